//! ### English
//! C ABI bindings for buffer handles (info, pixel copy, unref).
//!
//! ### 中文
//! 缓冲区句柄的 C ABI 绑定（信息、像素拷贝、unref）。

use super::{RosenBufferInfo, RosenSurfaceBuffer};
use crate::error::{GSERROR_OK, GsError};

/// ### English
/// Byte range `offset..offset + len` if it fits in a buffer of `total` bytes.
///
/// ### 中文
/// 若 `offset..offset + len` 落在 `total` 字节的缓冲区内，则返回该范围。
fn checked_range(offset: usize, len: usize, total: usize) -> Option<std::ops::Range<usize>> {
    let end = offset.checked_add(len)?;
    (end <= total).then_some(offset..end)
}

#[unsafe(no_mangle)]
/// ### English
/// Writes geometry and layout of `buffer` into `out`.
///
/// ### 中文
/// 把 `buffer` 的尺寸与布局写入 `out`。
pub unsafe extern "C" fn rosen_surface_buffer_info(
    buffer: *const RosenSurfaceBuffer,
    out: *mut RosenBufferInfo,
) -> i32 {
    if buffer.is_null() || out.is_null() {
        return GsError::InvalidArguments.code();
    }
    let buffer = unsafe { &(*buffer).buffer };
    unsafe { out.write(RosenBufferInfo::from(buffer.as_ref())) };
    GSERROR_OK
}

#[unsafe(no_mangle)]
/// ### English
/// Copies `len` bytes from `data` into the buffer's pixels at `offset`.
///
/// Returns `OutOfRange` if the range does not fit.
///
/// ### 中文
/// 从 `data` 拷贝 `len` 字节到缓冲区像素的 `offset` 处。
///
/// 范围越界时返回 `OutOfRange`。
pub unsafe extern "C" fn rosen_surface_buffer_write(
    buffer: *const RosenSurfaceBuffer,
    offset: usize,
    data: *const u8,
    len: usize,
) -> i32 {
    if buffer.is_null() || (data.is_null() && len != 0) {
        return GsError::InvalidArguments.code();
    }
    if len == 0 {
        return GSERROR_OK;
    }

    let src = unsafe { std::slice::from_raw_parts(data, len) };
    let buffer = unsafe { &(*buffer).buffer };
    buffer.write_pixels(|pixels| match checked_range(offset, len, pixels.len()) {
        Some(range) => {
            pixels[range].copy_from_slice(src);
            GSERROR_OK
        }
        None => GsError::OutOfRange.code(),
    })
}

#[unsafe(no_mangle)]
/// ### English
/// Copies `len` bytes of the buffer's pixels at `offset` into `out`.
///
/// ### 中文
/// 把缓冲区像素 `offset` 处的 `len` 字节拷贝到 `out`。
pub unsafe extern "C" fn rosen_surface_buffer_read(
    buffer: *const RosenSurfaceBuffer,
    offset: usize,
    out: *mut u8,
    len: usize,
) -> i32 {
    if buffer.is_null() || (out.is_null() && len != 0) {
        return GsError::InvalidArguments.code();
    }
    if len == 0 {
        return GSERROR_OK;
    }

    let dst = unsafe { std::slice::from_raw_parts_mut(out, len) };
    let buffer = unsafe { &(*buffer).buffer };
    buffer.read_pixels(|pixels| match checked_range(offset, len, pixels.len()) {
        Some(range) => {
            dst.copy_from_slice(&pixels[range]);
            GSERROR_OK
        }
        None => GsError::OutOfRange.code(),
    })
}

#[unsafe(no_mangle)]
/// ### English
/// Frees a buffer handle that will not be passed back to flush/cancel/release.
///
/// ### 中文
/// 释放不会再传回 flush/cancel/release 的缓冲区句柄。
pub unsafe extern "C" fn rosen_surface_buffer_unref(buffer: *mut RosenSurfaceBuffer) {
    if buffer.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(buffer));
    }
}

#[cfg(test)]
mod tests {
    use super::checked_range;

    #[test]
    fn ranges_must_fit() {
        assert_eq!(checked_range(0, 4, 4), Some(0..4));
        assert_eq!(checked_range(2, 4, 4), None);
        assert_eq!(checked_range(usize::MAX, 2, 4), None);
    }
}
