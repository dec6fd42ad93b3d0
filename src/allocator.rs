//! ### English
//! Buffer memory allocation seam.
//!
//! The queue never allocates pixel memory itself; it asks a `BufferAllocator`. The default
//! `HeapAllocator` backs buffers with plain heap memory and supports the two formats the
//! compositor reads directly, for CPU-accessible usages without vendor-private bits.
//!
//! ### 中文
//! 缓冲区内存分配的接口层。
//!
//! 队列本身不分配像素内存，而是交给 `BufferAllocator`。默认的 `HeapAllocator` 使用普通堆内存，
//! 并支持合成器可直接读取的两种格式，用途须可被 CPU 访问且不含厂商私有位。

use tracing::warn;

use crate::buffer::SurfaceBuffer;
use crate::error::{GsError, Result};
use crate::flags::BUFFER_USAGE_VENDOR_MASK;
use crate::types::{BufferRequestConfig, BufferVerifyAllocInfo, PixelFormat, SURFACE_MAX_SIZE};

/// ### English
/// Allocates pixel memory for queue slots and answers capability queries.
///
/// ### 中文
/// 为队列槽位分配像素内存，并回答能力查询。
pub trait BufferAllocator: Send + Sync {
    /// ### English
    /// Allocates a buffer for `config`. The config has already been validated by the queue.
    ///
    /// #### Parameters
    /// - `sequence`: Sequence number the queue assigned to the new slot.
    /// - `config`: Validated request config.
    ///
    /// ### 中文
    /// 按 `config` 分配缓冲区。队列已事先校验过该配置。
    ///
    /// #### 参数
    /// - `sequence`：队列为新槽位分配的序号。
    /// - `config`：已校验的 request 配置。
    fn alloc(&self, sequence: u32, config: &BufferRequestConfig) -> Result<SurfaceBuffer>;

    /// ### English
    /// Whether a buffer described by `info` could be allocated.
    ///
    /// ### 中文
    /// 是否能够分配 `info` 所描述的缓冲区。
    fn is_supported(&self, info: &BufferVerifyAllocInfo) -> bool;
}

/// ### English
/// Heap-backed allocator (CPU memory only).
///
/// ### 中文
/// 基于堆内存的分配器（仅 CPU 内存）。
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapAllocator;

#[inline]
fn aligned_stride(width: i32, alignment: i32) -> u32 {
    let width = width as u32;
    let alignment = alignment.max(1) as u32;
    width.div_ceil(alignment) * alignment
}

impl BufferAllocator for HeapAllocator {
    fn alloc(&self, sequence: u32, config: &BufferRequestConfig) -> Result<SurfaceBuffer> {
        let stride = aligned_stride(config.width, config.stride_alignment);
        let Some(len) = config.format.byte_size(stride, config.height as u32) else {
            warn!(sequence, format = ?config.format, "format has no fixed layout");
            return Err(GsError::ApiFailed);
        };
        Ok(SurfaceBuffer::new(sequence, *config, stride, vec![0; len]))
    }

    fn is_supported(&self, info: &BufferVerifyAllocInfo) -> bool {
        let area = i64::from(info.width) * i64::from(info.height);
        let format_ok = matches!(
            info.format,
            PixelFormat::Rgba8888 | PixelFormat::Ycrcb420Sp
        );
        let usage_ok =
            info.usage.is_cpu_accessible() && (info.usage.bits() & BUFFER_USAGE_VENDOR_MASK) == 0;
        format_ok && usage_ok && area > 0 && area <= SURFACE_MAX_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::BufferUsage;

    #[test]
    fn stride_is_rounded_up_to_alignment() {
        assert_eq!(aligned_stride(30, 8), 32);
        assert_eq!(aligned_stride(32, 8), 32);
        assert_eq!(aligned_stride(1, 4), 4);
    }

    #[test]
    fn alloc_sizes_memory_from_stride() {
        let mut config = BufferRequestConfig::new(30, 10);
        config.stride_alignment = 8;
        let buffer = HeapAllocator.alloc(3, &config).unwrap();
        assert_eq!(buffer.stride(), 32);
        assert_eq!(buffer.byte_len(), 32 * 10 * 4);
    }

    #[test]
    fn palette_formats_fail_allocation() {
        let mut config = BufferRequestConfig::new(8, 8);
        config.format = PixelFormat::Clut8;
        assert_eq!(HeapAllocator.alloc(0, &config).unwrap_err(), GsError::ApiFailed);
    }

    #[test]
    fn only_rgba_and_nv21_are_supported() {
        let info = |format| BufferVerifyAllocInfo {
            width: 0x100,
            height: 0x100,
            usage: BufferUsage::CPU_READ | BufferUsage::CPU_WRITE,
            format,
        };
        assert!(HeapAllocator.is_supported(&info(PixelFormat::Rgba8888)));
        assert!(HeapAllocator.is_supported(&info(PixelFormat::Ycrcb420Sp)));
        assert!(!HeapAllocator.is_supported(&info(PixelFormat::Yuv422I)));
    }

    #[test]
    fn gpu_only_and_vendor_usages_are_not_supported() {
        let info = |usage| BufferVerifyAllocInfo {
            width: 0x100,
            height: 0x100,
            usage,
            format: PixelFormat::Rgba8888,
        };
        assert!(!HeapAllocator.is_supported(&info(BufferUsage::HW_TEXTURE)));
        let vendor = BufferUsage::from_bits_retain(BufferUsage::CPU_READ.bits() | (1u64 << 50));
        assert!(!HeapAllocator.is_supported(&info(vendor)));
        let mixed = BufferUsage::CPU_WRITE | BufferUsage::HW_TEXTURE;
        assert!(HeapAllocator.is_supported(&info(mixed)));
    }
}
