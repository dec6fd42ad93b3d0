//! ### English
//! C ABI surface for `rosen_surface`.
//!
//! All exported symbols are `extern "C"` functions; structs are `#[repr(C)]`.
//! Functions returning `i32` report `0` on success and a `GsError::code` otherwise.
//! Buffer handles (`RosenSurfaceBuffer`) handed out by request/acquire are consumed by the
//! matching flush/cancel/release call; a handle that is not returned must be freed with
//! `rosen_surface_buffer_unref`.
//!
//! ### 中文
//! `rosen_surface` 的 C ABI 接口层。
//!
//! 所有导出符号均为 `extern "C"` 函数；结构体使用 `#[repr(C)]`。
//! 返回 `i32` 的函数成功时返回 `0`，失败时返回 `GsError::code`。
//! request/acquire 交出的缓冲区句柄（`RosenSurfaceBuffer`）会被对应的 flush/cancel/release
//! 调用消耗；未归还的句柄必须用 `rosen_surface_buffer_unref` 释放。
mod abi;
mod buffer;
mod consumer;
mod producer;

use std::ffi::{CStr, c_char, c_void};
use std::sync::Arc;

use crossbeam_channel as channel;

use crate::buffer::SurfaceBuffer;
use crate::error::{GsError, Result};
use crate::flags::BufferUsage;
use crate::listener::{ConsumerEvent, ConsumerListener};
use crate::surface::{ConsumerSurface, ProducerSurface};
use crate::types::{BufferFlushConfig, BufferRequestConfig, Rect};

/// ### English
/// C ABI version for `rosen_surface`.
///
/// ### 中文
/// `rosen_surface` 的 C ABI 版本号。
const ROSEN_SURFACE_ABI_VERSION: u32 = 1;

#[repr(C)]
/// ### English
/// Opaque consumer handle owning the buffer queue.
///
/// ### 中文
/// 不透明的 consumer 句柄，持有 buffer queue。
pub struct RosenSurfaceConsumer {
    surface: ConsumerSurface,
    /// ### English
    /// Availability events, present when created with `ROSEN_SURFACE_FLAG_POLL_AVAILABLE`.
    ///
    /// ### 中文
    /// 可用事件；使用 `ROSEN_SURFACE_FLAG_POLL_AVAILABLE` 创建时存在。
    events: Option<channel::Receiver<ConsumerEvent>>,
}

#[repr(C)]
/// ### English
/// Opaque producer handle.
///
/// ### 中文
/// 不透明的生产者句柄。
pub struct RosenSurfaceProducer {
    surface: ProducerSurface,
}

#[repr(C)]
/// ### English
/// Opaque reference to one graphics buffer.
///
/// ### 中文
/// 指向单个图形缓冲区的不透明引用。
pub struct RosenSurfaceBuffer {
    buffer: Arc<SurfaceBuffer>,
}

impl RosenSurfaceBuffer {
    fn into_raw(buffer: Arc<SurfaceBuffer>) -> *mut RosenSurfaceBuffer {
        Box::into_raw(Box::new(RosenSurfaceBuffer { buffer }))
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
/// ### English
/// C mirror of `BufferRequestConfig`. Enum fields carry their `i32` discriminants.
///
/// ### 中文
/// `BufferRequestConfig` 的 C 镜像。枚举字段使用其 `i32` 判别值。
pub struct RosenRequestConfig {
    pub width: i32,
    pub height: i32,
    pub stride_alignment: i32,
    pub format: i32,
    pub usage: u64,
    /// ### English
    /// Milliseconds to wait when every slot is in use (`0` = fail immediately).
    ///
    /// ### 中文
    /// 所有槽位都在使用时等待的毫秒数（`0` = 立即失败）。
    pub timeout: i32,
    pub color_gamut: i32,
    pub transform: i32,
}

impl TryFrom<RosenRequestConfig> for BufferRequestConfig {
    type Error = GsError;

    fn try_from(value: RosenRequestConfig) -> Result<Self> {
        Ok(Self {
            width: value.width,
            height: value.height,
            stride_alignment: value.stride_alignment,
            format: value.format.try_into()?,
            usage: BufferUsage::from_bits_retain(value.usage),
            timeout: value.timeout,
            color_gamut: value.color_gamut.try_into()?,
            transform: value.transform.try_into()?,
        })
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug)]
/// ### English
/// C mirror of `BufferFlushConfig`.
///
/// ### 中文
/// `BufferFlushConfig` 的 C 镜像。
pub struct RosenFlushConfig {
    pub damage: Rect,
    /// ### English
    /// Content timestamp in microseconds; `0` means "now".
    ///
    /// ### 中文
    /// 内容时间戳（微秒）；`0` 表示“当前时间”。
    pub timestamp: i64,
}

impl From<RosenFlushConfig> for BufferFlushConfig {
    fn from(value: RosenFlushConfig) -> Self {
        Self {
            damage: value.damage,
            timestamp: value.timestamp,
        }
    }
}

#[repr(C)]
/// ### English
/// Buffer handed to the producer by `rosen_surface_producer_request_buffer`.
///
/// ### 中文
/// `rosen_surface_producer_request_buffer` 交给生产者的缓冲区。
pub struct RosenRequestedBuffer {
    pub buffer: *mut RosenSurfaceBuffer,
    /// ### English
    /// Release fence fd of the consumer's last read, or `-1`.
    ///
    /// ### 中文
    /// consumer 上次读取的 release fence fd，或 `-1`。
    pub fence: i32,
}

#[repr(C)]
/// ### English
/// Buffer handed to the consumer by `rosen_surface_consumer_acquire_buffer`.
///
/// ### 中文
/// `rosen_surface_consumer_acquire_buffer` 交给 consumer 的缓冲区。
pub struct RosenAcquiredBuffer {
    pub buffer: *mut RosenSurfaceBuffer,
    pub fence: i32,
    pub timestamp: i64,
    pub damage: Rect,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default)]
/// ### English
/// Geometry and layout of a buffer.
///
/// ### 中文
/// 缓冲区的尺寸与布局。
pub struct RosenBufferInfo {
    pub sequence: u32,
    pub width: i32,
    pub height: i32,
    pub stride: u32,
    pub format: i32,
    pub usage: u64,
    pub byte_len: usize,
}

impl From<&SurfaceBuffer> for RosenBufferInfo {
    fn from(buffer: &SurfaceBuffer) -> Self {
        Self {
            sequence: buffer.sequence(),
            width: buffer.width(),
            height: buffer.height(),
            stride: buffer.stride(),
            format: buffer.format().into(),
            usage: buffer.usage().bits(),
            byte_len: buffer.byte_len(),
        }
    }
}

/// ### English
/// Embedder callback invoked once per flushed buffer.
///
/// ### 中文
/// 每个 flush 的缓冲区调用一次的宿主回调。
pub type RosenBufferAvailableFn = unsafe extern "C" fn(user_data: *mut c_void);

/// ### English
/// Consumer listener forwarding `on_buffer_available` to a C function pointer.
///
/// ### 中文
/// 把 `on_buffer_available` 转发给 C 函数指针的 consumer 监听器。
struct CallbackListener {
    callback: RosenBufferAvailableFn,
    user_data: *mut c_void,
}

// SAFETY: the embedder guarantees `user_data` may be used from whichever thread flushes.
unsafe impl Send for CallbackListener {}
unsafe impl Sync for CallbackListener {}

impl ConsumerListener for CallbackListener {
    fn on_buffer_available(&self) {
        unsafe { (self.callback)(self.user_data) };
    }
}

/// ### English
/// Converts an optional NUL-terminated UTF-8 C string into an owned name.
///
/// Returns `None` for NULL pointers, invalid UTF-8, or empty strings.
///
/// # Safety
/// `ptr` must be valid and point to a NUL-terminated string for the duration of the call.
///
/// ### 中文
/// 将可选的 NUL 结尾 UTF-8 C 字符串转换为名称。
///
/// 对 NULL 指针、UTF-8 非法或空字符串返回 `None`。
///
/// # Safety
/// `ptr` 在本次调用期间必须有效，并指向以 NUL 结尾的字符串。
unsafe fn cstr_to_name(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }

    let value = unsafe { CStr::from_ptr(ptr) }.to_str().ok()?;
    if value.is_empty() {
        return None;
    }

    Some(value.to_owned())
}

#[cfg(test)]
mod tests {
    use std::ffi::{CString, c_void};
    use std::ptr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::abi::rosen_surface_abi_version;
    use super::buffer::*;
    use super::consumer::*;
    use super::producer::*;
    use super::*;
    use crate::error::GSERROR_OK;
    use crate::flags::ROSEN_SURFACE_FLAG_POLL_AVAILABLE;

    fn request_config(width: i32, height: i32) -> RosenRequestConfig {
        RosenRequestConfig {
            width,
            height,
            stride_alignment: 8,
            format: 12,
            usage: (BufferUsage::CPU_READ | BufferUsage::CPU_WRITE).bits(),
            timeout: 0,
            color_gamut: 0,
            transform: 0,
        }
    }

    fn empty_requested() -> RosenRequestedBuffer {
        RosenRequestedBuffer {
            buffer: ptr::null_mut(),
            fence: 0,
        }
    }

    fn empty_acquired() -> RosenAcquiredBuffer {
        RosenAcquiredBuffer {
            buffer: ptr::null_mut(),
            fence: 0,
            timestamp: 0,
            damage: Rect::default(),
        }
    }

    unsafe extern "C" fn count_available(user_data: *mut c_void) {
        let counter = unsafe { &*(user_data as *const AtomicUsize) };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn abi_version_is_stable() {
        assert_eq!(rosen_surface_abi_version(), ROSEN_SURFACE_ABI_VERSION);
    }

    #[test]
    fn callback_round_trip() {
        let counter = AtomicUsize::new(0);
        let name = CString::new("ffi").unwrap();
        unsafe {
            let consumer = rosen_surface_consumer_create(name.as_ptr(), 2, 0);
            assert!(!consumer.is_null());
            assert_eq!(
                rosen_surface_consumer_set_listener(
                    consumer,
                    Some(count_available),
                    &counter as *const AtomicUsize as *mut c_void,
                ),
                GSERROR_OK
            );
            let producer = rosen_surface_producer_create(consumer);
            assert_eq!(
                rosen_surface_producer_unique_id(producer),
                rosen_surface_consumer_unique_id(consumer)
            );
            assert_eq!(rosen_surface_producer_queue_size(producer), 2);

            let mut requested = empty_requested();
            let config = request_config(4, 4);
            assert_eq!(
                rosen_surface_producer_request_buffer(producer, &config, &mut requested),
                GSERROR_OK
            );
            assert_eq!(requested.fence, -1);

            let mut info = RosenBufferInfo::default();
            assert_eq!(rosen_surface_buffer_info(requested.buffer, &mut info), GSERROR_OK);
            assert_eq!((info.width, info.height, info.stride), (4, 4, 8));

            let pixels = [7u8; 4];
            assert_eq!(
                rosen_surface_buffer_write(requested.buffer, 0, pixels.as_ptr(), pixels.len()),
                GSERROR_OK
            );
            assert_eq!(
                rosen_surface_buffer_write(requested.buffer, info.byte_len, pixels.as_ptr(), 1),
                GsError::OutOfRange.code()
            );
            assert_eq!(
                rosen_surface_producer_flush_buffer(producer, requested.buffer, -1, ptr::null()),
                GSERROR_OK
            );
            assert_eq!(counter.load(Ordering::SeqCst), 1);

            let mut acquired = empty_acquired();
            assert_eq!(
                rosen_surface_consumer_acquire_buffer(consumer, &mut acquired),
                GSERROR_OK
            );
            let mut read_back = [0u8; 4];
            assert_eq!(
                rosen_surface_buffer_read(acquired.buffer, 0, read_back.as_mut_ptr(), 4),
                GSERROR_OK
            );
            assert_eq!(read_back, pixels);
            assert_eq!(
                rosen_surface_consumer_release_buffer(consumer, acquired.buffer, -1),
                GSERROR_OK
            );

            let mut empty = empty_acquired();
            assert_eq!(
                rosen_surface_consumer_acquire_buffer(consumer, &mut empty),
                GsError::NoBuffer.code()
            );

            rosen_surface_producer_destroy(producer);
            rosen_surface_consumer_destroy(consumer);
        }
    }

    #[test]
    fn polling_consumer_counts_flushes() {
        unsafe {
            let consumer =
                rosen_surface_consumer_create(ptr::null(), 0, ROSEN_SURFACE_FLAG_POLL_AVAILABLE);
            assert_eq!(rosen_surface_consumer_queue_size(consumer), 3);
            assert_eq!(
                rosen_surface_consumer_set_listener(consumer, Some(count_available), ptr::null_mut()),
                GsError::NoEntry.code()
            );
            let producer = rosen_surface_producer_create(consumer);

            for _ in 0..2 {
                let mut requested = empty_requested();
                let config = request_config(2, 2);
                assert_eq!(
                    rosen_surface_producer_request_buffer(producer, &config, &mut requested),
                    GSERROR_OK
                );
                assert_eq!(
                    rosen_surface_producer_flush_buffer(producer, requested.buffer, -1, ptr::null()),
                    GSERROR_OK
                );
            }
            assert_eq!(rosen_surface_consumer_wait_available(consumer, 100), 2);
            assert_eq!(rosen_surface_consumer_wait_available(consumer, 0), 0);

            rosen_surface_producer_destroy(producer);
            rosen_surface_consumer_destroy(consumer);
        }
    }

    #[test]
    fn idle_producer_destroy_keeps_acquired_buffer() {
        unsafe {
            let consumer =
                rosen_surface_consumer_create(ptr::null(), 0, ROSEN_SURFACE_FLAG_POLL_AVAILABLE);
            let producer = rosen_surface_producer_create(consumer);
            let idle = rosen_surface_producer_create(consumer);
            assert_eq!(
                rosen_surface_producer_disconnect(idle),
                GsError::InvalidOperating.code()
            );

            let mut requested = empty_requested();
            let config = request_config(2, 2);
            assert_eq!(
                rosen_surface_producer_request_buffer(producer, &config, &mut requested),
                GSERROR_OK
            );
            assert_eq!(
                rosen_surface_producer_flush_buffer(producer, requested.buffer, -1, ptr::null()),
                GSERROR_OK
            );
            let mut acquired = empty_acquired();
            assert_eq!(
                rosen_surface_consumer_acquire_buffer(consumer, &mut acquired),
                GSERROR_OK
            );

            rosen_surface_producer_destroy(idle);
            assert_eq!(
                rosen_surface_consumer_release_buffer(consumer, acquired.buffer, -1),
                GSERROR_OK
            );

            rosen_surface_producer_destroy(producer);
            rosen_surface_consumer_destroy(consumer);
        }
    }

    #[test]
    fn invalid_arguments_are_reported() {
        unsafe {
            let consumer = rosen_surface_consumer_create(ptr::null(), 0, 0);
            let producer = rosen_surface_producer_create(consumer);
            let mut requested = empty_requested();

            assert_eq!(
                rosen_surface_producer_request_buffer(producer, ptr::null(), &mut requested),
                GsError::InvalidArguments.code()
            );
            let mut bad_format = request_config(4, 4);
            bad_format.format = 1234;
            assert_eq!(
                rosen_surface_producer_request_buffer(producer, &bad_format, &mut requested),
                GsError::InvalidArguments.code()
            );
            assert_eq!(
                rosen_surface_producer_request_buffer(producer, &request_config(4, 4), &mut requested),
                GsError::NoConsumer.code()
            );
            assert_eq!(
                rosen_surface_producer_set_queue_size(producer, 0),
                GsError::InvalidArguments.code()
            );
            assert!(rosen_surface_producer_create(ptr::null_mut()).is_null());

            rosen_surface_producer_destroy(producer);
            rosen_surface_consumer_destroy(consumer);
        }
    }
}
