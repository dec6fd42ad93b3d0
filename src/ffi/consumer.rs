//! ### English
//! C ABI bindings for the consumer side (create/destroy, listener, acquire/release).
//!
//! ### 中文
//! consumer 侧的 C ABI 绑定（create/destroy、监听器、acquire/release）。

use std::ffi::{c_char, c_void};
use std::sync::Arc;
use std::time::Duration;

use super::{
    CallbackListener, RosenAcquiredBuffer, RosenBufferAvailableFn, RosenSurfaceBuffer,
    RosenSurfaceConsumer,
};
use crate::config::BufferQueueOptions;
use crate::error::{GSERROR_OK, GsError, result_code};
use crate::fence::SyncFence;
use crate::flags::ROSEN_SURFACE_FLAG_POLL_AVAILABLE;
use crate::listener::{ChannelConsumerListener, ConsumerEvent};
use crate::surface::{ConsumerSurface, Surface};

#[unsafe(no_mangle)]
/// ### English
/// Creates a consumer surface and its buffer queue.
///
/// `name` is an optional NUL-terminated UTF-8 string; NULL or empty selects the default name.
/// `queue_size = 0` selects the default size; larger values are clamped to the maximum.
/// With `ROSEN_SURFACE_FLAG_POLL_AVAILABLE` in `flags`, availability events are recorded for
/// `rosen_surface_consumer_wait_available` and no callback may be installed.
///
/// ### 中文
/// 创建 consumer surface 及其 buffer queue。
///
/// `name` 为可选的 NUL 结尾 UTF-8 字符串；NULL 或空字符串使用默认名称。
/// `queue_size = 0` 使用默认大小；更大的值会被截断到最大值。
/// `flags` 含 `ROSEN_SURFACE_FLAG_POLL_AVAILABLE` 时，可用事件会被记录以供
/// `rosen_surface_consumer_wait_available` 读取，且不能再安装回调。
pub unsafe extern "C" fn rosen_surface_consumer_create(
    name: *const c_char,
    queue_size: u32,
    flags: u32,
) -> *mut RosenSurfaceConsumer {
    let mut options = BufferQueueOptions::default();
    if let Some(name) = unsafe { super::cstr_to_name(name) } {
        options.name = name;
    }
    if queue_size != 0 {
        options.queue_size = queue_size;
    }

    let surface = ConsumerSurface::with_options(options);
    let events = if flags & ROSEN_SURFACE_FLAG_POLL_AVAILABLE != 0 {
        let (listener, rx) = ChannelConsumerListener::new();
        if surface.register_consumer_listener(listener).is_err() {
            return std::ptr::null_mut();
        }
        Some(rx)
    } else {
        None
    };

    Box::into_raw(Box::new(RosenSurfaceConsumer { surface, events }))
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys a consumer created by `rosen_surface_consumer_create`.
///
/// Producers derived from it stay valid but every further request fails with `NoConsumer`.
///
/// ### 中文
/// 销毁由 `rosen_surface_consumer_create` 创建的 consumer。
///
/// 从它派生的生产者仍然有效，但之后的所有 request 都会返回 `NoConsumer`。
pub unsafe extern "C" fn rosen_surface_consumer_destroy(consumer: *mut RosenSurfaceConsumer) {
    if consumer.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(consumer));
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Installs the buffer-available callback. Only one listener per queue.
///
/// ### 中文
/// 安装缓冲区可用回调。每个队列只能有一个监听器。
pub unsafe extern "C" fn rosen_surface_consumer_set_listener(
    consumer: *mut RosenSurfaceConsumer,
    callback: Option<RosenBufferAvailableFn>,
    user_data: *mut c_void,
) -> i32 {
    if consumer.is_null() {
        return GsError::InvalidArguments.code();
    }
    let Some(callback) = callback else {
        return GsError::InvalidArguments.code();
    };

    let listener = Arc::new(CallbackListener { callback, user_data });
    let surface = unsafe { &(*consumer).surface };
    result_code(surface.register_consumer_listener(listener))
}

#[unsafe(no_mangle)]
/// ### English
/// Waits up to `timeout_ms` for availability events and returns how many buffers became
/// available. Returns `0` for consumers created without `ROSEN_SURFACE_FLAG_POLL_AVAILABLE`.
///
/// ### 中文
/// 最多等待 `timeout_ms` 毫秒的可用事件，并返回新可用的缓冲区数量。
/// 未使用 `ROSEN_SURFACE_FLAG_POLL_AVAILABLE` 创建的 consumer 返回 `0`。
pub unsafe extern "C" fn rosen_surface_consumer_wait_available(
    consumer: *mut RosenSurfaceConsumer,
    timeout_ms: u32,
) -> u32 {
    if consumer.is_null() {
        return 0;
    }
    let Some(events) = (unsafe { (*consumer).events.as_ref() }) else {
        return 0;
    };

    let Ok(first) = events.recv_timeout(Duration::from_millis(u64::from(timeout_ms))) else {
        return 0;
    };
    std::iter::once(first)
        .chain(events.try_iter())
        .filter(|event| *event == ConsumerEvent::BufferAvailable)
        .count() as u32
}

#[unsafe(no_mangle)]
/// ### English
/// Acquires the oldest flushed buffer.
///
/// On success `out` receives a new buffer handle that must be passed back to
/// `rosen_surface_consumer_release_buffer`.
///
/// ### 中文
/// acquire 最早 flush 的缓冲区。
///
/// 成功时 `out` 获得新的缓冲区句柄，之后必须传回 `rosen_surface_consumer_release_buffer`。
pub unsafe extern "C" fn rosen_surface_consumer_acquire_buffer(
    consumer: *mut RosenSurfaceConsumer,
    out: *mut RosenAcquiredBuffer,
) -> i32 {
    if consumer.is_null() || out.is_null() {
        return GsError::InvalidArguments.code();
    }

    let surface = unsafe { &(*consumer).surface };
    match surface.acquire_buffer() {
        Ok(acquired) => {
            unsafe {
                out.write(RosenAcquiredBuffer {
                    buffer: RosenSurfaceBuffer::into_raw(acquired.buffer),
                    fence: acquired.fence.fd(),
                    timestamp: acquired.timestamp,
                    damage: acquired.damage,
                });
            }
            GSERROR_OK
        }
        Err(err) => err.code(),
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Releases an acquired buffer. `buffer` is consumed whether or not the call succeeds.
///
/// `fence` is the consumer's release fence fd, or `-1`.
///
/// ### 中文
/// release 一个已 acquire 的缓冲区。无论调用是否成功，`buffer` 都会被消耗。
///
/// `fence` 为 consumer 的 release fence fd，或 `-1`。
pub unsafe extern "C" fn rosen_surface_consumer_release_buffer(
    consumer: *mut RosenSurfaceConsumer,
    buffer: *mut RosenSurfaceBuffer,
    fence: i32,
) -> i32 {
    if buffer.is_null() {
        return GsError::InvalidArguments.code();
    }
    let buffer = unsafe { Box::from_raw(buffer) };
    if consumer.is_null() {
        return GsError::InvalidArguments.code();
    }

    let surface = unsafe { &(*consumer).surface };
    result_code(surface.release_buffer(&buffer.buffer, SyncFence::new(fence)))
}

#[unsafe(no_mangle)]
/// ### English
/// Returns the queue's unique id, or `0` for NULL.
///
/// ### 中文
/// 返回队列的唯一 id；NULL 时返回 `0`。
pub unsafe extern "C" fn rosen_surface_consumer_unique_id(
    consumer: *mut RosenSurfaceConsumer,
) -> u64 {
    if consumer.is_null() {
        return 0;
    }
    unsafe { (*consumer).surface.unique_id() }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosen_surface_consumer_queue_size(
    consumer: *mut RosenSurfaceConsumer,
) -> u32 {
    if consumer.is_null() {
        return 0;
    }
    unsafe { (*consumer).surface.queue_size() }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosen_surface_consumer_set_queue_size(
    consumer: *mut RosenSurfaceConsumer,
    queue_size: u32,
) -> i32 {
    if consumer.is_null() {
        return GsError::InvalidArguments.code();
    }
    result_code(unsafe { (*consumer).surface.set_queue_size(queue_size) })
}
