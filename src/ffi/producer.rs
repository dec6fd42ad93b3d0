//! ### English
//! C ABI bindings for the producer side (create/destroy, request/flush/cancel, disconnect).
//!
//! ### 中文
//! 生产者侧的 C ABI 绑定（create/destroy、request/flush/cancel、disconnect）。

use super::{
    RosenFlushConfig, RosenRequestConfig, RosenRequestedBuffer, RosenSurfaceBuffer,
    RosenSurfaceConsumer, RosenSurfaceProducer,
};
use crate::error::{GSERROR_OK, GsError, result_code};
use crate::fence::SyncFence;
use crate::surface::{ProducerSurface, Surface};
use crate::types::{BufferFlushConfig, BufferRequestConfig};

#[unsafe(no_mangle)]
/// ### English
/// Creates a producer attached to `consumer`'s queue. The producer may outlive the consumer.
///
/// ### 中文
/// 创建附着在 `consumer` 队列上的生产者。生产者可以比 consumer 存活更久。
pub unsafe extern "C" fn rosen_surface_producer_create(
    consumer: *mut RosenSurfaceConsumer,
) -> *mut RosenSurfaceProducer {
    if consumer.is_null() {
        return std::ptr::null_mut();
    }

    let producer = unsafe { (*consumer).surface.producer() };
    let surface = ProducerSurface::create(producer);
    Box::into_raw(Box::new(RosenSurfaceProducer { surface }))
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys a producer created by `rosen_surface_producer_create`. A producer that requested
/// buffers since its last disconnect is disconnected first; an idle one leaves the queue alone.
///
/// ### 中文
/// 销毁由 `rosen_surface_producer_create` 创建的生产者。若自上次断开以来 request 过缓冲区，
/// 会先断开连接；空闲的生产者不会影响队列。
pub unsafe extern "C" fn rosen_surface_producer_destroy(producer: *mut RosenSurfaceProducer) {
    if producer.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(producer));
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Requests a writable buffer.
///
/// On success `out.buffer` is a new handle that must be passed to
/// `rosen_surface_producer_flush_buffer` or `rosen_surface_producer_cancel_buffer`, and
/// `out.fence` is the fence to wait on before writing (`-1` if none).
///
/// ### 中文
/// 请求一个可写缓冲区。
///
/// 成功时 `out.buffer` 为新句柄，之后必须传给 `rosen_surface_producer_flush_buffer` 或
/// `rosen_surface_producer_cancel_buffer`；`out.fence` 为写入前需要等待的 fence（没有则为 `-1`）。
pub unsafe extern "C" fn rosen_surface_producer_request_buffer(
    producer: *mut RosenSurfaceProducer,
    config: *const RosenRequestConfig,
    out: *mut RosenRequestedBuffer,
) -> i32 {
    if producer.is_null() || config.is_null() || out.is_null() {
        return GsError::InvalidArguments.code();
    }

    let config = match BufferRequestConfig::try_from(unsafe { *config }) {
        Ok(config) => config,
        Err(err) => return err.code(),
    };
    let surface = unsafe { &(*producer).surface };
    match surface.request_buffer(&config) {
        Ok(requested) => {
            unsafe {
                out.write(RosenRequestedBuffer {
                    buffer: RosenSurfaceBuffer::into_raw(requested.buffer),
                    fence: requested.fence.fd(),
                });
            }
            GSERROR_OK
        }
        Err(err) => err.code(),
    }
}

#[unsafe(no_mangle)]
/// ### English
/// Queues a filled buffer for the consumer. `buffer` is consumed whether or not the call succeeds.
///
/// `config` may be NULL (no damage, timestamp filled from the clock).
///
/// ### 中文
/// 将已填充的缓冲区排队给 consumer。无论调用是否成功，`buffer` 都会被消耗。
///
/// `config` 可以为 NULL（无 damage，时间戳取当前时钟）。
pub unsafe extern "C" fn rosen_surface_producer_flush_buffer(
    producer: *mut RosenSurfaceProducer,
    buffer: *mut RosenSurfaceBuffer,
    fence: i32,
    config: *const RosenFlushConfig,
) -> i32 {
    if buffer.is_null() {
        return GsError::InvalidArguments.code();
    }
    let buffer = unsafe { Box::from_raw(buffer) };
    if producer.is_null() {
        return GsError::InvalidArguments.code();
    }

    let config = if config.is_null() {
        BufferFlushConfig::default()
    } else {
        BufferFlushConfig::from(unsafe { *config })
    };
    let surface = unsafe { &(*producer).surface };
    result_code(surface.flush_buffer(&buffer.buffer, SyncFence::new(fence), &config))
}

#[unsafe(no_mangle)]
/// ### English
/// Returns a requested buffer unused. `buffer` is consumed whether or not the call succeeds.
///
/// ### 中文
/// 不使用并归还已请求的缓冲区。无论调用是否成功，`buffer` 都会被消耗。
pub unsafe extern "C" fn rosen_surface_producer_cancel_buffer(
    producer: *mut RosenSurfaceProducer,
    buffer: *mut RosenSurfaceBuffer,
) -> i32 {
    if buffer.is_null() {
        return GsError::InvalidArguments.code();
    }
    let buffer = unsafe { Box::from_raw(buffer) };
    if producer.is_null() {
        return GsError::InvalidArguments.code();
    }

    let surface = unsafe { &(*producer).surface };
    result_code(surface.cancel_buffer(&buffer.buffer))
}

#[unsafe(no_mangle)]
/// ### English
/// Drops every cached buffer and disconnects the producer until its next request.
///
/// ### 中文
/// 丢弃所有缓存的缓冲区，并断开生产者直到下一次 request。
pub unsafe extern "C" fn rosen_surface_producer_disconnect(
    producer: *mut RosenSurfaceProducer,
) -> i32 {
    if producer.is_null() {
        return GsError::InvalidArguments.code();
    }
    result_code(unsafe { (*producer).surface.disconnect() })
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosen_surface_producer_unique_id(
    producer: *mut RosenSurfaceProducer,
) -> u64 {
    if producer.is_null() {
        return 0;
    }
    unsafe { (*producer).surface.unique_id() }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosen_surface_producer_queue_size(
    producer: *mut RosenSurfaceProducer,
) -> u32 {
    if producer.is_null() {
        return 0;
    }
    unsafe { (*producer).surface.queue_size() }
}

#[unsafe(no_mangle)]
pub unsafe extern "C" fn rosen_surface_producer_set_queue_size(
    producer: *mut RosenSurfaceProducer,
    queue_size: u32,
) -> i32 {
    if producer.is_null() {
        return GsError::InvalidArguments.code();
    }
    result_code(unsafe { (*producer).surface.set_queue_size(queue_size) })
}
