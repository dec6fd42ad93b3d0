//! ### English
//! Producer-side `request_buffer`: reuse a FREE slot, reallocate it, or allocate a new one.
//!
//! ### 中文
//! 生产者侧的 `request_buffer`：复用 FREE 槽位、重新分配，或分配新槽位。

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::MutexGuard;
use tracing::{debug, warn};

use crate::buffer::SurfaceBuffer;
use crate::error::{GsError, Result};
use crate::fence::SyncFence;
use crate::types::{
    BufferRequestConfig, ColorGamut, PixelFormat, SURFACE_MAX_SIZE, SURFACE_MAX_STRIDE_ALIGNMENT,
    SURFACE_MIN_STRIDE_ALIGNMENT, TransformType,
};

use super::slot::{BufferSlot, BufferState};
use super::{BufferQueue, QueueInner};

/// ### English
/// Result of a successful `request_buffer`.
///
/// ### 中文
/// `request_buffer` 成功时的返回值。
#[derive(Clone, Debug)]
pub struct RequestedBuffer {
    pub buffer: Arc<SurfaceBuffer>,
    /// ### English
    /// Release fence of the consumer's last read; wait on it before writing.
    /// `SyncFence::INVALID` for freshly allocated buffers.
    ///
    /// ### 中文
    /// consumer 上次读取的 release fence；写入前需等待它。
    /// 新分配的缓冲区为 `SyncFence::INVALID`。
    pub fence: SyncFence,
    /// ### English
    /// Sequences deleted since the previous request (drop them from any producer-side cache).
    ///
    /// ### 中文
    /// 自上次 request 以来被删除的序号（请从生产者侧缓存中移除）。
    pub deleting: Vec<u32>,
}

/// ### English
/// Validates a request config before touching the slot table.
///
/// ### 中文
/// 在访问槽位表之前校验 request 配置。
pub(super) fn check_request_config(config: &BufferRequestConfig) -> Result<()> {
    if config.width <= 0 || config.height <= 0 {
        warn!(width = config.width, height = config.height, "buffer size must be positive");
        return Err(GsError::InvalidArguments);
    }
    if i64::from(config.width) * i64::from(config.height) > SURFACE_MAX_SIZE {
        warn!(width = config.width, height = config.height, "buffer area exceeds maximum");
        return Err(GsError::InvalidArguments);
    }

    let align = config.stride_alignment;
    if !(SURFACE_MIN_STRIDE_ALIGNMENT..=SURFACE_MAX_STRIDE_ALIGNMENT).contains(&align) {
        warn!(align, "stride alignment out of range");
        return Err(GsError::InvalidArguments);
    }
    if align & (align - 1) != 0 {
        warn!(align, "stride alignment is not a power of two");
        return Err(GsError::InvalidArguments);
    }

    if matches!(config.format, PixelFormat::VendorMask | PixelFormat::Butt) {
        warn!(format = ?config.format, "unsupported pixel format");
        return Err(GsError::InvalidArguments);
    }
    if config.color_gamut == ColorGamut::Invalid {
        warn!("invalid color gamut");
        return Err(GsError::InvalidArguments);
    }
    if config.transform == TransformType::Butt {
        warn!("invalid transform");
        return Err(GsError::InvalidArguments);
    }
    Ok(())
}

impl QueueInner {
    /// ### English
    /// Pops a FREE slot, preferring one whose config matches exactly.
    ///
    /// ### 中文
    /// 取出一个 FREE 槽位，优先选择配置完全一致的那个。
    fn pop_free(&mut self, config: &BufferRequestConfig) -> Option<u32> {
        let matching = self
            .free_list
            .iter()
            .position(|seq| self.slots.get(seq).is_some_and(|slot| slot.config == *config));
        match matching {
            Some(index) => self.free_list.remove(index),
            None => self.free_list.pop_front(),
        }
    }
}

impl BufferQueue {
    /// ### English
    /// Hands a buffer to the producer (FREE/new -> REQUESTED).
    ///
    /// Fails with `NoConsumer` when no consumer listener is registered or the consumer is gone,
    /// `InvalidArguments` for a malformed config, and `NoBuffer` when every slot is in use and
    /// none came back within `config.timeout` milliseconds.
    ///
    /// ### 中文
    /// 将缓冲区交给生产者（FREE/新建 -> REQUESTED）。
    ///
    /// 未注册 consumer 监听器或 consumer 已销毁时返回 `NoConsumer`；配置非法返回
    /// `InvalidArguments`；所有槽位都在使用且 `config.timeout` 毫秒内没有归还时返回 `NoBuffer`。
    pub fn request_buffer(&self, config: &BufferRequestConfig) -> Result<RequestedBuffer> {
        if !self.inner.lock().consumer_alive || self.consumer_listener().is_none() {
            warn!(queue_id = self.unique_id, "request without consumer");
            return Err(GsError::NoConsumer);
        }
        check_request_config(config)?;

        let mut inner = self.inner.lock();
        if let Some(sequence) = inner.pop_free(config) {
            return self.reuse_slot(&mut inner, sequence, config);
        }

        if inner.used_size() >= inner.queue_size {
            self.wait_for_slot(&mut inner, config.timeout);
            if !inner.consumer_alive {
                return Err(GsError::NoConsumer);
            }
            if let Some(sequence) = inner.pop_free(config) {
                return self.reuse_slot(&mut inner, sequence, config);
            }
            if inner.used_size() >= inner.queue_size {
                debug!(
                    queue_id = self.unique_id,
                    queue_size = inner.queue_size,
                    "all buffers are in use"
                );
                return Err(GsError::NoBuffer);
            }
        }

        self.alloc_slot(&mut inner, config)
    }

    fn wait_for_slot(&self, inner: &mut MutexGuard<'_, QueueInner>, timeout_ms: i32) {
        if timeout_ms <= 0 {
            return;
        }
        let deadline = Instant::now() + Duration::from_millis(timeout_ms as u64);
        while inner.free_list.is_empty()
            && inner.used_size() >= inner.queue_size
            && inner.consumer_alive
        {
            if self.slot_returned.wait_until(inner, deadline).timed_out() {
                break;
            }
        }
    }

    fn reuse_slot(
        &self,
        inner: &mut QueueInner,
        sequence: u32,
        config: &BufferRequestConfig,
    ) -> Result<RequestedBuffer> {
        let needs_realloc = inner.slot(sequence)?.config != *config;
        if needs_realloc {
            debug!(queue_id = self.unique_id, sequence, "config changed, reallocating");
            inner.delete_slot(sequence);
            return self.alloc_slot(inner, config);
        }

        let slot = inner.slot_mut(sequence)?;
        slot.state = BufferState::Requested;
        let buffer = Arc::clone(&slot.buffer);
        let fence = slot.fence;
        let deleting = std::mem::take(&mut inner.deleting_list);
        inner.producer_connected = true;
        inner.note_handed_to_producer(sequence);
        debug!(
            queue_id = self.unique_id,
            sequence,
            release_fence = fence.fd(),
            "reused buffer"
        );
        Ok(RequestedBuffer {
            buffer,
            fence,
            deleting,
        })
    }

    fn alloc_slot(
        &self,
        inner: &mut QueueInner,
        config: &BufferRequestConfig,
    ) -> Result<RequestedBuffer> {
        let sequence = inner.next_sequence();
        let buffer = match self.allocator.alloc(sequence, config) {
            Ok(buffer) => Arc::new(buffer),
            Err(err) => {
                warn!(queue_id = self.unique_id, sequence, %err, "buffer allocation failed");
                return Err(err);
            }
        };
        inner
            .slots
            .insert(sequence, BufferSlot::requested(Arc::clone(&buffer), *config));
        let deleting = std::mem::take(&mut inner.deleting_list);
        inner.producer_connected = true;
        inner.note_handed_to_producer(sequence);
        debug!(
            queue_id = self.unique_id,
            sequence,
            width = config.width,
            height = config.height,
            "allocated buffer"
        );
        Ok(RequestedBuffer {
            buffer,
            fence: SyncFence::INVALID,
            deleting,
        })
    }
}
