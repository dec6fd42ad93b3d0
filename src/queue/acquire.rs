//! ### English
//! Consumer-side `acquire_buffer` (FLUSHED -> ACQUIRED), strictly in flush order.
//!
//! ### 中文
//! consumer 侧的 `acquire_buffer`（FLUSHED -> ACQUIRED），严格按 flush 顺序。

use std::sync::Arc;

use tracing::debug;

use crate::buffer::SurfaceBuffer;
use crate::error::{GsError, Result};
use crate::fence::SyncFence;
use crate::types::Rect;

use super::BufferQueue;
use super::slot::BufferState;

/// ### English
/// Metadata for one acquired buffer (consumer side).
///
/// ### 中文
/// 单个已 acquire 缓冲区的元数据（consumer 侧）。
#[derive(Clone, Debug)]
pub struct AcquiredBuffer {
    pub buffer: Arc<SurfaceBuffer>,
    /// ### English
    /// Flush fence; wait on it before reading pixels.
    ///
    /// ### 中文
    /// flush fence；读取像素前需等待它。
    pub fence: SyncFence,
    /// ### English
    /// Content timestamp in microseconds.
    ///
    /// ### 中文
    /// 内容时间戳（微秒）。
    pub timestamp: i64,
    pub damage: Rect,
}

impl BufferQueue {
    /// ### English
    /// Acquires the oldest FLUSHED buffer; `NoBuffer` when nothing is queued.
    ///
    /// ### 中文
    /// acquire 最早 flush 的缓冲区；没有排队的缓冲区时返回 `NoBuffer`。
    pub fn acquire_buffer(&self) -> Result<AcquiredBuffer> {
        let mut inner = self.inner.lock();
        while let Some(sequence) = inner.dirty_list.pop_front() {
            let Some(slot) = inner.slots.get_mut(&sequence) else {
                continue;
            };
            slot.state = BufferState::Acquired;
            let acquired = AcquiredBuffer {
                buffer: Arc::clone(&slot.buffer),
                fence: slot.fence,
                timestamp: slot.timestamp,
                damage: slot.damage,
            };
            debug!(
                queue_id = self.unique_id,
                sequence,
                acquire_fence = acquired.fence.fd(),
                "acquired buffer"
            );
            return Ok(acquired);
        }
        debug!(queue_id = self.unique_id, "no dirty buffer to acquire");
        Err(GsError::NoBuffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BufferQueueOptions;
    use crate::listener::ConsumerListener;
    use crate::types::{BufferFlushConfig, BufferRequestConfig};

    struct Quiet;
    impl ConsumerListener for Quiet {
        fn on_buffer_available(&self) {}
    }

    #[test]
    fn acquire_follows_flush_order_not_request_order() {
        let queue = BufferQueue::new(BufferQueueOptions::default());
        queue.register_consumer_listener(Arc::new(Quiet)).unwrap();
        let config = BufferRequestConfig::new(4, 4);
        let a = queue.request_buffer(&config).unwrap().buffer.sequence();
        let b = queue.request_buffer(&config).unwrap().buffer.sequence();

        let flush = |ts| BufferFlushConfig {
            damage: Rect::default(),
            timestamp: ts,
        };
        queue.flush_buffer(b, SyncFence::new(11), &flush(200)).unwrap();
        queue.flush_buffer(a, SyncFence::new(10), &flush(100)).unwrap();

        let first = queue.acquire_buffer().unwrap();
        assert_eq!(first.buffer.sequence(), b);
        assert_eq!(first.fence, SyncFence::new(11));
        assert_eq!(first.timestamp, 200);
        let second = queue.acquire_buffer().unwrap();
        assert_eq!(second.buffer.sequence(), a);
        assert_eq!(queue.acquire_buffer().unwrap_err(), GsError::NoBuffer);
    }
}
