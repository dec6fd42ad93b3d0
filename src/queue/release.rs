//! ### English
//! Consumer-side `release_buffer` (ACQUIRED -> FREE), recording the release fence.
//!
//! ### 中文
//! consumer 侧的 `release_buffer`（ACQUIRED -> FREE），并记录 release fence。

use std::sync::Arc;

use tracing::{debug, warn};

use crate::buffer::SurfaceBuffer;
use crate::error::{GsError, Result};
use crate::fence::SyncFence;

use super::BufferQueue;
use super::slot::BufferState;

impl BufferQueue {
    /// ### English
    /// Returns an acquired buffer to the producer.
    ///
    /// #### Parameters
    /// - `buffer`: Buffer previously returned by `acquire_buffer`.
    /// - `fence`: Signaled once the consumer's read finished; the next request of this slot
    ///   hands it to the producer.
    ///
    /// ### 中文
    /// 将已 acquire 的缓冲区归还给生产者。
    ///
    /// #### 参数
    /// - `buffer`：之前由 `acquire_buffer` 返回的缓冲区。
    /// - `fence`：consumer 读取完成时 signal；下次 request 该槽位时交给生产者。
    pub fn release_buffer(&self, buffer: &Arc<SurfaceBuffer>, fence: SyncFence) -> Result<()> {
        let sequence = buffer.sequence();
        {
            let mut inner = self.inner.lock();
            let slot = match inner.slot_mut(sequence) {
                Ok(slot) if Arc::ptr_eq(&slot.buffer, buffer) => slot,
                _ => {
                    warn!(queue_id = self.unique_id, sequence, "release of unknown buffer");
                    return Err(GsError::NoEntry);
                }
            };
            if slot.state != BufferState::Acquired {
                warn!(
                    queue_id = self.unique_id,
                    sequence,
                    state = slot.state.as_str(),
                    "release in wrong state"
                );
                return Err(GsError::NoEntry);
            }

            slot.state = BufferState::Free;
            slot.fence = fence;
            if slot.is_deleting {
                inner.delete_slot(sequence);
                debug!(queue_id = self.unique_id, sequence, "released buffer deleted");
            } else {
                inner.free_list.push_back(sequence);
                debug!(
                    queue_id = self.unique_id,
                    sequence,
                    release_fence = fence.fd(),
                    "released buffer"
                );
            }
        }
        self.slot_returned.notify_all();

        let release_listener = self.release_listener.lock().clone();
        if let Some(listener) = release_listener {
            listener(buffer);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::config::BufferQueueOptions;
    use crate::listener::ConsumerListener;
    use crate::types::{BufferFlushConfig, BufferRequestConfig};

    struct Quiet;
    impl ConsumerListener for Quiet {
        fn on_buffer_available(&self) {}
    }

    #[test]
    fn release_fence_is_handed_back_on_next_request() {
        let queue = BufferQueue::new(BufferQueueOptions::default());
        queue.register_consumer_listener(Arc::new(Quiet)).unwrap();
        let config = BufferRequestConfig::new(4, 4);
        let seq = queue.request_buffer(&config).unwrap().buffer.sequence();
        queue
            .flush_buffer(seq, SyncFence::INVALID, &BufferFlushConfig::default())
            .unwrap();
        let acquired = queue.acquire_buffer().unwrap();
        queue.release_buffer(&acquired.buffer, SyncFence::new(21)).unwrap();

        let again = queue.request_buffer(&config).unwrap();
        assert_eq!(again.buffer.sequence(), seq);
        assert_eq!(again.fence, SyncFence::new(21));
    }

    #[test]
    fn double_release_and_release_before_acquire_fail() {
        let queue = BufferQueue::new(BufferQueueOptions::default());
        queue.register_consumer_listener(Arc::new(Quiet)).unwrap();
        let requested = queue.request_buffer(&BufferRequestConfig::new(4, 4)).unwrap();
        assert_eq!(
            queue.release_buffer(&requested.buffer, SyncFence::INVALID),
            Err(GsError::NoEntry)
        );

        queue
            .flush_buffer(
                requested.buffer.sequence(),
                SyncFence::INVALID,
                &BufferFlushConfig::default(),
            )
            .unwrap();
        let acquired = queue.acquire_buffer().unwrap();
        queue.release_buffer(&acquired.buffer, SyncFence::INVALID).unwrap();
        assert_eq!(
            queue.release_buffer(&acquired.buffer, SyncFence::INVALID),
            Err(GsError::NoEntry)
        );
    }

    #[test]
    fn release_listener_sees_released_buffer() {
        let queue = BufferQueue::new(BufferQueueOptions::default());
        queue.register_consumer_listener(Arc::new(Quiet)).unwrap();
        let seen = Arc::new(AtomicU32::new(u32::MAX));
        let sink = Arc::clone(&seen);
        queue
            .register_release_listener(Arc::new(move |buffer: &Arc<SurfaceBuffer>| {
                sink.store(buffer.sequence(), Ordering::SeqCst);
            }))
            .unwrap();

        let seq = queue
            .request_buffer(&BufferRequestConfig::new(4, 4))
            .unwrap()
            .buffer
            .sequence();
        queue
            .flush_buffer(seq, SyncFence::INVALID, &BufferFlushConfig::default())
            .unwrap();
        let acquired = queue.acquire_buffer().unwrap();
        queue.release_buffer(&acquired.buffer, SyncFence::INVALID).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), seq);
    }
}
