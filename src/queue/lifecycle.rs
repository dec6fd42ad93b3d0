//! ### English
//! Cache-wide transitions: producer connection, producer disconnect (go background), explicit
//! cache cleaning and consumer death.
//!
//! ### 中文
//! 作用于整个缓存的转换：生产者连接、生产者断开（进入后台）、显式清空缓存以及 consumer 销毁。

use tracing::{debug, info, warn};

use crate::error::{GsError, Result};

use super::BufferQueue;

impl BufferQueue {
    /// ### English
    /// Drops every cached buffer after telling the consumer the producer went away.
    ///
    /// ### 中文
    /// 通知 consumer 生产者已离开，然后丢弃所有缓存的缓冲区。
    pub fn go_background(&self) -> Result<()> {
        if let Some(listener) = self.consumer_listener() {
            listener.on_go_background();
        }
        self.inner.lock().clear();
        self.slot_returned.notify_all();
        debug!(queue_id = self.unique_id, "went background, cache cleared");
        Ok(())
    }

    /// ### English
    /// Drops every cached buffer on producer request.
    ///
    /// ### 中文
    /// 应生产者请求丢弃所有缓存的缓冲区。
    pub fn clean_cache(&self) -> Result<()> {
        if let Some(listener) = self.consumer_listener() {
            listener.on_clean_cache();
        }
        self.inner.lock().clear();
        self.slot_returned.notify_all();
        debug!(queue_id = self.unique_id, "cache cleaned");
        Ok(())
    }

    /// ### English
    /// Whether a producer has requested a buffer since the last disconnect.
    ///
    /// ### 中文
    /// 自上次断开以来是否有生产者 request 过缓冲区。
    pub fn is_producer_connected(&self) -> bool {
        self.inner.lock().producer_connected
    }

    pub(crate) fn check_producer_connected(&self) -> Result<()> {
        if self.inner.lock().producer_connected {
            Ok(())
        } else {
            debug!(queue_id = self.unique_id, "no producer connected");
            Err(GsError::InvalidOperating)
        }
    }

    /// ### English
    /// Disconnects the producer and drops every cached buffer. `InvalidOperating` when no
    /// producer is connected; the queue is then left untouched.
    ///
    /// ### 中文
    /// 断开生产者并丢弃所有缓存的缓冲区。没有已连接的生产者时返回 `InvalidOperating`，
    /// 且队列保持不变。
    pub(crate) fn disconnect_producer(&self) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            if !inner.producer_connected {
                warn!(queue_id = self.unique_id, "disconnect without connected producer");
                return Err(GsError::InvalidOperating);
            }
            inner.producer_connected = false;
        }
        debug!(queue_id = self.unique_id, "producer disconnected");
        self.go_background()
    }

    /// ### English
    /// The producer dropped its own buffer cache. Slots are kept; the queue only tracks which
    /// sequences the producer has been handed again.
    ///
    /// ### 中文
    /// 生产者丢弃了自己的缓冲区缓存。槽位保持不变；队列只记录哪些序号已重新交给生产者。
    pub(crate) fn producer_go_background(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.producer_connected {
            warn!(queue_id = self.unique_id, "go background without connected producer");
            return Err(GsError::InvalidOperating);
        }
        inner.set_producer_cache_clean(true);
        debug!(queue_id = self.unique_id, "producer cache marked clean");
        Ok(())
    }

    /// ### English
    /// Whether the producer is still rebuilding its cache after going background.
    ///
    /// ### 中文
    /// 生产者进入后台之后是否仍在重建缓存。
    pub fn is_producer_cache_clean(&self) -> bool {
        self.inner.lock().producer_cache_clean
    }

    /// ### English
    /// Marks the consumer as alive or gone. While gone, request and flush fail with `NoConsumer`.
    ///
    /// ### 中文
    /// 标记 consumer 存活或已离开。离开期间 request 与 flush 返回 `NoConsumer`。
    pub fn set_status(&self, alive: bool) {
        self.inner.lock().consumer_alive = alive;
        self.slot_returned.notify_all();
    }

    pub fn status(&self) -> bool {
        self.inner.lock().consumer_alive
    }

    pub(crate) fn on_consumer_died(&self) {
        {
            let mut inner = self.inner.lock();
            inner.clear();
            inner.consumer_alive = false;
        }
        self.slot_returned.notify_all();
        info!(queue_id = self.unique_id, "consumer died, cache cleared");
    }
}

#[cfg(test)]
mod tests {
    use crate::config::BufferQueueOptions;
    use crate::error::GsError;
    use crate::listener::{ChannelConsumerListener, ConsumerEvent};
    use crate::queue::BufferQueue;
    use crate::types::BufferRequestConfig;

    #[test]
    fn go_background_notifies_then_forgets_buffers() {
        let queue = BufferQueue::new(BufferQueueOptions::default());
        let (listener, rx) = ChannelConsumerListener::new();
        queue.register_consumer_listener(listener).unwrap();
        let seq = queue
            .request_buffer(&BufferRequestConfig::new(4, 4))
            .unwrap()
            .buffer
            .sequence();

        queue.go_background().unwrap();
        assert_eq!(rx.try_recv(), Ok(ConsumerEvent::GoBackground));
        assert_eq!(queue.cancel_buffer(seq), Err(GsError::NoEntry));
    }

    #[test]
    fn disconnect_requires_a_prior_request() {
        let queue = BufferQueue::new(BufferQueueOptions::default());
        let (listener, rx) = ChannelConsumerListener::new();
        queue.register_consumer_listener(listener).unwrap();
        assert!(!queue.is_producer_connected());
        assert_eq!(queue.disconnect_producer(), Err(GsError::InvalidOperating));
        assert_eq!(queue.producer_go_background(), Err(GsError::InvalidOperating));
        assert!(rx.try_recv().is_err());

        queue.request_buffer(&BufferRequestConfig::new(4, 4)).unwrap();
        assert!(queue.is_producer_connected());
        queue.disconnect_producer().unwrap();
        assert!(!queue.is_producer_connected());
        assert_eq!(rx.try_recv(), Ok(ConsumerEvent::GoBackground));
    }

    #[test]
    fn producer_background_keeps_slots_until_cache_is_rebuilt() {
        let queue = BufferQueue::new(BufferQueueOptions::default());
        let (listener, rx) = ChannelConsumerListener::new();
        queue.register_consumer_listener(listener).unwrap();
        let config = BufferRequestConfig::new(4, 4);
        let a = queue.request_buffer(&config).unwrap().buffer.sequence();
        let b = queue.request_buffer(&config).unwrap().buffer.sequence();
        queue.cancel_buffer(a).unwrap();
        queue.cancel_buffer(b).unwrap();

        queue.producer_go_background().unwrap();
        assert!(queue.is_producer_cache_clean());
        assert!(rx.try_recv().is_err());

        let first = queue.request_buffer(&config).unwrap().buffer.sequence();
        assert!(queue.is_producer_cache_clean());
        let second = queue.request_buffer(&config).unwrap().buffer.sequence();
        assert_eq!((first, second), (a, b));
        assert!(!queue.is_producer_cache_clean());
    }

    #[test]
    fn dead_consumer_rejects_requests() {
        let queue = BufferQueue::new(BufferQueueOptions::default());
        let (listener, _rx) = ChannelConsumerListener::new();
        queue.register_consumer_listener(listener).unwrap();
        queue.on_consumer_died();
        assert!(!queue.status());
        assert_eq!(
            queue.request_buffer(&BufferRequestConfig::new(4, 4)).unwrap_err(),
            GsError::NoConsumer
        );
        queue.set_status(true);
        assert!(queue.request_buffer(&BufferRequestConfig::new(4, 4)).is_ok());
    }
}
