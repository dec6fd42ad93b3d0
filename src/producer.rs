//! ### English
//! Producer handle of a buffer queue.
//!
//! `BufferQueueProducer` is the only way a producer reaches the queue: it is obtained from a
//! consumer surface and wrapped by `ProducerSurface`. The connection state lives in the queue, so
//! every handle of one queue sees the same connection: a successful request connects, and
//! `disconnect`, `clean_cache` and `go_background` are rejected while nothing is connected.
//!
//! ### 中文
//! buffer queue 的生产者句柄。
//!
//! 生产者只能通过 `BufferQueueProducer` 访问队列：它从 consumer surface 获取，并由
//! `ProducerSurface` 包装。连接状态保存在队列中，同一队列的所有句柄看到的是同一个连接：成功的
//! request 建立连接，未连接时 `disconnect`、`clean_cache` 与 `go_background` 会被拒绝。

use std::sync::Arc;

use tracing::warn;

use crate::error::{GsError, Result};
use crate::fence::SyncFence;
use crate::flags::BufferUsage;
use crate::listener::ReleaseListener;
use crate::queue::{BufferQueue, RequestedBuffer};
use crate::types::{
    BufferFlushConfig, BufferRequestConfig, BufferVerifyAllocInfo, ExtDataHandle, HdrMetaData,
    HdrMetadataKey, PresentTimestampType, ScalingMode, TransformType,
};

/// ### English
/// Producer-side view of a `BufferQueue`.
///
/// ### 中文
/// `BufferQueue` 的生产者侧视图。
pub struct BufferQueueProducer {
    queue: Arc<BufferQueue>,
}

impl BufferQueueProducer {
    pub(crate) fn new(queue: Arc<BufferQueue>) -> Self {
        Self { queue }
    }

    /// ### English
    /// Requests a writable buffer; a success (re)connects the producer.
    ///
    /// ### 中文
    /// 请求一个可写缓冲区；成功时（重新）连接生产者。
    pub fn request_buffer(&self, config: &BufferRequestConfig) -> Result<RequestedBuffer> {
        self.queue.request_buffer(config)
    }

    /// ### English
    /// Queues a requested buffer for the consumer.
    ///
    /// #### Parameters
    /// - `sequence`: Sequence of a REQUESTED buffer.
    /// - `fence`: Signaled once the producer's writes finished.
    /// - `config`: Damage rectangle and content timestamp.
    ///
    /// ### 中文
    /// 将已 request 的缓冲区排队交给 consumer。
    ///
    /// #### 参数
    /// - `sequence`：处于 REQUESTED 状态的缓冲区序号。
    /// - `fence`：生产者写入完成时 signal。
    /// - `config`：脏区矩形与内容时间戳。
    pub fn flush_buffer(
        &self,
        sequence: u32,
        fence: SyncFence,
        config: &BufferFlushConfig,
    ) -> Result<()> {
        self.queue.flush_buffer(sequence, fence, config)
    }

    /// ### English
    /// Returns a requested buffer to the free list without showing it to the consumer.
    ///
    /// ### 中文
    /// 将已 request 的缓冲区放回空闲列表，不交给 consumer。
    pub fn cancel_buffer(&self, sequence: u32) -> Result<()> {
        self.queue.cancel_buffer(sequence)
    }

    /// ### English
    /// Sets the queue capacity (see `BufferQueue::set_queue_size`).
    ///
    /// ### 中文
    /// 设置队列容量（见 `BufferQueue::set_queue_size`）。
    pub fn set_queue_size(&self, size: u32) -> Result<()> {
        self.queue.set_queue_size(size)
    }

    pub fn queue_size(&self) -> u32 {
        self.queue.queue_size()
    }

    /// ### English
    /// Name of the queue, as given by the consumer.
    ///
    /// ### 中文
    /// 队列名称，由 consumer 指定。
    pub fn name(&self) -> &str {
        self.queue.name()
    }

    pub fn unique_id(&self) -> u64 {
        self.queue.unique_id()
    }

    /// ### English
    /// Default buffer width suggested by the consumer.
    ///
    /// ### 中文
    /// consumer 建议的默认缓冲区宽度。
    pub fn default_width(&self) -> i32 {
        self.queue.default_size().width
    }

    pub fn default_height(&self) -> i32 {
        self.queue.default_size().height
    }

    pub fn default_usage(&self) -> BufferUsage {
        self.queue.default_usage()
    }

    /// ### English
    /// Stores the transform the consumer should apply to every following frame.
    ///
    /// ### 中文
    /// 保存 consumer 应对后续每一帧应用的 transform。
    pub fn set_transform(&self, transform: TransformType) -> Result<()> {
        self.queue.set_transform(transform)
    }

    /// ### English
    /// Asks the allocator whether each described buffer could be allocated, in input order.
    ///
    /// ### 中文
    /// 按输入顺序询问分配器每个描述的缓冲区能否被分配。
    pub fn is_supported_alloc(&self, infos: &[BufferVerifyAllocInfo]) -> Result<Vec<bool>> {
        if infos.is_empty() {
            warn!(queue_id = self.unique_id(), "empty alloc info list");
            return Err(GsError::InvalidArguments);
        }
        let allocator = self.queue.allocator();
        Ok(infos.iter().map(|info| allocator.is_supported(info)).collect())
    }

    /// ### English
    /// Per-buffer attributes; they become visible to the consumer when the buffer is flushed.
    ///
    /// ### 中文
    /// 按缓冲区设置的属性；缓冲区 flush 后才对 consumer 可见。
    pub fn set_scaling_mode(&self, sequence: u32, mode: ScalingMode) -> Result<()> {
        self.queue.set_scaling_mode(sequence, mode)
    }

    pub fn set_metadata(&self, sequence: u32, metadata: &[HdrMetaData]) -> Result<()> {
        self.queue.set_metadata(sequence, metadata)
    }

    pub fn set_metadata_set(&self, sequence: u32, key: HdrMetadataKey, data: &[u8]) -> Result<()> {
        self.queue.set_metadata_set(sequence, key, data)
    }

    pub fn set_tunnel_handle(&self, handle: Option<ExtDataHandle>) -> Result<()> {
        self.queue.set_tunnel_handle(handle)
    }

    /// ### English
    /// Reads the present timestamp the consumer recorded; `Unsupported` is `InvalidArguments`.
    ///
    /// ### 中文
    /// 读取 consumer 记录的呈现时间戳；`Unsupported` 返回 `InvalidArguments`。
    pub fn present_timestamp(&self, sequence: u32, kind: PresentTimestampType) -> Result<i64> {
        if kind == PresentTimestampType::Unsupported {
            return Err(GsError::InvalidArguments);
        }
        self.queue.present_timestamp(sequence, kind)
    }

    /// ### English
    /// Drops every cached buffer and marks the producer disconnected.
    /// `InvalidOperating` when no request happened since the last disconnect.
    ///
    /// ### 中文
    /// 丢弃所有缓存的缓冲区并将生产者标记为已断开。
    /// 自上次断开以来没有 request 时返回 `InvalidOperating`。
    pub fn disconnect(&self) -> Result<()> {
        self.queue.disconnect_producer()
    }

    pub fn is_connected(&self) -> bool {
        self.queue.is_producer_connected()
    }

    /// ### English
    /// Drops every cached buffer on both sides. Requires a connected producer.
    ///
    /// ### 中文
    /// 丢弃双方缓存的所有缓冲区。需要生产者已连接。
    pub fn clean_cache(&self) -> Result<()> {
        self.queue.check_producer_connected()?;
        self.queue.clean_cache()
    }

    /// ### English
    /// Tells the queue the producer dropped its own cache. The consumer keeps its buffers.
    /// Requires a connected producer.
    ///
    /// ### 中文
    /// 告知队列生产者丢弃了自己的缓存。consumer 保留其缓冲区。需要生产者已连接。
    pub fn go_background(&self) -> Result<()> {
        self.queue.producer_go_background()
    }

    pub fn register_release_listener(&self, listener: ReleaseListener) -> Result<()> {
        self.queue.register_release_listener(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BufferQueueOptions;
    use crate::listener::ChannelConsumerListener;
    use crate::types::PixelFormat;

    fn producer() -> BufferQueueProducer {
        let queue = BufferQueue::new(BufferQueueOptions::default());
        let (listener, _rx) = ChannelConsumerListener::new();
        queue.register_consumer_listener(listener).unwrap();
        BufferQueueProducer::new(queue)
    }

    #[test]
    fn disconnect_twice_is_rejected_until_reconnected() {
        let producer = producer();
        assert!(!producer.is_connected());
        assert_eq!(producer.disconnect(), Err(GsError::InvalidOperating));
        let seq = producer
            .request_buffer(&BufferRequestConfig::new(8, 8))
            .unwrap()
            .buffer
            .sequence();

        producer.disconnect().unwrap();
        assert!(!producer.is_connected());
        assert_eq!(producer.disconnect(), Err(GsError::InvalidOperating));
        assert_eq!(
            producer.flush_buffer(seq, SyncFence::INVALID, &BufferFlushConfig::default()),
            Err(GsError::NoEntry)
        );

        producer.request_buffer(&BufferRequestConfig::new(8, 8)).unwrap();
        assert!(producer.is_connected());
        assert_eq!(producer.disconnect(), Ok(()));
    }

    #[test]
    fn handles_of_one_queue_share_the_connection() {
        let first = producer();
        let second = BufferQueueProducer::new(Arc::clone(&first.queue));
        assert_eq!(second.clean_cache(), Err(GsError::InvalidOperating));
        assert_eq!(second.go_background(), Err(GsError::InvalidOperating));

        first.request_buffer(&BufferRequestConfig::new(8, 8)).unwrap();
        assert!(second.is_connected());
        second.go_background().unwrap();
        second.clean_cache().unwrap();
        second.disconnect().unwrap();
        assert!(!first.is_connected());
        assert_eq!(first.disconnect(), Err(GsError::InvalidOperating));
    }

    #[test]
    fn alloc_support_is_reported_per_info() {
        let producer = producer();
        assert_eq!(producer.is_supported_alloc(&[]), Err(GsError::InvalidArguments));

        let rgba = BufferVerifyAllocInfo {
            width: 64,
            height: 64,
            usage: BufferUsage::CPU_READ,
            format: PixelFormat::Rgba8888,
        };
        let rgb565 = BufferVerifyAllocInfo {
            format: PixelFormat::Rgb565,
            ..rgba
        };
        assert_eq!(producer.is_supported_alloc(&[rgba, rgb565]), Ok(vec![true, false]));
    }

    #[test]
    fn unsupported_present_timestamp_kind_is_invalid() {
        let producer = producer();
        assert_eq!(
            producer.present_timestamp(0, PresentTimestampType::Unsupported),
            Err(GsError::InvalidArguments)
        );
    }
}
