//! ### English
//! Consumer handle of a buffer queue.
//!
//! ### 中文
//! buffer queue 的 consumer 句柄。

use std::sync::Arc;

use dpi::PhysicalSize;

use crate::buffer::SurfaceBuffer;
use crate::error::Result;
use crate::fence::SyncFence;
use crate::flags::BufferUsage;
use crate::listener::ConsumerListener;
use crate::queue::{AcquiredBuffer, BufferQueue};
use crate::types::{
    ExtDataHandle, HdrMetaData, HdrMetaDataType, HdrMetadataKey, PresentTimestamp, ScalingMode,
    TransformType,
};

/// ### English
/// Consumer-side view of a queue: acquire/release, listener registration and attribute reads.
///
/// ### 中文
/// 队列的 consumer 侧视图：acquire/release、监听器注册以及属性读取。
pub struct BufferQueueConsumer {
    queue: Arc<BufferQueue>,
}

impl BufferQueueConsumer {
    pub(crate) fn new(queue: Arc<BufferQueue>) -> Self {
        Self { queue }
    }

    pub(crate) fn queue(&self) -> &Arc<BufferQueue> {
        &self.queue
    }

    /// ### English
    /// Takes the oldest flushed buffer; `NoBuffer` when nothing is queued.
    ///
    /// ### 中文
    /// 取出最早 flush 的缓冲区；没有排队的缓冲区时返回 `NoBuffer`。
    pub fn acquire_buffer(&self) -> Result<AcquiredBuffer> {
        self.queue.acquire_buffer()
    }

    /// ### English
    /// Hands an acquired buffer back to the producer together with the consumer's release fence.
    ///
    /// ### 中文
    /// 将已 acquire 的缓冲区连同 consumer 的 release fence 一起归还给生产者。
    pub fn release_buffer(&self, buffer: &Arc<SurfaceBuffer>, fence: SyncFence) -> Result<()> {
        self.queue.release_buffer(buffer, fence)
    }

    /// ### English
    /// Registers the single availability listener; a second registration is `NoEntry`.
    ///
    /// ### 中文
    /// 注册唯一的可用通知监听器；重复注册返回 `NoEntry`。
    pub fn register_consumer_listener(&self, listener: Arc<dyn ConsumerListener>) -> Result<()> {
        self.queue.register_consumer_listener(listener)
    }

    pub fn unregister_consumer_listener(&self) -> Result<()> {
        self.queue.unregister_consumer_listener()
    }

    /// ### English
    /// Name given when the consumer surface was created.
    ///
    /// ### 中文
    /// 创建 consumer surface 时指定的名称。
    pub fn name(&self) -> &str {
        self.queue.name()
    }

    pub fn unique_id(&self) -> u64 {
        self.queue.unique_id()
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
    /// Default size suggested to producers; both sides must be positive.
    ///
    /// ### 中文
    /// 建议生产者使用的默认尺寸；宽高都必须为正数。
    pub fn set_default_width_and_height(&self, width: i32, height: i32) -> Result<()> {
        self.queue.set_default_width_and_height(width, height)
    }

    pub fn default_size(&self) -> PhysicalSize<i32> {
        self.queue.default_size()
    }

    pub fn set_default_usage(&self, usage: BufferUsage) -> Result<()> {
        self.queue.set_default_usage(usage)
    }

    pub fn default_usage(&self) -> BufferUsage {
        self.queue.default_usage()
    }

    /// ### English
    /// Transform the producer last stored.
    ///
    /// ### 中文
    /// 生产者最近保存的 transform。
    pub fn transform(&self) -> TransformType {
        self.queue.transform()
    }

    /// ### English
    /// Attribute reads see what the producer set before the buffer's last flush.
    ///
    /// ### 中文
    /// 属性读取只能看到缓冲区最近一次 flush 之前生产者设置的值。
    pub fn scaling_mode(&self, sequence: u32) -> Result<ScalingMode> {
        self.queue.scaling_mode(sequence)
    }

    pub fn metadata(&self, sequence: u32) -> Result<Vec<HdrMetaData>> {
        self.queue.metadata(sequence)
    }

    pub fn metadata_set(&self, sequence: u32) -> Result<(HdrMetadataKey, Vec<u8>)> {
        self.queue.metadata_set(sequence)
    }

    pub fn query_metadata_type(&self, sequence: u32) -> Result<HdrMetaDataType> {
        self.queue.query_metadata_type(sequence)
    }

    /// ### English
    /// Records when a buffer was presented, for the producer to read back.
    ///
    /// ### 中文
    /// 记录缓冲区的呈现时间，供生产者读回。
    pub fn set_present_timestamp(&self, sequence: u32, timestamp: PresentTimestamp) -> Result<()> {
        self.queue.set_present_timestamp(sequence, timestamp)
    }

    pub fn tunnel_handle(&self) -> Option<ExtDataHandle> {
        self.queue.tunnel_handle()
    }

    /// ### English
    /// Marks the consumer alive or gone; producers see `NoConsumer` while gone.
    ///
    /// ### 中文
    /// 标记 consumer 存活或已离开；离开期间生产者得到 `NoConsumer`。
    pub fn set_status(&self, alive: bool) {
        self.queue.set_status(alive);
    }

    pub fn status(&self) -> bool {
        self.queue.status()
    }

    /// ### English
    /// Text snapshot of the queue and its slots.
    ///
    /// ### 中文
    /// 队列及其槽位的文本快照。
    pub fn dump(&self) -> String {
        self.queue.dump()
    }

    /// ### English
    /// Tears the queue's cache down after the owning consumer went away.
    ///
    /// ### 中文
    /// 所属 consumer 离开后拆除队列缓存。
    pub(crate) fn on_consumer_died(&self) {
        self.queue.on_consumer_died();
    }
}
