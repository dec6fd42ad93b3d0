//! ### English
//! Consumer-side surface; owner of the buffer queue.
//!
//! ### 中文
//! consumer 侧 surface；buffer queue 的所有者。

use std::sync::Arc;

use tracing::debug;

use crate::allocator::BufferAllocator;
use crate::buffer::SurfaceBuffer;
use crate::config::BufferQueueOptions;
use crate::consumer::BufferQueueConsumer;
use crate::error::{GsError, Result};
use crate::fence::SyncFence;
use crate::flags::BufferUsage;
use crate::listener::{ConsumerListener, ReleaseListener};
use crate::producer::BufferQueueProducer;
use crate::queue::{AcquiredBuffer, BufferQueue};
use crate::types::{
    BufferVerifyAllocInfo, ExtDataHandle, HdrMetaData, HdrMetaDataType, HdrMetadataKey,
    PresentTimestamp, PresentTimestampType, ScalingMode, TransformType,
};

use super::Surface;
use super::user_data::UserData;

/// ### English
/// Surface used by the compositor side. Creating one creates the queue; dropping it marks the
/// consumer dead so producers get `NoConsumer` from then on.
///
/// ### 中文
/// 合成侧使用的 surface。创建时创建队列；销毁时把 consumer 标记为已死亡，之后生产者会得到
/// `NoConsumer`。
pub struct ConsumerSurface {
    consumer: BufferQueueConsumer,
    user_data: UserData,
}

impl ConsumerSurface {
    pub fn create(name: impl Into<String>) -> Self {
        Self::with_options(BufferQueueOptions::named(name))
    }

    pub fn with_options(options: BufferQueueOptions) -> Self {
        Self::from_queue(BufferQueue::new(options))
    }

    /// ### English
    /// Creates a consumer surface whose queue allocates through `allocator`.
    ///
    /// #### Parameters
    /// - `options`: Queue name, size and defaults.
    /// - `allocator`: Buffer allocator / `is_supported_alloc` oracle.
    ///
    /// ### 中文
    /// 创建一个通过 `allocator` 分配缓冲区的 consumer surface。
    ///
    /// #### 参数
    /// - `options`：队列名称、大小与默认值。
    /// - `allocator`：缓冲区分配器 / `is_supported_alloc` 查询器。
    pub fn with_allocator(options: BufferQueueOptions, allocator: Arc<dyn BufferAllocator>) -> Self {
        Self::from_queue(BufferQueue::with_allocator(options, allocator))
    }

    fn from_queue(queue: Arc<BufferQueue>) -> Self {
        debug!(queue_id = queue.unique_id(), "consumer surface created");
        Self {
            consumer: BufferQueueConsumer::new(queue),
            user_data: UserData::default(),
        }
    }

    /// ### English
    /// New producer handle for this queue; wrap it with `ProducerSurface::create`.
    /// Every handle shares the queue's producer connection.
    ///
    /// ### 中文
    /// 该队列的新生产者句柄；用 `ProducerSurface::create` 包装。
    /// 所有句柄共享队列的生产者连接。
    pub fn producer(&self) -> BufferQueueProducer {
        BufferQueueProducer::new(Arc::clone(self.consumer.queue()))
    }

    pub fn consumer(&self) -> &BufferQueueConsumer {
        &self.consumer
    }

    pub fn set_status(&self, alive: bool) {
        self.consumer.set_status(alive);
    }

    pub fn status(&self) -> bool {
        self.consumer.status()
    }
}

impl Surface for ConsumerSurface {
    fn is_consumer(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        self.consumer.name()
    }

    fn unique_id(&self) -> u64 {
        self.consumer.unique_id()
    }

    fn queue_size(&self) -> u32 {
        self.consumer.queue_size()
    }

    fn set_queue_size(&self, size: u32) -> Result<()> {
        self.consumer.set_queue_size(size)
    }

    fn set_user_data(&self, key: &str, value: &str) -> Result<()> {
        self.user_data.set(key, value)
    }

    fn user_data(&self, key: &str) -> String {
        self.user_data.get(key)
    }

    fn register_consumer_listener(&self, listener: Arc<dyn ConsumerListener>) -> Result<()> {
        self.consumer.register_consumer_listener(listener)
    }

    fn unregister_consumer_listener(&self) -> Result<()> {
        self.consumer.unregister_consumer_listener()
    }

    fn register_release_listener(&self, listener: ReleaseListener) -> Result<()> {
        self.consumer.queue().register_release_listener(listener)
    }

    fn acquire_buffer(&self) -> Result<AcquiredBuffer> {
        self.consumer.acquire_buffer()
    }

    fn release_buffer(&self, buffer: &Arc<SurfaceBuffer>, fence: SyncFence) -> Result<()> {
        self.consumer.release_buffer(buffer, fence)
    }

    fn set_transform(&self, transform: TransformType) -> Result<()> {
        self.consumer.queue().set_transform(transform)
    }

    fn transform(&self) -> TransformType {
        self.consumer.transform()
    }

    fn set_default_width_and_height(&self, width: i32, height: i32) -> Result<()> {
        self.consumer.set_default_width_and_height(width, height)
    }

    fn default_width(&self) -> i32 {
        self.consumer.default_size().width
    }

    fn default_height(&self) -> i32 {
        self.consumer.default_size().height
    }

    fn set_default_usage(&self, usage: BufferUsage) -> Result<()> {
        self.consumer.set_default_usage(usage)
    }

    fn default_usage(&self) -> BufferUsage {
        self.consumer.default_usage()
    }

    fn set_scaling_mode(&self, sequence: u32, mode: ScalingMode) -> Result<()> {
        self.consumer.queue().set_scaling_mode(sequence, mode)
    }

    fn scaling_mode(&self, sequence: u32) -> Result<ScalingMode> {
        self.consumer.scaling_mode(sequence)
    }

    fn set_metadata(&self, sequence: u32, metadata: &[HdrMetaData]) -> Result<()> {
        self.consumer.queue().set_metadata(sequence, metadata)
    }

    fn metadata(&self, sequence: u32) -> Result<Vec<HdrMetaData>> {
        self.consumer.metadata(sequence)
    }

    fn set_metadata_set(&self, sequence: u32, key: HdrMetadataKey, data: &[u8]) -> Result<()> {
        self.consumer.queue().set_metadata_set(sequence, key, data)
    }

    fn metadata_set(&self, sequence: u32) -> Result<(HdrMetadataKey, Vec<u8>)> {
        self.consumer.metadata_set(sequence)
    }

    fn query_metadata_type(&self, sequence: u32) -> Result<HdrMetaDataType> {
        self.consumer.query_metadata_type(sequence)
    }

    /// ### English
    /// Same set-once rule as the producer, plus a handle without reserve ints is rejected.
    ///
    /// ### 中文
    /// 与生产者相同的只设置一次规则；另外拒绝没有 reserve 整数的句柄。
    fn set_tunnel_handle(&self, handle: Option<ExtDataHandle>) -> Result<()> {
        match handle {
            Some(handle) if !handle.reserve.is_empty() => {
                self.consumer.queue().set_tunnel_handle(Some(handle))
            }
            _ => Err(GsError::InvalidArguments),
        }
    }

    fn tunnel_handle(&self) -> Option<ExtDataHandle> {
        self.consumer.tunnel_handle()
    }

    fn set_present_timestamp(&self, sequence: u32, timestamp: PresentTimestamp) -> Result<()> {
        self.consumer.set_present_timestamp(sequence, timestamp)
    }

    fn present_timestamp(&self, _sequence: u32, _kind: PresentTimestampType) -> Result<i64> {
        Err(GsError::NotSupport)
    }

    fn is_supported_alloc(&self, _infos: &[BufferVerifyAllocInfo]) -> Result<Vec<bool>> {
        Err(GsError::NotSupport)
    }

    fn clean_cache(&self) -> Result<()> {
        Err(GsError::NotSupport)
    }

    fn go_background(&self) -> Result<()> {
        self.consumer.queue().go_background()
    }

    fn disconnect(&self) -> Result<()> {
        Err(GsError::NotSupport)
    }

    fn dump(&self) -> String {
        self.consumer.dump()
    }
}

impl Drop for ConsumerSurface {
    fn drop(&mut self) {
        self.consumer.on_consumer_died();
    }
}
