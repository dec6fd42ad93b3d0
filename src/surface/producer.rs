//! ### English
//! Producer-side surface.
//!
//! ### 中文
//! 生产者侧 surface。

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::buffer::SurfaceBuffer;
use crate::error::{GsError, Result};
use crate::fence::SyncFence;
use crate::flags::BufferUsage;
use crate::listener::{ConsumerListener, ReleaseListener};
use crate::producer::BufferQueueProducer;
use crate::queue::{AcquiredBuffer, RequestedBuffer};
use crate::types::{
    BufferFlushConfig, BufferRequestConfig, BufferVerifyAllocInfo, ExtDataHandle, HdrMetaData,
    HdrMetaDataType, HdrMetadataKey, PresentTimestamp, PresentTimestampType, ScalingMode,
    TransformType,
};

use super::Surface;
use super::user_data::UserData;

/// ### English
/// Surface used by whoever renders into the queue.
///
/// Keeps the buffers it has been handed, keyed by sequence, and forgets the ones the queue
/// reports as deleted. Dropping a surface that requested buffers since its last disconnect
/// disconnects the producer; an idle surface leaves the queue alone.
///
/// ### 中文
/// 供向队列渲染的一方使用的 surface。
///
/// 按序号缓存已拿到的缓冲区，并移除队列报告为已删除的缓冲区。若 surface 自上次断开以来
/// request 过缓冲区，销毁时会断开生产者；空闲的 surface 不会影响队列。
pub struct ProducerSurface {
    producer: BufferQueueProducer,
    cache: Mutex<HashMap<u32, Arc<SurfaceBuffer>>>,
    /// ### English
    /// Set by a successful request through this surface, cleared by its disconnect.
    ///
    /// ### 中文
    /// 通过该 surface 成功 request 时置位，断开时清除。
    connected: AtomicBool,
    user_data: UserData,
}

impl ProducerSurface {
    /// ### English
    /// Wraps the producer handle of a consumer surface.
    ///
    /// ### 中文
    /// 包装 consumer surface 的生产者句柄。
    pub fn create(producer: BufferQueueProducer) -> Self {
        debug!(queue_id = producer.unique_id(), "producer surface created");
        Self {
            producer,
            cache: Mutex::new(HashMap::new()),
            connected: AtomicBool::new(false),
            user_data: UserData::default(),
        }
    }

    pub fn producer(&self) -> &BufferQueueProducer {
        &self.producer
    }

    /// ### English
    /// Requests a writable buffer (see `BufferQueue::request_buffer`).
    ///
    /// ### 中文
    /// 请求一个可写缓冲区（见 `BufferQueue::request_buffer`）。
    pub fn request_buffer(&self, config: &BufferRequestConfig) -> Result<RequestedBuffer> {
        let requested = match self.producer.request_buffer(config) {
            Ok(requested) => requested,
            Err(GsError::NoConsumer) => {
                self.cache.lock().clear();
                return Err(GsError::NoConsumer);
            }
            Err(err) => return Err(err),
        };

        self.connected.store(true, Ordering::Release);
        let mut cache = self.cache.lock();
        for sequence in &requested.deleting {
            cache.remove(sequence);
        }
        cache.insert(requested.buffer.sequence(), Arc::clone(&requested.buffer));
        Ok(requested)
    }

    /// ### English
    /// Flushes a buffer this surface requested (see `BufferQueueProducer::flush_buffer`).
    ///
    /// ### 中文
    /// flush 该 surface request 的缓冲区（见 `BufferQueueProducer::flush_buffer`）。
    pub fn flush_buffer(
        &self,
        buffer: &SurfaceBuffer,
        fence: SyncFence,
        config: &BufferFlushConfig,
    ) -> Result<()> {
        self.producer.flush_buffer(buffer.sequence(), fence, config)
    }

    pub fn cancel_buffer(&self, buffer: &SurfaceBuffer) -> Result<()> {
        self.producer.cancel_buffer(buffer.sequence())
    }

    /// ### English
    /// Number of buffers the producer currently knows about.
    ///
    /// ### 中文
    /// 生产者当前已知的缓冲区数量。
    pub fn cached_buffer_count(&self) -> usize {
        self.cache.lock().len()
    }
}

impl Surface for ProducerSurface {
    fn is_consumer(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        self.producer.name()
    }

    fn unique_id(&self) -> u64 {
        self.producer.unique_id()
    }

    fn queue_size(&self) -> u32 {
        self.producer.queue_size()
    }

    fn set_queue_size(&self, size: u32) -> Result<()> {
        self.producer.set_queue_size(size)
    }

    fn set_user_data(&self, key: &str, value: &str) -> Result<()> {
        self.user_data.set(key, value)
    }

    fn user_data(&self, key: &str) -> String {
        self.user_data.get(key)
    }

    fn register_consumer_listener(&self, _listener: Arc<dyn ConsumerListener>) -> Result<()> {
        Err(GsError::NotSupport)
    }

    fn unregister_consumer_listener(&self) -> Result<()> {
        Err(GsError::NotSupport)
    }

    fn register_release_listener(&self, listener: ReleaseListener) -> Result<()> {
        self.producer.register_release_listener(listener)
    }

    fn acquire_buffer(&self) -> Result<AcquiredBuffer> {
        Err(GsError::NotSupport)
    }

    fn release_buffer(&self, _buffer: &Arc<SurfaceBuffer>, _fence: SyncFence) -> Result<()> {
        Err(GsError::NotSupport)
    }

    fn set_transform(&self, transform: TransformType) -> Result<()> {
        self.producer.set_transform(transform)
    }

    /// ### English
    /// Always `TransformType::Butt`; only the consumer reads the stored transform back.
    ///
    /// ### 中文
    /// 总是返回 `TransformType::Butt`；只有 consumer 能读回保存的 transform。
    fn transform(&self) -> TransformType {
        TransformType::Butt
    }

    fn set_default_width_and_height(&self, _width: i32, _height: i32) -> Result<()> {
        Err(GsError::NotSupport)
    }

    fn default_width(&self) -> i32 {
        self.producer.default_width()
    }

    fn default_height(&self) -> i32 {
        self.producer.default_height()
    }

    fn set_default_usage(&self, _usage: BufferUsage) -> Result<()> {
        Err(GsError::NotSupport)
    }

    fn default_usage(&self) -> BufferUsage {
        self.producer.default_usage()
    }

    fn set_scaling_mode(&self, sequence: u32, mode: ScalingMode) -> Result<()> {
        self.producer.set_scaling_mode(sequence, mode)
    }

    fn scaling_mode(&self, _sequence: u32) -> Result<ScalingMode> {
        Err(GsError::NotSupport)
    }

    fn set_metadata(&self, sequence: u32, metadata: &[HdrMetaData]) -> Result<()> {
        self.producer.set_metadata(sequence, metadata)
    }

    fn metadata(&self, _sequence: u32) -> Result<Vec<HdrMetaData>> {
        Err(GsError::NotSupport)
    }

    fn set_metadata_set(&self, sequence: u32, key: HdrMetadataKey, data: &[u8]) -> Result<()> {
        self.producer.set_metadata_set(sequence, key, data)
    }

    fn metadata_set(&self, _sequence: u32) -> Result<(HdrMetadataKey, Vec<u8>)> {
        Err(GsError::NotSupport)
    }

    fn query_metadata_type(&self, _sequence: u32) -> Result<HdrMetaDataType> {
        Err(GsError::NotSupport)
    }

    fn set_tunnel_handle(&self, handle: Option<ExtDataHandle>) -> Result<()> {
        self.producer.set_tunnel_handle(handle)
    }

    fn tunnel_handle(&self) -> Option<ExtDataHandle> {
        None
    }

    fn set_present_timestamp(&self, _sequence: u32, _timestamp: PresentTimestamp) -> Result<()> {
        Err(GsError::NotSupport)
    }

    fn present_timestamp(&self, sequence: u32, kind: PresentTimestampType) -> Result<i64> {
        self.producer.present_timestamp(sequence, kind)
    }

    fn is_supported_alloc(&self, infos: &[BufferVerifyAllocInfo]) -> Result<Vec<bool>> {
        self.producer.is_supported_alloc(infos)
    }

    fn clean_cache(&self) -> Result<()> {
        self.cache.lock().clear();
        self.producer.clean_cache()
    }

    fn go_background(&self) -> Result<()> {
        self.cache.lock().clear();
        self.producer.go_background()
    }

    fn disconnect(&self) -> Result<()> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(GsError::InvalidOperating);
        }
        self.cache.lock().clear();
        self.producer.disconnect()?;
        self.connected.store(false, Ordering::Release);
        Ok(())
    }

    fn dump(&self) -> String {
        String::new()
    }
}

impl Drop for ProducerSurface {
    fn drop(&mut self) {
        if !self.connected.load(Ordering::Acquire) {
            return;
        }
        if let Err(err) = self.disconnect() {
            warn!(queue_id = self.producer.unique_id(), %err, "disconnect on drop failed");
        }
    }
}
