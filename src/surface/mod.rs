//! ### English
//! Public surface facades.
//!
//! A `ConsumerSurface` owns a new buffer queue; a `ProducerSurface` is built from the producer
//! handle of a consumer surface. Both implement `Surface`, whose operations either delegate to the
//! queue or report `NotSupport` on the side where they make no sense.
//!
//! ### 中文
//! 对外的 surface 门面。
//!
//! `ConsumerSurface` 拥有一个新的 buffer queue；`ProducerSurface` 由 consumer surface 的生产者
//! 句柄构建。二者都实现 `Surface`：各操作要么转发到队列，要么在不适用的一侧返回 `NotSupport`。

mod consumer;
mod producer;
mod user_data;

use std::sync::Arc;

use crate::buffer::SurfaceBuffer;
use crate::error::Result;
use crate::fence::SyncFence;
use crate::flags::BufferUsage;
use crate::listener::{ConsumerListener, ReleaseListener};
use crate::queue::AcquiredBuffer;
use crate::types::{
    BufferVerifyAllocInfo, ExtDataHandle, HdrMetaData, HdrMetaDataType, HdrMetadataKey,
    PresentTimestamp, PresentTimestampType, ScalingMode, TransformType,
};

pub use consumer::ConsumerSurface;
pub use producer::ProducerSurface;

/// ### English
/// Operations shared by both sides of a buffer queue.
///
/// ### 中文
/// buffer queue 两侧共有的操作。
pub trait Surface: Send + Sync {
    fn is_consumer(&self) -> bool;

    fn name(&self) -> &str;

    /// ### English
    /// Non-zero id of the underlying queue, equal on both sides.
    ///
    /// ### 中文
    /// 底层队列的非零 id，两侧相同。
    fn unique_id(&self) -> u64;

    fn queue_size(&self) -> u32;

    fn set_queue_size(&self, size: u32) -> Result<()>;

    fn set_user_data(&self, key: &str, value: &str) -> Result<()>;

    /// ### English
    /// Value stored for `key`, or an empty string.
    ///
    /// ### 中文
    /// `key` 对应的值，不存在时为空字符串。
    fn user_data(&self, key: &str) -> String;

    fn register_consumer_listener(&self, listener: Arc<dyn ConsumerListener>) -> Result<()>;

    fn unregister_consumer_listener(&self) -> Result<()>;

    fn register_release_listener(&self, listener: ReleaseListener) -> Result<()>;

    fn acquire_buffer(&self) -> Result<AcquiredBuffer>;

    fn release_buffer(&self, buffer: &Arc<SurfaceBuffer>, fence: SyncFence) -> Result<()>;

    fn set_transform(&self, transform: TransformType) -> Result<()>;

    fn transform(&self) -> TransformType;

    fn set_default_width_and_height(&self, width: i32, height: i32) -> Result<()>;

    fn default_width(&self) -> i32;

    fn default_height(&self) -> i32;

    fn set_default_usage(&self, usage: BufferUsage) -> Result<()>;

    fn default_usage(&self) -> BufferUsage;

    fn set_scaling_mode(&self, sequence: u32, mode: ScalingMode) -> Result<()>;

    fn scaling_mode(&self, sequence: u32) -> Result<ScalingMode>;

    fn set_metadata(&self, sequence: u32, metadata: &[HdrMetaData]) -> Result<()>;

    fn metadata(&self, sequence: u32) -> Result<Vec<HdrMetaData>>;

    fn set_metadata_set(&self, sequence: u32, key: HdrMetadataKey, data: &[u8]) -> Result<()>;

    fn metadata_set(&self, sequence: u32) -> Result<(HdrMetadataKey, Vec<u8>)>;

    fn query_metadata_type(&self, sequence: u32) -> Result<HdrMetaDataType>;

    fn set_tunnel_handle(&self, handle: Option<ExtDataHandle>) -> Result<()>;

    fn tunnel_handle(&self) -> Option<ExtDataHandle>;

    fn set_present_timestamp(&self, sequence: u32, timestamp: PresentTimestamp) -> Result<()>;

    fn present_timestamp(&self, sequence: u32, kind: PresentTimestampType) -> Result<i64>;

    /// ### English
    /// One flag per `infos` entry; empty input is `InvalidArguments`.
    ///
    /// ### 中文
    /// 每个 `infos` 元素对应一个标志；空输入返回 `InvalidArguments`。
    fn is_supported_alloc(&self, infos: &[BufferVerifyAllocInfo]) -> Result<Vec<bool>>;

    fn clean_cache(&self) -> Result<()>;

    fn go_background(&self) -> Result<()>;

    fn disconnect(&self) -> Result<()>;

    fn dump(&self) -> String;
}
