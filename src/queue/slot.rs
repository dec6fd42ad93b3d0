//! ### English
//! Per-buffer bookkeeping held in the queue's slot table.
//!
//! ### 中文
//! 队列槽位表中每个缓冲区的记录。

use std::sync::Arc;

use crate::buffer::SurfaceBuffer;
use crate::error::{GsError, Result};
use crate::fence::SyncFence;
use crate::types::{
    BufferRequestConfig, HdrMetaData, HdrMetaDataType, HdrMetadataKey, PresentTimestamp, Rect,
    ScalingMode,
};

/// ### English
/// Lifecycle state of a slot.
///
/// `Free -> Requested -> Flushed -> Acquired -> Free`, plus `Requested -> Free` on cancel.
///
/// ### 中文
/// 槽位的生命周期状态。
///
/// `Free -> Requested -> Flushed -> Acquired -> Free`，以及 cancel 时的 `Requested -> Free`。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BufferState {
    /// ### English
    /// Cached and reusable by the next request.
    ///
    /// ### 中文
    /// 已缓存，可被下一次 request 复用。
    Free,
    /// ### English
    /// Owned by the producer for writing.
    ///
    /// ### 中文
    /// 由生产者持有并写入。
    Requested,
    /// ### English
    /// Queued for the consumer (dirty).
    ///
    /// ### 中文
    /// 已排队等待 consumer（dirty）。
    Flushed,
    /// ### English
    /// Owned by the consumer for reading.
    ///
    /// ### 中文
    /// 由 consumer 持有并读取。
    Acquired,
}

impl BufferState {
    pub fn as_str(self) -> &'static str {
        match self {
            BufferState::Free => "Free",
            BufferState::Requested => "Requested",
            BufferState::Flushed => "Flushed",
            BufferState::Acquired => "Acquired",
        }
    }
}

/// ### English
/// Attribute written on one side and readable on the other only after the next flush.
///
/// ### 中文
/// 在一侧写入、只有在下一次 flush 之后才能在另一侧读取的属性。
#[derive(Clone, Debug, Default)]
pub(super) struct Published<T> {
    written: T,
    visible: Option<T>,
}

impl<T: Clone> Published<T> {
    #[inline]
    pub(super) fn write(&mut self, value: T) {
        self.written = value;
    }

    /// ### English
    /// Consumer-side read; `NotSupport` until the value has crossed a flush.
    ///
    /// ### 中文
    /// consumer 侧读取；值在经过一次 flush 之前返回 `NotSupport`。
    pub(super) fn read(&self) -> Result<T> {
        self.visible.clone().ok_or(GsError::NotSupport)
    }

    #[inline]
    pub(super) fn publish(&mut self) {
        self.visible = Some(self.written.clone());
    }
}

/// ### English
/// Per-sequence attributes (scaling, HDR metadata, present timestamp).
///
/// ### 中文
/// 按序号保存的属性（缩放、HDR 元数据、呈现时间戳）。
#[derive(Clone, Debug, Default)]
pub(super) struct SlotAttributes {
    pub scaling_mode: Published<ScalingMode>,
    pub metadata: Published<Vec<HdrMetaData>>,
    pub metadata_set: Published<(HdrMetadataKey, Vec<u8>)>,
    pub metadata_type: Published<HdrMetaDataType>,
    /// ### English
    /// Written by the consumer, read by the producer without a flush round-trip.
    ///
    /// ### 中文
    /// 由 consumer 写入，生产者无需 flush 往返即可读取。
    pub present_timestamp: PresentTimestamp,
}

impl SlotAttributes {
    pub(super) fn publish(&mut self) {
        self.scaling_mode.publish();
        self.metadata.publish();
        self.metadata_set.publish();
        self.metadata_type.publish();
    }
}

pub(super) struct BufferSlot {
    pub buffer: Arc<SurfaceBuffer>,
    pub state: BufferState,
    /// ### English
    /// Marked by a queue shrink; dropped instead of returning to the free list.
    ///
    /// ### 中文
    /// 因队列缩容而被标记；归还时直接删除而不是放回空闲列表。
    pub is_deleting: bool,
    pub config: BufferRequestConfig,
    /// ### English
    /// Flush fence while FLUSHED/ACQUIRED, release fence while FREE.
    ///
    /// ### 中文
    /// FLUSHED/ACQUIRED 期间为 flush fence，FREE 期间为 release fence。
    pub fence: SyncFence,
    pub timestamp: i64,
    pub damage: Rect,
    pub attributes: SlotAttributes,
}

impl BufferSlot {
    /// ### English
    /// New slot, handed straight to the producer.
    ///
    /// ### 中文
    /// 新槽位，直接交给生产者。
    pub(super) fn requested(buffer: Arc<SurfaceBuffer>, config: BufferRequestConfig) -> Self {
        Self {
            buffer,
            state: BufferState::Requested,
            is_deleting: false,
            config,
            fence: SyncFence::INVALID,
            timestamp: 0,
            damage: Rect::default(),
            attributes: SlotAttributes::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_are_hidden_until_published() {
        let mut attrs = SlotAttributes::default();
        attrs.scaling_mode.write(ScalingMode::ScaleCrop);
        assert_eq!(attrs.scaling_mode.read(), Err(GsError::NotSupport));

        attrs.publish();
        assert_eq!(attrs.scaling_mode.read(), Ok(ScalingMode::ScaleCrop));
        assert_eq!(attrs.metadata_type.read(), Ok(HdrMetaDataType::NotUsed));

        attrs.scaling_mode.write(ScalingMode::Freeze);
        assert_eq!(attrs.scaling_mode.read(), Ok(ScalingMode::ScaleCrop));
    }
}
