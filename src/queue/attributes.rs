//! ### English
//! Per-sequence attributes (scaling mode, HDR metadata, present timestamp) and queue-wide
//! attributes (transform, tunnel handle).
//!
//! Producer writes become readable by the consumer only after the buffer is flushed; until then
//! consumer reads report `NotSupport`. Unknown sequences report `NoEntry`.
//!
//! ### 中文
//! 按序号保存的属性（缩放模式、HDR 元数据、呈现时间戳）以及队列级属性（transform、tunnel 句柄）。
//!
//! 生产者写入的属性只有在缓冲区 flush 之后才对 consumer 可见；在此之前 consumer 读取返回
//! `NotSupport`。未知序号返回 `NoEntry`。

use tracing::{debug, warn};

use crate::error::{GsError, Result};
use crate::types::{
    ExtDataHandle, HdrMetaData, HdrMetaDataType, HdrMetadataKey, PresentTimestamp,
    PresentTimestampType, ScalingMode, TransformType,
};

use super::BufferQueue;

impl BufferQueue {
    /// ### English
    /// Stores the transform the consumer applies to following frames.
    ///
    /// ### 中文
    /// 保存 consumer 对后续帧应用的 transform。
    pub fn set_transform(&self, transform: TransformType) -> Result<()> {
        self.inner.lock().transform = transform;
        Ok(())
    }

    /// ### English
    /// Stored transform (`TransformType::Butt` until set).
    ///
    /// ### 中文
    /// 已保存的 transform（设置前为 `TransformType::Butt`）。
    pub fn transform(&self) -> TransformType {
        self.inner.lock().transform
    }

    /// ### English
    /// Sets the scaling mode of one buffer; `NoEntry` for an unknown sequence.
    ///
    /// ### 中文
    /// 设置单个缓冲区的缩放模式；未知序号返回 `NoEntry`。
    pub fn set_scaling_mode(&self, sequence: u32, mode: ScalingMode) -> Result<()> {
        let mut inner = self.inner.lock();
        let Ok(slot) = inner.slot_mut(sequence) else {
            warn!(queue_id = self.unique_id, sequence, "scaling mode for unknown buffer");
            return Err(GsError::NoEntry);
        };
        slot.attributes.scaling_mode.write(mode);
        Ok(())
    }

    /// ### English
    /// Scaling mode published by the last flush; `NotSupport` before the first flush.
    ///
    /// ### 中文
    /// 最近一次 flush 发布的缩放模式；首次 flush 之前返回 `NotSupport`。
    pub fn scaling_mode(&self, sequence: u32) -> Result<ScalingMode> {
        self.inner.lock().slot(sequence)?.attributes.scaling_mode.read()
    }

    /// ### English
    /// Attaches static HDR metadata; an empty slice is `InvalidArguments`.
    ///
    /// ### 中文
    /// 附加静态 HDR 元数据；空切片返回 `InvalidArguments`。
    pub fn set_metadata(&self, sequence: u32, metadata: &[HdrMetaData]) -> Result<()> {
        if metadata.is_empty() {
            warn!(queue_id = self.unique_id, sequence, "empty hdr metadata");
            return Err(GsError::InvalidArguments);
        }
        let mut inner = self.inner.lock();
        let slot = inner.slot_mut(sequence)?;
        slot.attributes.metadata.write(metadata.to_vec());
        slot.attributes.metadata_type.write(HdrMetaDataType::MetaData);
        debug!(queue_id = self.unique_id, sequence, entries = metadata.len(), "hdr metadata set");
        Ok(())
    }

    /// ### English
    /// Static HDR metadata published by the last flush.
    ///
    /// ### 中文
    /// 最近一次 flush 发布的静态 HDR 元数据。
    pub fn metadata(&self, sequence: u32) -> Result<Vec<HdrMetaData>> {
        self.inner.lock().slot(sequence)?.attributes.metadata.read()
    }

    /// ### English
    /// Attaches one keyed HDR metadata blob; an empty blob is `InvalidArguments`.
    ///
    /// ### 中文
    /// 附加一段带 key 的 HDR 元数据；空数据返回 `InvalidArguments`。
    pub fn set_metadata_set(
        &self,
        sequence: u32,
        key: HdrMetadataKey,
        metadata: &[u8],
    ) -> Result<()> {
        if metadata.is_empty() {
            warn!(queue_id = self.unique_id, sequence, "empty hdr metadata set");
            return Err(GsError::InvalidArguments);
        }
        let mut inner = self.inner.lock();
        let slot = inner.slot_mut(sequence)?;
        slot.attributes.metadata_set.write((key, metadata.to_vec()));
        slot.attributes
            .metadata_type
            .write(HdrMetaDataType::MetaDataSet);
        Ok(())
    }

    pub fn metadata_set(&self, sequence: u32) -> Result<(HdrMetadataKey, Vec<u8>)> {
        self.inner.lock().slot(sequence)?.attributes.metadata_set.read()
    }

    /// ### English
    /// Which kind of HDR metadata the last flush published.
    ///
    /// ### 中文
    /// 最近一次 flush 发布的 HDR 元数据类型。
    pub fn query_metadata_type(&self, sequence: u32) -> Result<HdrMetaDataType> {
        self.inner.lock().slot(sequence)?.attributes.metadata_type.read()
    }

    /// ### English
    /// Sets the queue's tunnel handle. Set-once: `None` while unset is `InvalidArguments`,
    /// any call after a handle has been set is `NoEntry`.
    ///
    /// ### 中文
    /// 设置队列的 tunnel 句柄。只能设置一次：未设置时传入 `None` 返回 `InvalidArguments`，
    /// 设置之后的任何调用都返回 `NoEntry`。
    pub fn set_tunnel_handle(&self, handle: Option<ExtDataHandle>) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            if inner.tunnel_handle.is_some() {
                warn!(queue_id = self.unique_id, "tunnel handle already set");
                return Err(GsError::NoEntry);
            }
            let Some(handle) = handle else {
                warn!(queue_id = self.unique_id, "tunnel handle is none");
                return Err(GsError::InvalidArguments);
            };
            debug!(queue_id = self.unique_id, fd = handle.fd, "tunnel handle set");
            inner.tunnel_handle = Some(handle);
        }
        if let Some(listener) = self.consumer_listener() {
            listener.on_tunnel_handle_change();
        }
        Ok(())
    }

    /// ### English
    /// The handle set by `set_tunnel_handle`, if any.
    ///
    /// ### 中文
    /// 由 `set_tunnel_handle` 设置的句柄（如有）。
    pub fn tunnel_handle(&self) -> Option<ExtDataHandle> {
        self.inner.lock().tunnel_handle.clone()
    }

    /// ### English
    /// Records when (or how late) a buffer was presented. Written by the consumer.
    ///
    /// ### 中文
    /// 记录缓冲区的呈现时间（或延迟）。由 consumer 写入。
    pub fn set_present_timestamp(&self, sequence: u32, timestamp: PresentTimestamp) -> Result<()> {
        if timestamp.kind == PresentTimestampType::Unsupported {
            return Err(GsError::InvalidArguments);
        }
        let mut inner = self.inner.lock();
        inner.slot_mut(sequence)?.attributes.present_timestamp = timestamp;
        Ok(())
    }

    /// ### English
    /// Reads the present timestamp of a buffer. `Delay` returns the stored delay; `Timestamp`
    /// returns the present time relative to the buffer's flush timestamp, and `InvalidArguments`
    /// when that difference does not fit in an `i64`. A kind other than the stored one is
    /// `NoEntry`.
    ///
    /// ### 中文
    /// 读取缓冲区的呈现时间戳。`Delay` 返回保存的延迟；`Timestamp` 返回相对 flush 时间戳的
    /// 呈现时间，差值超出 `i64` 范围时返回 `InvalidArguments`。与保存类型不一致时返回 `NoEntry`。
    pub fn present_timestamp(&self, sequence: u32, kind: PresentTimestampType) -> Result<i64> {
        let inner = self.inner.lock();
        let slot = inner.slot(sequence)?;
        let stored = slot.attributes.present_timestamp;
        if stored.kind != kind {
            debug!(
                queue_id = self.unique_id,
                sequence,
                requested = ?kind,
                stored = ?stored.kind,
                "present timestamp kind mismatch"
            );
            return Err(GsError::NoEntry);
        }
        match kind {
            PresentTimestampType::Delay => Ok(stored.time),
            PresentTimestampType::Timestamp => {
                stored.time.checked_sub(slot.timestamp).ok_or_else(|| {
                    warn!(
                        queue_id = self.unique_id,
                        sequence,
                        time = stored.time,
                        flushed = slot.timestamp,
                        "present timestamp out of range"
                    );
                    GsError::InvalidArguments
                })
            }
            PresentTimestampType::Unsupported => Err(GsError::TypeError),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::BufferQueueOptions;
    use crate::fence::SyncFence;
    use crate::listener::ConsumerListener;
    use crate::types::{BufferFlushConfig, BufferRequestConfig};

    struct Quiet;
    impl ConsumerListener for Quiet {
        fn on_buffer_available(&self) {}
    }

    fn queue_with_requested() -> (Arc<BufferQueue>, u32) {
        let queue = BufferQueue::new(BufferQueueOptions::default());
        queue.register_consumer_listener(Arc::new(Quiet)).unwrap();
        let seq = queue
            .request_buffer(&BufferRequestConfig::new(4, 4))
            .unwrap()
            .buffer
            .sequence();
        (queue, seq)
    }

    #[test]
    fn metadata_becomes_visible_after_flush() {
        let (queue, seq) = queue_with_requested();
        let entries = [HdrMetaData {
            key: HdrMetadataKey::MaxLuminance,
            value: 1000.0,
        }];
        assert_eq!(queue.set_metadata(seq, &[]), Err(GsError::InvalidArguments));
        queue.set_metadata(seq, &entries).unwrap();
        assert_eq!(queue.metadata(seq), Err(GsError::NotSupport));
        assert_eq!(queue.query_metadata_type(seq), Err(GsError::NotSupport));

        queue
            .flush_buffer(seq, SyncFence::INVALID, &BufferFlushConfig::default())
            .unwrap();
        assert_eq!(queue.metadata(seq), Ok(entries.to_vec()));
        assert_eq!(queue.query_metadata_type(seq), Ok(HdrMetaDataType::MetaData));
    }

    #[test]
    fn metadata_set_replaces_metadata_type() {
        let (queue, seq) = queue_with_requested();
        queue
            .set_metadata(
                seq,
                &[HdrMetaData {
                    key: HdrMetadataKey::MinLuminance,
                    value: 0.5,
                }],
            )
            .unwrap();
        queue
            .set_metadata_set(seq, HdrMetadataKey::Hdr10Plus, &[1, 2, 3])
            .unwrap();
        queue
            .flush_buffer(seq, SyncFence::INVALID, &BufferFlushConfig::default())
            .unwrap();
        assert_eq!(queue.query_metadata_type(seq), Ok(HdrMetaDataType::MetaDataSet));
        assert_eq!(
            queue.metadata_set(seq),
            Ok((HdrMetadataKey::Hdr10Plus, vec![1, 2, 3]))
        );
    }

    #[test]
    fn unknown_sequence_is_no_entry() {
        let (queue, _) = queue_with_requested();
        assert_eq!(
            queue.set_scaling_mode(u32::MAX, ScalingMode::ScaleCrop),
            Err(GsError::NoEntry)
        );
        assert_eq!(queue.scaling_mode(u32::MAX), Err(GsError::NoEntry));
        assert_eq!(
            queue.present_timestamp(u32::MAX, PresentTimestampType::Delay),
            Err(GsError::NoEntry)
        );
    }

    #[test]
    fn present_timestamp_is_relative_to_flush() {
        let (queue, seq) = queue_with_requested();
        queue
            .flush_buffer(
                seq,
                SyncFence::INVALID,
                &BufferFlushConfig {
                    timestamp: 1_000,
                    ..BufferFlushConfig::default()
                },
            )
            .unwrap();
        queue
            .set_present_timestamp(
                seq,
                PresentTimestamp {
                    kind: PresentTimestampType::Timestamp,
                    time: 1_750,
                },
            )
            .unwrap();
        assert_eq!(
            queue.present_timestamp(seq, PresentTimestampType::Timestamp),
            Ok(750)
        );
        assert_eq!(
            queue.present_timestamp(seq, PresentTimestampType::Delay),
            Err(GsError::NoEntry)
        );
    }

    #[test]
    fn present_timestamp_overflow_is_an_error() {
        let (queue, seq) = queue_with_requested();
        queue
            .flush_buffer(
                seq,
                SyncFence::INVALID,
                &BufferFlushConfig {
                    timestamp: 1_000,
                    ..BufferFlushConfig::default()
                },
            )
            .unwrap();
        queue
            .set_present_timestamp(
                seq,
                PresentTimestamp {
                    kind: PresentTimestampType::Timestamp,
                    time: i64::MIN,
                },
            )
            .unwrap();
        assert_eq!(
            queue.present_timestamp(seq, PresentTimestampType::Timestamp),
            Err(GsError::InvalidArguments)
        );
    }

    #[test]
    fn tunnel_handle_is_set_once() {
        let queue = BufferQueue::new(BufferQueueOptions::default());
        assert_eq!(queue.set_tunnel_handle(None), Err(GsError::InvalidArguments));
        let handle = ExtDataHandle {
            fd: 5,
            reserve: vec![1],
        };
        queue.set_tunnel_handle(Some(handle.clone())).unwrap();
        assert_eq!(queue.set_tunnel_handle(Some(handle.clone())), Err(GsError::NoEntry));
        assert_eq!(queue.set_tunnel_handle(None), Err(GsError::NoEntry));
        assert_eq!(queue.tunnel_handle(), Some(handle));
    }
}
