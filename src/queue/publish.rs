//! ### English
//! Producer-side hand-off: `flush_buffer` (REQUESTED -> FLUSHED) and `cancel_buffer`
//! (REQUESTED -> FREE).
//!
//! ### 中文
//! 生产者侧交接：`flush_buffer`（REQUESTED -> FLUSHED）与 `cancel_buffer`（REQUESTED -> FREE）。

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::error::{GsError, Result};
use crate::fence::SyncFence;
use crate::types::BufferFlushConfig;

use super::slot::BufferState;
use super::{BufferQueue, QueueInner};

fn now_micros() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_micros() as i64)
        .unwrap_or_default()
}

impl QueueInner {
    /// ### English
    /// REQUESTED -> FREE. Slots marked for deletion are dropped instead.
    ///
    /// ### 中文
    /// REQUESTED -> FREE。被标记删除的槽位会被直接删除。
    fn cancel_locked(&mut self, sequence: u32) -> Result<()> {
        let slot = self.slot_mut(sequence)?;
        if slot.state != BufferState::Requested {
            return Err(GsError::InvalidOperating);
        }
        slot.state = BufferState::Free;
        if slot.is_deleting {
            self.delete_slot(sequence);
        } else {
            self.free_list.push_back(sequence);
        }
        Ok(())
    }
}

impl BufferQueue {
    /// ### English
    /// Queues a REQUESTED buffer for the consumer and notifies the consumer listener once.
    ///
    /// #### Parameters
    /// - `sequence`: Sequence of the buffer returned by `request_buffer`.
    /// - `fence`: Signaled when the producer finished writing; handed to the consumer.
    /// - `config`: Damage region and content timestamp (`0` = now).
    ///
    /// ### 中文
    /// 将 REQUESTED 缓冲区排队给 consumer，并通知 consumer 监听器一次。
    ///
    /// #### 参数
    /// - `sequence`：`request_buffer` 返回的缓冲区序号。
    /// - `fence`：生产者写入完成时 signal；转交给 consumer。
    /// - `config`：damage 区域与内容时间戳（`0` = 当前时间）。
    pub fn flush_buffer(
        &self,
        sequence: u32,
        fence: SyncFence,
        config: &BufferFlushConfig,
    ) -> Result<()> {
        if config.damage.w < 0 || config.damage.h < 0 {
            warn!(
                queue_id = self.unique_id,
                sequence,
                w = config.damage.w,
                h = config.damage.h,
                "negative damage size"
            );
            return Err(GsError::InvalidArguments);
        }

        let listener = self.consumer_listener();
        {
            let mut inner = self.inner.lock();
            if !inner.consumer_alive {
                return Err(GsError::NoConsumer);
            }

            let state = match inner.slot(sequence) {
                Ok(slot) => slot.state,
                Err(err) => {
                    warn!(queue_id = self.unique_id, sequence, "flush of unknown buffer");
                    return Err(err);
                }
            };
            if state != BufferState::Requested {
                warn!(queue_id = self.unique_id, sequence, state = state.as_str(), "flush in wrong state");
                return Err(GsError::NoEntry);
            }

            if listener.is_none() {
                inner.cancel_locked(sequence)?;
                drop(inner);
                self.slot_returned.notify_all();
                warn!(queue_id = self.unique_id, sequence, "flush without consumer, cancelled");
                return Err(GsError::NoConsumer);
            }

            let slot = inner.slot_mut(sequence)?;
            if slot.is_deleting {
                inner.delete_slot(sequence);
                drop(inner);
                self.slot_returned.notify_all();
                debug!(queue_id = self.unique_id, sequence, "flushed buffer was pending deletion");
                return Ok(());
            }

            slot.state = BufferState::Flushed;
            slot.fence = fence;
            slot.damage = config.damage;
            slot.timestamp = if config.timestamp == 0 {
                now_micros()
            } else {
                config.timestamp
            };
            slot.attributes.publish();
            inner.dirty_list.push_back(sequence);
            debug!(
                queue_id = self.unique_id,
                sequence,
                acquire_fence = fence.fd(),
                dirty = inner.dirty_list.len(),
                "flushed buffer"
            );
        }

        if let Some(listener) = listener {
            listener.on_buffer_available();
        }
        Ok(())
    }

    /// ### English
    /// Returns a REQUESTED buffer to the free list without notifying the consumer.
    /// Fails with `NoEntry` for an unknown sequence and `InvalidOperating` if the buffer is not
    /// REQUESTED (e.g. cancelled twice).
    ///
    /// ### 中文
    /// 将 REQUESTED 缓冲区放回空闲列表，不通知 consumer。
    /// 未知序号返回 `NoEntry`；缓冲区不处于 REQUESTED（例如重复 cancel）时返回 `InvalidOperating`。
    pub fn cancel_buffer(&self, sequence: u32) -> Result<()> {
        let result = self.inner.lock().cancel_locked(sequence);
        match result {
            Ok(()) => {
                self.slot_returned.notify_all();
                debug!(queue_id = self.unique_id, sequence, "cancelled buffer");
            }
            Err(err) => {
                warn!(queue_id = self.unique_id, sequence, %err, "cancel rejected");
            }
        }
        result
    }
}
