//! ### English
//! Queue capacity and producer defaults.
//!
//! Shrinking deletes surplus FREE slots first, then FLUSHED ones, and finally marks in-use slots
//! so they are dropped when they come back.
//!
//! ### 中文
//! 队列容量与生产者默认值。
//!
//! 缩容时先删除多余的 FREE 槽位，再删除 FLUSHED 槽位，最后标记仍在使用的槽位，
//! 使其归还时被删除。

use dpi::PhysicalSize;
use tracing::{debug, warn};

use crate::error::{GsError, Result};
use crate::flags::BufferUsage;
use crate::types::SURFACE_MAX_QUEUE_SIZE;

use super::{BufferQueue, QueueInner};

impl QueueInner {
    fn delete_buffers(&mut self, mut count: u32) {
        while count > 0 {
            let Some(sequence) = self.free_list.pop_front() else {
                break;
            };
            self.delete_slot(sequence);
            count -= 1;
        }
        while count > 0 {
            let Some(sequence) = self.dirty_list.pop_front() else {
                break;
            };
            self.delete_slot(sequence);
            count -= 1;
        }
        for slot in self.slots.values_mut().filter(|slot| !slot.is_deleting) {
            if count == 0 {
                break;
            }
            slot.is_deleting = true;
            count -= 1;
        }
    }
}

impl BufferQueue {
    /// ### English
    /// Sets the maximum number of cached buffers; `size` must be in `1..=SURFACE_MAX_QUEUE_SIZE`.
    /// A rejected value leaves the queue unchanged.
    ///
    /// ### 中文
    /// 设置可缓存缓冲区的最大数量；`size` 必须位于 `1..=SURFACE_MAX_QUEUE_SIZE`。
    /// 被拒绝的值不会改变队列。
    pub fn set_queue_size(&self, size: u32) -> Result<()> {
        if size == 0 || size > SURFACE_MAX_QUEUE_SIZE {
            warn!(queue_id = self.unique_id, size, "queue size out of range");
            return Err(GsError::InvalidArguments);
        }

        let grew = {
            let mut inner = self.inner.lock();
            let old = inner.queue_size;
            if size < old {
                inner.delete_buffers(old - size);
            }
            inner.queue_size = size;
            size > old
        };
        if grew {
            self.slot_returned.notify_all();
        }
        debug!(queue_id = self.unique_id, size, "queue size set");
        Ok(())
    }

    pub fn queue_size(&self) -> u32 {
        self.inner.lock().queue_size
    }

    /// ### English
    /// Default buffer size suggested to producers; both sides must be positive.
    ///
    /// ### 中文
    /// 建议生产者使用的默认缓冲区尺寸；宽高都必须为正数。
    pub fn set_default_width_and_height(&self, width: i32, height: i32) -> Result<()> {
        if width <= 0 || height <= 0 {
            warn!(queue_id = self.unique_id, width, height, "default size must be positive");
            return Err(GsError::InvalidArguments);
        }
        self.inner.lock().default_size = PhysicalSize::new(width, height);
        Ok(())
    }

    pub fn default_size(&self) -> PhysicalSize<i32> {
        self.inner.lock().default_size
    }

    /// ### English
    /// Default usage suggested to producers.
    ///
    /// ### 中文
    /// 建议生产者使用的默认 usage。
    pub fn set_default_usage(&self, usage: BufferUsage) -> Result<()> {
        self.inner.lock().default_usage = usage;
        Ok(())
    }

    pub fn default_usage(&self) -> BufferUsage {
        self.inner.lock().default_usage
    }
}
