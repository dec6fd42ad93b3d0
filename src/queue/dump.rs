//! ### English
//! Human-readable snapshot of a queue for diagnostics.
//!
//! ### 中文
//! 用于诊断的队列可读快照。

use std::fmt::Write;

use super::BufferQueue;

impl BufferQueue {
    /// ### English
    /// Formats the queue header followed by one line per cached slot.
    ///
    /// ### 中文
    /// 输出队列概要，随后每个缓存槽位一行。
    pub fn dump(&self) -> String {
        let inner = self.inner.lock();
        let total_bytes: usize = inner.slots.values().map(|slot| slot.buffer.byte_len()).sum();

        let mut out = String::new();
        let _ = writeln!(
            out,
            "BufferQueue: default-size = [{}x{}], FIFO = {}, name = {}, uniqueId = {}, \
             usedBufferListLen = {}, freeBufferListLen = {}, dirtyBufferListLen = {}, \
             producerConnected = {}, producerCacheClean = {}, totalBuffersMemSize = {:.2}(KiB)",
            inner.default_size.width,
            inner.default_size.height,
            inner.queue_size,
            self.name,
            self.unique_id,
            inner.used_size(),
            inner.free_list.len(),
            inner.dirty_list.len(),
            inner.producer_connected,
            inner.producer_cache_clean,
            total_bytes as f64 / 1024.0,
        );

        for (sequence, slot) in &inner.slots {
            let damage = slot.damage;
            let _ = writeln!(
                out,
                "  sequence = {}, state = {}, timestamp = {}, damageRect = [{}, {}, {}, {}], \
                 config = [{}x{}, {}, {:?}, {:?}, {}], deleting = {}, bufferMemSize = {:.2}(KiB)",
                sequence,
                slot.state.as_str(),
                slot.timestamp,
                damage.x,
                damage.y,
                damage.w,
                damage.h,
                slot.config.width,
                slot.config.height,
                slot.config.stride_alignment,
                slot.config.format,
                slot.config.usage,
                slot.config.timeout,
                slot.is_deleting,
                slot.buffer.byte_len() as f64 / 1024.0,
            );
        }
        out
    }
}
