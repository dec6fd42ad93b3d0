//! ### English
//! The buffer queue: a bounded slot table shared by one producer and one consumer.
//!
//! Every slot-table mutation runs under a single `parking_lot::Mutex`. Listener callbacks are
//! looked up under a separate lock and invoked only after the slot lock has been dropped.
//! `request_buffer` may park on a condition variable for at most `config.timeout` milliseconds;
//! every path that returns a slot (cancel, release, growth, cache clears) notifies it.
//!
//! ### 中文
//! buffer queue：由一个生产者与一个消费者共享的有界槽位表。
//!
//! 所有槽位表修改都在同一个 `parking_lot::Mutex` 下进行。监听器在独立的锁下查找，且只在释放
//! 槽位锁之后调用。`request_buffer` 最多在条件变量上等待 `config.timeout` 毫秒；所有归还槽位的
//! 路径（cancel、release、扩容、清空缓存）都会唤醒它。

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use dpi::PhysicalSize;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::allocator::{BufferAllocator, HeapAllocator};
use crate::config::BufferQueueOptions;
use crate::error::{GsError, Result};
use crate::flags::BufferUsage;
use crate::listener::{ConsumerListener, ReleaseListener};
use crate::types::{ExtDataHandle, SURFACE_MAX_QUEUE_SIZE, TransformType};

mod acquire;
mod attributes;
mod dump;
mod lifecycle;
mod publish;
mod release;
mod request;
mod size;
mod slot;

pub use acquire::AcquiredBuffer;
pub use request::RequestedBuffer;
pub use slot::BufferState;

use slot::BufferSlot;

/// ### English
/// Slot table and queue-wide settings, guarded by `BufferQueue::inner`.
///
/// ### 中文
/// 槽位表与队列级设置，由 `BufferQueue::inner` 保护。
struct QueueInner {
    slots: BTreeMap<u32, BufferSlot>,
    /// ### English
    /// FREE sequences, oldest first.
    ///
    /// ### 中文
    /// FREE 状态的序号，最旧的在前。
    free_list: VecDeque<u32>,
    /// ### English
    /// FLUSHED sequences in flush order (acquire pops the front).
    ///
    /// ### 中文
    /// 按 flush 顺序排列的 FLUSHED 序号（acquire 从队首取出）。
    dirty_list: VecDeque<u32>,
    /// ### English
    /// Sequences deleted since the last successful request.
    ///
    /// ### 中文
    /// 自上次成功 request 以来被删除的序号。
    deleting_list: Vec<u32>,
    queue_size: u32,
    next_sequence: u32,
    default_size: PhysicalSize<i32>,
    default_usage: BufferUsage,
    transform: TransformType,
    tunnel_handle: Option<ExtDataHandle>,
    /// ### English
    /// Cleared when the consumer surface goes away; producers then see `NoConsumer`.
    ///
    /// ### 中文
    /// consumer surface 销毁时清除；此后生产者会得到 `NoConsumer`。
    consumer_alive: bool,
    /// ### English
    /// Set by the first successful request, cleared by a producer disconnect. Shared by every
    /// producer handle of the queue.
    ///
    /// ### 中文
    /// 首次成功 request 时置位，生产者断开时清除。由队列的所有生产者句柄共享。
    producer_connected: bool,
    /// ### English
    /// Set when the producer went background; cleared once every cached sequence has been
    /// handed to the producer again.
    ///
    /// ### 中文
    /// 生产者进入后台时置位；所有缓存序号都重新交给生产者之后清除。
    producer_cache_clean: bool,
    producer_cache_list: Vec<u32>,
}

impl QueueInner {
    /// ### English
    /// Number of cached slots in any state (the value bounded by `queue_size`).
    ///
    /// ### 中文
    /// 任意状态下缓存的槽位数量（受 `queue_size` 约束的值）。
    #[inline]
    fn used_size(&self) -> u32 {
        self.slots.len() as u32
    }

    fn next_sequence(&mut self) -> u32 {
        loop {
            let sequence = self.next_sequence;
            self.next_sequence = self.next_sequence.wrapping_add(1);
            if !self.slots.contains_key(&sequence) {
                return sequence;
            }
        }
    }

    fn slot(&self, sequence: u32) -> Result<&BufferSlot> {
        self.slots.get(&sequence).ok_or(GsError::NoEntry)
    }

    fn slot_mut(&mut self, sequence: u32) -> Result<&mut BufferSlot> {
        self.slots.get_mut(&sequence).ok_or(GsError::NoEntry)
    }

    /// ### English
    /// Drops a slot and records its sequence for the producer.
    /// The caller is responsible for removing it from the free/dirty lists.
    ///
    /// ### 中文
    /// 删除一个槽位，并为生产者记录其序号。
    /// 调用者负责把它从 free/dirty 列表中移除。
    fn delete_slot(&mut self, sequence: u32) {
        if self.slots.remove(&sequence).is_some() {
            self.deleting_list.push(sequence);
        }
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.free_list.clear();
        self.dirty_list.clear();
        self.deleting_list.clear();
        self.set_producer_cache_clean(false);
    }

    fn set_producer_cache_clean(&mut self, clean: bool) {
        self.producer_cache_clean = clean;
        self.producer_cache_list.clear();
    }

    /// ### English
    /// Records a sequence handed to the producer while its cache is being rebuilt.
    ///
    /// ### 中文
    /// 在生产者重建缓存期间记录交给它的序号。
    fn note_handed_to_producer(&mut self, sequence: u32) {
        if !self.producer_cache_clean {
            return;
        }
        self.producer_cache_list.push(sequence);
        let list = &self.producer_cache_list;
        if self.slots.keys().all(|seq| list.contains(seq)) {
            self.set_producer_cache_clean(false);
        }
    }
}

/// ### English
/// Bounded producer/consumer buffer queue.
///
/// Created by `ConsumerSurface`; shared by `Arc` with every producer handle derived from it.
///
/// ### 中文
/// 有界的生产者/消费者缓冲队列。
///
/// 由 `ConsumerSurface` 创建；通过 `Arc` 与所有从它派生的生产者句柄共享。
pub struct BufferQueue {
    name: String,
    unique_id: u64,
    allocator: Arc<dyn BufferAllocator>,
    inner: Mutex<QueueInner>,
    /// ### English
    /// Signaled whenever a slot may have become available to `request_buffer`.
    ///
    /// ### 中文
    /// 每当 `request_buffer` 可能获得槽位时发出信号。
    slot_returned: Condvar,
    listener: Mutex<Option<Arc<dyn ConsumerListener>>>,
    release_listener: Mutex<Option<ReleaseListener>>,
}

/// ### English
/// Process id in the upper 32 bits, low 32 bits of the queue allocation below.
///
/// ### 中文
/// 高 32 位为进程 id，低 32 位为队列分配地址的低 32 位。
fn queue_unique_id(addr: usize) -> u64 {
    (u64::from(std::process::id()) << 32) | (addr as u64 & 0xFFFF_FFFF)
}

impl BufferQueue {
    /// ### English
    /// Creates a queue backed by the heap allocator.
    ///
    /// ### 中文
    /// 创建使用堆分配器的队列。
    pub fn new(options: BufferQueueOptions) -> Arc<Self> {
        Self::with_allocator(options, Arc::new(HeapAllocator))
    }

    /// ### English
    /// Creates a queue that allocates buffers through `allocator`.
    ///
    /// #### Parameters
    /// - `options`: Name, initial size and defaults. Out-of-range values are clamped.
    /// - `allocator`: Buffer allocator / capability oracle.
    ///
    /// ### 中文
    /// 创建通过 `allocator` 分配缓冲区的队列。
    ///
    /// #### 参数
    /// - `options`：名称、初始大小及默认值。越界值会被截断。
    /// - `allocator`：缓冲区分配器 / 能力查询器。
    pub fn with_allocator(
        options: BufferQueueOptions,
        allocator: Arc<dyn BufferAllocator>,
    ) -> Arc<Self> {
        let BufferQueueOptions {
            name,
            queue_size,
            default_width,
            default_height,
            default_usage,
        } = options;

        let queue = Arc::new_cyclic(|weak| BufferQueue {
            name,
            unique_id: queue_unique_id(weak.as_ptr() as usize),
            allocator,
            inner: Mutex::new(QueueInner {
                slots: BTreeMap::new(),
                free_list: VecDeque::new(),
                dirty_list: VecDeque::new(),
                deleting_list: Vec::new(),
                queue_size: queue_size.clamp(1, SURFACE_MAX_QUEUE_SIZE),
                next_sequence: 0,
                default_size: PhysicalSize::new(default_width.max(0), default_height.max(0)),
                default_usage,
                transform: TransformType::Butt,
                tunnel_handle: None,
                consumer_alive: true,
                producer_connected: false,
                producer_cache_clean: false,
                producer_cache_list: Vec::new(),
            }),
            slot_returned: Condvar::new(),
            listener: Mutex::new(None),
            release_listener: Mutex::new(None),
        });
        info!(queue_id = queue.unique_id, name = %queue.name, "buffer queue created");
        queue
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// ### English
    /// Stable non-zero identifier of this queue.
    ///
    /// ### 中文
    /// 该队列稳定且非零的标识。
    #[inline]
    pub fn unique_id(&self) -> u64 {
        self.unique_id
    }

    pub(crate) fn allocator(&self) -> &dyn BufferAllocator {
        self.allocator.as_ref()
    }

    #[inline]
    fn consumer_listener(&self) -> Option<Arc<dyn ConsumerListener>> {
        self.listener.lock().clone()
    }

    /// ### English
    /// Registers the single consumer listener. A second registration fails with `NoEntry`
    /// and keeps the first listener.
    ///
    /// ### 中文
    /// 注册唯一的 consumer 监听器。重复注册返回 `NoEntry`，并保留第一个监听器。
    pub fn register_consumer_listener(&self, listener: Arc<dyn ConsumerListener>) -> Result<()> {
        let mut current = self.listener.lock();
        if current.is_some() {
            warn!(queue_id = self.unique_id, "consumer listener already registered");
            return Err(GsError::NoEntry);
        }
        *current = Some(listener);
        debug!(queue_id = self.unique_id, "consumer listener registered");
        Ok(())
    }

    pub fn unregister_consumer_listener(&self) -> Result<()> {
        self.listener.lock().take();
        debug!(queue_id = self.unique_id, "consumer listener unregistered");
        Ok(())
    }

    /// ### English
    /// Registers the producer-side release callback, replacing any previous one.
    ///
    /// ### 中文
    /// 注册生产者侧的 release 回调，替换之前的回调。
    pub fn register_release_listener(&self, listener: ReleaseListener) -> Result<()> {
        *self.release_listener.lock() = Some(listener);
        Ok(())
    }
}

impl Drop for BufferQueue {
    fn drop(&mut self) {
        info!(queue_id = self.unique_id, name = %self.name, "buffer queue destroyed");
    }
}
