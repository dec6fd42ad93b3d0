//! ### English
//! Consumer-side notifications.
//!
//! A queue holds at most one `ConsumerListener`. Callbacks run synchronously on the thread that
//! triggered them (e.g. the flushing producer thread), after the queue's slot lock has been
//! released, so a listener may call straight back into the queue (typically `acquire_buffer`).
//!
//! ### 中文
//! consumer 侧通知。
//!
//! 每个队列最多持有一个 `ConsumerListener`。回调在触发它的线程上同步执行（例如执行 flush 的
//! 生产者线程），且在队列槽位锁释放之后调用，因此监听器可以直接回调队列（通常是 `acquire_buffer`）。

use std::sync::Arc;

use crossbeam_channel as channel;

use crate::buffer::SurfaceBuffer;

/// ### English
/// Receives queue events on the consumer side.
///
/// ### 中文
/// 在 consumer 侧接收队列事件。
pub trait ConsumerListener: Send + Sync {
    /// ### English
    /// A flushed buffer is ready to be acquired. Called exactly once per successful flush.
    ///
    /// ### 中文
    /// 有已 flush 的缓冲区可供 acquire。每次成功 flush 恰好调用一次。
    fn on_buffer_available(&self);

    fn on_tunnel_handle_change(&self) {}

    /// ### English
    /// The producer disconnected; every cached buffer has been dropped.
    ///
    /// ### 中文
    /// 生产者已断开；所有缓存的缓冲区都已丢弃。
    fn on_go_background(&self) {}

    fn on_clean_cache(&self) {}
}

/// ### English
/// Producer-side callback invoked after the consumer released a buffer back to the free list.
///
/// ### 中文
/// consumer 将缓冲区释放回空闲列表后，在生产者侧调用的回调。
pub type ReleaseListener = Arc<dyn Fn(&Arc<SurfaceBuffer>) + Send + Sync>;

/// ### English
/// Event forwarded by `ChannelConsumerListener`.
///
/// ### 中文
/// `ChannelConsumerListener` 转发的事件。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsumerEvent {
    BufferAvailable,
    TunnelHandleChange,
    GoBackground,
    CleanCache,
}

/// ### English
/// Listener that forwards every event into a channel, for consumers running their own loop
/// (e.g. a compositor thread).
///
/// Sends never block; events are dropped silently once the receiver is gone.
///
/// ### 中文
/// 将所有事件转发到 channel 的监听器，适用于自带事件循环的 consumer（例如合成线程）。
///
/// 发送永不阻塞；接收端关闭后事件会被静默丢弃。
pub struct ChannelConsumerListener {
    tx: channel::Sender<ConsumerEvent>,
}

impl ChannelConsumerListener {
    /// ### English
    /// Creates the listener and the receiving end of its (unbounded) channel.
    ///
    /// ### 中文
    /// 创建监听器及其（无界）channel 的接收端。
    pub fn new() -> (Arc<Self>, channel::Receiver<ConsumerEvent>) {
        let (tx, rx) = channel::unbounded();
        (Arc::new(Self { tx }), rx)
    }

    #[inline]
    fn forward(&self, event: ConsumerEvent) {
        let _ = self.tx.send(event);
    }
}

impl ConsumerListener for ChannelConsumerListener {
    fn on_buffer_available(&self) {
        self.forward(ConsumerEvent::BufferAvailable);
    }

    fn on_tunnel_handle_change(&self) {
        self.forward(ConsumerEvent::TunnelHandleChange);
    }

    fn on_go_background(&self) {
        self.forward(ConsumerEvent::GoBackground);
    }

    fn on_clean_cache(&self) {
        self.forward(ConsumerEvent::CleanCache);
    }
}
