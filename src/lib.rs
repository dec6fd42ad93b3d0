//! ### English
//! `rosen_surface` crate root.
//!
//! A producer/consumer buffer queue for graphics surfaces. A `ConsumerSurface` owns the queue
//! and hands out producer handles; producers request, fill and flush buffers, the consumer is
//! notified, acquires them in flush order and releases them for reuse. The C ABI lives in `ffi`.
//!
//! ### 中文
//! `rosen_surface` 的 crate 根。
//!
//! 面向图形 surface 的生产者/消费者缓冲队列。`ConsumerSurface` 拥有队列并分发生产者句柄；
//! 生产者请求、填充并 flush 缓冲区，consumer 收到通知后按 flush 顺序 acquire，并在使用后
//! release 以便复用。C ABI 位于 `ffi` 模块。
pub mod allocator;
pub mod buffer;
pub mod config;
pub mod consumer;
pub mod error;
pub mod fence;
pub mod flags;
pub mod listener;
pub mod producer;
pub mod queue;
pub mod surface;
pub mod types;

mod ffi;

pub use allocator::{BufferAllocator, HeapAllocator};
pub use buffer::SurfaceBuffer;
pub use config::BufferQueueOptions;
pub use consumer::BufferQueueConsumer;
pub use error::{GsError, Result};
pub use fence::SyncFence;
pub use flags::BufferUsage;
pub use listener::{ChannelConsumerListener, ConsumerEvent, ConsumerListener, ReleaseListener};
pub use producer::BufferQueueProducer;
pub use queue::{AcquiredBuffer, BufferQueue, BufferState, RequestedBuffer};
pub use surface::{ConsumerSurface, ProducerSurface, Surface};
pub use types::*;
