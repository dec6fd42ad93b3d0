//! ### English
//! Construction options for a buffer queue.
//!
//! ### 中文
//! buffer queue 的构造选项。

use crate::flags::BufferUsage;
use crate::types::SURFACE_DEFAULT_QUEUE_SIZE;

/// ### English
/// Options used when a consumer surface creates its queue.
///
/// Out-of-range values are clamped when the queue is built; use `set_queue_size` /
/// `set_default_width_and_height` afterwards for checked updates.
///
/// ### 中文
/// consumer surface 创建队列时使用的选项。
///
/// 越界值会在构建队列时被截断；之后如需带校验的更新，请使用 `set_queue_size` /
/// `set_default_width_and_height`。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferQueueOptions {
    /// ### English
    /// Human-readable queue name (shown in dumps and logs).
    ///
    /// ### 中文
    /// 可读的队列名称（用于 dump 与日志）。
    pub name: String,
    pub queue_size: u32,
    pub default_width: i32,
    pub default_height: i32,
    pub default_usage: BufferUsage,
}

impl Default for BufferQueueOptions {
    fn default() -> Self {
        Self {
            name: String::from("surface"),
            queue_size: SURFACE_DEFAULT_QUEUE_SIZE,
            default_width: 0,
            default_height: 0,
            default_usage: BufferUsage::empty(),
        }
    }
}

impl BufferQueueOptions {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}
