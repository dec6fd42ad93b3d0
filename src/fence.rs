//! ### English
//! Opaque synchronization fence handed between producer and consumer.
//!
//! The queue stores and forwards fences but never waits on them.
//!
//! ### 中文
//! 在生产者与消费者之间传递的不透明同步 fence。
//!
//! 队列只保存并转交 fence，从不等待它们。

/// ### English
/// File-descriptor-like fence token (`-1` = no fence).
///
/// ### 中文
/// 类文件描述符的 fence 令牌（`-1` = 无 fence）。
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SyncFence(i32);

impl SyncFence {
    /// ### English
    /// Fence that is already signaled; returned for freshly allocated buffers.
    ///
    /// ### 中文
    /// 已 signal 的 fence；新分配的缓冲区返回该值。
    pub const INVALID: SyncFence = SyncFence(-1);

    #[inline]
    pub const fn new(fd: i32) -> Self {
        if fd < 0 { Self::INVALID } else { Self(fd) }
    }

    #[inline]
    pub const fn fd(self) -> i32 {
        self.0
    }

    #[inline]
    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }
}

impl Default for SyncFence {
    fn default() -> Self {
        Self::INVALID
    }
}

impl From<i32> for SyncFence {
    fn from(fd: i32) -> Self {
        Self::new(fd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_fds_collapse_to_invalid() {
        assert_eq!(SyncFence::new(-7), SyncFence::INVALID);
        assert!(!SyncFence::default().is_valid());
        assert!(SyncFence::new(0).is_valid());
        assert_eq!(SyncFence::from(12).fd(), 12);
    }
}
