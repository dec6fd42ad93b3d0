//! ### English
//! Buffer usage bitflags.
//!
//! These are passed through the C ABI as a `u64` bitmask; unknown bits are kept as-is.
//!
//! ### 中文
//! 缓冲区用途位标志（bitflags）。
//!
//! 通过 C ABI 以 `u64` 位掩码传入；未知位原样保留。

use bitflags::bitflags;

bitflags! {
    /// ### English
    /// How a buffer will be accessed by the producer, the consumer and the hardware.
    ///
    /// ### 中文
    /// 缓冲区将如何被生产者、消费者及硬件访问。
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u64 {
        const CPU_READ = 1 << 0;
        const CPU_WRITE = 1 << 1;
        /// ### English
        /// Media memory zone.
        ///
        /// ### 中文
        /// 媒体内存区（MMZ）。
        const MEM_MMZ = 1 << 2;
        const MEM_DMA = 1 << 3;
        const MEM_SHARE = 1 << 4;
        const MEM_MMZ_CACHE = 1 << 5;
        const MEM_FB = 1 << 6;
        const ASSIGN_SIZE = 1 << 7;
        /// ### English
        /// GPU writes the buffer.
        ///
        /// ### 中文
        /// GPU 写入该缓冲区。
        const HW_RENDER = 1 << 8;
        /// ### English
        /// GPU samples the buffer.
        ///
        /// ### 中文
        /// GPU 采样该缓冲区。
        const HW_TEXTURE = 1 << 9;
        const HW_COMPOSER = 1 << 10;
        const PROTECTED = 1 << 11;
        const CAMERA_READ = 1 << 12;
        const CAMERA_WRITE = 1 << 13;
        const VIDEO_ENCODER = 1 << 14;
        const VIDEO_DECODER = 1 << 15;

        const _ = !0;
    }
}

impl BufferUsage {
    /// ### English
    /// Whether the CPU touches the pixel memory directly.
    ///
    /// ### 中文
    /// CPU 是否直接访问像素内存。
    #[inline]
    pub fn is_cpu_accessible(self) -> bool {
        self.intersects(BufferUsage::CPU_READ | BufferUsage::CPU_WRITE)
    }
}

/// ### English
/// Bits reserved for vendor-private usages (bits 44..=63).
///
/// ### 中文
/// 为厂商私有用途保留的位（第 44..=63 位）。
pub const BUFFER_USAGE_VENDOR_MASK: u64 = !((1u64 << 44) - 1);

/// ### English
/// C ABI creation flag: the consumer records availability events internally and the embedder
/// polls them with `rosen_surface_consumer_wait_available` instead of installing a callback.
///
/// ### 中文
/// C ABI 创建标志：consumer 在内部记录可用事件，宿主通过 `rosen_surface_consumer_wait_available`
/// 轮询，而不是安装回调。
pub const ROSEN_SURFACE_FLAG_POLL_AVAILABLE: u32 = 1 << 0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_bits_survive_conversion() {
        let raw = BufferUsage::CPU_READ.bits() | (1u64 << 50);
        let usage = BufferUsage::from_bits_retain(raw);
        assert_eq!(usage.bits(), raw);
        assert_ne!(usage.bits() & BUFFER_USAGE_VENDOR_MASK, 0);
        assert!(usage.is_cpu_accessible());
        assert!(!BufferUsage::HW_TEXTURE.is_cpu_accessible());
    }
}
