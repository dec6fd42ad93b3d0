//! ### English
//! Graphic buffer handed out by the queue.
//!
//! A `SurfaceBuffer` is shared (`Arc`) between the queue and whichever side currently owns the
//! slot. Pixel memory sits behind a lock so a stale handle can never race the current owner.
//!
//! ### 中文
//! 由队列分发的图形缓冲区。
//!
//! `SurfaceBuffer` 通过 `Arc` 在队列与当前持有槽位的一方之间共享。像素内存位于锁之后，
//! 过期的句柄不会与当前持有者产生数据竞争。

use dpi::PhysicalSize;
use parking_lot::Mutex;

use crate::flags::BufferUsage;
use crate::types::{BufferRequestConfig, ColorGamut, PixelFormat, TransformType};

/// ### English
/// One allocated graphic buffer.
///
/// ### 中文
/// 一个已分配的图形缓冲区。
#[derive(Debug)]
pub struct SurfaceBuffer {
    /// ### English
    /// Sequence number identifying the buffer within its queue.
    ///
    /// ### 中文
    /// 在所属队列中标识该缓冲区的序号。
    sequence: u32,
    config: BufferRequestConfig,
    /// ### English
    /// Row length in pixels, `width` rounded up to the stride alignment.
    ///
    /// ### 中文
    /// 以像素计的行长度，即 `width` 按 stride 对齐向上取整。
    stride: u32,
    pixels: Mutex<Vec<u8>>,
}

impl SurfaceBuffer {
    pub(crate) fn new(
        sequence: u32,
        config: BufferRequestConfig,
        stride: u32,
        pixels: Vec<u8>,
    ) -> Self {
        Self {
            sequence,
            config,
            stride,
            pixels: Mutex::new(pixels),
        }
    }

    #[inline]
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// ### English
    /// Buffer size in pixels.
    ///
    /// ### 中文
    /// 缓冲区尺寸（像素）。
    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.config.width as u32, self.config.height as u32)
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.config.width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.config.height
    }

    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.config.format
    }

    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.config.usage
    }

    #[inline]
    pub fn color_gamut(&self) -> ColorGamut {
        self.config.color_gamut
    }

    #[inline]
    pub fn transform(&self) -> TransformType {
        self.config.transform
    }

    /// ### English
    /// The request config this buffer was allocated for.
    ///
    /// ### 中文
    /// 分配该缓冲区时使用的 request 配置。
    #[inline]
    pub fn config(&self) -> &BufferRequestConfig {
        &self.config
    }

    /// ### English
    /// Size of the pixel memory in bytes.
    ///
    /// ### 中文
    /// 像素内存的字节数。
    pub fn byte_len(&self) -> usize {
        self.pixels.lock().len()
    }

    /// ### English
    /// Runs `f` with mutable access to the pixel memory (producer side, while REQUESTED).
    ///
    /// ### 中文
    /// 以可变方式访问像素内存并执行 `f`（生产者侧，REQUESTED 期间）。
    pub fn write_pixels<R>(&self, f: impl FnOnce(&mut [u8]) -> R) -> R {
        let mut pixels = self.pixels.lock();
        f(&mut pixels)
    }

    /// ### English
    /// Runs `f` with shared access to the pixel memory (consumer side, while ACQUIRED).
    ///
    /// ### 中文
    /// 以只读方式访问像素内存并执行 `f`（消费者侧，ACQUIRED 期间）。
    pub fn read_pixels<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let pixels = self.pixels.lock();
        f(&pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixels_written_by_producer_are_visible_to_reader() {
        let config = BufferRequestConfig::new(2, 1);
        let buffer = SurfaceBuffer::new(7, config, 4, vec![0; 16]);
        buffer.write_pixels(|px| px[..4].copy_from_slice(&[1, 2, 3, 4]));
        let head = buffer.read_pixels(|px| px[..4].to_vec());
        assert_eq!(head, vec![1, 2, 3, 4]);
        assert_eq!(buffer.sequence(), 7);
        assert_eq!(buffer.size(), PhysicalSize::new(2, 1));
        assert_eq!(buffer.byte_len(), 16);
    }
}
