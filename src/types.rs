//! ### English
//! Plain data types exchanged through the buffer queue: request/flush configs, pixel formats,
//! color gamuts, transforms, scaling modes, HDR metadata and present timestamps.
//!
//! All enums keep the numeric values used on the wire so they can cross the C ABI unchanged.
//!
//! ### 中文
//! 在 buffer queue 中传递的纯数据类型：request/flush 配置、像素格式、色域、变换、缩放模式、
//! HDR 元数据以及呈现时间戳。
//!
//! 所有枚举保留线上的数值，可原样穿过 C ABI。

use crate::error::GsError;
use crate::flags::BufferUsage;

/// ### English
/// Maximum number of distinct user-data keys per surface.
///
/// ### 中文
/// 每个 surface 最多可保存的 user-data 键数量。
pub const SURFACE_MAX_USER_DATA_COUNT: usize = 1000;
/// ### English
/// Upper bound for `set_queue_size`.
///
/// ### 中文
/// `set_queue_size` 的上限。
pub const SURFACE_MAX_QUEUE_SIZE: u32 = 32;
/// ### English
/// Queue size of a freshly created queue.
///
/// ### 中文
/// 新建队列的默认大小。
pub const SURFACE_DEFAULT_QUEUE_SIZE: u32 = 3;
pub const SURFACE_MAX_STRIDE_ALIGNMENT: i32 = 32;
pub const SURFACE_MIN_STRIDE_ALIGNMENT: i32 = 4;
pub const SURFACE_DEFAULT_STRIDE_ALIGNMENT: i32 = 4;
/// ### English
/// Largest pixel count a single buffer may hold (7680 x 7680).
///
/// ### 中文
/// 单个缓冲区允许的最大像素数（7680 x 7680）。
pub const SURFACE_MAX_SIZE: i64 = 58_982_400;

macro_rules! i32_enum {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        impl TryFrom<i32> for $name {
            type Error = GsError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                match value {
                    $(v if v == $name::$variant as i32 => Ok($name::$variant),)+
                    _ => Err(GsError::InvalidArguments),
                }
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> i32 {
                value as i32
            }
        }
    };
}

/// ### English
/// Pixel layout of a buffer.
///
/// ### 中文
/// 缓冲区的像素布局。
#[repr(i32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Clut8 = 0,
    Clut1 = 1,
    Clut4 = 2,
    Rgb565 = 3,
    Rgba5658 = 4,
    Rgbx4444 = 5,
    Rgba4444 = 6,
    Rgb444 = 7,
    Rgbx5551 = 8,
    Rgba5551 = 9,
    Rgb555 = 10,
    Rgbx8888 = 11,
    #[default]
    Rgba8888 = 12,
    Rgb888 = 13,
    Bgr565 = 14,
    Bgrx4444 = 15,
    Bgra4444 = 16,
    Bgrx5551 = 17,
    Bgra5551 = 18,
    Bgrx8888 = 19,
    Bgra8888 = 20,
    Yuv422I = 21,
    Ycbcr422Sp = 22,
    Ycrcb422Sp = 23,
    Ycbcr420Sp = 24,
    Ycrcb420Sp = 25,
    Ycbcr422P = 26,
    Ycrcb422P = 27,
    Ycbcr420P = 28,
    Ycrcb420P = 29,
    Yuyv422Pkg = 30,
    Uyvy422Pkg = 31,
    Yvyu422Pkg = 32,
    Vyuy422Pkg = 33,
    VendorMask = 0x7FFF_0000,
    /// ### English
    /// Invalid sentinel, never allocatable.
    ///
    /// ### 中文
    /// 无效哨兵值，永远不可分配。
    Butt = 0x7FFF_FFFF,
}

i32_enum!(PixelFormat {
    Clut8,
    Clut1,
    Clut4,
    Rgb565,
    Rgba5658,
    Rgbx4444,
    Rgba4444,
    Rgb444,
    Rgbx5551,
    Rgba5551,
    Rgb555,
    Rgbx8888,
    Rgba8888,
    Rgb888,
    Bgr565,
    Bgrx4444,
    Bgra4444,
    Bgrx5551,
    Bgra5551,
    Bgrx8888,
    Bgra8888,
    Yuv422I,
    Ycbcr422Sp,
    Ycrcb422Sp,
    Ycbcr420Sp,
    Ycrcb420Sp,
    Ycbcr422P,
    Ycrcb422P,
    Ycbcr420P,
    Ycrcb420P,
    Yuyv422Pkg,
    Uyvy422Pkg,
    Yvyu422Pkg,
    Vyuy422Pkg,
    VendorMask,
    Butt,
});

impl PixelFormat {
    /// ### English
    /// Storage size of `width x height` pixels in this format, or `None` for formats without a
    /// fixed layout (palette, vendor, invalid).
    ///
    /// ### 中文
    /// 该格式下 `width x height` 像素所需的存储字节数；对于没有固定布局的格式（调色板、厂商、
    /// 无效）返回 `None`。
    pub fn byte_size(self, stride: u32, height: u32) -> Option<usize> {
        let stride = stride as usize;
        let height = height as usize;
        let size = match self {
            PixelFormat::Rgb565
            | PixelFormat::Rgbx4444
            | PixelFormat::Rgba4444
            | PixelFormat::Rgb444
            | PixelFormat::Rgbx5551
            | PixelFormat::Rgba5551
            | PixelFormat::Rgb555
            | PixelFormat::Bgr565
            | PixelFormat::Bgrx4444
            | PixelFormat::Bgra4444
            | PixelFormat::Bgrx5551
            | PixelFormat::Bgra5551 => stride * height * 2,
            PixelFormat::Rgba5658 | PixelFormat::Rgb888 => stride * height * 3,
            PixelFormat::Rgbx8888
            | PixelFormat::Rgba8888
            | PixelFormat::Bgrx8888
            | PixelFormat::Bgra8888 => stride * height * 4,
            PixelFormat::Yuv422I
            | PixelFormat::Ycbcr422Sp
            | PixelFormat::Ycrcb422Sp
            | PixelFormat::Ycbcr422P
            | PixelFormat::Ycrcb422P
            | PixelFormat::Yuyv422Pkg
            | PixelFormat::Uyvy422Pkg
            | PixelFormat::Yvyu422Pkg
            | PixelFormat::Vyuy422Pkg => stride * height * 2,
            PixelFormat::Ycbcr420Sp
            | PixelFormat::Ycrcb420Sp
            | PixelFormat::Ycbcr420P
            | PixelFormat::Ycrcb420P => stride * height * 3 / 2,
            PixelFormat::Clut8
            | PixelFormat::Clut1
            | PixelFormat::Clut4
            | PixelFormat::VendorMask
            | PixelFormat::Butt => return None,
        };
        Some(size)
    }
}

/// ### English
/// Color gamut of buffer content.
///
/// ### 中文
/// 缓冲区内容的色域。
#[repr(i32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorGamut {
    Invalid = -1,
    Native = 0,
    StandardBt601 = 1,
    StandardBt709 = 2,
    DciP3 = 3,
    #[default]
    Srgb = 4,
    AdobeRgb = 5,
    DisplayP3 = 6,
    Bt2020 = 7,
    Bt2100Pq = 8,
    Bt2100Hlg = 9,
    DisplayBt2020 = 10,
}

i32_enum!(ColorGamut {
    Invalid,
    Native,
    StandardBt601,
    StandardBt709,
    DciP3,
    Srgb,
    AdobeRgb,
    DisplayP3,
    Bt2020,
    Bt2100Pq,
    Bt2100Hlg,
    DisplayBt2020,
});

/// ### English
/// Rotation / flip applied when the consumer presents the buffer.
///
/// `Butt` is the "unset" sentinel and is never a valid request transform.
///
/// ### 中文
/// consumer 呈现缓冲区时应用的旋转/翻转。
///
/// `Butt` 表示“未设置”的哨兵值，不能作为 request 的 transform。
#[repr(i32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TransformType {
    #[default]
    RotateNone = 0,
    Rotate90 = 1,
    Rotate180 = 2,
    Rotate270 = 3,
    FlipH = 4,
    FlipV = 5,
    FlipHRot90 = 6,
    FlipVRot90 = 7,
    FlipHRot180 = 8,
    FlipVRot180 = 9,
    FlipHRot270 = 10,
    FlipVRot270 = 11,
    Butt = 12,
}

i32_enum!(TransformType {
    RotateNone,
    Rotate90,
    Rotate180,
    Rotate270,
    FlipH,
    FlipV,
    FlipHRot90,
    FlipVRot90,
    FlipHRot180,
    FlipVRot180,
    FlipHRot270,
    FlipVRot270,
    Butt,
});

#[repr(i32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScalingMode {
    Freeze = 0,
    #[default]
    ScaleToWindow = 1,
    ScaleCrop = 2,
    NoScaleCrop = 3,
}

i32_enum!(ScalingMode {
    Freeze,
    ScaleToWindow,
    ScaleCrop,
    NoScaleCrop,
});

/// ### English
/// Which kind of HDR metadata a buffer carries.
///
/// ### 中文
/// 缓冲区携带的 HDR 元数据类型。
#[repr(i32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HdrMetaDataType {
    #[default]
    NotUsed = 0,
    MetaData = 1,
    MetaDataSet = 2,
}

#[repr(i32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HdrMetadataKey {
    #[default]
    RedPrimaryX = 0,
    RedPrimaryY = 1,
    GreenPrimaryX = 2,
    GreenPrimaryY = 3,
    BluePrimaryX = 4,
    BluePrimaryY = 5,
    WhitePrimaryX = 6,
    WhitePrimaryY = 7,
    MaxLuminance = 8,
    MinLuminance = 9,
    MaxContentLightLevel = 10,
    MaxFrameAverageLightLevel = 11,
    Hdr10Plus = 12,
    HdrVivid = 13,
}

i32_enum!(HdrMetadataKey {
    RedPrimaryX,
    RedPrimaryY,
    GreenPrimaryX,
    GreenPrimaryY,
    BluePrimaryX,
    BluePrimaryY,
    WhitePrimaryX,
    WhitePrimaryY,
    MaxLuminance,
    MinLuminance,
    MaxContentLightLevel,
    MaxFrameAverageLightLevel,
    Hdr10Plus,
    HdrVivid,
});

/// ### English
/// One static HDR metadata entry.
///
/// ### 中文
/// 一条静态 HDR 元数据。
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HdrMetaData {
    pub key: HdrMetadataKey,
    pub value: f32,
}

#[repr(i32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PresentTimestampType {
    #[default]
    Unsupported = 0,
    /// ### English
    /// Delay between flush and present, stored as-is.
    ///
    /// ### 中文
    /// flush 到呈现之间的延迟，原样保存。
    Delay = 1 << 0,
    /// ### English
    /// Absolute present time; read back relative to the flush timestamp.
    ///
    /// ### 中文
    /// 绝对呈现时间；读取时返回相对 flush 时间戳的差值。
    Timestamp = 1 << 1,
}

i32_enum!(PresentTimestampType {
    Unsupported,
    Delay,
    Timestamp,
});

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresentTimestamp {
    pub kind: PresentTimestampType,
    pub time: i64,
}

/// ### English
/// Rectangle in buffer pixels (damage region).
///
/// ### 中文
/// 以缓冲区像素为单位的矩形（damage 区域）。
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// ### English
/// Parameters of a `request_buffer` call.
///
/// Two configs must be equal field-by-field for a free buffer to be reused without reallocation.
///
/// ### 中文
/// `request_buffer` 调用的参数。
///
/// 只有逐字段相等时，空闲缓冲区才会被直接复用而不重新分配。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferRequestConfig {
    pub width: i32,
    pub height: i32,
    pub stride_alignment: i32,
    pub format: PixelFormat,
    pub usage: BufferUsage,
    /// ### English
    /// Milliseconds to wait for a slot when the queue is full (`0` = fail immediately).
    ///
    /// ### 中文
    /// 队列已满时等待空闲槽位的毫秒数（`0` = 立即失败）。
    pub timeout: i32,
    pub color_gamut: ColorGamut,
    pub transform: TransformType,
}

impl Default for BufferRequestConfig {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            stride_alignment: SURFACE_DEFAULT_STRIDE_ALIGNMENT,
            format: PixelFormat::Rgba8888,
            usage: BufferUsage::CPU_READ | BufferUsage::CPU_WRITE | BufferUsage::MEM_DMA,
            timeout: 0,
            color_gamut: ColorGamut::Srgb,
            transform: TransformType::RotateNone,
        }
    }
}

impl BufferRequestConfig {
    /// ### English
    /// RGBA8888 CPU-accessible config of the given size.
    ///
    /// ### 中文
    /// 指定尺寸的 RGBA8888、CPU 可访问配置。
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

/// ### English
/// Parameters of a `flush_buffer` call.
///
/// ### 中文
/// `flush_buffer` 调用的参数。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferFlushConfig {
    pub damage: Rect,
    /// ### English
    /// Content timestamp in microseconds; `0` means "now".
    ///
    /// ### 中文
    /// 内容时间戳（微秒）；`0` 表示“当前时间”。
    pub timestamp: i64,
}

/// ### English
/// One entry of an `is_supported_alloc` capability query.
///
/// ### 中文
/// `is_supported_alloc` 能力查询中的一项。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BufferVerifyAllocInfo {
    pub width: u32,
    pub height: u32,
    pub usage: BufferUsage,
    pub format: PixelFormat,
}

/// ### English
/// Sideband (tunnel) handle attached to a queue, e.g. a video decoder output.
///
/// ### 中文
/// 挂在队列上的旁路（tunnel）句柄，例如视频解码器输出。
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ExtDataHandle {
    /// ### English
    /// Handle fd, `-1` if not supported.
    ///
    /// ### 中文
    /// 句柄 fd，不支持时为 `-1`。
    pub fd: i32,
    pub reserve: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_convert_from_wire_values() {
        assert_eq!(PixelFormat::try_from(12), Ok(PixelFormat::Rgba8888));
        assert_eq!(PixelFormat::try_from(25), Ok(PixelFormat::Ycrcb420Sp));
        assert_eq!(PixelFormat::try_from(99), Err(GsError::InvalidArguments));
        assert_eq!(ColorGamut::try_from(-1), Ok(ColorGamut::Invalid));
        assert_eq!(TransformType::try_from(12), Ok(TransformType::Butt));
        assert_eq!(TransformType::try_from(13), Err(GsError::InvalidArguments));
        assert_eq!(i32::from(PresentTimestampType::Timestamp), 2);
    }

    #[test]
    fn byte_size_follows_bits_per_pixel() {
        assert_eq!(PixelFormat::Rgba8888.byte_size(16, 2), Some(128));
        assert_eq!(PixelFormat::Rgb565.byte_size(16, 2), Some(64));
        assert_eq!(PixelFormat::Ycrcb420Sp.byte_size(16, 2), Some(48));
        assert_eq!(PixelFormat::Butt.byte_size(16, 2), None);
    }

    #[test]
    fn request_config_equality_covers_every_field() {
        let base = BufferRequestConfig::new(64, 64);
        let mut other = base;
        assert_eq!(base, other);
        other.timeout = 5;
        assert_ne!(base, other);
    }
}
