//! ### English
//! Error kinds returned by every surface and buffer-queue operation.
//!
//! Each variant has a stable numeric code (`GsError::code`) used by the C ABI.
//!
//! ### 中文
//! surface 与 buffer queue 所有操作返回的错误类型。
//!
//! 每个变体都有稳定的数值错误码（`GsError::code`），供 C ABI 使用。

use thiserror::Error;

/// ### English
/// Graphic surface error.
///
/// ### 中文
/// 图形 surface 错误。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GsError {
    /// ### English
    /// Malformed config, out-of-range value or empty required vector.
    ///
    /// ### 中文
    /// 配置非法、取值越界或必需的数组为空。
    #[error("invalid arguments")]
    InvalidArguments,

    /// ### English
    /// Unknown sequence, buffer in the wrong state, or a once-only resource already set.
    ///
    /// ### 中文
    /// 未知序号、缓冲区状态不符，或一次性资源已被设置。
    #[error("no entry")]
    NoEntry,

    /// ### English
    /// Not available on this side (yet).
    ///
    /// ### 中文
    /// 在当前一侧（暂时）不可用。
    #[error("not supported")]
    NotSupport,

    /// ### English
    /// Queue is full, or nothing is ready to acquire.
    ///
    /// ### 中文
    /// 队列已满，或没有可 acquire 的缓冲区。
    #[error("no buffer")]
    NoBuffer,

    /// ### English
    /// No consumer listener is registered.
    ///
    /// ### 中文
    /// 没有注册 consumer 监听器。
    #[error("no consumer")]
    NoConsumer,

    #[error("out of range")]
    OutOfRange,

    /// ### English
    /// Operation is invalid in the current state (double cancel, double disconnect).
    ///
    /// ### 中文
    /// 当前状态下操作无效（重复 cancel、重复 disconnect）。
    #[error("invalid operation")]
    InvalidOperating,

    #[error("type error")]
    TypeError,

    /// ### English
    /// Allocation or another collaborator call failed.
    ///
    /// ### 中文
    /// 内存分配或其它协作方调用失败。
    #[error("api failed")]
    ApiFailed,
}

/// ### English
/// Numeric code reported for success over the C ABI.
///
/// ### 中文
/// C ABI 中表示成功的数值码。
pub const GSERROR_OK: i32 = 0;

impl GsError {
    /// ### English
    /// Stable numeric code for this error.
    ///
    /// ### 中文
    /// 该错误对应的稳定数值码。
    pub const fn code(self) -> i32 {
        match self {
            GsError::InvalidArguments => 40001000,
            GsError::NoBuffer => 40601000,
            GsError::NoEntry => 40602000,
            GsError::OutOfRange => 40603000,
            GsError::InvalidOperating => 41001000,
            GsError::NoConsumer => 41002000,
            GsError::TypeError => 41004000,
            GsError::ApiFailed => 50001000,
            GsError::NotSupport => 50007000,
        }
    }
}

/// ### English
/// Result type for surface operations.
///
/// ### 中文
/// surface 操作的结果类型。
pub type Result<T> = std::result::Result<T, GsError>;

/// ### English
/// Converts a unit result into its C ABI code.
///
/// ### 中文
/// 将无返回值的结果转换为 C ABI 错误码。
pub(crate) fn result_code(result: Result<()>) -> i32 {
    match result {
        Ok(()) => GSERROR_OK,
        Err(err) => err.code(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_and_non_zero() {
        let all = [
            GsError::InvalidArguments,
            GsError::NoEntry,
            GsError::NotSupport,
            GsError::NoBuffer,
            GsError::NoConsumer,
            GsError::OutOfRange,
            GsError::InvalidOperating,
            GsError::TypeError,
            GsError::ApiFailed,
        ];
        let mut codes: Vec<i32> = all.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
        assert!(codes.iter().all(|&c| c != GSERROR_OK));
    }

    #[test]
    fn result_code_maps_ok_to_zero() {
        assert_eq!(result_code(Ok(())), GSERROR_OK);
        assert_eq!(result_code(Err(GsError::NoEntry)), 40602000);
    }
}
