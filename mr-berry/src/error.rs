//! 运行时错误.

use std::fmt;

use crate::VoxelIndex;

/// 分割核心计算的运行时错误.
///
/// 每个核心操作要么返回合法结果, 要么恰好返回以下一种错误, 不存在部分结果.
#[derive(Debug, Clone, PartialEq)]
pub enum SegError {
    /// 索引 (或种子点) 越界.
    ///
    /// `index` 和 `dims` 都按照 `(x, y, z)` 顺序给出.
    OutOfBounds {
        /// 越界的体素索引.
        index: VoxelIndex,
        /// 网格尺寸.
        dims: [usize; 3],
    },

    /// 两个网格尺寸不一致, 无法比较或合并. 均按照 `(x, y, z)` 顺序给出.
    DimensionMismatch {
        /// 左侧网格尺寸.
        left: [usize; 3],
        /// 右侧网格尺寸.
        right: [usize; 3],
    },

    /// 区域生长没有在种子之外增加任何体素. 参数为去重后的种子个数.
    EmptyRegion {
        /// 种子个数.
        seeds: usize,
    },

    /// 参数不合法. `name` 为参数名, `value` 为其取值的文本表示.
    InvalidParameter {
        /// 参数名.
        name: &'static str,
        /// 参数取值.
        value: String,
    },
}

impl SegError {
    /// 快速构造 [`SegError::InvalidParameter`].
    #[inline]
    pub(crate) fn invalid<V: fmt::Debug>(name: &'static str, value: V) -> Self {
        Self::InvalidParameter {
            name,
            value: format!("{value:?}"),
        }
    }
}

impl fmt::Display for SegError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegError::OutOfBounds { index, dims } => {
                write!(f, "索引 {index:?} 越界, 网格尺寸为 {dims:?}")
            }
            SegError::DimensionMismatch { left, right } => {
                write!(f, "网格尺寸不一致: {left:?} vs {right:?}")
            }
            SegError::EmptyRegion { seeds } => {
                write!(f, "区域生长未能在 {seeds} 个种子之外增加任何体素")
            }
            SegError::InvalidParameter { name, value } => {
                write!(f, "参数 `{name}` 不合法: {value}")
            }
        }
    }
}

impl std::error::Error for SegError {}

/// 分割核心计算的结果类型.
pub type SegResult<T> = Result<T, SegError>;
