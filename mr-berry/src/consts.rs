//! 通用常量.

/// 单通道标签值.
pub mod label {
    /// 分割掩膜中, 背景的体素值.
    pub const MASK_BACKGROUND: u8 = 0;

    /// 分割掩膜中, 前景 (前列腺) 的体素值.
    pub const MASK_FOREGROUND: u8 = 1;

    /// 体素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, MASK_BACKGROUND)
    }

    /// 体素是否是前景?
    ///
    /// 任何非零标签都被视为前景, 因此参考分割中的多标签掩膜也可以直接参与评估.
    #[inline]
    pub const fn is_foreground(p: u8) -> bool {
        !is_background(p)
    }
}

/// 区域生长默认的初始邻域半径 (体素).
pub const DEFAULT_INITIAL_RADIUS: usize = 1;

/// 区域生长接受区间的最小半宽系数.
///
/// 当统计方差为零 (例如单个种子, 或完全均匀的邻域) 时, 接受区间退化为
/// `mean ± MIN_HALF_BAND_RATIO * max(1, |mean|)`.
pub const MIN_HALF_BAND_RATIO: f64 = 1e-6;

/// 体素/像素类型.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ElemType {
    /// `MASK_BACKGROUND`, 代表背景.
    Background,

    /// 非零标签, 代表前景.
    Foreground,
}

impl ElemType {
    /// 是否为前景.
    #[inline]
    pub fn is_foreground(&self) -> bool {
        matches!(self, Self::Foreground)
    }

    /// 是否为背景.
    #[inline]
    pub fn is_background(&self) -> bool {
        !self.is_foreground()
    }

    /// 由标签值判断类型.
    #[inline]
    pub const fn from_label(p: u8) -> Self {
        if label::is_background(p) {
            Self::Background
        } else {
            Self::Foreground
        }
    }
}
