//! 二值阈值分割.

use ndarray::{Array3, ArrayView3};

use crate::consts::label::*;
use crate::consts::ElemType;
use crate::data::{as_f64, MrMask, Scalar, VoxelGrid};
use crate::error::{SegError, SegResult};

/// 二值阈值参数. 闭区间 `[lower, upper]` 内的体素被标记为 `inside`,
/// 其余体素被标记为 `outside`.
///
/// 该结构是只读的, 合法性在构造时检查.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ThresholdSpec {
    lower: f64,
    upper: f64,
    inside: u8,
    outside: u8,
}

impl ThresholdSpec {
    /// 构建阈值参数.
    ///
    /// 当 `lower > upper` 或任一边界为 `NaN` 时返回 `InvalidParameter`.
    pub fn new(lower: f64, upper: f64, inside: u8, outside: u8) -> SegResult<Self> {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(SegError::invalid("threshold_bounds", (lower, upper)));
        }
        Ok(Self {
            lower,
            upper,
            inside,
            outside,
        })
    }

    /// 以 [`MASK_FOREGROUND`] / [`MASK_BACKGROUND`] 为内外标签构建阈值参数.
    #[inline]
    pub fn binary(lower: f64, upper: f64) -> SegResult<Self> {
        Self::new(lower, upper, MASK_FOREGROUND, MASK_BACKGROUND)
    }

    /// 下界.
    #[inline]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// 上界.
    #[inline]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// 判断体素值 `v` 是否落在阈值区间内.
    #[inline]
    pub fn eval(&self, v: f64) -> ElemType {
        if (self.lower..=self.upper).contains(&v) {
            ElemType::Foreground
        } else {
            ElemType::Background
        }
    }

    /// 体素值 `v` 对应的输出标签.
    #[inline]
    pub fn label(&self, v: f64) -> u8 {
        match self.eval(v) {
            ElemType::Foreground => self.inside,
            ElemType::Background => self.outside,
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        fn label_all<T: Scalar>(data: ArrayView3<'_, T>, spec: &ThresholdSpec) -> Array3<u8> {
            ndarray::Zip::from(data).par_map_collect(|v| spec.label(as_f64(*v)))
        }
    } else {
        fn label_all<T: Scalar>(data: ArrayView3<'_, T>, spec: &ThresholdSpec) -> Array3<u8> {
            data.map(|v| spec.label(as_f64(*v)))
        }
    }
}

/// 按照 `spec` 对 `grid` 做二值阈值分割, 返回与 `grid` 形状和空间元信息一致的掩膜.
pub fn binary_threshold<T: Scalar>(grid: &VoxelGrid<T>, spec: &ThresholdSpec) -> MrMask {
    grid.with_data(label_all(grid.data(), spec))
}

/// 同 [`binary_threshold`], 但直接接受边界与标签参数.
///
/// 当 `lower > upper` 时返回 `InvalidParameter`.
#[inline]
pub fn threshold<T: Scalar>(
    grid: &VoxelGrid<T>,
    lower: f64,
    upper: f64,
    inside: u8,
    outside: u8,
) -> SegResult<MrMask> {
    let spec = ThresholdSpec::new(lower, upper, inside, outside)?;
    Ok(binary_threshold(grid, &spec))
}
