//! 两个掩膜之间的重叠度量.
//!
//! 任何非零标签都视为前景. 空掩膜的约定如下:
//! 两个掩膜都为空时视为完全一致, 只有一个为空时视为完全不一致.

use ndarray::{ArrayView2, ArrayView3, Axis, Zip};

use crate::consts::label::is_foreground;
use crate::data::MrMask;
use crate::error::SegResult;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 两个掩膜前景集合的计数.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverlapMeasures {
    /// `|A ∩ B|`
    intersection: usize,

    /// `|A|`
    source: usize,

    /// `|B|`
    target: usize,
}

impl std::ops::Add for OverlapMeasures {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self {
            intersection: self.intersection + rhs.intersection,
            source: self.source + rhs.source,
            target: self.target + rhs.target,
        }
    }
}

/// 单层切片上的计数.
fn count_slice(a: ArrayView2<'_, u8>, b: ArrayView2<'_, u8>) -> OverlapMeasures {
    let mut m = OverlapMeasures::default();
    Zip::from(a).and(b).for_each(|&p, &q| {
        let (p, q) = (is_foreground(p), is_foreground(q));
        m.source += p as usize;
        m.target += q as usize;
        m.intersection += (p && q) as usize;
    });
    m
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        /// 按水平切片并行计数后归约.
        fn count_all(a: ArrayView3<'_, u8>, b: ArrayView3<'_, u8>) -> OverlapMeasures {
            use rayon::prelude::*;
            a.axis_iter(Axis(0))
                .into_par_iter()
                .zip(b.axis_iter(Axis(0)).into_par_iter())
                .map(|(p, q)| count_slice(p, q))
                .reduce(OverlapMeasures::default, |x, y| x + y)
        }
    } else {
        /// 按水平切片计数后归约.
        fn count_all(a: ArrayView3<'_, u8>, b: ArrayView3<'_, u8>) -> OverlapMeasures {
            a.axis_iter(Axis(0))
                .zip(b.axis_iter(Axis(0)))
                .map(|(p, q)| count_slice(p, q))
                .fold(OverlapMeasures::default(), |x, y| x + y)
        }
    }
}

impl OverlapMeasures {
    /// 计算 `source` 与 `target` 的前景计数.
    ///
    /// 两者形状不一致时返回 `DimensionMismatch`.
    pub fn compute(source: &MrMask, target: &MrMask) -> SegResult<Self> {
        source.ensure_same_shape(target)?;
        Ok(count_all(source.data(), target.data()))
    }

    /// `|A ∩ B|`
    #[inline]
    pub fn intersection(&self) -> usize {
        self.intersection
    }

    /// `|A|`
    #[inline]
    pub fn source(&self) -> usize {
        self.source
    }

    /// `|B|`
    #[inline]
    pub fn target(&self) -> usize {
        self.target
    }

    /// `|A ∪ B|`
    #[inline]
    pub fn union(&self) -> usize {
        self.source + self.target - self.intersection
    }

    /// Dice 系数 `2|A ∩ B| / (|A| + |B|)`.
    pub fn dice(&self) -> f64 {
        match (self.source, self.target) {
            (0, 0) => 1.0,
            (0, _) | (_, 0) => 0.0,
            (s, t) => 2.0 * self.intersection as f64 / (s + t) as f64,
        }
    }

    /// Jaccard 系数 `|A ∩ B| / |A ∪ B|`.
    pub fn jaccard(&self) -> f64 {
        match self.union() {
            0 => 1.0,
            u => self.intersection as f64 / u as f64,
        }
    }

    /// 体积相似度 `2(|A| - |B|) / (|A| + |B|)`, 取值范围 `[-2, 2]`.
    ///
    /// 两者都为空时为 0.
    pub fn volume_similarity(&self) -> f64 {
        match self.source + self.target {
            0 => 0.0,
            sum => 2.0 * (self.source as f64 - self.target as f64) / sum as f64,
        }
    }

    /// 假阴性误差 `|B \ A| / |B|`, 以 `B` 为参考.
    ///
    /// 参考为空时为 0.
    pub fn false_negative_error(&self) -> f64 {
        match self.target {
            0 => 0.0,
            t => (t - self.intersection) as f64 / t as f64,
        }
    }

    /// 假阳性误差 `|A \ B| / |A|`.
    ///
    /// 分割为空时为 0.
    pub fn false_positive_error(&self) -> f64 {
        match self.source {
            0 => 0.0,
            s => (s - self.intersection) as f64 / s as f64,
        }
    }
}

/// 计算两个掩膜的 Dice 系数. 形状不一致时返回 `DimensionMismatch`.
#[inline]
pub fn dice(a: &MrMask, b: &MrMask) -> SegResult<f64> {
    OverlapMeasures::compute(a, b).map(|m| m.dice())
}
