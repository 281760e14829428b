//! 强度值的五数概括, 供箱线图展示使用.

use ordered_float::OrderedFloat;

use crate::segment::RunningStats;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 五数概括以及均值, 标准差.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntensitySummary {
    /// 最小值.
    pub min: f64,
    /// 下四分位数.
    pub q1: f64,
    /// 中位数.
    pub median: f64,
    /// 上四分位数.
    pub q3: f64,
    /// 最大值.
    pub max: f64,
    /// 均值.
    pub mean: f64,
    /// 样本标准差.
    pub std: f64,
    /// 参与统计的样本个数 (不含 `NaN`).
    pub count: usize,
}

/// 有序序列 `sorted` 在 `p` 处的分位数, 相邻两个样本间线性插值.
#[inline]
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let (lo, hi) = (pos.floor() as usize, pos.ceil() as usize);
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

impl IntensitySummary {
    /// 由样本计算概括. `NaN` 会被忽略.
    ///
    /// # 返回值
    ///
    /// 如果不存在有效样本, 则返回 `None`.
    pub fn from_values<I: IntoIterator<Item = f64>>(it: I) -> Option<Self> {
        let mut sorted: Vec<f64> = it.into_iter().filter(|v| !v.is_nan()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_unstable_by_key(|&v| OrderedFloat(v));

        let mut stats = RunningStats::default();
        sorted.iter().for_each(|&v| stats.push(v));

        Some(Self {
            min: sorted[0],
            q1: quantile(&sorted, 0.25),
            median: quantile(&sorted, 0.5),
            q3: quantile(&sorted, 0.75),
            max: sorted[sorted.len() - 1],
            mean: stats.mean(),
            std: stats.std(),
            count: sorted.len(),
        })
    }

    /// 四分位距 `q3 - q1`.
    #[inline]
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}

#[cfg(test)]
mod tests {
    use super::IntensitySummary;
    use approx::assert_relative_eq;

    #[test]
    fn test_odd_count() {
        let s = IntensitySummary::from_values([5.0, 1.0, 4.0, 2.0, 3.0]).unwrap();
        assert_eq!((s.min, s.q1, s.median, s.q3, s.max), (1.0, 2.0, 3.0, 4.0, 5.0));
        assert_eq!(s.count, 5);
        assert_relative_eq!(s.mean, 3.0);
        assert_relative_eq!(s.std, 2.5f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_even_count_interpolated() {
        let s = IntensitySummary::from_values([4.0, 3.0, f64::NAN, 2.0, 1.0]).unwrap();
        assert_eq!(s.count, 4);
        assert_relative_eq!(s.q1, 1.75);
        assert_relative_eq!(s.median, 2.5);
        assert_relative_eq!(s.q3, 3.25);
        assert_relative_eq!(s.iqr(), 1.5);
    }

    #[test]
    fn test_empty() {
        assert!(IntensitySummary::from_values([]).is_none());
        assert!(IntensitySummary::from_values([f64::NAN]).is_none());
        let s = IntensitySummary::from_values([7.0]).unwrap();
        assert_eq!((s.min, s.median, s.max, s.std), (7.0, 7.0, 7.0, 0.0));
    }
}
