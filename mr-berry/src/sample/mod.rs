//! 以物理坐标为中心的子区域采样.

use ndarray::s;

use crate::data::{as_f64, Scalar, VoxelGrid};
use crate::error::{SegError, SegResult};
use crate::{Point3, VoxelIndex};

mod summary;

pub use summary::IntensitySummary;

/// 一次子区域采样的结果.
///
/// 所有索引都按照 `(x, y, z)` 顺序给出. 采样框为 `[lower, upper)`,
/// 已截断到网格内部.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionSample<T> {
    /// 目标点对应的体素索引. 可能位于网格之外.
    pub center: VoxelIndex,

    /// 采样框下界 (包含).
    pub lower: VoxelIndex,

    /// 采样框上界 (不包含).
    pub upper: VoxelIndex,

    /// 中心体素的值. 中心位于网格外时为 `None`.
    pub center_intensity: Option<T>,

    /// 采样框内所有体素值, 按 `(z, H, W)` 行优先顺序排列.
    pub values: Vec<T>,
}

impl<T> RegionSample<T> {
    /// 采样框每个轴上的体素个数, `(x, y, z)` 顺序.
    #[inline]
    pub fn extent(&self) -> [usize; 3] {
        [0, 1, 2].map(|a| (self.upper[a] - self.lower[a]) as usize)
    }

    /// 采样体素个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否没有采样到任何体素. 由 [`sample_region`] 得到的结果总是非空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T: Scalar> RegionSample<T> {
    /// 计算采样值的五数概括. 全部为 `NaN` 时返回 `None`.
    #[inline]
    pub fn summary(&self) -> Option<IntensitySummary> {
        IntensitySummary::from_values(self.values.iter().map(|&v| as_f64(v)))
    }
}

/// 以物理坐标 `point` 为中心, 采集边长为 `width` (物理单位) 的立方区域内的体素值.
///
/// 每个轴上的半宽为 `width / 2 / spacing`, 采样框为
/// `[ceil(c - half), ceil(c + half))`, 然后截断到网格内部.
/// 目标点可以位于网格之外, 只要截断后的采样框非空即可.
///
/// # 返回值
///
/// - `point` 含有非有限分量, 或 `width` 不是有限正数时返回 `InvalidParameter`;
/// - 截断后采样框在任一轴上为空时返回 `OutOfBounds`.
pub fn sample_region<T: Scalar>(
    grid: &VoxelGrid<T>,
    point: Point3,
    width: f64,
) -> SegResult<RegionSample<T>> {
    if !point.iter().all(|v| v.is_finite()) {
        return Err(SegError::invalid("point", point));
    }
    if !(width.is_finite() && width > 0.0) {
        return Err(SegError::invalid("width", width));
    }

    let center = grid.physical_to_index(point);
    let dims = grid.dims();
    let spacing = grid.geometry().spacing();

    let mut lower = [0i64; 3];
    let mut upper = [0i64; 3];
    for a in 0..3 {
        let half = width / 2.0 / spacing[a];
        let c = center[a] as f64;
        let dim = dims[a] as i64;
        lower[a] = ((c - half).ceil() as i64).clamp(0, dim);
        upper[a] = ((c + half).ceil() as i64).clamp(0, dim);
        if lower[a] >= upper[a] {
            return Err(SegError::OutOfBounds {
                index: center,
                dims,
            });
        }
    }

    let [xl, yl, zl] = lower.map(|v| v as usize);
    let [xu, yu, zu] = upper.map(|v| v as usize);
    let values = grid
        .data()
        .slice(s![zl..zu, yl..yu, xl..xu])
        .iter()
        .copied()
        .collect();

    Ok(RegionSample {
        center,
        lower,
        upper,
        center_intensity: grid.intensity_at(center).ok(),
        values,
    })
}
