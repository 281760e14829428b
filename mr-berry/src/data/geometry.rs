//! 体数据的空间元信息: 体素间距, 原点和方向矩阵.
//!
//! 物理坐标与体素索引都按照 `(x, y, z)` 顺序组织 (即 `(w, h, z)`).
//! 映射关系为
//!
//! ```text
//! point = origin + direction · (index ⊙ spacing)
//! index = round(direction⁻¹ · (point − origin) / spacing)
//! ```
//!
//! 其中 `direction` 的第 `c` 列是第 `c` 个体素轴在物理空间中的方向.

use crate::error::{SegError, SegResult};
use crate::{Point3, VoxelIndex};

/// 3x3 矩阵, 行优先.
pub type Mat3 = [[f64; 3]; 3];

const IDENTITY: Mat3 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// 方向矩阵行列式的绝对值下限, 低于此值视为奇异.
const SINGULAR_EPS: f64 = 1e-12;

#[inline]
fn mat_vec(m: &Mat3, v: &[f64; 3]) -> [f64; 3] {
    [0, 1, 2].map(|r| m[r][0] * v[0] + m[r][1] * v[1] + m[r][2] * v[2])
}

#[inline]
fn det(m: &Mat3) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// 通过伴随矩阵求逆. 调用方负责保证 `m` 非奇异.
fn inverse(m: &Mat3, d: f64) -> Mat3 {
    let mut inv = [[0.0; 3]; 3];
    for (r, row) in inv.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            // 余子式 M[c][r] 的代数余子式, 即伴随矩阵的 (r, c) 元素.
            let (r1, r2) = ((c + 1) % 3, (c + 2) % 3);
            let (c1, c2) = ((r + 1) % 3, (r + 2) % 3);
            *cell = (m[r1][c1] * m[r2][c2] - m[r1][c2] * m[r2][c1]) / d;
        }
    }
    inv
}

/// 体数据的空间元信息.
///
/// 该结构是只读的. 构造后, 间距、原点和方向在整个生命周期内保持不变.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Geometry {
    spacing: [f64; 3],
    origin: Point3,
    direction: Mat3,
    inverse: Mat3,
}

impl Default for Geometry {
    /// 单位间距, 原点为零, 方向为单位阵.
    fn default() -> Self {
        Self {
            spacing: [1.0; 3],
            origin: [0.0; 3],
            direction: IDENTITY,
            inverse: IDENTITY,
        }
    }
}

impl Geometry {
    /// 构建空间元信息.
    ///
    /// # 返回值
    ///
    /// - 任一间距分量非有限或不为正时, 返回 `InvalidParameter("spacing")`;
    /// - 原点存在非有限分量时, 返回 `InvalidParameter("origin")`;
    /// - 方向矩阵存在非有限分量或奇异时, 返回 `InvalidParameter("direction")`.
    pub fn new(spacing: [f64; 3], origin: Point3, direction: Mat3) -> SegResult<Self> {
        if !spacing.iter().all(|s| s.is_finite() && *s > 0.0) {
            return Err(SegError::invalid("spacing", spacing));
        }
        if !origin.iter().all(|o| o.is_finite()) {
            return Err(SegError::invalid("origin", origin));
        }
        let d = det(&direction);
        if !direction.iter().flatten().all(|v| v.is_finite()) || d.abs() < SINGULAR_EPS {
            return Err(SegError::invalid("direction", direction));
        }
        Ok(Self {
            spacing,
            origin,
            direction,
            inverse: inverse(&direction, d),
        })
    }

    /// 仅指定间距, 原点为零, 方向为单位阵.
    #[inline]
    pub fn with_spacing(spacing: [f64; 3]) -> SegResult<Self> {
        Self::new(spacing, [0.0; 3], IDENTITY)
    }

    /// 体素间距, `(x, y, z)` 顺序.
    #[inline]
    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// 索引 `(0, 0, 0)` 体素的物理坐标.
    #[inline]
    pub fn origin(&self) -> Point3 {
        self.origin
    }

    /// 方向矩阵.
    #[inline]
    pub fn direction(&self) -> Mat3 {
        self.direction
    }

    /// 单个体素的物理体积.
    #[inline]
    pub fn voxel_volume(&self) -> f64 {
        self.spacing.iter().product()
    }

    /// 物理坐标到连续 (未取整) 体素坐标.
    pub fn physical_to_continuous_index(&self, point: Point3) -> [f64; 3] {
        let rel = [0, 1, 2].map(|a| point[a] - self.origin[a]);
        let v = mat_vec(&self.inverse, &rel);
        [0, 1, 2].map(|a| v[a] / self.spacing[a])
    }

    /// 物理坐标到体素索引. 每个分量按最近整数取整 (0.5 远离零取整).
    ///
    /// 结果不做截断, 调用方需要自行检查越界.
    #[inline]
    pub fn physical_to_index(&self, point: Point3) -> VoxelIndex {
        self.physical_to_continuous_index(point)
            .map(|v| v.round() as i64)
    }

    /// 体素索引到物理坐标. 是 [`Self::physical_to_index`] 的精确逆映射.
    #[inline]
    pub fn index_to_physical(&self, index: VoxelIndex) -> Point3 {
        let scaled = [0, 1, 2].map(|a| index[a] as f64 * self.spacing[a]);
        let v = mat_vec(&self.direction, &scaled);
        [0, 1, 2].map(|a| self.origin[a] + v[a])
    }
}
