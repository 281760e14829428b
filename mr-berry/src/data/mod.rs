use std::ops::Index;

use ndarray::{Array3, ArrayView2, ArrayView3, Axis};
use num::ToPrimitive;

use crate::consts::label::*;
use crate::error::{SegError, SegResult};
use crate::{Idx3d, Point3, VoxelIndex};

pub mod geometry;
pub mod io;
pub mod resample;

pub use geometry::{Geometry, Mat3};
pub use io::OpenGridError;

/// 体素标量类型. 所有核心算法都通过 `f64` 进行数值比较.
pub trait Scalar: Copy + Send + Sync + PartialOrd + ToPrimitive + 'static {}

impl<T> Scalar for T where T: Copy + Send + Sync + PartialOrd + ToPrimitive + 'static {}

/// 将体素值转换为 `f64`. 不可表示的值被视为 `NaN`.
#[inline]
pub(crate) fn as_f64<T: Scalar>(v: T) -> f64 {
    v.to_f64().unwrap_or(f64::NAN)
}

/// 3D 体素网格, 包括数据和空间元信息.
///
/// 数据按照 `(z, H, W)` 存储, 即 `data[(z, h, w)]`; 与物理空间相关的接口
/// (如 [`Self::intensity_at`]) 使用 `(x, y, z)` == `(w, h, z)` 顺序的 [`VoxelIndex`].
///
/// 网格的尺寸和空间元信息在构造后不可变. 所有算法都接受 `&VoxelGrid`
/// 并返回新分配的网格, 不会就地修改输入.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid<T> {
    geometry: Geometry,
    data: Array3<T>,
}

/// 3D MRI 扫描 (强度值). 以 `f32` 保存.
pub type MrScan = VoxelGrid<f32>;

/// 3D 分割掩膜. 标签值以 `u8` 保存, 一般仅包括
/// [`MASK_BACKGROUND`] 和 [`MASK_FOREGROUND`].
pub type MrMask = VoxelGrid<u8>;

impl<T> Index<Idx3d> for VoxelGrid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Idx3d) -> &Self::Output {
        &self.data[index]
    }
}

impl<T> VoxelGrid<T> {
    /// 由 `(z, H, W)` 组织的数据和空间元信息直接创建网格.
    #[inline]
    pub fn new(data: Array3<T>, geometry: Geometry) -> Self {
        Self { geometry, data }
    }

    /// 使用默认空间元信息 (单位间距, 零原点, 单位方向) 创建网格.
    #[inline]
    pub fn with_unit_geometry(data: Array3<T>) -> Self {
        Self::new(data, Geometry::default())
    }

    /// 创建形状为 `shape` (`(z, H, W)`) 且所有体素均为 `elem` 的网格.
    #[inline]
    pub fn from_elem(shape: Idx3d, elem: T, geometry: Geometry) -> Self
    where
        T: Clone,
    {
        Self::new(Array3::from_elem(shape, elem), geometry)
    }

    /// 获取空间元信息.
    #[inline]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// 获取数据形状大小, `(z, H, W)` 顺序.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }

    /// 获取网格尺寸, `(x, y, z)` 顺序.
    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        let (z, h, w) = self.shape();
        [w, h, z]
    }

    /// 获取数据体素个数.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// 检查 `(z, H, W)` 索引是否合法.
    #[inline]
    pub fn check(&self, (z0, h0, w0): &Idx3d) -> bool {
        let (z, h, w) = self.shape();
        *z0 < z && *h0 < h && *w0 < w
    }

    /// 将 `(x, y, z)` 索引转换为存储索引 `(z, H, W)`.
    ///
    /// 任一分量不在 `[0, dim)` 内时返回 `OutOfBounds`.
    pub fn checked_idx(&self, index: VoxelIndex) -> SegResult<Idx3d> {
        let dims = self.dims();
        let in_range = index
            .iter()
            .zip(dims.iter())
            .all(|(&i, &d)| i >= 0 && (i as u64) < d as u64);
        if !in_range {
            return Err(SegError::OutOfBounds { index, dims });
        }
        let [x, y, z] = index;
        Ok((z as usize, y as usize, x as usize))
    }

    /// 获取 `(x, y, z)` 索引处的体素值. 越界时返回 `OutOfBounds`.
    #[inline]
    pub fn intensity_at(&self, index: VoxelIndex) -> SegResult<T>
    where
        T: Copy,
    {
        self.checked_idx(index).map(|pos| self.data[pos])
    }

    /// 物理坐标到体素索引. 不截断, 见 [`Geometry::physical_to_index`].
    #[inline]
    pub fn physical_to_index(&self, point: Point3) -> VoxelIndex {
        self.geometry.physical_to_index(point)
    }

    /// 体素索引到物理坐标, 见 [`Geometry::index_to_physical`].
    #[inline]
    pub fn index_to_physical(&self, index: VoxelIndex) -> Point3 {
        self.geometry.index_to_physical(index)
    }

    /// 获得数据的一份不可变 shallow copy.
    #[inline]
    pub fn data(&self) -> ArrayView3<'_, T> {
        self.data.view()
    }

    /// 直接获得内部数据和空间元信息的所有权.
    #[inline]
    pub fn into_raw(self) -> (Array3<T>, Geometry) {
        (self.data, self.geometry)
    }

    /// 获取 z 空间的第 `z_index` 层切片视图, 供可视化使用.
    ///
    /// 当 `z_index` 越界时 panic.
    #[inline]
    pub fn slice_at(&self, z_index: usize) -> ArrayView2<'_, T> {
        self.data.index_axis(Axis(0), z_index)
    }

    /// 两个网格的形状是否一致?
    #[inline]
    pub fn same_shape<U>(&self, other: &VoxelGrid<U>) -> bool {
        self.shape() == other.shape()
    }

    /// 两个网格形状不一致时返回 `DimensionMismatch`.
    #[inline]
    pub fn ensure_same_shape<U>(&self, other: &VoxelGrid<U>) -> SegResult<()> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(SegError::DimensionMismatch {
                left: self.dims(),
                right: other.dims(),
            })
        }
    }

    /// 对每个体素实施 `f`, 得到共享空间元信息的新网格.
    #[inline]
    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> VoxelGrid<U> {
        VoxelGrid::new(self.data.map(f), self.geometry)
    }

    /// 用相同空间元信息包装新数据. `data` 的形状必须与 `self` 一致, 否则 panic.
    #[inline]
    pub(crate) fn with_data<U>(&self, data: Array3<U>) -> VoxelGrid<U> {
        assert_eq!(self.shape(), data.dim(), "网格形状不一致");
        VoxelGrid::new(data, self.geometry)
    }

    /// 统计满足谓词 `pred` 的体素个数.
    #[inline]
    pub fn count_where<F: Fn(&T) -> bool>(&self, pred: F) -> usize {
        self.data.iter().filter(|p| pred(p)).count()
    }

    /// `(z, H, W)` 索引到行优先展平索引.
    #[inline]
    pub(crate) fn flatten_idx(&self, (z, h, w): Idx3d) -> usize {
        let (_, hl, wl) = self.shape();
        (z * hl + h) * wl + w
    }

    /// 行优先展平索引到 `(z, H, W)` 索引.
    #[inline]
    pub(crate) fn unflatten_idx(&self, flat: usize) -> Idx3d {
        let (_, hl, wl) = self.shape();
        (flat / (hl * wl), (flat / wl) % hl, flat % wl)
    }

    /// 获取 `pos` 前后上下左右六个点的坐标.
    ///
    /// 在数据范围外的坐标会被过滤掉, 不会包含在返回值中.
    pub(crate) fn diamond_neighbours(&self, (z, h, w): Idx3d) -> Vec<Idx3d> {
        self.check_collect([
            (z.wrapping_sub(1), h, w),
            (z.saturating_add(1), h, w),
            (z, h.wrapping_sub(1), w),
            (z, h.saturating_add(1), w),
            (z, h, w.wrapping_sub(1)),
            (z, h, w.saturating_add(1)),
        ])
    }

    /// 收集 `data` 中不越界的索引.
    #[inline]
    fn check_collect<B: FromIterator<Idx3d>, const N: usize>(&self, data: [Idx3d; N]) -> B {
        data.into_iter().filter(|p| self.check(p)).collect()
    }
}

impl VoxelGrid<u8> {
    /// 获取掩膜中值为 `label` 的体素个数.
    #[inline]
    pub fn count(&self, label: u8) -> usize {
        self.count_where(|p| *p == label)
    }

    /// 获取掩膜前景 (任何非零标签) 体素个数.
    #[inline]
    pub fn count_foreground(&self) -> usize {
        self.count_where(|p| is_foreground(*p))
    }

    /// 掩膜是否为全背景?
    #[inline]
    pub fn is_background(&self) -> bool {
        self.data.iter().copied().all(is_background)
    }

    /// 收集所有前景体素对应的 `(z, H, W)` 下标. 结果按行优先存储.
    pub fn foreground_pos(&self) -> Vec<Idx3d> {
        self.data
            .indexed_iter()
            .filter_map(|(pos, pixel)| is_foreground(*pixel).then_some(pos))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Geometry, MrMask, MrScan};
    use crate::error::SegError;
    use ndarray::Array3;

    fn ramp() -> MrScan {
        // (z, h, w) = (2, 3, 4)
        let data = Array3::from_shape_fn((2, 3, 4), |(z, h, w)| (z * 100 + h * 10 + w) as f32);
        MrScan::with_unit_geometry(data)
    }

    #[test]
    fn test_intensity_at_axis_order() {
        let g = ramp();
        assert_eq!(g.dims(), [4, 3, 2]);
        // (x, y, z) = (w, h, z)
        assert_eq!(g.intensity_at([3, 2, 1]).unwrap(), 123.0);
        assert_eq!(g.intensity_at([0, 0, 0]).unwrap(), 0.0);
    }

    #[test]
    fn test_intensity_at_out_of_bounds() {
        let g = ramp();
        for bad in [[4, 0, 0], [0, 3, 0], [0, 0, 2], [-1, 0, 0]] {
            assert_eq!(
                g.intensity_at(bad).unwrap_err(),
                SegError::OutOfBounds {
                    index: bad,
                    dims: [4, 3, 2]
                }
            );
        }
    }

    #[test]
    fn test_flatten_round_trip() {
        let g = ramp();
        for (flat, (pos, _)) in g.data().indexed_iter().enumerate() {
            assert_eq!(g.flatten_idx(pos), flat);
            assert_eq!(g.unflatten_idx(flat), pos);
        }
    }

    #[test]
    fn test_diamond_neighbours_at_corner() {
        let g = ramp();
        let mut n = g.diamond_neighbours((0, 0, 0));
        n.sort();
        assert_eq!(n, vec![(0, 0, 1), (0, 1, 0), (1, 0, 0)]);
        assert_eq!(g.diamond_neighbours((1, 1, 1)).len(), 5);
    }

    #[test]
    fn test_mask_statistics() {
        let mut data = Array3::<u8>::zeros((3, 3, 3));
        data[(1, 1, 1)] = 1;
        data[(0, 2, 1)] = 2;
        let m = MrMask::new(data, Geometry::default());
        assert_eq!(m.count(1), 1);
        assert_eq!(m.count_foreground(), 2);
        assert_eq!(m.foreground_pos(), vec![(0, 2, 1), (1, 1, 1)]);
        assert!(!m.is_background());
    }

    #[test]
    fn test_shape_mismatch() {
        let a = MrMask::with_unit_geometry(Array3::zeros((2, 2, 2)));
        let b = MrMask::with_unit_geometry(Array3::zeros((2, 2, 3)));
        assert_eq!(
            a.ensure_same_shape(&b).unwrap_err(),
            SegError::DimensionMismatch {
                left: [2, 2, 2],
                right: [3, 2, 2]
            }
        );
    }
}
