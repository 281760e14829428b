//! 最近邻重采样.

use ndarray::Array3;

use super::VoxelGrid;

/// 将 `source` 按最近邻规则重采样到 `reference` 的网格上.
///
/// 返回值的形状和空间元信息与 `reference` 一致. 对于每个输出体素,
/// 先计算其物理坐标, 再映射回 `source` 的体素索引 (取整规则同
/// [`super::Geometry::physical_to_index`]). 落在 `source` 之外的体素取 `T::default()`.
///
/// 一般用于把参考分割对齐到 MRI 扫描网格, 然后再做重叠评估.
pub fn resample_nearest<T, U>(source: &VoxelGrid<T>, reference: &VoxelGrid<U>) -> VoxelGrid<T>
where
    T: Copy + Default,
{
    let data = Array3::from_shape_fn(reference.shape(), |(z, h, w)| {
        let point = reference.index_to_physical([w as i64, h as i64, z as i64]);
        source
            .intensity_at(source.physical_to_index(point))
            .unwrap_or_default()
    });
    VoxelGrid::new(data, *reference.geometry())
}

#[cfg(test)]
mod tests {
    use super::resample_nearest;
    use crate::data::{Geometry, MrMask, MrScan};
    use ndarray::Array3;

    #[test]
    fn test_same_geometry_is_identity() {
        let data = Array3::from_shape_fn((3, 4, 5), |(z, h, w)| ((z + h + w) % 2) as u8);
        let m = MrMask::with_unit_geometry(data);
        let r = resample_nearest(&m, &m);
        assert_eq!(r, m);
    }

    #[test]
    fn test_coarse_to_fine() {
        // 2x2x2 粗网格, 间距为 2; 细网格间距为 1, 形状 4x4x4.
        let coarse_data = Array3::from_shape_fn((2, 2, 2), |(z, _, _)| z as u8 + 1);
        let coarse = MrMask::new(coarse_data, Geometry::with_spacing([2.0; 3]).unwrap());
        let fine = MrScan::from_elem((4, 4, 4), 0.0, Geometry::default());

        let r = resample_nearest(&coarse, &fine);
        assert_eq!(r.shape(), (4, 4, 4));
        assert_eq!(r.geometry(), fine.geometry());
        // fine z = 0 -> coarse 0; z = 1 -> round(0.5) = 1; z = 2 -> 1; z = 3 -> round(1.5) = 2 (越界).
        assert_eq!(r[(0, 0, 0)], 1);
        assert_eq!(r[(1, 0, 0)], 2);
        assert_eq!(r[(2, 0, 0)], 2);
        assert_eq!(r[(3, 0, 0)], 0);
    }
}
