//! 立方邻域平滑滤波.
//!
//! 邻域为 `(2r + 1)^3` 的立方体, 在网格边界处截断 (只统计网格内的体素).

use itertools::iproduct;
use ndarray::{Array3, ArrayView3, Zip};

use crate::data::{as_f64, MrScan, Scalar, VoxelGrid};
use crate::Idx3d;

/// 截断到网格内部的立方邻域.
fn neighbourhood<'a, T: Copy>(
    data: &'a ArrayView3<'a, T>,
    (z, h, w): Idx3d,
    r: usize,
) -> impl Iterator<Item = T> + 'a {
    let (zl, hl, wl) = data.dim();
    let span = move |c: usize, len: usize| c.saturating_sub(r)..(c + r + 1).min(len);
    iproduct!(span(z, zl), span(h, hl), span(w, wl)).map(move |pos| data[pos])
}

/// 中值: 邻域排序后第 `n / 2` 个元素 (偶数个时取上中位数).
fn median_of<T: Scalar>(mut values: Vec<T>) -> T {
    let mid = values.len() / 2;
    values.select_nth_unstable_by(mid, |a, b| as_f64(*a).total_cmp(&as_f64(*b)));
    values[mid]
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        fn map_indexed<T, U, F>(data: &ArrayView3<'_, T>, f: F) -> Array3<U>
        where
            T: Sync,
            U: Send,
            F: Fn(Idx3d) -> U + Sync + Send,
        {
            Zip::indexed(data).par_map_collect(|pos, _| f(pos))
        }
    } else {
        fn map_indexed<T, U, F>(data: &ArrayView3<'_, T>, f: F) -> Array3<U>
        where
            F: Fn(Idx3d) -> U,
        {
            Zip::indexed(data).map_collect(|pos, _| f(pos))
        }
    }
}

fn mean_of<T: Scalar, I: Iterator<Item = T>>(it: I) -> f32 {
    let (sum, n) = it.fold((0.0, 0usize), |(s, n), v| (s + as_f64(v), n + 1));
    (sum / n as f64) as f32
}

/// 中值滤波. `radius` 为 0 时返回输入的拷贝.
///
/// 输出中的每个值都取自输入, 因此标签图像也可以直接使用.
pub fn median_filter<T: Scalar>(grid: &VoxelGrid<T>, radius: usize) -> VoxelGrid<T> {
    let data = grid.data();
    if radius == 0 {
        return grid.with_data(data.to_owned());
    }
    let f = |pos: Idx3d| median_of(neighbourhood(&data, pos, radius).collect());
    grid.with_data(map_indexed(&data, f))
}

/// 均值滤波, 结果为 `f32`. `radius` 为 0 时只做类型转换.
pub fn mean_filter<T: Scalar>(grid: &VoxelGrid<T>, radius: usize) -> MrScan {
    let data = grid.data();
    let f = |pos: Idx3d| mean_of(neighbourhood(&data, pos, radius));
    grid.with_data(map_indexed(&data, f))
}

#[cfg(test)]
mod tests {
    use super::{mean_filter, median_filter};
    use crate::data::{MrMask, MrScan};
    use approx::assert_relative_eq;
    use ndarray::Array3;

    #[test]
    fn test_radius_zero() {
        let scan = MrScan::with_unit_geometry(Array3::from_shape_fn((2, 3, 4), |(z, h, w)| {
            (z + h * w) as f32
        }));
        assert_eq!(median_filter(&scan, 0), scan);
        assert_eq!(mean_filter(&scan, 0), scan);
    }

    #[test]
    fn test_median_removes_salt() {
        let mut data = Array3::<u8>::zeros((5, 5, 5));
        data[(2, 2, 2)] = 1;
        data[(0, 0, 0)] = 1;
        let m = MrMask::with_unit_geometry(data);
        assert!(median_filter(&m, 1).is_background());
    }

    #[test]
    fn test_median_upper_middle_at_corner() {
        // 角点邻域为 2x2x2, 其中 4 个 1 与 4 个 0, 取上中位数.
        let data = Array3::from_shape_fn((3, 3, 3), |(z, _, _)| u8::from(z == 0));
        let m = MrMask::with_unit_geometry(data);
        let r = median_filter(&m, 1);
        assert_eq!(r[(0, 0, 0)], 1);
        assert_eq!(r[(2, 2, 2)], 0);
    }

    #[test]
    fn test_mean_border_clipped() {
        let scan = MrScan::with_unit_geometry(Array3::from_shape_fn((1, 1, 4), |(_, _, w)| {
            w as f32
        }));
        let r = mean_filter(&scan, 1);
        assert_relative_eq!(r[(0, 0, 0)], 0.5);
        assert_relative_eq!(r[(0, 0, 1)], 1.0);
        assert_relative_eq!(r[(0, 0, 3)], 2.5);
    }
}
