//! 强度预处理: 线性拉伸, 窗口化与平滑.
//!
//! 所有滤波器都返回新分配的网格, 空间元信息与输入一致.

use crate::data::{as_f64, MrScan, Scalar, VoxelGrid};
use crate::error::{SegError, SegResult};

mod smooth;
mod window;

pub use smooth::{mean_filter, median_filter};
pub use window::IntensityWindow;

/// 将 `grid` 的强度范围 `[min, max]` 线性映射到 `[out_min, out_max]`.
///
/// `min` 和 `max` 只统计有限值. 如果图像是常数 (或不存在有限值),
/// 所有有限值都映射到 `out_min`. 非有限值保持原样.
///
/// 当 `out_min > out_max` 或任一端点不是有限值时返回 `InvalidParameter`.
pub fn rescale_intensity<T: Scalar>(
    grid: &VoxelGrid<T>,
    out_min: f64,
    out_max: f64,
) -> SegResult<MrScan> {
    if !(out_min.is_finite() && out_max.is_finite() && out_min <= out_max) {
        return Err(SegError::invalid("output_range", (out_min, out_max)));
    }

    let (lo, hi) = grid
        .data()
        .iter()
        .map(|&v| as_f64(v))
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

    let scale = if hi > lo {
        (out_max - out_min) / (hi - lo)
    } else {
        0.0
    };
    Ok(grid.map(|&v| {
        let v = as_f64(v);
        if v.is_finite() {
            (out_min + (v - lo) * scale) as f32
        } else {
            v as f32
        }
    }))
}

/// 以 `window` 对 `grid` 的每个体素做窗口化.
#[inline]
pub fn window_intensity<T: Scalar>(grid: &VoxelGrid<T>, window: &IntensityWindow) -> MrScan {
    grid.map(|&v| window.eval(as_f64(v)) as f32)
}

#[cfg(test)]
mod tests {
    use super::{rescale_intensity, window_intensity, IntensityWindow};
    use crate::data::{MrMask, MrScan};
    use crate::error::SegError;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    #[test]
    fn test_rescale() {
        let scan = MrScan::with_unit_geometry(Array3::from_shape_fn((1, 2, 3), |(_, h, w)| {
            (h * 3 + w) as f32 * 2.0 - 4.0
        }));
        let r = rescale_intensity(&scan, 0.0, 255.0).unwrap();
        assert_eq!(r.geometry(), scan.geometry());
        assert_eq!(r[(0, 0, 0)], 0.0);
        assert_eq!(r[(0, 1, 2)], 255.0);
        assert_relative_eq!(r[(0, 0, 1)], 51.0);
    }

    #[test]
    fn test_rescale_constant_and_invalid() {
        let m = MrMask::with_unit_geometry(Array3::from_elem((2, 2, 2), 9));
        let r = rescale_intensity(&m, -1.0, 1.0).unwrap();
        assert!(r.data().iter().all(|&v| v == -1.0));

        assert!(matches!(
            rescale_intensity(&m, 1.0, 0.0).unwrap_err(),
            SegError::InvalidParameter {
                name: "output_range",
                ..
            }
        ));
    }

    #[test]
    fn test_window_intensity() {
        let scan = MrScan::with_unit_geometry(Array3::from_shape_fn((1, 1, 5), |(_, _, w)| {
            w as f32 * 10.0
        }));
        let w = IntensityWindow::new(10.0, 30.0, 0.0, 1.0).unwrap();
        let r = window_intensity(&scan, &w);
        let v: Vec<f32> = r.data().iter().copied().collect();
        assert_eq!(v, vec![0.0, 0.0, 0.5, 1.0, 1.0]);
    }
}
