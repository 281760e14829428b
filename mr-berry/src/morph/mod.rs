//! 3D 二值形态学操作.
//!
//! 所有操作都把任何非零标签视为前景, 输出只包含 [`MASK_FOREGROUND`] 和
//! [`MASK_BACKGROUND`]. 网格之外的体素在膨胀时视为背景, 在腐蚀时视为前景.
//! 由于结构元素关于原点对称, 这两种操作在网格上构成伴随对,
//! 因此闭运算与开运算都是幂等的.

use ndarray::{Array3, ArrayView3};

use crate::consts::label::*;
use crate::data::MrMask;
use crate::Idx3d;

mod element;

pub use element::{Offset3d, Shape, StructuringElement};

/// 计算 `pos + off`. 结果越界时返回 `None`.
#[inline]
fn shift((z, h, w): Idx3d, (dz, dh, dw): Offset3d, (zl, hl, wl): Idx3d) -> Option<Idx3d> {
    let z = z.checked_add_signed(dz).filter(|&z| z < zl)?;
    let h = h.checked_add_signed(dh).filter(|&h| h < hl)?;
    let w = w.checked_add_signed(dw).filter(|&w| w < wl)?;
    Some((z, h, w))
}

#[inline]
fn to_label(fg: bool) -> u8 {
    if fg {
        MASK_FOREGROUND
    } else {
        MASK_BACKGROUND
    }
}

/// 存在一个网格内偏移落在前景上.
#[inline]
fn hit(data: &ArrayView3<'_, u8>, pos: Idx3d, element: &StructuringElement) -> bool {
    let shape = data.dim();
    element
        .offsets()
        .iter()
        .filter_map(|&off| shift(pos, off, shape))
        .any(|p| is_foreground(data[p]))
}

/// 所有网格内偏移都落在前景上.
#[inline]
fn fit(data: &ArrayView3<'_, u8>, pos: Idx3d, element: &StructuringElement) -> bool {
    let shape = data.dim();
    element
        .offsets()
        .iter()
        .filter_map(|&off| shift(pos, off, shape))
        .all(|p| is_foreground(data[p]))
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        fn apply<F>(mask: &MrMask, f: F) -> MrMask
        where
            F: Fn(&ArrayView3<'_, u8>, Idx3d) -> bool + Sync + Send,
        {
            let data = mask.data();
            let out: Array3<u8> =
                ndarray::Zip::indexed(&data).par_map_collect(|pos, _| to_label(f(&data, pos)));
            mask.with_data(out)
        }
    } else {
        fn apply<F>(mask: &MrMask, f: F) -> MrMask
        where
            F: Fn(&ArrayView3<'_, u8>, Idx3d) -> bool,
        {
            let data = mask.data();
            let out = Array3::from_shape_fn(data.dim(), |pos| to_label(f(&data, pos)));
            mask.with_data(out)
        }
    }
}

/// 二值膨胀. 网格之外视为背景.
pub fn dilate(mask: &MrMask, element: &StructuringElement) -> MrMask {
    apply(mask, |data, pos| hit(data, pos, element))
}

/// 二值腐蚀. 网格之外视为前景, 因此贴着网格边界的前景不会被腐蚀掉.
pub fn erode(mask: &MrMask, element: &StructuringElement) -> MrMask {
    apply(mask, |data, pos| fit(data, pos, element))
}

/// 形态学闭运算 (先膨胀, 后腐蚀), 用于填补区域生长结果中的小孔洞.
///
/// # 返回值
///
/// 与输入形状和空间元信息一致的新掩膜. 结果包含输入的全部前景, 且对同一结构元素幂等.
#[inline]
pub fn closing(mask: &MrMask, element: &StructuringElement) -> MrMask {
    erode(&dilate(mask, element), element)
}

/// 形态学开运算 (先腐蚀, 后膨胀).
#[inline]
pub fn opening(mask: &MrMask, element: &StructuringElement) -> MrMask {
    dilate(&erode(mask, element), element)
}

#[cfg(test)]
mod tests {
    use super::{closing, dilate, erode, opening, Shape, StructuringElement};
    use crate::data::MrMask;
    use ndarray::{s, Array3};

    fn scattered() -> MrMask {
        let data = Array3::from_shape_fn((7, 8, 9), |(z, h, w)| {
            u8::from((z * 7 + h * 13 + w * 29 + z * h * w) % 5 < 2)
        });
        MrMask::with_unit_geometry(data)
    }

    #[test]
    fn test_dilate_single_voxel() {
        let mut data = Array3::<u8>::zeros((5, 5, 5));
        data[(2, 2, 2)] = 3;
        let m = MrMask::with_unit_geometry(data);
        let e = StructuringElement::new(Shape::Cross, [1, 1, 1]).unwrap();
        let d = dilate(&m, &e);
        assert_eq!(d.count(1), 7);
        assert_eq!(d.count(3), 0);
        assert_eq!(erode(&d, &e).foreground_pos(), vec![(2, 2, 2)]);
    }

    #[test]
    fn test_border_handling() {
        let full = MrMask::with_unit_geometry(Array3::from_elem((3, 4, 5), 1));
        let e = StructuringElement::ball(2).unwrap();
        assert_eq!(erode(&full, &e), full);

        let empty = MrMask::with_unit_geometry(Array3::zeros((3, 4, 5)));
        assert_eq!(dilate(&empty, &e), empty);
    }

    #[test]
    fn test_closing_fills_hole() {
        let mut data = Array3::<u8>::zeros((9, 9, 9));
        data.slice_mut(s![2..7, 2..7, 2..7]).fill(1);
        data[(4, 4, 4)] = 0;
        let m = MrMask::with_unit_geometry(data);
        let c = closing(&m, &StructuringElement::ball(1).unwrap());
        assert_eq!(c[(4, 4, 4)], 1);
        assert_eq!(c.count_foreground(), 125);
    }

    #[test]
    fn test_closing_extensive_and_idempotent() {
        let m = scattered();
        for shape in [Shape::Ball, Shape::Box, Shape::Cross] {
            let e = StructuringElement::new(shape, [1, 2, 1]).unwrap();
            let once = closing(&m, &e);
            for pos in m.foreground_pos() {
                assert_eq!(once[pos], 1);
            }
            assert_eq!(closing(&once, &e), once, "{shape:?}");
        }
    }

    #[test]
    fn test_opening_idempotent() {
        let m = scattered();
        let e = StructuringElement::ball(1).unwrap();
        let once = opening(&m, &e);
        assert_eq!(opening(&once, &e), once);
        for pos in once.foreground_pos() {
            assert_eq!(m[pos], 1);
        }
    }
}
