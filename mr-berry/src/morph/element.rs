//! 结构元素.

use crate::error::{SegError, SegResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 带符号的 `(z, H, W)` 偏移.
pub type Offset3d = (isize, isize, isize);

/// 结构元素形状.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    /// 椭球: 满足 `Σ (d_i / r_i)^2 <= 1` 的偏移.
    #[default]
    Ball,

    /// 长方体: 每个分量满足 `|d_i| <= r_i` 的偏移.
    Box,

    /// 十字: 至多一个分量非零的偏移.
    Cross,
}

/// 形态学操作使用的结构元素. 所有形状都关于原点对称.
///
/// 偏移在构造时预先计算.
#[derive(Clone, Debug, PartialEq)]
pub struct StructuringElement {
    shape: Shape,
    radius: [usize; 3],
    offsets: Vec<Offset3d>,
}

impl StructuringElement {
    /// 构建结构元素. `radius` 按照 `(x, y, z)` 顺序给出, 每个分量至少为 1.
    pub fn new(shape: Shape, radius: [usize; 3]) -> SegResult<Self> {
        if radius.iter().any(|&r| r < 1) {
            return Err(SegError::invalid("structuring_radius", radius));
        }
        let [rx, ry, rz] = radius.map(|r| r as isize);

        let inside = |(dz, dh, dw): Offset3d| -> bool {
            match shape {
                Shape::Box => true,
                Shape::Cross => [dz, dh, dw].iter().filter(|&&d| d != 0).count() <= 1,
                Shape::Ball => {
                    let ratio = |d: isize, r: isize| (d as f64 / r as f64).powi(2);
                    ratio(dz, rz) + ratio(dh, ry) + ratio(dw, rx) <= 1.0
                }
            }
        };

        let offsets = itertools::iproduct!(-rz..=rz, -ry..=ry, -rx..=rx)
            .filter(|&off| inside(off))
            .collect();
        Ok(Self {
            shape,
            radius,
            offsets,
        })
    }

    /// 各向同性的球形结构元素.
    #[inline]
    pub fn ball(radius: usize) -> SegResult<Self> {
        Self::new(Shape::Ball, [radius; 3])
    }

    /// 形状.
    #[inline]
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// 半径, `(x, y, z)` 顺序.
    #[inline]
    pub fn radius(&self) -> [usize; 3] {
        self.radius
    }

    /// 所有 `(z, H, W)` 偏移, 包含原点.
    #[inline]
    pub fn offsets(&self) -> &[Offset3d] {
        &self.offsets
    }
}

#[cfg(test)]
mod tests {
    use super::{Shape, StructuringElement};
    use crate::error::SegError;

    #[test]
    fn test_invalid_radius() {
        assert_eq!(
            StructuringElement::new(Shape::Box, [1, 0, 2]).unwrap_err(),
            SegError::InvalidParameter {
                name: "structuring_radius",
                value: "[1, 0, 2]".to_string()
            }
        );
    }

    #[test]
    fn test_offset_counts() {
        assert_eq!(StructuringElement::ball(1).unwrap().offsets().len(), 7);
        // 1 + 6 + 12 + 8 + 6
        assert_eq!(StructuringElement::ball(2).unwrap().offsets().len(), 33);
        let b = StructuringElement::new(Shape::Box, [1, 1, 1]).unwrap();
        assert_eq!(b.offsets().len(), 27);
        let c = StructuringElement::new(Shape::Cross, [2, 1, 1]).unwrap();
        assert_eq!(c.offsets().len(), 1 + 4 + 2 + 2);
    }

    #[test]
    fn test_anisotropic_axis_order() {
        let e = StructuringElement::new(Shape::Box, [3, 1, 1]).unwrap();
        // x 对应 W 分量.
        assert!(e.offsets().contains(&(0, 0, 3)));
        assert!(!e.offsets().contains(&(3, 0, 0)));
    }

    #[test]
    fn test_symmetric() {
        for shape in [Shape::Ball, Shape::Box, Shape::Cross] {
            let e = StructuringElement::new(shape, [2, 1, 3]).unwrap();
            for &(z, h, w) in e.offsets() {
                assert!(e.offsets().contains(&(-z, -h, -w)));
            }
            assert!(e.offsets().contains(&(0, 0, 0)));
        }
    }
}
