//! 分割流程配置.

use crate::consts::DEFAULT_INITIAL_RADIUS;
use crate::error::{SegError, SegResult};
use crate::morph::{Shape, StructuringElement};
use crate::segment::{ConfidenceParams, ThresholdSpec};
use crate::{Point3, VoxelIndex};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
#[inline]
fn default_initial_radius() -> usize {
    DEFAULT_INITIAL_RADIUS
}

/// 一次完整分割流程的全部参数.
///
/// 所有常量都来自该结构, 流程内部不存在硬编码参数.
/// 启用 `serde` feature 时可以直接从 JSON 等格式反序列化.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PipelineConfig {
    /// 区域生长种子, `(x, y, z)` 顺序.
    pub seeds: Vec<VoxelIndex>,

    /// 阈值分割的闭区间 `[lower, upper]`.
    pub threshold_bounds: [f64; 2],

    /// 区域生长标准差倍率.
    pub multiplier: f64,

    /// 区域生长迭代轮数.
    pub iterations: u32,

    /// 闭运算结构元素半径 (各向同性).
    pub structuring_radius: usize,

    /// 闭运算结构元素形状, 默认为球形.
    #[cfg_attr(feature = "serde", serde(default))]
    pub structuring_shape: Shape,

    /// 采样中心的物理坐标 (LPS).
    pub sample_point: Point3,

    /// 采样立方体的物理边长.
    pub sample_width: f64,

    /// 区域生长初始统计邻域半径.
    #[cfg_attr(feature = "serde", serde(default = "default_initial_radius"))]
    pub initial_radius: usize,
}

impl PipelineConfig {
    /// 检查所有参数. 返回第一个不合法的参数对应的错误.
    ///
    /// # 注意
    ///
    /// 种子是否越界取决于具体的扫描, 这里不做检查.
    pub fn validate(&self) -> SegResult<()> {
        self.threshold_spec()?;
        self.confidence_params().validate()?;
        self.structuring_element()?;
        if !self.sample_point.iter().all(|v| v.is_finite()) {
            return Err(SegError::invalid("sample_point", self.sample_point));
        }
        if !(self.sample_width.is_finite() && self.sample_width > 0.0) {
            return Err(SegError::invalid("sample_width", self.sample_width));
        }
        Ok(())
    }

    /// 阈值分割参数, 内外标签为前景/背景.
    #[inline]
    pub fn threshold_spec(&self) -> SegResult<ThresholdSpec> {
        let [lower, upper] = self.threshold_bounds;
        ThresholdSpec::binary(lower, upper)
    }

    /// 区域生长参数.
    pub fn confidence_params(&self) -> ConfidenceParams {
        ConfidenceParams::new(self.seeds.clone(), self.iterations, self.multiplier)
            .with_initial_radius(self.initial_radius)
    }

    /// 闭运算结构元素.
    #[inline]
    pub fn structuring_element(&self) -> SegResult<StructuringElement> {
        StructuringElement::new(self.structuring_shape, [self.structuring_radius; 3])
    }
}

#[cfg(test)]
mod tests {
    use super::PipelineConfig;
    use crate::error::SegError;
    use crate::morph::Shape;

    fn sample_config() -> PipelineConfig {
        PipelineConfig {
            seeds: vec![[5, 5, 5]],
            threshold_bounds: [90.0, 110.0],
            multiplier: 2.5,
            iterations: 6,
            structuring_radius: 1,
            structuring_shape: Shape::Ball,
            sample_point: [5.0, 5.0, 5.0],
            sample_width: 4.0,
            initial_radius: 1,
        }
    }

    #[test]
    fn test_validate_ok() {
        let c = sample_config();
        assert!(c.validate().is_ok());
        let p = c.confidence_params();
        assert_eq!((p.iterations, p.multiplier, p.initial_radius), (6, 2.5, 1));
        assert_eq!(c.structuring_element().unwrap().offsets().len(), 7);
    }

    #[test]
    fn test_validate_first_invalid() {
        let mut c = sample_config();
        c.sample_width = 0.0;
        c.structuring_radius = 0;
        assert!(matches!(
            c.validate().unwrap_err(),
            SegError::InvalidParameter {
                name: "structuring_radius",
                ..
            }
        ));

        c.threshold_bounds = [3.0, 1.0];
        assert!(matches!(
            c.validate().unwrap_err(),
            SegError::InvalidParameter {
                name: "threshold_bounds",
                ..
            }
        ));
    }

    #[test]
    fn test_validate_sample_point() {
        let mut c = sample_config();
        c.sample_point = [5.0, f64::NAN, 5.0];
        assert!(matches!(
            c.validate().unwrap_err(),
            SegError::InvalidParameter {
                name: "sample_point",
                ..
            }
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_defaults() {
        let json = r#"{
            "seeds": [[3, 4, 5]],
            "threshold_bounds": [80.0, 98.0],
            "multiplier": 2.5,
            "iterations": 5,
            "structuring_radius": 2,
            "sample_point": [1.5, -2.0, 30.0],
            "sample_width": 6.0
        }"#;
        let c: PipelineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.initial_radius, 1);
        assert_eq!(c.structuring_shape, Shape::Ball);
        assert_eq!(c.seeds, vec![[3, 4, 5]]);
        assert!(c.validate().is_ok());
    }
}
