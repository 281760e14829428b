use crate::error::{SegError, SegResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 强度窗口. 将窗口 `[window_min, window_max]` 线性映射到输出区间
/// `[output_min, output_max]`, 窗口之外的值饱和到输出区间端点.
///
/// 该窗口是只读的. 若要修改窗口参数, 你应该创建新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntensityWindow {
    window_min: f64,
    window_max: f64,
    output_min: f64,
    output_max: f64,
}

impl IntensityWindow {
    /// 构建强度窗口.
    ///
    /// 窗口必须满足 `window_min < window_max`, 所有参数必须是有限值,
    /// 否则返回 `InvalidParameter`. 输出区间允许反转 (`output_min > output_max`).
    pub fn new(
        window_min: f64,
        window_max: f64,
        output_min: f64,
        output_max: f64,
    ) -> SegResult<Self> {
        if !(window_min.is_finite() && window_max.is_finite() && window_min < window_max) {
            return Err(SegError::invalid("window", (window_min, window_max)));
        }
        if !(output_min.is_finite() && output_max.is_finite()) {
            return Err(SegError::invalid("output_range", (output_min, output_max)));
        }
        Ok(Self {
            window_min,
            window_max,
            output_min,
            output_max,
        })
    }

    /// 以窗位 (window level) 和窗宽 (window width) 构建强度窗口.
    #[inline]
    pub fn from_level_width(
        level: f64,
        width: f64,
        output_min: f64,
        output_max: f64,
    ) -> SegResult<Self> {
        Self::new(level - width / 2.0, level + width / 2.0, output_min, output_max)
    }

    /// 窗下限.
    #[inline]
    pub fn lower_bound(&self) -> f64 {
        self.window_min
    }

    /// 窗上限.
    #[inline]
    pub fn upper_bound(&self) -> f64 {
        self.window_max
    }

    /// 窗位.
    #[inline]
    pub fn level(&self) -> f64 {
        (self.window_min + self.window_max) / 2.0
    }

    /// 窗宽.
    #[inline]
    pub fn width(&self) -> f64 {
        self.window_max - self.window_min
    }

    /// 求 `v` 在当前窗口设置下的输出值. `NaN` 保持为 `NaN`.
    pub fn eval(&self, v: f64) -> f64 {
        if v.is_nan() {
            v
        } else if v <= self.window_min {
            self.output_min
        } else if v >= self.window_max {
            self.output_max
        } else {
            let t = (v - self.window_min) / self.width();
            self.output_min + t * (self.output_max - self.output_min)
        }
    }

    /// 求 `v` 在当前窗口下对应的灰度图像素整数值 (0 <= value <= 255),
    /// 忽略输出区间设置. 如果 `v` 无意义 (如 inf, NaN), 则返回 `None`.
    pub fn eval_u8(&self, v: f64) -> Option<u8> {
        if !v.is_finite() {
            return None;
        }
        if v <= self.window_min {
            Some(u8::MIN)
        } else if v >= self.window_max {
            Some(u8::MAX)
        } else {
            // 255, not 256.
            Some(((v - self.window_min) / self.width() * 255.0) as u8)
        }
    }
}
