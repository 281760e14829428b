//! 分割流程编排.
//!
//! 依次运行阈值分割, 区域生长, 闭运算, 子区域采样, 以及 (存在参考分割时) Dice 评估.
//! 每个阶段都有独立的结果, 某个阶段失败只会记录一条警告, 不会中断其它阶段.
//! 闭运算依赖区域生长的结果, 因此区域生长失败时闭运算也会失败.

use log::{debug, warn};

use crate::config::PipelineConfig;
use crate::data::{MrMask, Scalar, VoxelGrid};
use crate::error::SegResult;
use crate::metrics::dice;
use crate::morph::closing;
use crate::sample::{sample_region, RegionSample};
use crate::segment::{binary_threshold, confidence_connected_with_report, GrowthReport};

/// 各个掩膜与参考分割之间的 Dice 系数.
#[derive(Clone, Debug, PartialEq)]
pub struct DiceScores {
    /// 阈值分割.
    pub threshold: SegResult<f64>,
    /// 区域生长.
    pub growth: SegResult<f64>,
    /// 闭运算之后的区域生长.
    pub cleaned: SegResult<f64>,
}

/// 一次分割流程的全部结果.
#[derive(Clone, Debug)]
pub struct PipelineReport<T> {
    /// 阈值分割掩膜.
    pub threshold: SegResult<MrMask>,

    /// 区域生长掩膜.
    pub growth: SegResult<MrMask>,

    /// 区域生长的运行概况. 区域生长失败时为 `None`.
    pub growth_report: Option<GrowthReport>,

    /// 闭运算后的区域生长掩膜.
    pub cleaned: SegResult<MrMask>,

    /// 强度子区域采样.
    pub sample: SegResult<RegionSample<T>>,

    /// Dice 评估. 不存在参考分割时为 `None`.
    pub dice: Option<DiceScores>,
}

impl<T> PipelineReport<T> {
    /// 所有阶段是否都成功?
    pub fn is_complete(&self) -> bool {
        let dice_ok = self.dice.as_ref().map_or(true, |d| {
            d.threshold.is_ok() && d.growth.is_ok() && d.cleaned.is_ok()
        });
        self.threshold.is_ok()
            && self.growth.is_ok()
            && self.cleaned.is_ok()
            && self.sample.is_ok()
            && dice_ok
    }
}

/// 失败时记录一条警告, 原样返回结果.
#[inline]
fn logged<R>(stage: &str, r: SegResult<R>) -> SegResult<R> {
    if let Err(e) = &r {
        warn!("stage `{stage}` failed: {e}");
    }
    r
}

/// 评估 `mask` 与参考分割. `mask` 本身失败时直接传递错误.
fn score(stage: &str, mask: &SegResult<MrMask>, reference: &MrMask) -> SegResult<f64> {
    let r = mask.as_ref().map_err(Clone::clone).and_then(|m| dice(m, reference));
    match &r {
        Ok(d) => debug!("dice of `{stage}`: {d:.4}"),
        Err(e) => warn!("dice of `{stage}` unavailable: {e}"),
    }
    r
}

/// 按照 `config` 对 `scan` 运行完整的分割流程.
///
/// `reference` 为可选的参考分割, 其形状应与 `scan` 一致
/// (可先使用 [`crate::data::resample::resample_nearest`] 对齐).
pub fn run_pipeline<T: Scalar>(
    scan: &VoxelGrid<T>,
    reference: Option<&MrMask>,
    config: &PipelineConfig,
) -> PipelineReport<T> {
    let threshold = logged(
        "threshold",
        config
            .threshold_spec()
            .map(|spec| binary_threshold(scan, &spec)),
    );

    let grown = confidence_connected_with_report(scan, &config.confidence_params());
    let (growth, growth_report) = match logged("growth", grown) {
        Ok((mask, report)) => (Ok(mask), Some(report)),
        Err(e) => (Err(e), None),
    };

    let cleaned = match &growth {
        Ok(mask) => logged(
            "closing",
            config.structuring_element().map(|e| closing(mask, &e)),
        ),
        Err(e) => Err(e.clone()),
    };

    let sample = logged(
        "sample",
        sample_region(scan, config.sample_point, config.sample_width),
    );

    let dice = reference.map(|reference| DiceScores {
        threshold: score("threshold", &threshold, reference),
        growth: score("growth", &growth, reference),
        cleaned: score("cleaned", &cleaned, reference),
    });

    PipelineReport {
        threshold,
        growth,
        growth_report,
        cleaned,
        sample,
        dice,
    }
}
