//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{Idx3d, Point3, VoxelIndex};

pub use crate::data::io::{home_dataset_dir, home_dataset_dir_with};
pub use crate::data::resample::resample_nearest;
pub use crate::data::{Geometry, MrMask, MrScan, OpenGridError, VoxelGrid};

pub use crate::consts::label::{MASK_BACKGROUND, MASK_FOREGROUND};
pub use crate::consts::ElemType;

pub use crate::error::{SegError, SegResult};

pub use crate::filter::{rescale_intensity, window_intensity, IntensityWindow};
pub use crate::metrics::{dice, OverlapMeasures};
pub use crate::morph::{closing, Shape, StructuringElement};
pub use crate::sample::{sample_region, IntensitySummary, RegionSample};
pub use crate::segment::{
    binary_threshold, confidence_connected, confidence_connected_with_report, sweep_multiplier,
    ConfidenceParams, GrowthReport, ThresholdSpec,
};

pub use crate::config::PipelineConfig;
pub use crate::pipeline::{run_pipeline, DiceScores, PipelineReport};
