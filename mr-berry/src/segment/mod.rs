//! 分割算法: 二值阈值与置信连通区域生长.

mod confidence;
mod memento;
mod sweep;
mod threshold;

pub use confidence::{
    confidence_connected, confidence_connected_with_report, ConfidenceParams, GrowthReport,
};
pub use memento::RunningStats;
pub use sweep::{sweep, sweep_multiplier};
pub use threshold::{binary_threshold, threshold, ThresholdSpec};
