//! 分割结果评估.

mod overlap;

pub use overlap::{dice, OverlapMeasures};
