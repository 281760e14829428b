//! 参数扫描.
//!
//! 扫描只负责对每个参数取值计算结果, 不做任何渲染, 结果按照输入顺序返回.

use super::confidence::{confidence_connected, ConfidenceParams};
use crate::data::{MrMask, Scalar, VoxelGrid};
use crate::error::SegResult;

/// 对 `values` 中的每个参数调用 `f`, 返回 `(参数, 结果)` 列表.
#[inline]
pub fn sweep<P, R, I, F>(values: I, mut f: F) -> Vec<(P, R)>
where
    P: Clone,
    I: IntoIterator<Item = P>,
    F: FnMut(P) -> R,
{
    values
        .into_iter()
        .map(|p| {
            let r = f(p.clone());
            (p, r)
        })
        .collect()
}

/// 以不同的标准差倍率重复运行区域生长. 其余参数取自 `params`.
///
/// 每个倍率的结果独立, 某个倍率失败不影响其它倍率.
pub fn sweep_multiplier<T: Scalar>(
    grid: &VoxelGrid<T>,
    params: &ConfidenceParams,
    multipliers: &[f64],
) -> Vec<(f64, SegResult<MrMask>)> {
    sweep(multipliers.iter().copied(), |m| {
        confidence_connected(grid, &params.clone().with_multiplier(m))
    })
}
