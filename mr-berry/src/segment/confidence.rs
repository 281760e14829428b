//! 置信连通 (confidence-connected) 区域生长.
//!
//! 算法流程依次为:
//!
//! 1. 以去重后的种子作为初始区域. 初始均值 μ 与标准差 σ 在所有种子的立方邻域
//!   (半径为 `initial_radius`, 截断到网格内部) 的并集上计算.
//! 2. 接受区间为 `[μ - h, μ + h]`, 其中 `h = max(m * σ, ε)`.
//!   `ε` 见 [`MIN_HALF_BAND_RATIO`], 用于 σ 为零 (如单个种子) 的情形.
//! 3. 每一轮迭代评估区域的全部 6-相邻边界体素. 所有候选都以本轮开始时的区间为准,
//!   全部评估完成后再统一并入区域, 然后在整个区域上重新计算 μ 与 σ.
//! 4. 迭代 `iterations` 轮后结束, 或某一轮没有新增体素时提前结束 (收敛).
//! 5. 如果最终区域只有种子本身, 返回 `EmptyRegion`.
//!
//! 连通性固定为 6-相邻 (面相邻).
//!
//! 若 μ 与 σ 保持不变, 增大 `m` 只会扩大区域. 但每轮都会重新计算 μ 与 σ,
//! 较大的 `m` 可能提前接纳偏离的体素, 使之后的区间偏移, 因此区域关于 `m`
//! 一般不具有单调性.

use std::collections::BTreeSet;

use itertools::iproduct;
use log::debug;

use super::memento::{GrowthMemento, RunningStats};
use crate::consts::label::*;
use crate::consts::{DEFAULT_INITIAL_RADIUS, MIN_HALF_BAND_RATIO};
use crate::data::{as_f64, MrMask, Scalar, VoxelGrid};
use crate::error::{SegError, SegResult};
use crate::{Idx3d, VoxelIndex};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 区域生长参数.
///
/// 该结构是一个普通的参数记录. 合法性在 [`confidence_connected`] 调用时检查.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConfidenceParams {
    /// 种子点, `(x, y, z)` 顺序. 至少一个, 且必须都在网格内.
    pub seeds: Vec<VoxelIndex>,

    /// 迭代轮数, 至少为 1.
    pub iterations: u32,

    /// 标准差倍率, 必须为正.
    pub multiplier: f64,

    /// 计算初始统计量时, 种子周围立方邻域的半径.
    pub initial_radius: usize,

    /// 区域内体素在输出掩膜中的标签, 不能为 [`MASK_BACKGROUND`].
    pub replace_value: u8,
}

impl ConfidenceParams {
    /// 使用默认初始邻域半径和前景标签构建参数.
    pub fn new(seeds: Vec<VoxelIndex>, iterations: u32, multiplier: f64) -> Self {
        Self {
            seeds,
            iterations,
            multiplier,
            initial_radius: DEFAULT_INITIAL_RADIUS,
            replace_value: MASK_FOREGROUND,
        }
    }

    /// 替换初始邻域半径.
    #[inline]
    pub fn with_initial_radius(mut self, radius: usize) -> Self {
        self.initial_radius = radius;
        self
    }

    /// 替换标准差倍率.
    #[inline]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// 检查除种子越界以外的参数合法性. 返回第一个不合法的参数.
    pub fn validate(&self) -> SegResult<()> {
        if self.seeds.is_empty() {
            return Err(SegError::invalid("seeds", &self.seeds));
        }
        if self.iterations == 0 {
            return Err(SegError::invalid("iterations", self.iterations));
        }
        if !(self.multiplier.is_finite() && self.multiplier > 0.0) {
            return Err(SegError::invalid("multiplier", self.multiplier));
        }
        if is_background(self.replace_value) {
            return Err(SegError::invalid("replace_value", self.replace_value));
        }
        Ok(())
    }
}

/// 区域生长的运行概况.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GrowthReport {
    /// 实际执行 (且有新增体素) 的迭代轮数.
    pub iterations: u32,

    /// 是否因某一轮没有新增体素而提前结束.
    pub converged: bool,

    /// 最终区域的体素值均值.
    pub mean: f64,

    /// 最终区域的体素值样本标准差.
    pub std: f64,

    /// 最终区域体素个数.
    pub voxels: usize,
}

/// 接受区间 `[lower, upper]`.
#[derive(Copy, Clone, Debug)]
struct AcceptBand {
    lower: f64,
    upper: f64,
}

impl AcceptBand {
    fn new(stats: &RunningStats, multiplier: f64) -> Self {
        let mean = stats.mean();
        let min_half = MIN_HALF_BAND_RATIO * mean.abs().max(1.0);
        let half = (multiplier * stats.std()).max(min_half);
        Self {
            lower: mean - half,
            upper: mean + half,
        }
    }

    #[inline]
    fn contains(&self, v: f64) -> bool {
        (self.lower..=self.upper).contains(&v)
    }
}

/// 以 `params` 对 `grid` 实施置信连通区域生长, 返回二值掩膜.
///
/// 区域内体素标记为 `params.replace_value`, 其余为 [`MASK_BACKGROUND`].
///
/// # 返回值
///
/// - 参数不合法时返回 `InvalidParameter`;
/// - 任一种子越界时返回 `OutOfBounds`;
/// - 区域没有在种子之外增长时返回 `EmptyRegion`.
#[inline]
pub fn confidence_connected<T: Scalar>(
    grid: &VoxelGrid<T>,
    params: &ConfidenceParams,
) -> SegResult<MrMask> {
    confidence_connected_with_report(grid, params).map(|(mask, _)| mask)
}

/// 同 [`confidence_connected`], 但同时返回运行概况.
pub fn confidence_connected_with_report<T: Scalar>(
    grid: &VoxelGrid<T>,
    params: &ConfidenceParams,
) -> SegResult<(MrMask, GrowthReport)> {
    params.validate()?;
    GrowImp::new(grid, params)?.grow()
}

/// `confidence_connected` 函数的实现细节.
struct GrowImp<'a, T> {
    grid: &'a VoxelGrid<T>,
    params: &'a ConfidenceParams,
    seeds: BTreeSet<Idx3d>,
}

impl<'a, T: Scalar> GrowImp<'a, T> {
    fn new(grid: &'a VoxelGrid<T>, params: &'a ConfidenceParams) -> SegResult<Self> {
        let seeds = params
            .seeds
            .iter()
            .map(|&s| grid.checked_idx(s))
            .collect::<SegResult<BTreeSet<_>>>()?;
        Ok(Self {
            grid,
            params,
            seeds,
        })
    }

    #[inline]
    fn value(&self, flat: usize) -> f64 {
        as_f64(self.grid[self.grid.unflatten_idx(flat)])
    }

    /// 种子立方邻域并集上的统计量.
    fn initial_stats(&self) -> RunningStats {
        let r = self.params.initial_radius;
        let (zl, hl, wl) = self.grid.shape();
        let span = |c: usize, len: usize| c.saturating_sub(r)..(c + r + 1).min(len);

        let mut region = BTreeSet::new();
        for &(z, h, w) in self.seeds.iter() {
            region.extend(iproduct!(span(z, zl), span(h, hl), span(w, wl)));
        }

        let mut stats = RunningStats::default();
        for pos in region {
            stats.push(as_f64(self.grid[pos]));
        }
        stats
    }

    /// 将 `flat` 的全部 6-邻域放入边界集.
    fn expand_boundary(&self, db: &mut GrowthMemento, flat: usize) {
        for neigh in self.grid.diamond_neighbours(self.grid.unflatten_idx(flat)) {
            db.push_boundary(self.grid.flatten_idx(neigh));
        }
    }

    fn grow(self) -> SegResult<(MrMask, GrowthReport)> {
        let mut db = GrowthMemento::new();
        for &seed in self.seeds.iter() {
            let flat = self.grid.flatten_idx(seed);
            db.include(flat, self.value(flat));
        }
        let seed_flats: Vec<usize> = db.members().to_vec();
        for flat in seed_flats {
            self.expand_boundary(&mut db, flat);
        }

        let mut band = AcceptBand::new(&self.initial_stats(), self.params.multiplier);
        let mut iterations = 0;
        let mut converged = false;

        for round in 0..self.params.iterations {
            // 本轮所有候选都只读取 `band`, 不读取本轮新增的体素.
            let candidates = db.boundary_snapshot();
            let accepted = self.accept(&candidates, &band);
            debug!(
                "confidence round {round}: band [{:.3}, {:.3}], {} candidates, {} accepted",
                band.lower,
                band.upper,
                candidates.len(),
                accepted.len()
            );
            if accepted.is_empty() {
                converged = true;
                break;
            }

            // 本轮合并
            for &flat in accepted.iter() {
                db.include(flat, self.value(flat));
            }
            for &flat in accepted.iter() {
                self.expand_boundary(&mut db, flat);
            }
            iterations += 1;
            band = AcceptBand::new(db.stats(), self.params.multiplier);
        }

        if db.len() == self.seeds.len() {
            return Err(SegError::EmptyRegion {
                seeds: self.seeds.len(),
            });
        }

        let report = GrowthReport {
            iterations,
            converged,
            mean: db.stats().mean(),
            std: db.stats().std(),
            voxels: db.len(),
        };
        debug!("confidence growth finished: {report:?}");

        let mut data = ndarray::Array3::from_elem(self.grid.shape(), MASK_BACKGROUND);
        for &flat in db.members() {
            data[self.grid.unflatten_idx(flat)] = self.params.replace_value;
        }
        Ok((self.grid.with_data(data), report))
    }

    /// 并行评估候选体素. 结果保持 `candidates` 中的顺序.
    #[cfg(feature = "rayon")]
    fn accept(&self, candidates: &[usize], band: &AcceptBand) -> Vec<usize> {
        use rayon::prelude::*;
        candidates
            .par_iter()
            .copied()
            .filter(|&flat| band.contains(self.value(flat)))
            .collect()
    }

    /// 评估候选体素. 结果保持 `candidates` 中的顺序.
    #[cfg(not(feature = "rayon"))]
    fn accept(&self, candidates: &[usize], band: &AcceptBand) -> Vec<usize> {
        candidates
            .iter()
            .copied()
            .filter(|&flat| band.contains(self.value(flat)))
            .collect()
    }
}
