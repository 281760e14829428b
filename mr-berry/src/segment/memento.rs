//! 区域生长的簿记: 区域成员, 边界集与在线统计量.

use std::collections::HashSet;

/// 在线均值/方差统计 (Welford).
#[derive(Copy, Clone, Debug, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    /// 加入一个样本.
    #[inline]
    pub fn push(&mut self, v: f64) {
        self.count += 1;
        let delta = v - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (v - self.mean);
    }

    /// 样本个数.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值. 无样本时为 0.
    #[inline]
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// 样本标准差 (`n - 1`). 样本不足两个时为 0.
    #[inline]
    pub fn std(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            (self.m2 / (self.count - 1) as f64).max(0.0).sqrt()
        }
    }
}

/// 区域生长过程中需要维护的数据结构集合.
///
/// 体素均以行优先展平索引表示. `members` 以插入顺序记录区域内的体素,
/// `included` 提供 O(1) 的成员判定, `boundary` 记录与区域 6-相邻但尚未加入的体素.
pub struct GrowthMemento {
    members: Vec<usize>,
    included: HashSet<usize>,
    boundary: HashSet<usize>,
    stats: RunningStats,
}

impl Default for GrowthMemento {
    fn default() -> Self {
        Self::new()
    }
}

impl GrowthMemento {
    /// 创建空的簿记结构.
    pub fn new() -> Self {
        Self {
            members: Vec::with_capacity(4096),
            included: HashSet::with_capacity(4096),
            boundary: HashSet::with_capacity(1024),
            stats: RunningStats::default(),
        }
    }

    /// 将体素加入区域, 并更新统计量. 返回值指示是否是插入了新值.
    pub fn include(&mut self, pos: usize, value: f64) -> bool {
        if !self.included.insert(pos) {
            return false;
        }
        self.boundary.remove(&pos);
        self.members.push(pos);
        self.stats.push(value);
        true
    }

    /// 判断某个体素是否已在区域内.
    #[inline]
    pub fn contains(&self, pos: usize) -> bool {
        self.included.contains(&pos)
    }

    /// 为边界集添加一个体素. 已在区域内的体素会被忽略.
    #[inline]
    pub fn push_boundary(&mut self, pos: usize) -> bool {
        !self.contains(pos) && self.boundary.insert(pos)
    }

    /// 获得当前边界集的有序快照.
    ///
    /// 排序使得同一轮的候选评估与合并顺序确定, 进而统计量的浮点结果可复现.
    pub fn boundary_snapshot(&self) -> Vec<usize> {
        let mut v: Vec<usize> = self.boundary.iter().copied().collect();
        v.sort_unstable();
        v
    }

    /// 区域内体素个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// 区域内所有体素, 按加入顺序.
    #[inline]
    pub fn members(&self) -> &[usize] {
        &self.members
    }

    /// 区域内体素值的统计量.
    #[inline]
    pub fn stats(&self) -> &RunningStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::{GrowthMemento, RunningStats};
    use approx::assert_relative_eq;

    #[test]
    fn test_running_stats() {
        let mut s = RunningStats::default();
        assert_eq!(s.std(), 0.0);
        s.push(4.0);
        assert_eq!(s.std(), 0.0);
        for v in [7.0, 13.0, 16.0] {
            s.push(v);
        }
        assert_eq!(s.count(), 4);
        assert_relative_eq!(s.mean(), 10.0);
        // 样本方差 = (36 + 9 + 9 + 36) / 3 = 30
        assert_relative_eq!(s.std(), 30.0f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_memento_membership() {
        let mut db = GrowthMemento::new();
        assert!(db.push_boundary(5));
        assert!(db.push_boundary(2));
        assert!(!db.push_boundary(5));
        assert_eq!(db.boundary_snapshot(), vec![2, 5]);

        assert!(db.include(5, 1.0));
        assert!(!db.include(5, 1.0));
        assert!(db.contains(5));
        assert!(!db.push_boundary(5));
        assert_eq!(db.boundary_snapshot(), vec![2]);
        assert_eq!(db.members(), &[5]);
        assert_eq!(db.len(), 1);

        let empty = GrowthMemento::default();
        assert_eq!(empty.len(), 0);
        assert!(empty.boundary_snapshot().is_empty());
    }
}
