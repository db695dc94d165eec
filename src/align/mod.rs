//! 片段匹配：种子查找、种子延伸（MEM / Greedy）、E 值统计与最佳匹配选择。

pub mod extend;
pub mod matcher;
pub mod seed;
pub mod stats;

pub use extend::{Extender, GreedyExtender, MemExtender};
pub use matcher::ReadMatcher;

/// 一个被接受的无间隙匹配
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    /// 匹配来自 read 的第几个片段
    pub fragment: usize,
    /// 片段上的区间 [qb, qe)
    pub qb: usize,
    pub qe: usize,
    pub seq_id: usize,
    /// 参考蛋白质上的起点
    pub rb: usize,
    pub mismatches: u32,
    pub score: i32,
    pub evalue: Option<f64>,
    pub taxon: u64,
}

impl Match {
    #[inline]
    pub fn len(&self) -> usize {
        self.qe - self.qb
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.qe <= self.qb
    }
}
