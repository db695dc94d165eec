use std::collections::HashMap;

use crate::index::{ProteinIndex, SaRange};
use crate::util::protein::is_matchable;

/// 精确种子：read 上的区间 [qb, qe) 及其在索引中的 SA 区间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seed {
    pub qb: usize,
    pub qe: usize,
    pub range: SaRange,
}

impl Seed {
    #[inline]
    pub fn len(&self) -> usize {
        self.qe - self.qb
    }
}

/// 定长滑动窗口找种子：对每个不含不可匹配残基的窗口做反向搜索，
/// 仅返回 SA 区间非空的窗口。含 X 的窗口直接跳过（种子在此断开）。
pub fn find_seeds<I: ProteinIndex + ?Sized>(
    index: &I,
    query: &[u8],
    seed_len: usize,
) -> Vec<Seed> {
    let n = query.len();
    if seed_len == 0 || n < seed_len {
        return Vec::new();
    }

    let mut seeds = Vec::new();
    let mut qb = 0usize;
    while qb + seed_len <= n {
        let window = &query[qb..qb + seed_len];
        // 窗口内最后一个不可匹配残基之后才可能有合法窗口
        if let Some(bad) = window.iter().rposition(|&a| !is_matchable(a)) {
            qb += bad + 1;
            continue;
        }
        let range = index.backward_search(window);
        if !range.is_empty() {
            seeds.push(Seed { qb, qe: qb + seed_len, range });
        }
        qb += 1;
    }
    seeds
}

/// 已接受匹配在 (蛋白质, 对角线) 上覆盖的 read 区间，用于跳过被包含的种子
#[derive(Debug, Default)]
pub struct Coverage {
    spans: HashMap<(usize, isize), Vec<(usize, usize)>>,
}

impl Coverage {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn diagonal(qb: usize, rb: usize) -> isize {
        rb as isize - qb as isize
    }

    /// 记录一个已接受的匹配：read 区间 [qb, qe)，参考起点 rb
    pub fn insert(&mut self, seq_id: usize, qb: usize, qe: usize, rb: usize) {
        self.spans
            .entry((seq_id, Self::diagonal(qb, rb)))
            .or_default()
            .push((qb, qe));
    }

    /// 种子 [qb, qe) 落在参考偏移 rb 处时，是否已被同一对角线上的匹配完全包含
    pub fn contains(&self, seq_id: usize, qb: usize, qe: usize, rb: usize) -> bool {
        self.spans
            .get(&(seq_id, Self::diagonal(qb, rb)))
            .map_or(false, |v| v.iter().any(|&(b, e)| b <= qb && qe <= e))
    }

    pub fn clear(&mut self) {
        self.spans.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::fm::FMIndex;
    use crate::util::protein::encode_seq;

    fn build_test_fm() -> FMIndex {
        FMIndex::from_proteins(
            vec![
                ("P1", 10u64, &b"MKVLAWDERTY"[..]),
                ("P2", 20u64, &b"GGMKVLHHH"[..]),
            ],
            4,
        )
        .expect("index")
    }

    #[test]
    fn seeds_basic() {
        let fm = build_test_fm();
        let q = encode_seq(b"MKVLAW");
        let seeds = find_seeds(&fm, &q, 4);
        assert!(seeds.iter().any(|s| s.qb == 0 && s.range.len() == 2));
        assert!(seeds.iter().any(|s| s.qb == 2 && s.range.len() == 1));
        assert!(seeds.iter().all(|s| s.len() == 4));
    }

    #[test]
    fn seeds_respect_min_len() {
        let fm = build_test_fm();
        let q = encode_seq(b"MKV");
        assert!(find_seeds(&fm, &q, 4).is_empty());
    }

    #[test]
    fn unknown_residue_breaks_seeds() {
        let fm = build_test_fm();
        let q = encode_seq(b"MKVXAWDE");
        let seeds = find_seeds(&fm, &q, 3);
        assert!(seeds.iter().all(|s| s.qe <= 3 || s.qb >= 4));
        assert!(seeds.iter().any(|s| s.qb == 4));
    }

    #[test]
    fn coverage_detects_contained_seeds() {
        let mut cov = Coverage::new();
        cov.insert(0, 2, 10, 5);
        assert!(cov.contains(0, 3, 7, 6));
        assert!(!cov.contains(0, 3, 7, 7)); // 不同对角线
        assert!(!cov.contains(1, 3, 7, 6)); // 不同蛋白质
        assert!(!cov.contains(0, 8, 12, 11)); // 超出覆盖范围
        cov.clear();
        assert!(!cov.contains(0, 3, 7, 6));
    }
}
