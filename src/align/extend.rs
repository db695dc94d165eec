//! 种子延伸。两种模式在启动时选定一次，匹配循环按具体类型单态化。

use super::seed::Seed;
use super::stats::{self, KarlinParams, BLOSUM62_UNGAPPED};
use super::Match;
use crate::config::ClassifyConfig;
use crate::index::{Hit, ProteinIndex};
use crate::util::blosum;
use crate::util::protein::is_matchable;

/// 将一个种子命中延伸为匹配，并定义匹配之间的优劣
pub trait Extender: Sync {
    fn seed_len(&self) -> usize;

    /// 从命中 `hit`（种子 `seed` 在参考中的位置）向两侧延伸；
    /// 不满足本模式阈值时返回 None
    fn extend<I: ProteinIndex + ?Sized>(
        &self,
        index: &I,
        query: &[u8],
        seed: &Seed,
        hit: &Hit,
    ) -> Option<Match>;

    /// 排序键，越大越好
    fn rank(&self, m: &Match) -> i64;

    /// 片段可能达到的最大排序键
    fn upper_bound(&self, fragment: &[u8]) -> i64;

    /// 被已接受匹配覆盖的种子能否跳过。
    /// 只有极大匹配满足这一点：从覆盖内的种子重新延伸只会得到同一个匹配。
    fn prunable(&self) -> bool;
}

#[inline]
fn same(a: u8, b: u8) -> bool {
    a == b && is_matchable(a)
}

/// MEM：只沿精确相等延伸，直到失配或序列边界
#[derive(Debug, Clone, Copy)]
pub struct MemExtender {
    pub min_len: usize,
}

impl MemExtender {
    pub fn from_config(cfg: &ClassifyConfig) -> Self {
        Self { min_len: cfg.min_fragment_length }
    }
}

impl Extender for MemExtender {
    fn seed_len(&self) -> usize {
        self.min_len
    }

    fn extend<I: ProteinIndex + ?Sized>(
        &self,
        index: &I,
        query: &[u8],
        seed: &Seed,
        hit: &Hit,
    ) -> Option<Match> {
        let seq = hit.seq_id;
        let rlen = index.sequence_length(seq);

        let (mut qb, mut rb) = (seed.qb, hit.offset);
        while qb > 0 && rb > 0 && same(query[qb - 1], index.residue_at(seq, rb - 1)) {
            qb -= 1;
            rb -= 1;
        }
        let (mut qe, mut re) = (seed.qe, hit.offset + seed.len());
        while qe < query.len() && re < rlen && same(query[qe], index.residue_at(seq, re)) {
            qe += 1;
            re += 1;
        }

        if qe - qb < self.min_len {
            return None;
        }
        Some(Match {
            fragment: 0,
            qb,
            qe,
            seq_id: seq,
            rb,
            mismatches: 0,
            score: blosum::self_score(&query[qb..qe]),
            evalue: None,
            taxon: hit.taxon,
        })
    }

    fn rank(&self, m: &Match) -> i64 {
        m.len() as i64
    }

    fn upper_bound(&self, fragment: &[u8]) -> i64 {
        fragment.len() as i64
    }

    fn prunable(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EvalueFilter {
    pub threshold: f64,
    pub db_len: u64,
    pub params: KarlinParams,
}

/// Greedy：允许有限个替换，按 BLOSUM62 计分，X-drop 截断
#[derive(Debug, Clone, Copy)]
pub struct GreedyExtender {
    pub seed_len: usize,
    pub min_len: usize,
    pub min_score: i32,
    pub max_mismatches: u32,
    pub xdrop: i32,
    pub evalue: Option<EvalueFilter>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Run {
    len: usize,
    score: i32,
    mismatches: u32,
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Left,
    Right,
}

impl GreedyExtender {
    pub fn from_config(cfg: &ClassifyConfig, db_len: u64) -> Self {
        Self {
            seed_len: cfg.seed_length,
            min_len: cfg.min_fragment_length,
            min_score: cfg.min_score,
            max_mismatches: cfg.max_mismatches,
            xdrop: cfg.xdrop,
            evalue: cfg.evalue.map(|threshold| EvalueFilter {
                threshold,
                db_len,
                params: BLOSUM62_UNGAPPED,
            }),
        }
    }

    /// 单方向延伸，一次扫描给出每个替换预算下的最佳截断：
    /// 返回值第 b 项为至多用 b 个替换时得分最高的前缀（同分取较短者）。
    /// 长度为 `min(budget, 可走步数) + 1`，更大的预算等同于最后一项。
    fn extend_dir<I: ProteinIndex + ?Sized>(
        &self,
        index: &I,
        query: &[u8],
        seq: usize,
        q_from: usize,
        r_from: usize,
        dir: Direction,
        budget: u32,
    ) -> Vec<Run> {
        let rlen = index.sequence_length(seq);
        let avail = match dir {
            Direction::Right => (query.len() - q_from).min(rlen - r_from),
            Direction::Left => q_from.min(r_from),
        };

        // 先按“恰好 c 个替换”记录，最后做前缀最大
        let slots = (budget as usize).min(avail) + 1;
        let mut by_count = vec![Run::default(); slots];
        let mut top = 0i32;
        let mut running = 0i32;
        let mut mismatches = 0u32;
        for k in 0..avail {
            let (qi, ri) = match dir {
                Direction::Right => (q_from + k, r_from + k),
                Direction::Left => (q_from - 1 - k, r_from - 1 - k),
            };
            let (a, b) = (query[qi], index.residue_at(seq, ri));
            if !same(a, b) {
                if mismatches == budget {
                    break;
                }
                mismatches += 1;
            }
            running += blosum::score(a, b);
            let slot = &mut by_count[mismatches as usize];
            if running > slot.score {
                *slot = Run { len: k + 1, score: running, mismatches };
            }
            top = top.max(running);
            if top - running > self.xdrop {
                break;
            }
        }
        for c in 1..slots {
            if by_count[c].score <= by_count[c - 1].score {
                by_count[c] = by_count[c - 1];
            }
        }
        by_count
    }

    /// 在左右两侧之间分配替换预算，取总分最高者；同分取替换更少者
    fn split_budget(&self, left: &[Run], right: &[Run]) -> (Run, Run) {
        let max = self.max_mismatches as usize;
        let at = |runs: &[Run], b: usize| runs[b.min(runs.len() - 1)];
        let mut pick = (left[0], at(right, max));
        for b in 1..left.len() {
            let cand = (left[b], at(right, max - b));
            let (cs, ps) = (cand.0.score + cand.1.score, pick.0.score + pick.1.score);
            let (cm, pm) = (cand.0.mismatches + cand.1.mismatches, pick.0.mismatches + pick.1.mismatches);
            if cs > ps || (cs == ps && cm < pm) {
                pick = cand;
            }
        }
        pick
    }
}

impl Extender for GreedyExtender {
    fn seed_len(&self) -> usize {
        self.seed_len
    }

    fn extend<I: ProteinIndex + ?Sized>(
        &self,
        index: &I,
        query: &[u8],
        seed: &Seed,
        hit: &Hit,
    ) -> Option<Match> {
        let seq = hit.seq_id;
        let seed_score = blosum::self_score(&query[seed.qb..seed.qe]);

        let right = self.extend_dir(
            index,
            query,
            seq,
            seed.qe,
            hit.offset + seed.len(),
            Direction::Right,
            self.max_mismatches,
        );
        let left = self.extend_dir(
            index,
            query,
            seq,
            seed.qb,
            hit.offset,
            Direction::Left,
            self.max_mismatches,
        );
        let (left, right) = self.split_budget(&left, &right);

        let qb = seed.qb - left.len;
        let qe = seed.qe + right.len;
        let score = seed_score + left.score + right.score;
        if qe - qb < self.min_len || score < self.min_score {
            return None;
        }

        let evalue = match self.evalue {
            Some(f) => {
                let e = stats::evalue(score, query.len(), f.db_len, &f.params);
                if e > f.threshold {
                    return None;
                }
                Some(e)
            }
            None => None,
        };

        Some(Match {
            fragment: 0,
            qb,
            qe,
            seq_id: seq,
            rb: hit.offset - left.len,
            mismatches: left.mismatches + right.mismatches,
            score,
            evalue,
            taxon: hit.taxon,
        })
    }

    fn rank(&self, m: &Match) -> i64 {
        m.score as i64
    }

    /// 子区间的得分不超过其中正的对角线得分之和；X 处记 0
    fn upper_bound(&self, fragment: &[u8]) -> i64 {
        fragment.iter().map(|&a| blosum::score(a, a).max(0) as i64).sum()
    }

    /// 覆盖内的种子带着完整的替换预算重新延伸，可能走得更远
    fn prunable(&self) -> bool {
        false
    }
}
