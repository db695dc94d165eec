use super::seed::{find_seeds, Coverage};
use super::{Extender, Match};
use crate::index::ProteinIndex;

/// 对一条 read 的全部片段求最佳匹配集合。
///
/// 片段按可达上界降序处理，上界严格低于当前最佳的片段直接跳过。
/// 所有排序键等于最佳值的匹配都会保留（并列）。
pub struct ReadMatcher<'a, I: ?Sized, E> {
    index: &'a I,
    extender: &'a E,
    prune_subsumed: bool,
}

impl<'a, I: ProteinIndex + ?Sized, E: Extender> ReadMatcher<'a, I, E> {
    /// `prune_subsumed` 只对允许剪枝的延伸方式生效，见 [`Extender::prunable`]
    pub fn new(index: &'a I, extender: &'a E, prune_subsumed: bool) -> Self {
        Self { index, extender, prune_subsumed: prune_subsumed && extender.prunable() }
    }

    /// 单个片段的全部候选匹配
    pub fn match_fragment(&self, fragment_id: usize, query: &[u8], cov: &mut Coverage) -> Vec<Match> {
        let mut out = Vec::new();
        cov.clear();
        for seed in find_seeds(self.index, query, self.extender.seed_len()) {
            for sa_pos in seed.range.l..seed.range.r {
                let hit = match self.index.locate(sa_pos) {
                    Some(h) => h,
                    None => continue,
                };
                if self.prune_subsumed && cov.contains(hit.seq_id, seed.qb, seed.qe, hit.offset) {
                    continue;
                }
                if let Some(mut m) = self.extender.extend(self.index, query, &seed, &hit) {
                    m.fragment = fragment_id;
                    if self.prune_subsumed {
                        cov.insert(m.seq_id, m.qb, m.qe, m.rb);
                    }
                    out.push(m);
                }
            }
        }
        out
    }

    pub fn best_matches(&self, fragments: &[&[u8]]) -> Vec<Match> {
        let mut order: Vec<(i64, usize)> = fragments
            .iter()
            .enumerate()
            .map(|(i, f)| (self.extender.upper_bound(f), i))
            .collect();
        order.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

        let mut cov = Coverage::new();
        let mut best_rank = i64::MIN;
        let mut best: Vec<Match> = Vec::new();
        for (bound, i) in order {
            if bound < best_rank {
                break;
            }
            for m in self.match_fragment(i, fragments[i], &mut cov) {
                let r = self.extender.rank(&m);
                if r > best_rank {
                    best_rank = r;
                    best.clear();
                }
                if r == best_rank {
                    best.push(m);
                }
            }
        }

        // 未剪枝时同一匹配可能由多个种子得到
        best.sort_by(|a, b| {
            (a.fragment, a.seq_id, a.rb, a.qb, a.qe).cmp(&(b.fragment, b.seq_id, b.rb, b.qb, b.qe))
        });
        best.dedup_by(|a, b| {
            (a.fragment, a.seq_id, a.rb, a.qb, a.qe) == (b.fragment, b.seq_id, b.rb, b.qb, b.qe)
        });
        best
    }
}
