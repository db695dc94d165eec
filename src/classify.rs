//! 单条 read 的分类：片段准备、匹配、双端处理与 LCA 归约。
//! 一个 `Classifier` 由全部 worker 共享。

use crate::align::{Extender, Match, ReadMatcher};
use crate::config::{ClassifyConfig, Mode, PairPolicy};
use crate::index::ProteinIndex;
use crate::taxonomy::Taxonomy;
use crate::types::{Classification, Read, ReportedHit};
use crate::util::dna::six_frame_peptides;
use crate::util::protein::{decode_seq, encode_seq, strip_seq};
use crate::util::seg::{mask_low_complexity, SegParams};

/// read 上一段可检索的片段（索引字母表编码）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub codes: Vec<u8>,
}

pub struct Classifier<'a, I: ?Sized, E> {
    index: &'a I,
    taxonomy: &'a Taxonomy,
    cfg: &'a ClassifyConfig,
    matcher: ReadMatcher<'a, I, E>,
    seg: SegParams,
}

impl<'a, I: ProteinIndex + ?Sized, E: Extender> Classifier<'a, I, E> {
    pub fn new(index: &'a I, taxonomy: &'a Taxonomy, cfg: &'a ClassifyConfig, extender: &'a E) -> Self {
        Self {
            index,
            taxonomy,
            cfg,
            matcher: ReadMatcher::new(index, extender, cfg.prune_subsumed),
            seg: SegParams::default(),
        }
    }

    /// 蛋白质输入即一个片段；核酸输入做六框翻译并在终止密码子处切分。
    /// 短于种子长度的片段丢弃，其余按配置做 SEG 屏蔽。
    pub fn fragments(&self, seq: &[u8]) -> Vec<Fragment> {
        let min_len = self.cfg.min_seed_length();
        let raw: Vec<Fragment> = if self.cfg.input_is_protein {
            vec![Fragment { codes: encode_seq(&strip_seq(seq)) }]
        } else {
            six_frame_peptides(seq, min_len)
                .into_iter()
                .map(|p| Fragment { codes: encode_seq(&p) })
                .collect()
        };

        raw.into_iter()
            .filter(|f| f.codes.len() >= min_len)
            .map(|mut f| {
                if self.cfg.seg {
                    mask_low_complexity(&mut f.codes, &self.seg);
                }
                f
            })
            .collect()
    }

    fn best_for(&self, fragments: &[Fragment]) -> Vec<Match> {
        let slices: Vec<&[u8]> = fragments.iter().map(|f| f.codes.as_slice()).collect();
        self.matcher.best_matches(&slices)
    }

    /// 保留 `mine` 中与 `other` 某个匹配在根以下有共同祖先的匹配
    fn compatible_with(&self, mine: Vec<Match>, other: &[Match]) -> Vec<Match> {
        mine.into_iter()
            .filter(|m| other.iter().any(|o| self.taxonomy.compatible(m.taxon, o.taxon)))
            .collect()
    }

    pub fn classify(&self, read: &Read) -> Classification {
        if !read.consistent {
            return Classification::unclassified(read.name.as_str());
        }

        let frags1 = self.fragments(&read.seq1);
        let (hits, frags): (Vec<Match>, Vec<Fragment>) = match &read.seq2 {
            None => (self.best_for(&frags1), frags1),
            Some(seq2) => {
                let frags2 = self.fragments(seq2);
                if self.cfg.mode == Mode::Mem && self.cfg.pair_policy == PairPolicy::RequireBoth {
                    let best1 = self.best_for(&frags1);
                    let best2 = self.best_for(&frags2);
                    if best1.is_empty() || best2.is_empty() {
                        return Classification::unclassified(read.name.as_str());
                    }
                    let keep1 = self.compatible_with(best1.clone(), &best2);
                    let keep2 = self.compatible_with(best2, &best1);
                    // 两个 mate 的片段拼接在同一列表中，mate 2 的片段编号整体后移
                    let shift = frags1.len();
                    let mut merged = keep1;
                    merged.extend(keep2.into_iter().map(|mut m| {
                        m.fragment += shift;
                        m
                    }));
                    let mut all = frags1;
                    all.extend(frags2);
                    (merged, all)
                } else {
                    let mut all = frags1;
                    all.extend(frags2);
                    (self.best_for(&all), all)
                }
            }
        };

        self.resolve(&read.name, &hits, &frags)
    }

    fn resolve(&self, name: &str, hits: &[Match], frags: &[Fragment]) -> Classification {
        let taxon = match self.taxonomy.lca(hits.iter().map(|m| m.taxon)) {
            Some(t) => t,
            None => return Classification::unclassified(name),
        };
        Classification {
            read_name: name.to_string(),
            taxon: Some(taxon),
            best_length: hits.iter().map(Match::len).max().unwrap_or(0),
            best_score: hits.iter().map(|m| m.score).max().unwrap_or(0),
            hits: hits.iter().map(|m| self.report(m, &frags[m.fragment])).collect(),
        }
    }

    fn report(&self, m: &Match, frag: &Fragment) -> ReportedHit {
        ReportedHit {
            taxon: m.taxon,
            accession: self.index.accession(m.seq_id).to_string(),
            peptide: decode_seq(&frag.codes[m.qb..m.qe]),
            evalue: m.evalue,
        }
    }
}
