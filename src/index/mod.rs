//! 蛋白质 FM 索引：后缀数组、BWT 以及分类引擎使用的查询接口。

pub mod bwt;
pub mod fm;
pub mod sa;

/// 后缀数组上的半开区间 [l, r)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaRange {
    pub l: usize,
    pub r: usize,
}

impl SaRange {
    pub const EMPTY: SaRange = SaRange { l: 0, r: 0 };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.l >= self.r
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.r.saturating_sub(self.l)
    }
}

/// 后缀数组位置解析出的来源：第几条蛋白质、其分类号、以及在该蛋白质内的偏移
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub seq_id: usize,
    pub taxon: u64,
    pub offset: usize,
}

/// 分类引擎对索引的全部需求。实现必须只读且可在线程间共享。
pub trait ProteinIndex: Sync {
    /// 覆盖全部后缀的区间（空模式）
    fn full_range(&self) -> SaRange;

    /// 反向扩展一步：在 `range` 中的后缀前再加一个残基 `residue`
    fn extend(&self, range: SaRange, residue: u8) -> SaRange;

    /// 后缀数组位置 -> 来源；落在分隔符上时返回 None
    fn locate(&self, sa_pos: usize) -> Option<Hit>;

    fn sequence_length(&self, seq_id: usize) -> usize;

    fn residue_at(&self, seq_id: usize, offset: usize) -> u8;

    fn accession(&self, seq_id: usize) -> &str;

    /// 数据库中残基总数（E 值的搜索空间）
    fn total_residues(&self) -> u64;

    /// 对整个模式做反向搜索；`pat` 为字母表编码
    fn backward_search(&self, pat: &[u8]) -> SaRange {
        let mut range = self.full_range();
        for &a in pat.iter().rev() {
            range = self.extend(range, a);
            if range.is_empty() {
                return SaRange::EMPTY;
            }
        }
        range
    }
}
