//! 在分类流水线中流转的记录。

/// 一条 read 或 read pair，归处理它的 worker 所有
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Read {
    pub name: String,
    pub seq1: Vec<u8>,
    pub seq2: Option<Vec<u8>>,
    /// 两个 mate 名称不一致时为 false，此类 pair 不做匹配
    pub consistent: bool,
}

impl Read {
    pub fn single(name: impl Into<String>, seq: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), seq1: seq.into(), seq2: None, consistent: true }
    }

    pub fn paired(
        name: impl Into<String>,
        seq1: impl Into<Vec<u8>>,
        seq2: impl Into<Vec<u8>>,
    ) -> Self {
        Self { name: name.into(), seq1: seq1.into(), seq2: Some(seq2.into()), consistent: true }
    }

    pub fn is_paired(&self) -> bool {
        self.seq2.is_some()
    }
}

/// 转成可输出形式的最佳匹配
#[derive(Debug, Clone, PartialEq)]
pub struct ReportedHit {
    pub taxon: u64,
    pub accession: String,
    /// 片段中匹配上的残基（字母形式）
    pub peptide: String,
    /// 仅在启用 E 值过滤时有值
    pub evalue: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub read_name: String,
    /// 最佳匹配的 LCA；未分类时为 None
    pub taxon: Option<u64>,
    pub best_length: usize,
    pub best_score: i32,
    pub hits: Vec<ReportedHit>,
}

impl Classification {
    pub fn unclassified(read_name: impl Into<String>) -> Self {
        Self { read_name: read_name.into(), taxon: None, best_length: 0, best_score: 0, hits: Vec::new() }
    }

    pub fn is_classified(&self) -> bool {
        self.taxon.is_some()
    }
}
