use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use super::{bwt, sa, Hit, ProteinIndex, SaRange};
use crate::util::protein::{self, SIGMA};

/// 一条参考蛋白质的元信息
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ProteinEntry {
    pub accession: String,
    pub taxon: u64,
    pub len: u32,
    /// 在拼接文本中的起始位置
    pub offset: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct IndexMeta {
    pub reference_file: Option<String>,
    pub build_args: Option<String>,
    pub build_timestamp: Option<String>,
}

/// 蛋白质 FM 索引：
/// - 字母表为 [0..SIGMA)，0 为 $ 分隔符，21 为不可匹配的 X。
/// - 采用定长分块的 Occ 采样（块内顺扫补偿）。
/// - 保存完整 SA 与原始文本，便于 locate 与种子延伸时的随机访问。
#[derive(Debug, Serialize, Deserialize)]
pub struct FMIndex {
    pub sigma: u8,
    pub block: u32,
    /// C[i] = 文本中字母 < i 的累计数量
    pub c: Vec<u32>,
    /// BWT 序列（与 SA 同长度）
    pub bwt: Vec<u8>,
    /// Occ 采样（按块存储，行优先展平）：occ_samples[block_id * sigma + c]
    pub occ_samples: Vec<u32>,
    pub sa: Vec<u32>,
    /// 拼接后的编码文本（每条蛋白质后跟一个 0）
    pub text: Vec<u8>,
    pub proteins: Vec<ProteinEntry>,
    pub meta: IndexMeta,
}

impl FMIndex {
    pub fn build(
        text: Vec<u8>,
        bwt: Vec<u8>,
        sa: Vec<u32>,
        proteins: Vec<ProteinEntry>,
        sigma: u8,
        block: usize,
    ) -> Self {
        let n = bwt.len();
        let sigma_us = sigma as usize;
        let block = block.max(1);
        // 计算 C 表
        let mut freq = vec![0u32; sigma_us];
        for &ch in &bwt {
            let ci = ch as usize;
            if ci < sigma_us {
                freq[ci] += 1;
            }
        }
        let mut c = vec![0u32; sigma_us];
        let mut acc = 0u32;
        for i in 0..sigma_us {
            c[i] = acc;
            acc += freq[i];
        }

        // 采样 Occ
        let num_blocks = if n == 0 { 0 } else { (n + block - 1) / block };
        let mut occ_samples = vec![0u32; num_blocks * sigma_us];
        let mut running = vec![0u32; sigma_us];
        for bi in 0..num_blocks {
            occ_samples[bi * sigma_us..(bi + 1) * sigma_us].copy_from_slice(&running);
            let start = bi * block;
            let end = ((bi + 1) * block).min(n);
            for &ch in &bwt[start..end] {
                let ci = ch as usize;
                if ci < sigma_us {
                    running[ci] += 1;
                }
            }
        }

        Self {
            sigma,
            block: block as u32,
            c,
            bwt,
            occ_samples,
            sa,
            text,
            proteins,
            meta: IndexMeta::default(),
        }
    }

    /// 由 (accession, taxon, 残基序列) 列表直接构建索引。
    /// 残基序列为 ASCII，非标准残基编码为 X。
    pub fn from_proteins<'a, I>(records: I, block: usize) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, u64, &'a [u8])>,
    {
        let mut text: Vec<u8> = Vec::new();
        let mut proteins: Vec<ProteinEntry> = Vec::new();
        for (accession, taxon, seq) in records {
            let residues = protein::strip_seq(seq);
            if residues.is_empty() {
                continue;
            }
            let offset = text.len();
            text.extend(residues.iter().map(|&b| protein::to_alphabet(b)));
            let len = text.len() - offset;
            if text.len() >= u32::MAX as usize {
                bail!("database exceeds {} residues", u32::MAX);
            }
            proteins.push(ProteinEntry {
                accession: accession.to_string(),
                taxon,
                len: len as u32,
                offset: offset as u32,
            });
            // 序列间分隔符
            text.push(0);
        }
        if proteins.is_empty() {
            bail!("no protein sequences to index");
        }

        let sa_arr = sa::build_sa(&text);
        let bwt_arr = bwt::build_bwt(&text, &sa_arr);
        Ok(Self::build(text, bwt_arr, sa_arr, proteins, SIGMA as u8, block))
    }

    pub fn set_meta(&mut self, meta: IndexMeta) {
        self.meta = meta;
    }

    #[inline]
    pub fn occ(&self, c: u8, pos: usize) -> u32 {
        // 返回 BWT[0..pos) 中 c 的出现次数
        if pos == 0 {
            return 0;
        }
        let sigma_us = self.sigma as usize;
        let block = self.block as usize;
        let bi = (pos - 1) / block;
        let base = self.occ_samples[bi * sigma_us + c as usize];
        let start = bi * block;
        let add = self.bwt[start..pos].iter().filter(|&&ch| ch == c).count() as u32;
        base + add
    }

    #[inline]
    pub fn rank_range(&self, c: u8, l: usize, r: usize) -> (usize, usize) {
        // 返回在区间 [l, r) 上扩展字符 c 后的新区间
        let c0 = self.c[c as usize] as usize;
        let nl = c0 + self.occ(c, l) as usize;
        let nr = c0 + self.occ(c, r) as usize;
        (nl, nr)
    }

    /// 将文本位置映射到 (蛋白质下标, 蛋白质内偏移)。若落在分隔符($)位置，则返回 None。
    pub fn map_text_pos(&self, pos: u32) -> Option<(usize, u32)> {
        let idx = self.proteins.partition_point(|p| p.offset + p.len <= pos);
        let p = self.proteins.get(idx)?;
        if pos < p.offset {
            return None;
        }
        Some((idx, pos - p.offset))
    }

    /// 结构自检：加载后的索引若不自洽，整个运行不可用
    pub fn validate(&self) -> Result<()> {
        let n = self.text.len();
        if self.sigma as usize != SIGMA {
            bail!("index alphabet size {} is not the protein alphabet ({})", self.sigma, SIGMA);
        }
        if self.bwt.len() != n || self.sa.len() != n {
            bail!("index arrays disagree in length (text {}, bwt {}, sa {})", n, self.bwt.len(), self.sa.len());
        }
        if self.c.len() != SIGMA || self.block == 0 {
            bail!("index rank structures are malformed");
        }
        let blocks = (n + self.block as usize - 1) / self.block as usize;
        if self.occ_samples.len() != blocks * SIGMA {
            bail!("index occurrence samples are truncated");
        }
        if self.bwt.iter().chain(&self.text).any(|&ch| ch as usize >= SIGMA) {
            bail!("index contains symbols outside the protein alphabet");
        }
        if let Some(&bad) = self.sa.iter().find(|&&p| p as usize >= n) {
            bail!("suffix array entry {} exceeds text length {}", bad, n);
        }
        // 蛋白质按偏移升序且互不重叠，map_text_pos 的二分依赖这一点
        let mut prev_end = 0u32;
        for p in &self.proteins {
            let end = match p.offset.checked_add(p.len) {
                Some(e) if e as usize <= n && p.offset >= prev_end => e,
                _ => bail!("protein '{}' lies outside the indexed text", p.accession),
            };
            prev_end = end;
        }
        Ok(())
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let f = std::fs::File::create(path)?;
        let mut w = std::io::BufWriter::new(f);
        bincode::serialize_into(&mut w, self)?;
        std::io::Write::flush(&mut w)?;
        Ok(())
    }

    pub fn load_from_file(path: &str) -> Result<Self> {
        let f = std::fs::File::open(path).with_context(|| format!("cannot open index '{}'", path))?;
        let idx: Self = bincode::deserialize_from(std::io::BufReader::new(f))
            .with_context(|| format!("index '{}' is not a valid protein FM-index", path))?;
        idx.validate().with_context(|| format!("index '{}' is malformed", path))?;
        Ok(idx)
    }
}

impl ProteinIndex for FMIndex {
    #[inline]
    fn full_range(&self) -> SaRange {
        SaRange { l: 0, r: self.bwt.len() }
    }

    #[inline]
    fn extend(&self, range: SaRange, residue: u8) -> SaRange {
        if range.is_empty() || !protein::is_matchable(residue) {
            return SaRange::EMPTY;
        }
        let (l, r) = self.rank_range(residue, range.l, range.r);
        if l >= r {
            SaRange::EMPTY
        } else {
            SaRange { l, r }
        }
    }

    fn locate(&self, sa_pos: usize) -> Option<Hit> {
        let pos = *self.sa.get(sa_pos)?;
        let (seq_id, offset) = self.map_text_pos(pos)?;
        Some(Hit { seq_id, taxon: self.proteins[seq_id].taxon, offset: offset as usize })
    }

    #[inline]
    fn sequence_length(&self, seq_id: usize) -> usize {
        self.proteins[seq_id].len as usize
    }

    #[inline]
    fn residue_at(&self, seq_id: usize, offset: usize) -> u8 {
        self.text[self.proteins[seq_id].offset as usize + offset]
    }

    fn accession(&self, seq_id: usize) -> &str {
        &self.proteins[seq_id].accession
    }

    fn total_residues(&self) -> u64 {
        self.proteins.iter().map(|p| p.len as u64).sum()
    }
}
