use std::io::BufRead;

use anyhow::{Context, Result};

use crate::util::protein::strip_seq;

/// 一条 FASTA 记录；`header` 为去掉 `>` 的整行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub header: String,
    pub seq: Vec<u8>,
}

impl FastaRecord {
    /// header 的第一个空白前的部分
    pub fn id(&self) -> &str {
        self.header.split_whitespace().next().unwrap_or("")
    }
}

/// 逐条读取 FASTA。按字节读行，非 UTF-8 的序列行不会出错；
/// 第一个 `>` 之前的内容被忽略。
pub struct FastaReader<R: BufRead> {
    reader: R,
    line: Vec<u8>,
    pending: Option<String>,
    eof: bool,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader, line: Vec::new(), pending: None, eof: false }
    }

    /// 读一行到 `self.line`；返回是否读到内容
    fn fill_line(&mut self) -> std::io::Result<bool> {
        self.line.clear();
        let n = self.reader.read_until(b'\n', &mut self.line)?;
        if n == 0 {
            self.eof = true;
        }
        Ok(n > 0)
    }

    fn header_of_line(&self) -> Option<String> {
        self.line
            .strip_prefix(b">")
            .map(|h| String::from_utf8_lossy(h).trim().to_string())
    }

    pub fn next_record(&mut self) -> Result<Option<FastaRecord>> {
        let header = match self.pending.take() {
            Some(h) => h,
            None => loop {
                if self.eof || !self.fill_line()? {
                    return Ok(None);
                }
                if let Some(h) = self.header_of_line() {
                    break h;
                }
            },
        };

        let mut seq = Vec::new();
        while !self.eof && self.fill_line()? {
            if let Some(h) = self.header_of_line() {
                self.pending = Some(h);
                break;
            }
            seq.extend(strip_seq(&self.line));
        }
        Ok(Some(FastaRecord { header, seq }))
    }
}

/// 参考蛋白质 header：`ACCESSION_TAXID`（取最后一个下划线之后）或仅 `TAXID`。
/// 返回 (accession, taxon)；无法解析出分类号时返回 None。
pub fn parse_db_header(id: &str) -> Option<(&str, u64)> {
    match id.rsplit_once('_') {
        Some((acc, tax)) if !acc.is_empty() => tax.parse().ok().map(|t| (acc, t)),
        _ => id.parse().ok().map(|t| (id, t)),
    }
}

/// 一条待建索引的参考蛋白质
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbProtein {
    pub accession: String,
    pub taxon: u64,
    pub residues: Vec<u8>,
}

/// 读取参考蛋白质 FASTA。header 不含分类号的记录被跳过并计数。
pub fn read_protein_db<R: BufRead>(reader: R) -> Result<(Vec<DbProtein>, usize)> {
    let mut reader = FastaReader::new(reader);
    let mut proteins = Vec::new();
    let mut skipped = 0usize;
    while let Some(rec) = reader.next_record().context("malformed protein FASTA")? {
        match parse_db_header(rec.id()) {
            Some((acc, taxon)) if !rec.seq.is_empty() => proteins.push(DbProtein {
                accession: acc.to_string(),
                taxon,
                residues: rec.seq,
            }),
            _ => skipped += 1,
        }
    }
    Ok((proteins, skipped))
}
