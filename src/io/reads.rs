//! read 文件：格式与压缩检测、名称规范化、双端配对。

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use flate2::bufread::MultiGzDecoder;
use log::warn;

use super::fasta::FastaReader;
use super::fastq::FastqReader;
use crate::error::ReadInputError;
use crate::types::Read;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub type DynReader = Box<dyn BufRead + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeqFormat {
    Fasta,
    Fastq,
}

/// 打开文件；按魔数识别 gzip 并透明解压
pub fn open_maybe_gz(path: &Path) -> Result<DynReader> {
    let file = File::open(path).with_context(|| format!("cannot open file '{}'", path.display()))?;
    let mut reader = BufReader::new(file);
    let head = reader
        .fill_buf()
        .with_context(|| format!("cannot read file '{}'", path.display()))?;
    if head.starts_with(&GZIP_MAGIC) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

/// 跳过开头空白，查看第一个记录标记
pub fn detect_format<R: BufRead + ?Sized>(reader: &mut R) -> std::io::Result<Option<SeqFormat>> {
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(None);
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(i) => {
                let format = match buf[i] {
                    b'>' => Some(SeqFormat::Fasta),
                    b'@' => Some(SeqFormat::Fastq),
                    _ => None,
                };
                reader.consume(i);
                return Ok(format);
            }
            None => {
                let n = buf.len();
                reader.consume(n);
            }
        }
    }
}

/// `detect_format` 已读完全部内容，即输入只含空白
fn is_blank<R: BufRead + ?Sized>(reader: &mut R) -> std::io::Result<bool> {
    Ok(reader.fill_buf()?.is_empty())
}

/// read 名取到第一个空格、`/`、制表符或回车为止，使双端的两个 mate 同名
pub fn read_name(header: &str) -> &str {
    match header.find(&[' ', '/', '\t', '\r'][..]) {
        Some(i) => &header[..i],
        None => header,
    }
}

/// 与文件格式无关的一条记录：名称与序列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqRecord {
    pub name: String,
    pub seq: Vec<u8>,
}

pub enum SeqFileReader {
    Fasta(FastaReader<DynReader>),
    Fastq(FastqReader<DynReader>),
    /// 空文件或只含空白的文件，不产生记录
    Empty,
}

impl SeqFileReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut reader = open_maybe_gz(path)?;
        let format = detect_format(&mut reader)
            .with_context(|| format!("cannot read file '{}'", path.display()))?;
        Ok(match format {
            Some(SeqFormat::Fasta) => SeqFileReader::Fasta(FastaReader::new(reader)),
            Some(SeqFormat::Fastq) => {
                SeqFileReader::Fastq(FastqReader::named(reader, path.display().to_string()))
            }
            None if is_blank(&mut reader)? => {
                warn!("file '{}' contains no reads", path.display());
                SeqFileReader::Empty
            }
            None => return Err(ReadInputError::UnknownFormat(path.display().to_string()).into()),
        })
    }

    /// 空文件返回 None
    pub fn format(&self) -> Option<SeqFormat> {
        match self {
            SeqFileReader::Fasta(_) => Some(SeqFormat::Fasta),
            SeqFileReader::Fastq(_) => Some(SeqFormat::Fastq),
            SeqFileReader::Empty => None,
        }
    }

    pub fn next_record(&mut self) -> Result<Option<SeqRecord>> {
        let rec = match self {
            SeqFileReader::Fasta(r) => r.next_record()?.map(|r| (r.header, r.seq)),
            SeqFileReader::Fastq(r) => r.next_record()?.map(|r| (r.id, r.seq)),
            SeqFileReader::Empty => None,
        };
        Ok(rec.map(|(id, seq)| SeqRecord { name: read_name(&id).to_string(), seq }))
    }
}

pub fn count_records(path: &Path) -> Result<usize> {
    let mut reader = SeqFileReader::open(path)?;
    let mut n = 0usize;
    while reader.next_record()?.is_some() {
        n += 1;
    }
    Ok(n)
}

/// 双端文件的记录数必须相同；在分类任何 read 之前检查
pub fn check_mate_counts(first: &Path, second: &Path) -> Result<usize> {
    let n1 = count_records(first)?;
    let n2 = count_records(second)?;
    if n1 != n2 {
        return Err(ReadInputError::MateCountMismatch {
            first: first.display().to_string(),
            second: second.display().to_string(),
            n1,
            n2,
        }
        .into());
    }
    Ok(n1)
}

/// 按需产生单端 read 或 read pair。两个 mate 名称不同时标记为不一致并继续，不中止运行。
pub struct ReadSource {
    first: SeqFileReader,
    second: Option<SeqFileReader>,
}

impl ReadSource {
    pub fn single(path: &Path) -> Result<Self> {
        Ok(Self { first: SeqFileReader::open(path)?, second: None })
    }

    /// 此处不核对记录数，见 [`check_mate_counts`]
    pub fn paired(first: &Path, second: &Path) -> Result<Self> {
        Ok(Self { first: SeqFileReader::open(first)?, second: Some(SeqFileReader::open(second)?) })
    }

    pub fn is_paired(&self) -> bool {
        self.second.is_some()
    }

    fn next_read(&mut self) -> Result<Option<Read>> {
        let r1 = match self.first.next_record()? {
            Some(r) => r,
            None => return Ok(None),
        };
        let second = match self.second.as_mut() {
            Some(s) => s,
            None => return Ok(Some(Read::single(r1.name, r1.seq))),
        };
        let r2 = second
            .next_record()?
            .ok_or_else(|| anyhow!("second read file ended before read '{}'", r1.name))?;
        let mut read = Read::paired(r1.name, r1.seq, r2.seq);
        if read.name != r2.name {
            warn!("names of paired reads differ: '{}' vs '{}'", read.name, r2.name);
            read.consistent = false;
        }
        Ok(Some(read))
    }
}

impl Iterator for ReadSource {
    type Item = Result<Read>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_read().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> std::path::PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, content).expect("write");
        p
    }

    #[test]
    fn names_are_cut_at_separators() {
        assert_eq!(read_name("r1/1"), "r1");
        assert_eq!(read_name("r1\tx"), "r1");
        assert_eq!(read_name("r1\r"), "r1");
        assert_eq!(read_name("r1"), "r1");
    }

    #[test]
    fn detects_format_after_blank_lines() {
        let mut c = Cursor::new(&b"\n \n>r1\nACGT\n"[..]);
        assert_eq!(detect_format(&mut c).unwrap(), Some(SeqFormat::Fasta));
        let mut c = Cursor::new(&b"@r1\nACGT\n+\nIIII\n"[..]);
        assert_eq!(detect_format(&mut c).unwrap(), Some(SeqFormat::Fastq));
        let mut c = Cursor::new(&b"ACGT\n"[..]);
        assert_eq!(detect_format(&mut c).unwrap(), None);
        let mut c = Cursor::new(&b""[..]);
        assert_eq!(detect_format(&mut c).unwrap(), None);
    }

    #[test]
    fn unknown_format_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let p = write_file(dir.path(), "x.txt", b"hello\n");
        let err = SeqFileReader::open(&p).err().expect("error");
        assert!(matches!(err.downcast_ref::<ReadInputError>(), Some(ReadInputError::UnknownFormat(_))));
    }

    #[test]
    fn empty_files_yield_no_reads() {
        let dir = tempfile::tempdir().expect("tempdir");
        let empty = write_file(dir.path(), "empty.fq", b"");
        let blank = write_file(dir.path(), "blank.fa", b"\n  \n\t\n");
        for p in [&empty, &blank] {
            let mut reader = SeqFileReader::open(p).expect("open");
            assert_eq!(reader.format(), None);
            assert!(reader.next_record().unwrap().is_none());
            assert_eq!(ReadSource::single(p).expect("source").count(), 0);
        }
        assert_eq!(check_mate_counts(&empty, &blank).unwrap(), 0);
    }

    #[test]
    fn reads_gzipped_fastq() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(b"@r1/1\nACGT\n+\nIIII\n@r2/1\nGG\n+\nII\n").expect("gz");
        let p = write_file(dir.path(), "a.fq.gz", &enc.finish().expect("gz"));

        let mut reader = SeqFileReader::open(&p).expect("open");
        assert_eq!(reader.format(), Some(SeqFormat::Fastq));
        let r = reader.next_record().unwrap().unwrap();
        assert_eq!(r, SeqRecord { name: "r1".into(), seq: b"ACGT".to_vec() });
        assert_eq!(count_records(&p).unwrap(), 2);
    }

    #[test]
    fn pairs_are_zipped_and_checked() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = write_file(dir.path(), "a.fa", b">p1/1\nACGT\n>p2/1\nAAAA\n");
        let b = write_file(dir.path(), "b.fa", b">p1/2\nTTTT\n>other/2\nCCCC\n");
        assert_eq!(check_mate_counts(&a, &b).unwrap(), 2);
        let reads: Vec<Read> = ReadSource::paired(&a, &b)
            .expect("open")
            .collect::<Result<_>>()
            .expect("reads");
        assert_eq!(reads.len(), 2);
        assert_eq!(reads[0].name, "p1");
        assert_eq!(reads[0].seq2.as_deref(), Some(&b"TTTT"[..]));
        assert!(reads[0].consistent);
        assert!(!reads[1].consistent);
    }

    #[test]
    fn mate_count_mismatch_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = write_file(dir.path(), "a.fa", b">p1\nACGT\n>p2\nAAAA\n");
        let b = write_file(dir.path(), "b.fa", b">p1\nTTTT\n");
        let err = check_mate_counts(&a, &b).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReadInputError>(),
            Some(ReadInputError::MateCountMismatch { n1: 2, n2: 1, .. })
        ));
    }
}
