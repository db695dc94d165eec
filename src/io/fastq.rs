use anyhow::Result;
use std::io::BufRead;

use crate::error::ReadInputError;

#[derive(Debug, Clone)]
pub struct FastqRecord {
    pub id: String,
    pub desc: Option<String>,
    pub seq: Vec<u8>,
}

pub struct FastqReader<R: BufRead> {
    reader: R,
    source: String,
    buf: String,
    done: bool,
}

impl<R: BufRead> FastqReader<R> {
    pub fn new(reader: R) -> Self {
        Self::named(reader, "<stream>")
    }

    /// `source` 仅用于错误信息
    pub fn named(reader: R, source: impl Into<String>) -> Self {
        Self { reader, source: source.into(), buf: String::new(), done: false }
    }

    fn malformed(&self, read: &str, reason: &'static str) -> anyhow::Error {
        ReadInputError::MalformedFastq { file: self.source.clone(), read: read.to_string(), reason }
            .into()
    }

    fn line(&mut self) -> Result<bool> {
        self.buf.clear();
        Ok(self.reader.read_line(&mut self.buf)? > 0)
    }

    pub fn next_record(&mut self) -> Result<Option<FastqRecord>> {
        if self.done { return Ok(None); }

        // header，跳过记录之间的空行
        loop {
            if !self.line()? { self.done = true; return Ok(None); }
            if !self.buf.trim().is_empty() { break; }
        }
        let header = match self.buf.strip_prefix('@') {
            Some(h) => h.trim_end().to_string(),
            None => return Err(self.malformed(self.buf.trim_end(), "header does not start with '@'")),
        };
        let mut parts = header.splitn(2, char::is_whitespace);
        let id = parts.next().unwrap_or("").to_string();
        let desc = parts.next().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

        if !self.line()? { return Err(self.malformed(&id, "unexpected end of file after header")); }
        let raw_len = self.buf.trim_end().len();
        let seq = crate::util::protein::strip_seq(self.buf.as_bytes());

        if !self.line()? || !self.buf.starts_with('+') {
            return Err(self.malformed(&id, "missing '+' line"));
        }

        if !self.line()? { return Err(self.malformed(&id, "missing quality line")); }
        if self.buf.trim_end().len() != raw_len {
            return Err(self.malformed(&id, "sequence and quality lengths differ"));
        }

        Ok(Some(FastqRecord { id, desc, seq }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_two_records() {
        let data = "@r1/1 lane1\nACGTN\n+\nIIIII\n\n@r2\nacgt\n+r2\n####\n";
        let mut r = FastqReader::new(Cursor::new(data));
        let a = r.next_record().unwrap().unwrap();
        assert_eq!(a.id, "r1/1");
        assert_eq!(a.desc.as_deref(), Some("lane1"));
        assert_eq!(a.seq, b"ACGTN");
        let b = r.next_record().unwrap().unwrap();
        assert_eq!(b.id, "r2");
        assert_eq!(b.seq, b"ACGT");
        assert!(r.next_record().unwrap().is_none());
    }

    #[test]
    fn malformed_records_are_typed_errors() {
        let mut r = FastqReader::named(Cursor::new("@r1\nACGT\n+\nII\n"), "a.fq");
        let err = r.next_record().unwrap_err();
        match err.downcast_ref::<ReadInputError>() {
            Some(ReadInputError::MalformedFastq { file, read, .. }) => {
                assert_eq!(file, "a.fq");
                assert_eq!(read, "r1");
            }
            other => panic!("unexpected error {:?}", other),
        }

        let mut r = FastqReader::new(Cursor::new("r1\nACGT\n+\nIIII\n"));
        assert!(r.next_record().is_err());
        let mut r = FastqReader::new(Cursor::new("@r1\nACGT\n"));
        assert!(r.next_record().is_err());
    }
}
