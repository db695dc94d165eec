use std::fmt::Write as _;

use crate::types::Classification;

/// 每条 read 一行，制表符分隔：
/// `C|U  name  taxon  length`，verbose 时追加 `score  taxa  accessions  fragments`，
/// 启用 E 值过滤时再追加一列各匹配的 E 值。
/// 未分类时 taxon 与 length 均为 0，且没有附加列。
pub fn format_line(c: &Classification, verbose: bool) -> String {
    let mut line = String::with_capacity(64);
    match c.taxon {
        None => {
            let _ = write!(line, "U\t{}\t0\t0", c.read_name);
        }
        Some(taxon) => {
            let _ = write!(line, "C\t{}\t{}\t{}", c.read_name, taxon, c.best_length);
            if verbose {
                let _ = write!(line, "\t{}\t", c.best_score);
                push_list(&mut line, c.hits.iter().map(|h| h.taxon.to_string()));
                line.push('\t');
                push_list(&mut line, c.hits.iter().map(|h| h.accession.clone()));
                line.push('\t');
                push_list(&mut line, c.hits.iter().map(|h| h.peptide.clone()));
                if c.hits.iter().any(|h| h.evalue.is_some()) {
                    line.push('\t');
                    push_list(
                        &mut line,
                        c.hits.iter().map(|h| h.evalue.map_or_else(|| "-".to_string(), |e| format!("{:.2e}", e))),
                    );
                }
            }
        }
    }
    line.push('\n');
    line
}

fn push_list<I: Iterator<Item = String>>(line: &mut String, items: I) {
    for (i, s) in items.enumerate() {
        if i > 0 {
            line.push(',');
        }
        line.push_str(&s);
    }
    line.push(',');
}
