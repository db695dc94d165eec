use std::path::PathBuf;

use thiserror::Error;

/// 非法的运行参数，在打开任何文件之前检出
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("number of threads must be greater than 0")]
    NoThreads,
    #[error("queue capacity must be greater than 0")]
    NoQueueCapacity,
    #[error("minimum fragment length must be greater than 0")]
    MinFragmentLength,
    #[error("minimum score must be greater than 0")]
    MinScore,
    #[error("seed length must be greater than 0")]
    SeedLength,
    #[error("E-value threshold must be greater than 0, got {0}")]
    EvalueNotPositive(f64),
    #[error("E-value calculation is only available in Greedy mode")]
    EvalueRequiresGreedy,
    #[error("protein input only supports one input file")]
    PairedProteinInput,
    #[error("length of input/output file lists differs ({0} vs {1})")]
    FileListLength(usize, usize),
}

/// 无法使用的分类树文件
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("cannot read taxonomy file '{path}'")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: malformed taxonomy record '{record}'")]
    Malformed { line: usize, record: String },
    #[error("taxonomy contains no nodes")]
    Empty,
}

/// 结构上无法使用的 read 文件
#[derive(Debug, Error)]
pub enum ReadInputError {
    #[error("auto-detection of file type for file '{0}' failed")]
    UnknownFormat(String),
    #[error("file '{file}': malformed FASTQ record near read '{read}': {reason}")]
    MalformedFastq { file: String, read: String, reason: &'static str },
    #[error("file '{first}' contains {n1} reads but file '{second}' contains {n2}")]
    MateCountMismatch { first: String, second: String, n1: usize, n2: usize },
}
