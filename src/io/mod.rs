//! 序列文件读取与结果输出

pub mod fasta;
pub mod fastq;
pub mod output;
pub mod reads;
