//! 编码、翻译、打分与低复杂度屏蔽等基础工具

pub mod blosum;
pub mod dna;
pub mod protein;
pub mod seg;
