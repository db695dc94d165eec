//! # taxmatch
//!
//! 基于蛋白质 FM 索引的宏基因组 read 分类器。
//!
//! 每条 read（或 read pair）被翻译成蛋白质片段，在参考蛋白质库的 FM 索引中
//! 查找种子并延伸为匹配，最后把最佳匹配的分类号归约为最近公共祖先（LCA）。
//!
//! - **索引构建**：后缀数组 + BWT + 分块 Occ 采样，支持 locate 与随机访问
//! - **MEM 模式**：最大精确匹配，按长度取最佳
//! - **Greedy 模式**：允许替换的无间隙延伸，BLOSUM62 打分，可选 E 值过滤
//! - **分类**：合并 ID 重定向、LCA 归约、双端 read 的分类兼容性过滤
//! - **流水线**：有界队列 + 固定数量的工作线程
//!
//! ## 快速示例
//!
//! ```rust,no_run
//! use taxmatch::config::{ClassifyConfig, Mode};
//! use taxmatch::index::fm::FMIndex;
//! use taxmatch::pipeline::classify_stream;
//! use taxmatch::taxonomy::Taxonomy;
//! use taxmatch::types::Read;
//!
//! let fm = FMIndex::from_proteins(
//!     vec![("P1", 10u64, &b"MKVLA"[..]), ("P2", 20u64, &b"MKVLB"[..])],
//!     64,
//! )?;
//! let tax = Taxonomy::from_parents([(1, 1), (5, 1), (10, 5), (20, 5)]);
//! let cfg = ClassifyConfig {
//!     mode: Mode::Mem,
//!     min_fragment_length: 4,
//!     input_is_protein: true,
//!     ..Default::default()
//! };
//! cfg.validate(false)?;
//!
//! let reads = vec![Ok(Read::single("r1", "MKVLA"))];
//! let stats = classify_stream(&fm, &tax, &cfg, reads.into_iter(), std::io::stdout())?;
//! println!("{} classified", stats.classified);
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## 模块说明
//!
//! - [`index`]：蛋白质 FM 索引（后缀数组、BWT、FM 索引）与 [`index::ProteinIndex`] 查询接口
//! - [`align`]：种子查找、MEM / Greedy 延伸、E 值、最佳匹配选择
//! - [`classify`]：片段准备、双端处理与 LCA 归约
//! - [`pipeline`]：有界生产者/消费者线程池
//! - [`taxonomy`]：分类树与 LCA
//! - [`io`]：FASTA / FASTQ 读取（含 gzip）与结果输出
//! - [`util`]：蛋白质编码、六框翻译、BLOSUM62、SEG 屏蔽

pub mod align;
pub mod classify;
pub mod config;
pub mod error;
pub mod index;
pub mod io;
pub mod pipeline;
pub mod taxonomy;
pub mod types;
pub mod util;
