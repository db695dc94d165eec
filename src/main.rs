use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info, warn, LevelFilter};

use taxmatch::config::{ClassifyConfig, Mode, PairPolicy};
use taxmatch::error::ConfigError;
use taxmatch::index::fm::{FMIndex, IndexMeta};
use taxmatch::index::ProteinIndex;
use taxmatch::io::fasta::read_protein_db;
use taxmatch::io::reads::{check_mate_counts, open_maybe_gz, ReadSource};
use taxmatch::pipeline::classify_stream;
use taxmatch::taxonomy::Taxonomy;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(
    name = "taxmatch",
    author,
    version,
    about = "Taxonomic classification of reads against a protein FM-index",
    arg_required_else_help = true
)]
struct Cli {
    /// Print progress messages and extra output columns
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Print debug messages
    #[arg(short, long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ModeArg {
    Mem,
    Greedy,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PairArg {
    /// Both mates must match compatible taxa (MEM mode)
    Both,
    /// Pool the matches of both mates
    Either,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a protein FM-index from FASTA with `ACCESSION_TAXID` headers
    Index {
        /// Protein FASTA file (may be gzip-compressed)
        #[arg(short = 'i', long = "input")]
        input: String,
        /// Output index file
        #[arg(short = 'o', long = "output")]
        output: String,
        /// Occ sampling block size
        #[arg(long = "block", default_value_t = 64)]
        block: usize,
    },
    /// Classify reads
    Classify {
        /// nodes.dmp of the taxonomy
        #[arg(short = 't', long = "nodes")]
        nodes: String,
        /// merged.dmp with redirects of merged taxon ids
        #[arg(short = 'g', long = "merged")]
        merged: Option<String>,
        /// Protein FM-index built by `taxmatch index`
        #[arg(short = 'f', long = "fmi")]
        fmi: String,
        /// Input read files, comma-separated (FASTA/FASTQ, optionally gzipped)
        #[arg(short = 'i', long = "input")]
        input: String,
        /// Second mates for paired-end input, comma-separated
        #[arg(short = 'j', long = "mates")]
        mates: Option<String>,
        /// Output files, comma-separated (stdout if omitted)
        #[arg(short = 'o', long = "output")]
        output: Option<String>,
        #[arg(short = 'a', long = "mode", value_enum, default_value_t = ModeArg::Greedy)]
        mode: ModeArg,
        /// Minimum match length
        #[arg(short = 'm', long = "min-length", default_value_t = 11)]
        min_length: usize,
        /// Minimum match score (Greedy)
        #[arg(short = 's', long = "min-score", default_value_t = 65)]
        min_score: i32,
        /// Seed length (Greedy)
        #[arg(short = 'l', long = "seed-length", default_value_t = 7)]
        seed_length: usize,
        /// Maximum number of mismatches (Greedy)
        #[arg(short = 'e', long = "mismatches", default_value_t = 3)]
        mismatches: u32,
        /// Maximum E-value (Greedy)
        #[arg(short = 'E', long = "evalue")]
        evalue: Option<f64>,
        /// Number of worker threads
        #[arg(short = 'z', long = "threads", default_value_t = 1)]
        threads: usize,
        /// Disable SEG low-complexity filtering
        #[arg(short = 'X', long = "no-seg")]
        no_seg: bool,
        /// Input sequences are protein
        #[arg(short = 'p', long = "protein")]
        protein: bool,
        /// Capacity of the read queue
        #[arg(long = "queue", default_value_t = 500)]
        queue: usize,
        /// X-drop for Greedy extension
        #[arg(long = "xdrop", default_value_t = 20)]
        xdrop: i32,
        /// Do not skip seeds inside already accepted matches
        #[arg(long = "no-prune")]
        no_prune: bool,
        /// How the mates of a pair are combined in MEM mode
        #[arg(long = "pairs", value_enum, default_value_t = PairArg::Both)]
        pairs: PairArg,
    },
}

fn init_logging(verbose: bool, debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else if verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);
    match cli.command {
        Commands::Index { input, output, block } => run_index(&input, &output, block),
        Commands::Classify {
            nodes,
            merged,
            fmi,
            input,
            mates,
            output,
            mode,
            min_length,
            min_score,
            seed_length,
            mismatches,
            evalue,
            threads,
            no_seg,
            protein,
            queue,
            xdrop,
            no_prune,
            pairs,
        } => {
            let cfg = ClassifyConfig {
                mode: match mode {
                    ModeArg::Mem => Mode::Mem,
                    ModeArg::Greedy => Mode::Greedy,
                },
                min_fragment_length: min_length,
                min_score,
                seed_length,
                max_mismatches: mismatches,
                evalue,
                threads,
                seg: !no_seg,
                input_is_protein: protein,
                queue_capacity: queue,
                xdrop,
                prune_subsumed: !no_prune,
                pair_policy: match pairs {
                    PairArg::Both => PairPolicy::RequireBoth,
                    PairArg::Either => PairPolicy::Either,
                },
                verbose_output: cli.verbose,
            };
            let files = FileLists::parse(&input, mates.as_deref(), output.as_deref())?;
            run_classify(&nodes, merged.as_deref(), &fmi, &files, &cfg)
        }
    }
}

fn run_index(input: &str, output: &str, block: usize) -> Result<()> {
    info!("reading protein database from {}", input);
    let reader = open_maybe_gz(Path::new(input))?;
    let (proteins, skipped) = read_protein_db(reader)?;
    if skipped > 0 {
        warn!("{} record(s) without a taxon id in the header were skipped", skipped);
    }
    if proteins.is_empty() {
        bail!("FASTA file '{}' contains no usable protein sequences", input);
    }

    let total: usize = proteins.iter().map(|p| p.residues.len()).sum();
    info!("proteins: {}, residues: {}", proteins.len(), total);

    let mut fm = FMIndex::from_proteins(
        proteins.iter().map(|p| (p.accession.as_str(), p.taxon, p.residues.as_slice())),
        block,
    )?;
    fm.set_meta(IndexMeta {
        reference_file: Some(input.to_string()),
        build_args: Some(std::env::args().collect::<Vec<_>>().join(" ")),
        build_timestamp: Some(chrono::Utc::now().to_rfc3339()),
    });

    fm.save_to_file(output)
        .with_context(|| format!("cannot write index to '{}'", output))?;
    info!("FM index saved: {}", output);
    Ok(())
}

/// 输入、mate 与输出文件列表（逗号分隔），长度必须一致
#[derive(Debug)]
struct FileLists {
    inputs: Vec<String>,
    mates: Option<Vec<String>>,
    outputs: Option<Vec<String>>,
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',').map(str::trim).filter(|x| !x.is_empty()).map(String::from).collect()
}

impl FileLists {
    fn parse(input: &str, mates: Option<&str>, output: Option<&str>) -> Result<Self> {
        let inputs = split_list(input);
        if inputs.is_empty() {
            bail!("no input file given");
        }
        let mates = mates.map(split_list);
        let outputs = output.map(split_list);
        for other in [&mates, &outputs].into_iter().flatten() {
            if other.len() != inputs.len() {
                return Err(ConfigError::FileListLength(inputs.len(), other.len()).into());
            }
        }
        Ok(Self { inputs, mates, outputs })
    }

    fn all_inputs(&self) -> impl Iterator<Item = &String> {
        self.inputs.iter().chain(self.mates.iter().flatten())
    }
}

fn run_classify(
    nodes: &str,
    merged: Option<&str>,
    fmi: &str,
    files: &FileLists,
    cfg: &ClassifyConfig,
) -> Result<()> {
    let paired = files.mates.is_some();
    cfg.validate(paired)?;

    // 启动前检查全部文件，避免跑到一半才失败
    for f in [nodes, fmi].into_iter().chain(merged).chain(files.all_inputs().map(String::as_str)) {
        if !Path::new(f).is_file() {
            bail!("file '{}' does not exist or is not a regular file", f);
        }
    }
    if let Some(mates) = &files.mates {
        for (a, b) in files.inputs.iter().zip(mates) {
            check_mate_counts(Path::new(a), Path::new(b))?;
        }
    }

    info!("reading taxonomic tree from file {}", nodes);
    let taxonomy = Taxonomy::load(Path::new(nodes), merged.map(Path::new))?;
    info!("taxonomy: {} nodes", taxonomy.len());

    info!("reading database from file {}", fmi);
    let index = FMIndex::load_from_file(fmi)?;
    info!("database: {} proteins, {} residues", index.proteins.len(), index.total_residues());
    debug!("{:?}", cfg);

    for (k, input) in files.inputs.iter().enumerate() {
        let source = match &files.mates {
            Some(m) => {
                info!("processing files {} and {}", input, m[k]);
                ReadSource::paired(Path::new(input), Path::new(&m[k]))?
            }
            None => {
                info!("processing file {}", input);
                ReadSource::single(Path::new(input))?
            }
        };
        let out: Box<dyn Write + Send> = match &files.outputs {
            Some(o) => Box::new(BufWriter::new(
                File::create(&o[k]).with_context(|| format!("cannot create output file '{}'", o[k]))?,
            )),
            None => Box::new(BufWriter::new(std::io::stdout())),
        };
        let stats = classify_stream(&index, &taxonomy, cfg, source, out)
            .map_err(|e| anyhow!("classification of '{}' failed: {:#}", input, e))?;
        info!(
            "{} reads: {} classified, {} unclassified (peak {} in flight)",
            stats.processed, stats.classified, stats.unclassified, stats.peak_in_flight
        );
    }
    info!("finished");
    Ok(())
}
