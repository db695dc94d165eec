//! 有界生产者/消费者线程池。
//!
//! 调用线程解析 read 并送入有界通道；固定数量的 scoped worker 取出、分类，
//! 并向共享输出写一行。发送端被丢弃即关闭通道，队列取空后运行结束。
//! 不保持 read 之间的输出顺序。

use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use log::debug;
use parking_lot::Mutex;

use crate::align::{GreedyExtender, MemExtender};
use crate::classify::Classifier;
use crate::config::{ClassifyConfig, Mode};
use crate::index::ProteinIndex;
use crate::io::output::format_line;
use crate::taxonomy::Taxonomy;
use crate::types::{Classification, Read};

/// 生产者与所有 worker 共享的计数器
#[derive(Debug, Default)]
pub struct RunStats {
    processed: AtomicU64,
    classified: AtomicU64,
    /// 已从输入取出但尚未输出的 read：队列中的（含生产者正在交付的一条）
    /// 加上每个 worker 手中的一条
    in_flight: AtomicU64,
    peak_in_flight: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSummary {
    pub processed: u64,
    pub classified: u64,
    pub unclassified: u64,
    pub peak_in_flight: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn taken(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::AcqRel);
    }

    fn dropped(&self) {
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }

    fn emitted(&self, res: &Classification) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        if res.is_classified() {
            self.classified.fetch_add(1, Ordering::Relaxed);
        }
        self.in_flight.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn summary(&self) -> StatsSummary {
        let processed = self.processed.load(Ordering::Acquire);
        let classified = self.classified.load(Ordering::Acquire);
        StatsSummary {
            processed,
            classified,
            unclassified: processed - classified,
            peak_in_flight: self.peak_in_flight.load(Ordering::Acquire),
        }
    }
}

/// 串行化输出：先格式化整行，再一次写入
pub struct ResultSink<W: Write> {
    out: Mutex<W>,
    verbose: bool,
}

impl<W: Write> ResultSink<W> {
    pub fn new(out: W, verbose: bool) -> Self {
        Self { out: Mutex::new(out), verbose }
    }

    pub fn emit(&self, res: &Classification) -> std::io::Result<()> {
        let line = format_line(res, self.verbose);
        self.out.lock().write_all(line.as_bytes())
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

fn produce<R>(reads: R, tx: Sender<Read>, stats: &RunStats) -> Result<()>
where
    R: Iterator<Item = Result<Read>>,
{
    for read in reads {
        let read = read?;
        stats.taken();
        // 所有 worker 都已退出：其错误在 join 时返回
        if tx.send(read).is_err() {
            stats.dropped();
            break;
        }
    }
    Ok(())
}

fn consume<W, F>(rx: Receiver<Read>, classify: &F, sink: &ResultSink<W>, stats: &RunStats) -> Result<()>
where
    W: Write,
    F: Fn(&Read) -> Classification,
{
    for read in rx.iter() {
        let res = classify(&read);
        sink.emit(&res).context("cannot write classification result")?;
        stats.emitted(&res);
    }
    Ok(())
}

/// 用 `threads` 个 worker 和容量为 `capacity` 的队列对 `reads` 执行 `classify`。
/// 返回生产者或任一 worker 的第一个错误。
pub fn run_pool<R, W, F>(
    reads: R,
    threads: usize,
    capacity: usize,
    classify: F,
    sink: &ResultSink<W>,
    stats: &RunStats,
) -> Result<()>
where
    R: Iterator<Item = Result<Read>>,
    W: Write + Send,
    F: Fn(&Read) -> Classification + Sync,
{
    let threads = threads.max(1);
    // 生产者手中待交付的那条占一个队列位置
    let (tx, rx) = bounded::<Read>(capacity.max(1) - 1);
    let classify = &classify;

    thread::scope(|s| -> Result<()> {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let rx = rx.clone();
                s.spawn(move || consume(rx, classify, sink, stats))
            })
            .collect();
        drop(rx);

        let mut first_err = produce(reads, tx, stats).err();
        for h in handles {
            match h.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    first_err.get_or_insert(e);
                }
                Err(_) => {
                    first_err.get_or_insert_with(|| anyhow!("worker thread panicked"));
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    })
}

/// 对 read 流分类，每条 read 向 `out` 写一行。
///
/// 延伸模式在此处选定一次，worker 运行针对该模式单态化的分类器。
/// `cfg` 应已通过校验。
pub fn classify_stream<I, R, W>(
    index: &I,
    taxonomy: &Taxonomy,
    cfg: &ClassifyConfig,
    reads: R,
    out: W,
) -> Result<StatsSummary>
where
    I: ProteinIndex + ?Sized,
    R: Iterator<Item = Result<Read>>,
    W: Write + Send,
{
    let sink = ResultSink::new(out, cfg.verbose_output);
    let stats = RunStats::new();
    debug!(
        "classifying with {} worker(s), queue capacity {}, mode {:?}",
        cfg.threads, cfg.queue_capacity, cfg.mode
    );

    match cfg.mode {
        Mode::Mem => {
            let ext = MemExtender::from_config(cfg);
            let classifier = Classifier::new(index, taxonomy, cfg, &ext);
            run_pool(reads, cfg.threads, cfg.queue_capacity, |r| classifier.classify(r), &sink, &stats)?;
        }
        Mode::Greedy => {
            let ext = GreedyExtender::from_config(cfg, index.total_residues());
            let classifier = Classifier::new(index, taxonomy, cfg, &ext);
            run_pool(reads, cfg.threads, cfg.queue_capacity, |r| classifier.classify(r), &sink, &stats)?;
        }
    }

    sink.into_inner().flush().context("cannot flush output")?;
    Ok(stats.summary())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use std::time::Duration;

    fn reads(n: usize) -> impl Iterator<Item = Result<Read>> {
        (0..n).map(|i| Ok(Read::single(format!("r{}", i), "MKVLA")))
    }

    fn fake_classify(r: &Read) -> Classification {
        let mut c = Classification::unclassified(r.name.as_str());
        if r.name.ends_with('0') {
            c.taxon = Some(10);
            c.best_length = 5;
        }
        c
    }

    #[test]
    fn every_read_is_emitted_once() {
        let sink = ResultSink::new(Vec::new(), false);
        let stats = RunStats::new();
        run_pool(reads(100), 4, 8, fake_classify, &sink, &stats).expect("run");
        let text = String::from_utf8(sink.into_inner()).expect("utf8");
        let mut names: Vec<&str> = text.lines().map(|l| l.split('\t').nth(1).unwrap_or("")).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 100);

        let s = stats.summary();
        assert_eq!(s.processed, 100);
        assert_eq!(s.classified, 10);
        assert_eq!(s.unclassified, 90);
    }

    #[test]
    fn in_flight_reads_are_bounded() {
        let (capacity, threads) = (3usize, 2usize);
        let sink = ResultSink::new(io::sink(), false);
        let stats = RunStats::new();
        let slow = |r: &Read| {
            thread::sleep(Duration::from_millis(2));
            fake_classify(r)
        };
        run_pool(reads(60), threads, capacity, slow, &sink, &stats).expect("run");
        let s = stats.summary();
        assert_eq!(s.processed, 60);
        assert!(s.peak_in_flight >= 1);
        assert!(s.peak_in_flight <= (capacity + threads) as u64, "peak {}", s.peak_in_flight);
    }

    #[test]
    fn producer_blocks_while_workers_are_stuck() {
        let (capacity, threads) = (3usize, 2usize);
        let sink = ResultSink::new(io::sink(), false);
        let stats = RunStats::new();
        let pulled = AtomicUsize::new(0);
        let release = AtomicBool::new(false);
        let gated = |r: &Read| {
            while !release.load(Ordering::Acquire) {
                thread::sleep(Duration::from_millis(1));
            }
            fake_classify(r)
        };
        let input = reads(50).inspect(|_| {
            pulled.fetch_add(1, Ordering::SeqCst);
        });

        thread::scope(|s| {
            let run = s.spawn(|| run_pool(input, threads, capacity, gated, &sink, &stats));
            thread::sleep(Duration::from_millis(200));
            let stuck_pulled = pulled.load(Ordering::SeqCst);
            let stuck = stats.summary();
            release.store(true, Ordering::Release);
            run.join().expect("join").expect("run");

            // 每个 worker 一条，其余占满队列
            let bound = capacity + threads;
            assert!(stuck_pulled <= bound, "pulled {}", stuck_pulled);
            assert!(stuck.peak_in_flight <= bound as u64);
            assert_eq!(stuck.processed, 0);
        });
        assert_eq!(pulled.load(Ordering::SeqCst), 50);
        assert_eq!(stats.summary().processed, 50);
    }

    #[test]
    fn producer_error_stops_the_run() {
        let sink = ResultSink::new(Vec::new(), false);
        let stats = RunStats::new();
        let input = reads(5).chain(std::iter::once(Err(anyhow!("bad record")))).chain(reads(5));
        let err = run_pool(input, 2, 4, fake_classify, &sink, &stats).unwrap_err();
        assert!(err.to_string().contains("bad record"));
        assert_eq!(stats.summary().processed, 5);
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_errors_are_reported() {
        let sink = ResultSink::new(FailingWriter, false);
        let stats = RunStats::new();
        let err = run_pool(reads(50), 2, 4, fake_classify, &sink, &stats).unwrap_err();
        assert!(format!("{:#}", err).contains("disk full"));
    }
}
