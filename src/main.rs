// Fri Oct 16 2026 - Alex

use anyhow::Context;
use aob_scanner::{
    memory::{self, MemoryAccess, MemoryReader, SnapshotReader},
    utils::{format_bytes, format_duration, parse_address, pluralize},
    spawn_pattern_scan, AobScanner, CancellationToken, Pattern, ScanOptions, ScannerConfig,
};
use clap::{ArgGroup, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(name = "aob-scanner")]
#[command(author = "Alex")]
#[command(version = "1.0.0")]
#[command(about = "Parallel array-of-bytes scanner for process memory", long_about = None)]
#[command(group(ArgGroup::new("target").required(true).args(["pid", "file"])))]
struct Args {
    /// Space separated hex bytes, `?` or `??` for wildcards, e.g. "48 8B ?? ?? 05"
    pattern: String,

    #[arg(short, long)]
    pid: Option<u32>,

    /// Memory dump to scan instead of a live process
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Address the dump was taken from
    #[arg(long, default_value = "0", value_parser = parse_address, requires = "file")]
    base: usize,

    #[arg(long, value_parser = parse_address)]
    min: Option<usize>,

    #[arg(long, value_parser = parse_address)]
    max: Option<usize>,

    /// Required access, any of r, w, x (default rw)
    #[arg(short, long)]
    access: Option<MemoryAccess>,

    #[arg(short, long)]
    threads: Option<usize>,

    #[arg(long)]
    chunk_size: Option<usize>,

    /// JSON scanner config (max_threads, chunk_size)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also scan shared mappings (Linux)
    #[arg(long)]
    include_shared: bool,

    /// Print at most this many addresses
    #[arg(long)]
    limit: Option<usize>,

    #[arg(long)]
    json: bool,

    #[arg(long)]
    no_progress: bool,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Serialize)]
struct JsonReport {
    pattern: String,
    elapsed_ms: u128,
    total_matches: usize,
    matches: Vec<String>,
    regions: usize,
    chunks: usize,
    failed_chunks: usize,
    bytes_scanned: u64,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("{} {:#}", "[!]".red(), e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    setup_logging(&args);

    let pattern = Pattern::compile(&args.pattern).context("Could not compile pattern")?;
    let display = pattern.to_string();

    let mut config = match &args.config {
        Some(path) => ScannerConfig::load(path)?,
        None => ScannerConfig::default(),
    };
    if let Some(threads) = args.threads {
        config.max_threads = threads;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }

    let options = ScanOptions {
        min_address: args.min,
        max_address: args.max,
        access: args.access,
    };

    let (reader, target): (Box<dyn MemoryReader>, String) = match (&args.file, args.pid) {
        (Some(path), _) => {
            let reader = SnapshotReader::from_file(path, args.base)
                .with_context(|| format!("Failed to map {}", path.display()))?;
            (Box::new(reader) as Box<dyn MemoryReader>, path.display().to_string())
        }
        (None, Some(pid)) => {
            let reader = memory::open_process(pid, args.include_shared)
                .with_context(|| format!("Failed to open process {}", pid))?;
            (reader, format!("pid {}", pid))
        }
        (None, None) => anyhow::bail!("Either --pid or --file is required"),
    };

    let scanner = AobScanner::with_config(reader, config)?;

    if !args.json {
        println!("{} Scanning {} for {}", "[*]".blue(), target, display.cyan());
    }

    let spinner = if args.json || args.no_progress {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
        pb.set_message(format!("Scanning {}...", target));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let started = Instant::now();
    let result = spawn_pattern_scan(scanner, pattern, options, CancellationToken::new()).wait();
    let elapsed = started.elapsed();
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let report = result?;

    let shown = args.limit.unwrap_or(usize::MAX).min(report.matches.len());

    if args.json {
        let output = JsonReport {
            pattern: display,
            elapsed_ms: elapsed.as_millis(),
            total_matches: report.matches.len(),
            matches: report.matches[..shown].iter().map(|a| format!("0x{:x}", a)).collect(),
            regions: report.regions,
            chunks: report.chunks,
            failed_chunks: report.failed_chunks,
            bytes_scanned: report.bytes_scanned,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "{} {} in {} ({}, {}, {} read)",
        "[+]".green(),
        pluralize(report.matches.len(), "match", "matches"),
        format_duration(elapsed),
        pluralize(report.regions, "region", "regions"),
        pluralize(report.chunks, "chunk", "chunks"),
        format_bytes(report.bytes_scanned)
    );

    if report.failed_chunks > 0 {
        println!(
            "{} {} could not be read",
            "[!]".yellow(),
            pluralize(report.failed_chunks, "chunk", "chunks")
        );
    }

    for address in &report.matches[..shown] {
        println!("  {}", format!("0x{:x}", address).green());
    }
    if shown < report.matches.len() {
        println!("  ... and {} more", report.matches.len() - shown);
    }

    Ok(())
}

fn setup_logging(args: &Args) {
    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        match args.log_level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "error" => log::LevelFilter::Error,
            "off" => log::LevelFilter::Off,
            _ => log::LevelFilter::Warn,
        }
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}
