use anyhow::{Context, Result};
use colored::Colorize;
use memmap2::Mmap;
use oggsniff::{Detection, Detector, Scanner, SeekSource, Verdict};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

mod cli;

struct Summary {
    process_time: Duration,
    processed_bytes: usize,
    verdicts: BTreeMap<&'static str, usize>,
}

impl Summary {
    fn new() -> Self {
        Self {
            process_time: Duration::ZERO,
            processed_bytes: 0,
            verdicts: BTreeMap::new(),
        }
    }

    fn record(&mut self, verdict: Verdict) {
        *self.verdicts.entry(verdict.mime_type()).or_default() += 1;
    }
}

#[derive(Serialize)]
struct FileReport<'a> {
    path: &'a Path,
    #[serde(flatten)]
    detection: &'a Detection,
}

/// Map `path` into memory. Empty files cannot be mapped and come back as `None`.
fn map_file(path: &Path) -> Result<Option<Mmap>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;

    if file.metadata()?.len() == 0 {
        return Ok(None);
    }

    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("failed to map {}", path.display()))?;
    Ok(Some(mmap))
}

fn expand(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        let before = paths.len();
        for entry in glob::glob(pattern).with_context(|| format!("bad pattern {pattern}"))? {
            let path = entry?;
            if path.is_file() {
                paths.push(path);
            }
        }

        if paths.len() == before {
            tracing::warn!(pattern = %pattern, "pattern matched no files");
        }
    }

    Ok(paths)
}

fn run_detect(args: &cli::Cli, patterns: &[String]) -> Result<Summary> {
    let detector = Detector::new(args.detect_options());
    let mut summary = Summary::new();
    let start_time = Instant::now();

    for path in expand(patterns)? {
        let mmap = map_file(&path)?;
        let data: &[u8] = mmap.as_deref().unwrap_or(&[]);

        let mut source = SeekSource::new(Cursor::new(data))?;
        let detection = detector
            .detect(&mut source)
            .with_context(|| format!("failed to read {}", path.display()))?;

        summary.processed_bytes += data.len();
        summary.record(detection.verdict);

        if args.json {
            let report = FileReport {
                path: &path,
                detection: &detection,
            };
            println!("{}", serde_json::to_string(&report)?);
        } else if !args.silent {
            println!(
                "--> {}: {} ({} streams)",
                path.display(),
                detection.verdict.to_string().bold(),
                detection.total_streams
            );
        }
    }

    summary.process_time = start_time.elapsed();
    Ok(summary)
}

fn run_scan(args: &cli::Cli, file_path: &str) -> Result<Summary> {
    let scanner = Scanner::new(args.detect_options());
    let mut summary = Summary::new();

    let mmap = map_file(Path::new(file_path))?;
    let data: &[u8] = mmap.as_deref().unwrap_or(&[]);

    let start_time = Instant::now();
    let found = scanner.scan(data)?;

    for m in &found {
        summary.record(m.detection.verdict);

        if args.json {
            println!("{}", serde_json::to_string(m)?);
        } else if !args.silent {
            println!(
                "--> Found {} stream @ {:#016X} ({} bytes)",
                m.detection.verdict, m.offset, m.size
            );
        }
    }

    summary.processed_bytes = data.len();
    summary.process_time = start_time.elapsed();
    Ok(summary)
}

fn humanize_size(bytes: usize) -> String {
    const UNITS: [&str; 7] = ["B", "KB", "MB", "GB", "TB", "PB", "EB"];

    if bytes == 0 {
        return "0.00 B".to_string();
    }

    let exp = ((bytes as f64).log(1024.0).floor() as usize).min(UNITS.len() - 1);
    let size_in_units = bytes as f64 / 1024_f64.powi(exp as i32);

    format!("{:.2} {}", size_in_units, UNITS[exp])
}

fn print_summary(summary: &Summary) {
    let elapsed_seconds = summary.process_time.as_secs_f64().max(f64::EPSILON);
    let processed_bytes = summary.processed_bytes as f64;
    let speed_mbps = (processed_bytes / (1024.0 * 1024.0)) / elapsed_seconds;

    println!("\n{}", "Summary:\n".bold().underline());
    println!("-> Process time: {:?}", summary.process_time);
    println!(
        "-> Processed: {} ({} bytes)",
        humanize_size(summary.processed_bytes),
        summary.processed_bytes
    );
    println!("-> Speed: {:.2} MB/s", speed_mbps);

    for (mime, count) in &summary.verdicts {
        println!("-> {}: {}", mime, count);
    }
}

fn main() -> Result<()> {
    let args: cli::Cli = cli::parse();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if args.verbose {
            "oggsniff=debug".to_string()
        } else {
            "oggsniff=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let summary = match &args.command {
        cli::Commands::Detect { patterns } => run_detect(&args, patterns)?,
        cli::Commands::Scan { file_path } => {
            if !args.json {
                println!("-> Scanning...");
            }
            run_scan(&args, file_path)?
        }
    };

    if !args.json {
        print_summary(&summary);
    }

    Ok(())
}
