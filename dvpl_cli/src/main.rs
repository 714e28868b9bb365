mod convert;
mod logging;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use glob::Pattern;
use tracing::info;

use convert::{collect_targets, convert_all, ConvertOptions, Direction, Report};
use dvpl_core::{codec_for_kind, decode_footer, verify_payload, FOOTER_SIZE};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "dvpl",
    about = "Convert files to and from DVPL containers, and inspect their footers",
    version
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack plain files into `<name>.dvpl` containers
    Compress {
        #[command(flatten)]
        common: CommonArgs,
        /// Extensions written uncompressed (kind 0); repeatable
        #[arg(long = "stored-ext", value_name = "EXT", default_values_t = vec!["tex".to_string()])]
        stored_exts: Vec<String>,
    },
    /// Unpack `<name>.dvpl` containers back to plain files
    Decompress {
        #[command(flatten)]
        common: CommonArgs,
    },
    /// Print the footer of a single DVPL container and check its payload
    Inspect {
        /// DVPL container to inspect
        file: PathBuf,
        /// Print the footer as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Files or directories (walked recursively) to convert
    #[arg(required = true)]
    paths: Vec<PathBuf>,
    /// Keep source files after a successful conversion
    #[arg(short, long)]
    keep_originals: bool,
    /// Convert in memory and report, without writing or deleting files
    #[arg(long)]
    dry_run: bool,
    /// Skip files whose name matches this glob pattern; repeatable
    #[arg(short, long, value_name = "PATTERN")]
    ignore: Vec<String>,
    /// Worker threads (default: one per core)
    #[arg(short, long)]
    jobs: Option<usize>,
}

// ── Helpers ────────────────────────────────────────────────────────────────

fn human_bytes(n: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut v = n as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", n)
    } else {
        format!("{:.2} {}", v, UNITS[unit])
    }
}

fn build_options(
    direction: Direction,
    common: &CommonArgs,
    stored_exts: Vec<String>,
) -> anyhow::Result<ConvertOptions> {
    let ignore = common
        .ignore
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("invalid ignore pattern {:?}", p)))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut opts = ConvertOptions::new(direction);
    opts.keep_originals = common.keep_originals;
    opts.dry_run = common.dry_run;
    opts.ignore = ignore;
    opts.stored_exts = stored_exts
        .into_iter()
        .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
        .collect();
    Ok(opts)
}

fn print_report(report: &Report) {
    eprintln!("  converted   : {}", report.converted.len());
    eprintln!("  failed      : {}", report.failed.len());
    eprintln!("  bytes in    : {}", human_bytes(report.bytes_in()));
    eprintln!("  bytes out   : {}", human_bytes(report.bytes_out()));
    eprintln!("  elapsed     : {:.3}s", report.elapsed_secs);
    for (path, err) in &report.failed {
        eprintln!("  error: {:?}: {:#}", path, err);
    }
}

// ── Subcommand implementations ─────────────────────────────────────────────

fn run_convert(
    direction: Direction,
    common: CommonArgs,
    stored_exts: Vec<String>,
) -> anyhow::Result<()> {
    let opts = build_options(direction, &common, stored_exts)?;
    let targets = collect_targets(&common.paths, &opts)?;
    info!(count = targets.len(), ?direction, "starting conversion");

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = common.jobs {
        pool = pool.num_threads(jobs);
    }
    let pool = pool.build().context("building worker pool")?;
    let report = pool.install(|| convert_all(&targets, &opts));

    print_report(&report);
    if !report.failed.is_empty() {
        anyhow::bail!("{} of {} files failed", report.failed.len(), targets.len());
    }
    Ok(())
}

fn run_inspect(file: PathBuf, json: bool) -> anyhow::Result<()> {
    let data = std::fs::read(&file).with_context(|| format!("reading {:?}", file))?;
    let footer = decode_footer(&data).with_context(|| format!("decoding footer of {:?}", file))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&footer)?);
        return Ok(());
    }

    let payload = &data[..data.len() - FOOTER_SIZE];
    let codec = match footer.kind() {
        Ok(kind) => codec_for_kind(kind).name().to_string(),
        Err(e) => format!("invalid ({e})"),
    };
    let integrity = match verify_payload(payload, &footer) {
        Ok(()) => "ok".to_string(),
        Err(e) => e.to_string(),
    };

    println!("=== DVPL File: {:?} ===", file);
    println!();
    println!("  original size   : {}", human_bytes(footer.original_size as u64));
    println!("  compressed size : {}", human_bytes(footer.compressed_size as u64));
    println!("  payload on disk : {}", human_bytes(payload.len() as u64));
    println!("  checksum        : 0x{:08x}", footer.checksum);
    println!("  compression     : {} (kind={})", codec, footer.compression_kind);
    println!("  integrity       : {}", integrity);
    Ok(())
}

// ── Entry point ────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    match cli.command {
        Commands::Compress {
            common,
            stored_exts,
        } => run_convert(Direction::Compress, common, stored_exts),
        Commands::Decompress { common } => run_convert(Direction::Decompress, common, Vec::new()),
        Commands::Inspect { file, json } => run_inspect(file, json),
    }
}
