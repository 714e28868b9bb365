use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use glob::Pattern;
use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use dvpl_core::{compress, decompress, CompressionPolicy, EXTENSION};

/// Which way files are converted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// plain file → `<name>.dvpl`
    Compress,
    /// `<name>.dvpl` → plain file
    Decompress,
}

/// Settings shared by every file of one conversion run.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub direction: Direction,
    /// Keep the source file after a successful conversion.
    pub keep_originals: bool,
    /// Convert in memory and report, without writing or deleting anything.
    pub dry_run: bool,
    /// File-name patterns to skip.
    pub ignore: Vec<Pattern>,
    /// Lower-case extensions written with [`CompressionPolicy::Stored`].
    pub stored_exts: Vec<String>,
}

impl ConvertOptions {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            keep_originals: false,
            dry_run: false,
            ignore: Vec::new(),
            stored_exts: vec!["tex".to_string()],
        }
    }

    fn is_ignored(&self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };
        self.ignore.iter().any(|p| p.matches(name))
    }

    /// Whether `path` is a source file for this direction.
    fn wants(&self, path: &Path) -> bool {
        let is_dvpl = has_dvpl_extension(path);
        let direction_ok = match self.direction {
            Direction::Compress => !is_dvpl,
            Direction::Decompress => is_dvpl,
        };
        direction_ok && !self.is_ignored(path)
    }

    /// Policy used when compressing `path`.
    pub fn policy_for(&self, path: &Path) -> CompressionPolicy {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext {
            Some(ext) if self.stored_exts.iter().any(|s| *s == ext) => CompressionPolicy::Stored,
            _ => CompressionPolicy::Compressed,
        }
    }
}

fn has_dvpl_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| e.eq_ignore_ascii_case(EXTENSION))
}

/// Destination path for converting `path` in `direction`.
///
/// `a.txt` ↔ `a.txt.dvpl`.
pub fn output_path(path: &Path, direction: Direction) -> PathBuf {
    match direction {
        Direction::Compress => {
            let mut name: OsString = path.as_os_str().to_owned();
            name.push(".");
            name.push(EXTENSION);
            PathBuf::from(name)
        }
        Direction::Decompress => path.with_extension(""),
    }
}

/// Expand `paths` into the list of files to convert.
///
/// Directories are walked recursively. Explicitly named files that do not
/// match the direction or an ignore pattern are skipped with a warning.
pub fn collect_targets(paths: &[PathBuf], opts: &ConvertOptions) -> anyhow::Result<Vec<PathBuf>> {
    let mut targets = Vec::new();
    for root in paths {
        let meta = fs::metadata(root).with_context(|| format!("reading {:?}", root))?;
        if meta.is_file() {
            if opts.wants(root) {
                targets.push(root.clone());
            } else {
                warn!(path = %root.display(), "skipping file that does not match this conversion");
            }
            continue;
        }

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("walking {:?}", root))?;
            if entry.file_type().is_file() && opts.wants(entry.path()) {
                targets.push(entry.into_path());
            }
        }
    }
    debug!(count = targets.len(), "collected conversion targets");
    Ok(targets)
}

/// Result of converting one file.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub bytes_in: u64,
    pub bytes_out: u64,
}

/// Convert a single file according to `opts`.
pub fn convert_file(path: &Path, opts: &ConvertOptions) -> anyhow::Result<Outcome> {
    let data = fs::read(path).with_context(|| format!("reading {:?}", path))?;

    let converted = match opts.direction {
        Direction::Compress => {
            let policy = opts.policy_for(path);
            debug!(path = %path.display(), ?policy, "compressing");
            compress(&data, policy)
        }
        Direction::Decompress => {
            debug!(path = %path.display(), "decompressing");
            decompress(&data)
        }
    }
    .with_context(|| format!("converting {:?}", path))?;

    let output = output_path(path, opts.direction);
    if !opts.dry_run {
        fs::write(&output, &converted).with_context(|| format!("writing {:?}", output))?;
        if !opts.keep_originals {
            fs::remove_file(path).with_context(|| format!("removing {:?}", path))?;
        }
    }

    info!(
        input = %path.display(),
        output = %output.display(),
        dry_run = opts.dry_run,
        "converted"
    );
    Ok(Outcome {
        input: path.to_path_buf(),
        output,
        bytes_in: data.len() as u64,
        bytes_out: converted.len() as u64,
    })
}

/// Summary of a conversion run.
#[derive(Debug, Default)]
pub struct Report {
    pub converted: Vec<Outcome>,
    pub failed: Vec<(PathBuf, anyhow::Error)>,
    pub elapsed_secs: f64,
}

impl Report {
    pub fn bytes_in(&self) -> u64 {
        self.converted.iter().map(|o| o.bytes_in).sum()
    }

    pub fn bytes_out(&self) -> u64 {
        self.converted.iter().map(|o| o.bytes_out).sum()
    }
}

/// Convert every target, one file per rayon task.
///
/// A failure on one file does not stop the others; it is collected into
/// [`Report::failed`].
pub fn convert_all(targets: &[PathBuf], opts: &ConvertOptions) -> Report {
    let t0 = Instant::now();
    let results: Vec<(PathBuf, anyhow::Result<Outcome>)> = targets
        .par_iter()
        .map(|path| (path.clone(), convert_file(path, opts)))
        .collect();

    let mut report = Report::default();
    for (path, result) in results {
        match result {
            Ok(outcome) => {
                debug!(
                    input = %outcome.input.display(),
                    output = %outcome.output.display(),
                    bytes_in = outcome.bytes_in,
                    bytes_out = outcome.bytes_out,
                    "done"
                );
                report.converted.push(outcome)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{:#}", e), "conversion failed");
                report.failed.push((path, e));
            }
        }
    }
    report.elapsed_secs = t0.elapsed().as_secs_f64();
    report
}
