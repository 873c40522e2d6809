// ==============================================================================
// reconcile.rs - Merge Log / missnp Reconciliation
// ==============================================================================
// Description: Combines <out>-merge.missnp and <out>.log warnings into one
//              exclusion list for the exclusion stage
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================
// Output layout (<out>_MERGED_LOG_MISSNP.txt):
//   <every missnp line, verbatim>
//   <every rsID from a "Warning:" log line, one per line>
// ==============================================================================

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::models::{
    append_to_path, ReconcileMode, LOG_SUFFIX, MERGED_EXCLUSIONS_SUFFIX, MISSNP_SUFFIX,
};
use crate::parsers::{MissnpParser, PlinkLogParser};

pub fn manifest_path(out: &Path) -> PathBuf {
    append_to_path(out, MISSNP_SUFFIX)
}

pub fn log_path(out: &Path) -> PathBuf {
    append_to_path(out, LOG_SUFFIX)
}

pub fn merged_exclusions_path(out: &Path) -> PathBuf {
    append_to_path(out, MERGED_EXCLUSIONS_SUFFIX)
}

/// Written exclusion list
#[derive(Debug, Clone, Serialize)]
pub struct ExclusionList {
    pub path: PathBuf,
    pub manifest_lines: usize,
    pub log_identifiers: usize,
    /// Lines actually written (after dedup, if enabled)
    pub total: usize,
}

/// Merge the missnp manifest and log warnings for the run rooted at `out`.
///
/// Returns `Ok(None)` when there is nothing to exclude: both sources are
/// absent, or together they yielded no lines. A missing source is not an
/// error. The output file is always created fresh.
pub fn merge_log_to_missnp(out: &Path, mode: ReconcileMode) -> Result<Option<ExclusionList>> {
    let missnp = manifest_path(out);
    let logfile = log_path(out);

    info!(
        "Merging initial .log file: [ {} ] with .missnp file: [ {} ]",
        logfile.display(),
        missnp.display()
    );

    let manifest_lines = read_optional(MissnpParser::read_lines(&missnp))
        .with_context(|| format!("Failed to read {:?}", missnp))?;
    if manifest_lines.is_none() {
        warn!(".missnp file [ {} ] does not exist. Excluding from merge...", missnp.display());
    }

    let log_rsids = read_optional(PlinkLogParser::warning_rsids(&logfile))
        .with_context(|| format!("Failed to read {:?}", logfile))?;
    if log_rsids.is_none() {
        warn!("Log file [ {} ] does not exist.", logfile.display());
    }

    if manifest_lines.is_none() && log_rsids.is_none() {
        return Ok(None);
    }

    let manifest_lines = manifest_lines.unwrap_or_default();
    let log_rsids = log_rsids.unwrap_or_default();
    let manifest_count = manifest_lines.len();
    let log_count = log_rsids.len();

    let lines = combine(manifest_lines, log_rsids, mode);
    if lines.is_empty() {
        info!("No conflicting identifiers found for {}", out.display());
        return Ok(None);
    }

    let path = merged_exclusions_path(out);
    write_lines(&path, &lines).with_context(|| format!("Failed to write {:?}", path))?;

    info!(
        "Wrote {} exclusion entries ({} from missnp, {} from log) to {}",
        lines.len(),
        manifest_count,
        log_count,
        path.display()
    );

    Ok(Some(ExclusionList {
        path,
        manifest_lines: manifest_count,
        log_identifiers: log_count,
        total: lines.len(),
    }))
}

/// Manifest block then log block, each newline-terminated
pub fn combine(manifest_lines: Vec<String>, log_rsids: Vec<String>, mode: ReconcileMode) -> Vec<String> {
    let lines = manifest_lines
        .into_iter()
        .chain(log_rsids.into_iter().map(|rsid| format!("{}\n", rsid)));

    match mode {
        ReconcileMode::Preserve => lines.collect(),
        ReconcileMode::Dedup => {
            let mut seen = HashSet::new();
            lines
                .filter(|line| seen.insert(line.trim_end().to_string()))
                .collect()
        }
    }
}

/// NotFound becomes None; every other error propagates
fn read_optional<T>(result: io::Result<T>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn write_lines(path: &Path, lines: &[String]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for line in lines {
        writer.write_all(line.as_bytes())?;
    }
    writer.flush()
}
