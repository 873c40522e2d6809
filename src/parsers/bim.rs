// ==============================================================================
// bim.rs - PLINK .bim Marker File Parser
// ==============================================================================
// Description: Reads variant identifiers and rsID sets from PLINK .bim files
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================
// Format: Tab-delimited, no header, one variant per line
// Example:
//   1    rs3094315    0    752566    G    A
//   1    .            0    768448    A    G
//   MT   rs2853515    0    150       A    G
// Columns: chromosome, identifier, genetic distance (cM), position, A1, A2
// ==============================================================================

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

use super::find_rsid;

/// Errors that can occur while reading a .bim file
#[derive(Error, Debug)]
pub enum BimParseError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid line format at line {line}: {details}")]
    InvalidFormat { line: usize, details: String },
}

/// Parser for PLINK .bim files
#[derive(Debug, Clone, Default)]
pub struct BimParser {
    /// Only the first N lines are read when set (N > 0)
    pub max_records: Option<usize>,
}

impl BimParser {
    pub fn new() -> Self {
        Self { max_records: None }
    }

    /// Parser that stops after the first `max_records` lines.
    /// `Some(0)` and `None` both mean the whole file.
    pub fn with_max_records(max_records: Option<usize>) -> Self {
        Self {
            max_records: max_records.filter(|n| *n > 0),
        }
    }

    /// rsID carried by a marker line, if the line qualifies.
    ///
    /// A line is dropped when it contains "." anywhere (missing identifier or
    /// non-integer field) or starts with "MT" (mitochondrial).
    pub fn rsid_from_line(line: &str) -> Option<&str> {
        if line.contains('.') || line.starts_with("MT") {
            return None;
        }
        find_rsid(line)
    }

    /// Deduplicated set of rsIDs in the file
    pub fn extract_rsids(&self, path: impl AsRef<Path>) -> Result<BTreeSet<String>, BimParseError> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let limit = self.max_records.unwrap_or(usize::MAX);

        let mut rsids = BTreeSet::new();
        for line in reader.lines().take(limit) {
            let line = line?;
            if let Some(rsid) = Self::rsid_from_line(&line) {
                rsids.insert(rsid.to_string());
            }
        }

        Ok(rsids)
    }

    /// Identifier column of every line, in file order
    pub fn snp_ids(&self, path: impl AsRef<Path>) -> Result<Vec<String>, BimParseError> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let limit = self.max_records.unwrap_or(usize::MAX);

        let mut ids = Vec::new();
        for (index, line) in reader.lines().take(limit).enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 2 {
                return Err(BimParseError::InvalidFormat {
                    line: index + 1,
                    details: format!("Expected at least 2 fields, found {}", fields.len()),
                });
            }
            ids.push(fields[1].to_string());
        }

        Ok(ids)
    }
}
