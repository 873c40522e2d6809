// ==============================================================================
// snp_reference.rs - SNP ID to rsID Reference Parser
// ==============================================================================
// Description: Loads array-vendor SNP ID → rsID lookup tables (CSV)
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================
// Format: CSV, no fixed header; any line containing "#" is skipped
// Example:
//   # Probe Set ID,SNP ID,dbSNP RS ID
//   AFFX-SNP_10000979,SNP_A-1780419,rs6576700
//   AFFX-SNP_10009702,SNP_A-1780418,---
// Columns: array marker ID, SNP ID (index 1), rsID (index 2); "---" = no rsID
// ==============================================================================

use csv::ReaderBuilder;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

const NO_RSID: &str = "---";

/// Errors that can occur while loading a SNP reference
#[derive(Error, Debug)]
pub enum SnpReferenceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid line format at line {line}: expected at least 3 columns, found {found}")]
    InvalidFormat { line: u64, found: usize },
}

/// SNP ID → rsID lookup
#[derive(Debug, Clone, Default)]
pub struct SnpReference {
    entries: HashMap<String, String>,
}

impl SnpReference {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Load a reference CSV
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SnpReferenceError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path.as_ref())?;

        let mut entries = HashMap::new();
        for result in reader.records() {
            let record = result?;

            if record.iter().any(|field| field.contains('#')) {
                continue;
            }
            if record.len() < 3 {
                return Err(SnpReferenceError::InvalidFormat {
                    line: record.position().map(|p| p.line()).unwrap_or_default(),
                    found: record.len(),
                });
            }

            entries.insert(record[1].trim().to_string(), record[2].trim().to_string());
        }

        Ok(Self { entries })
    }

    /// rsID for `snp_id`; None when unknown or recorded as "---"
    pub fn rsid_for(&self, snp_id: &str) -> Option<&str> {
        self.entries
            .get(snp_id)
            .map(String::as_str)
            .filter(|rsid| *rsid != NO_RSID && !rsid.is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_reference() {
        let file = create_test_file(
            "# Probe Set ID,SNP ID,dbSNP RS ID\n\
             AFFX-1,SNP_A-1,rs6576700\n\
             AFFX-2,SNP_A-2,---\n",
        );

        let reference = SnpReference::load(file.path()).unwrap();

        assert_eq!(reference.len(), 2);
        assert_eq!(reference.rsid_for("SNP_A-1"), Some("rs6576700"));
        assert_eq!(reference.rsid_for("SNP_A-2"), None);
        assert_eq!(reference.rsid_for("SNP_A-3"), None);
    }

    #[test]
    fn test_comment_anywhere_skips_line() {
        let file = create_test_file("AFFX-1,SNP_A-1,rs1 # legacy\nAFFX-2,SNP_A-2,rs2\n");

        let reference = SnpReference::load(file.path()).unwrap();

        assert_eq!(reference.rsid_for("SNP_A-1"), None);
        assert_eq!(reference.rsid_for("SNP_A-2"), Some("rs2"));
    }

    #[test]
    fn test_short_line_rejected() {
        let file = create_test_file("AFFX-1,SNP_A-1,rs1\nAFFX-2,SNP_A-2\n");

        match SnpReference::load(file.path()).unwrap_err() {
            SnpReferenceError::InvalidFormat { line, found } => {
                assert_eq!(line, 2);
                assert_eq!(found, 2);
            }
            other => panic!("Expected InvalidFormat error, got {other:?}"),
        }
    }
}
