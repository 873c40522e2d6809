// ==============================================================================
// plink_log.rs - PLINK Run Log Parser
// ==============================================================================
// Description: Harvests rsIDs named in "Warning:" lines of a PLINK .log file
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================
// Example:
//   Warning: Variant 'rs4475691' has 3+ alleles. Excluding.
//   Warning: Multiple positions seen for variant 'rs6685064'.
//   Performing single-pass merge (2504 people, 61102 variants).
// ==============================================================================

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use super::find_rsid;

const WARNING_PREFIX: &str = "Warning:";

/// Parser for PLINK run logs
pub struct PlinkLogParser;

impl PlinkLogParser {
    /// rsID named by a single log line, when it is a warning
    pub fn parse_line(line: &str) -> Option<String> {
        if !line.starts_with(WARNING_PREFIX) {
            return None;
        }

        find_rsid(line).map(|rsid| rsid.trim_end_matches(['\n', '\'', '.']).to_string())
    }

    /// All rsIDs from warning lines, in log order (duplicates kept)
    pub fn warning_rsids(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
        let reader = BufReader::new(File::open(path.as_ref())?);

        let mut rsids = Vec::new();
        for line in reader.lines() {
            if let Some(rsid) = Self::parse_line(&line?) {
                rsids.push(rsid);
            }
        }

        Ok(rsids)
    }
}
