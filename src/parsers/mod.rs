// ==============================================================================
// parsers/mod.rs - File parser modules
// ==============================================================================
// Description: Readers for PLINK marker, log, missnp and SNP reference files
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================

use regex::Regex;
use std::sync::LazyLock;

pub mod bim;
pub mod missnp;
pub mod plink_log;
pub mod snp_reference;

pub use bim::{BimParseError, BimParser};
pub use missnp::MissnpParser;
pub use plink_log::PlinkLogParser;
pub use snp_reference::{SnpReference, SnpReferenceError};

/// Reference-SNP identifier: "rs" followed by one or more digits
static RSID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rs[0-9]+").expect("rsID pattern is a valid regex"));

/// First rsID substring in `text`, if any
pub fn find_rsid(text: &str) -> Option<&str> {
    RSID_PATTERN.find(text).map(|m| m.as_str())
}
