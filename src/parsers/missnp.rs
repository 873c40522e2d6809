// ==============================================================================
// missnp.rs - PLINK Merge Manifest Reader
// ==============================================================================
// Description: Reads <out>-merge.missnp lines verbatim
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================
// Format: one identifier per line, optional "#" header lines (passed through)
// ==============================================================================

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Reader for PLINK merge manifests
pub struct MissnpParser;

impl MissnpParser {
    /// Every line of the manifest, raw, each ending in exactly one "\n"
    pub fn read_lines(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
        let mut reader = BufReader::new(File::open(path.as_ref())?);

        let mut lines = Vec::new();
        let mut buffer = String::new();
        loop {
            buffer.clear();
            if reader.read_line(&mut buffer)? == 0 {
                break;
            }
            if !buffer.ends_with('\n') {
                buffer.push('\n');
            }
            lines.push(buffer.clone());
        }

        Ok(lines)
    }
}
