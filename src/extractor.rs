// ==============================================================================
// extractor.rs - rsID Extraction
// ==============================================================================
// Description: Builds an rsID-only copy of a PLINK dataset via --extract
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::artifacts::TempArtifact;
use crate::models::{BinaryFileset, RS_ONLY_SUFFIX};
use crate::parsers::BimParser;
use crate::plink::{PlinkArgs, PlinkRunner};

/// Result of extracting one dataset
#[derive(Debug, Clone, Serialize)]
pub struct ExtractedDataset {
    pub source: BinaryFileset,
    pub filtered: BinaryFileset,
    /// Distinct rsIDs written to the extraction list
    pub identifiers: usize,
}

/// Drives `plink --bfile <dataset> --extract <list> --make-bed --out <dataset>_RS_ONLY`
pub struct IdentifierExtractor<'a, R> {
    runner: &'a R,
    base_args: PlinkArgs,
    max_records: Option<usize>,
    keep_intermediate: bool,
}

impl<'a, R: PlinkRunner> IdentifierExtractor<'a, R> {
    pub fn new(runner: &'a R, base_args: PlinkArgs) -> Self {
        Self {
            runner,
            base_args,
            max_records: None,
            keep_intermediate: false,
        }
    }

    /// Scan only the first N marker lines (N > 0)
    pub fn with_max_records(mut self, max_records: Option<usize>) -> Self {
        self.max_records = max_records;
        self
    }

    /// Leave extraction lists on disk after PLINK has consumed them
    pub fn keep_intermediate(mut self, keep: bool) -> Self {
        self.keep_intermediate = keep;
        self
    }

    /// `<dataset dir>/extract_<dataset name>.txt`
    pub fn extraction_list_path(dataset: &BinaryFileset) -> PathBuf {
        dataset
            .directory()
            .join(format!("extract_{}.txt", dataset.file_name()))
    }

    pub async fn extract(&self, dataset: &BinaryFileset) -> Result<ExtractedDataset> {
        info!("Extracting only rsIDs from [ {} ]", dataset);
        if !dataset.is_complete() {
            warn!("{} is missing one of .bed/.bim/.fam", dataset);
        }

        let rsids = BimParser::with_max_records(self.max_records)
            .extract_rsids(dataset.bim())
            .with_context(|| format!("Failed to read marker file {:?}", dataset.bim()))?;

        info!("Found {} distinct rsIDs in {:?}", rsids.len(), dataset.bim());

        let list = TempArtifact::new(Self::extraction_list_path(dataset), self.keep_intermediate);
        write_identifier_list(list.path(), &rsids)?;

        let filtered = dataset.with_suffix(RS_ONLY_SUFFIX);
        let args = PlinkArgs {
            extract: Some(list.path().to_path_buf()),
            ..PlinkArgs::dataset(dataset.root(), filtered.root())
        }
        .inherit(&self.base_args);

        self.runner
            .run(
                &args,
                &format!("Get only rsIDs from input .bim file [ {} ]", dataset.file_name()),
            )
            .await
            .with_context(|| format!("rsID extraction failed for {}", dataset))?;

        Ok(ExtractedDataset {
            source: dataset.clone(),
            filtered,
            identifiers: rsids.len(),
        })
    }
}

/// Write one identifier per line, replacing any existing file
pub fn write_identifier_list(path: &Path, identifiers: &BTreeSet<String>) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create identifier list {:?}", path))?;
    let mut writer = BufWriter::new(file);
    for id in identifiers {
        writeln!(writer, "{}", id)?;
    }
    writer.flush()?;
    Ok(())
}
