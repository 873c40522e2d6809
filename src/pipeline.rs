// ==============================================================================
// pipeline.rs - Extract / Merge / Exclude / Merge Orchestration
// ==============================================================================
// Description: Merges a dataset with a HapMap fileset, excluding identifiers
//              PLINK reports as conflicting on the first attempt
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================
// Stages:
//   [RELABEL]     optional, when a SNP reference is supplied
//   EXTRACT       rsID-only copies of both datasets
//   FIRST_MERGE   --bfile A_RS_ONLY --bmerge B_RS_ONLY --out OUT
//   RECONCILE     OUT-merge.missnp + OUT.log -> OUT_MERGED_LOG_MISSNP.txt
//   EXCLUDE       both *_RS_ONLY datasets -> *_RS_ONLY_exc_missnp_log
//   FINAL_MERGE   --bfile A_..._exc_missnp_log --bmerge B_..._exc_missnp_log --out OUT
// Any failure aborts the remaining stages, except a FIRST_MERGE exit that
// came with a freshly written OUT-merge.missnp.
// ==============================================================================

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::extractor::{ExtractedDataset, IdentifierExtractor};
use crate::models::{BinaryFileset, ReconcileMode, Stage, EXCLUDED_SUFFIX};
use crate::parsers::SnpReference;
use crate::plink::{PlinkArgs, PlinkError, PlinkRunner};
use crate::reconcile::{manifest_path, merge_log_to_missnp, ExclusionList};
use crate::relabel::{relabel_dataset, RelabelOutcome};

/// Inputs for one pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Primary dataset root (.bed/.bim/.fam)
    pub bfile: PathBuf,
    /// Secondary (HapMap) dataset root
    pub bmerge: Option<PathBuf>,
    /// Output root for both merges
    pub out: PathBuf,
    /// SNP ID → rsID reference CSV, applied to the primary dataset
    pub snp_ref: Option<PathBuf>,
    pub noweb: bool,
    pub allow_no_sex: bool,
    /// Scan only the first N marker lines of each dataset
    pub max_records: Option<usize>,
    pub reconcile_mode: ReconcileMode,
    /// Run the final merge even when nothing had to be excluded
    pub final_merge_without_exclusions: bool,
    /// Keep extraction/update lists after PLINK has read them
    pub keep_intermediate: bool,
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bmerge.is_none() {
            anyhow::bail!("--bmerge is required: a second fileset must be supplied to merge");
        }
        if self.out.as_os_str().is_empty() {
            anyhow::bail!("--out must not be empty");
        }
        Ok(())
    }

    fn base_args(&self) -> PlinkArgs {
        PlinkArgs {
            noweb: self.noweb,
            allow_no_sex: self.allow_no_sex,
            ..Default::default()
        }
    }
}

/// What a pipeline run did
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub out: PathBuf,
    pub relabel: Option<RelabelOutcome>,
    pub primary: ExtractedDataset,
    pub secondary: ExtractedDataset,
    pub exclusions: Option<ExclusionList>,
    pub final_merge: bool,
    pub stages: Vec<Stage>,
}

impl PipelineSummary {
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write run report {:?}", path))?;
        Ok(())
    }
}

/// Sequences every PLINK invocation of a merge run
pub struct MergePipeline<R> {
    runner: R,
    config: PipelineConfig,
}

impl<R: PlinkRunner> MergePipeline<R> {
    pub fn new(runner: R, config: PipelineConfig) -> Self {
        Self { runner, config }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Main processing pipeline
    pub async fn run(&self) -> Result<PipelineSummary> {
        self.config.validate()?;
        let started_at = Utc::now();
        let base = self.config.base_args();
        let mut stages = Vec::new();

        let mut primary = BinaryFileset::new(&self.config.bfile);
        let secondary = BinaryFileset::new(self.config.bmerge.as_deref().unwrap_or(Path::new("")));
        let out = self.config.out.as_path();

        // 1. Optional SNP ID relabelling of the primary dataset
        let relabel = match &self.config.snp_ref {
            Some(reference_path) => {
                let reference = SnpReference::load(reference_path)
                    .with_context(|| format!("Failed to load SNP reference {:?}", reference_path))?;
                let outcome = relabel_dataset(
                    &self.runner,
                    &primary,
                    &reference,
                    &base,
                    self.config.keep_intermediate,
                )
                .await?;
                primary = outcome.dataset.clone();
                stages.push(Stage::Relabel);
                Some(outcome)
            }
            None => None,
        };

        // 2. rsID-only copies of both datasets
        let extractor = IdentifierExtractor::new(&self.runner, base.clone())
            .with_max_records(self.config.max_records)
            .keep_intermediate(self.config.keep_intermediate);
        let primary = extractor.extract(&primary).await?;
        let secondary = extractor.extract(&secondary).await?;
        stages.push(Stage::Extract);

        // 3. First merge attempt; PLINK leaves <out>.log and maybe <out>-merge.missnp
        self.first_merge(&primary.filtered, &secondary.filtered).await?;
        stages.push(Stage::FirstMerge);

        // 4. Reconcile
        let exclusions = merge_log_to_missnp(out, self.config.reconcile_mode)?;
        stages.push(Stage::Reconcile);

        // 5. Exclude, then 6. final merge
        let final_merge = match &exclusions {
            Some(list) => {
                let primary_clean = self
                    .exclude(&primary.filtered, &list.path, "dataset")
                    .await?;
                let secondary_clean = self
                    .exclude(&secondary.filtered, &list.path, "HapMap")
                    .await?;
                stages.push(Stage::Exclude);

                self.final_merge(&primary_clean, &secondary_clean).await?;
                stages.push(Stage::FinalMerge);
                true
            }
            None if self.config.final_merge_without_exclusions => {
                info!("Nothing to exclude; final merge requested anyway");
                self.final_merge(&primary.filtered, &secondary.filtered).await?;
                stages.push(Stage::FinalMerge);
                true
            }
            None => {
                info!("Nothing to exclude; skipping exclusion and final merge");
                false
            }
        };

        let summary = PipelineSummary {
            started_at,
            finished_at: Utc::now(),
            out: out.to_path_buf(),
            relabel,
            primary,
            secondary,
            exclusions,
            final_merge,
            stages,
        };

        info!(
            "Pipeline complete in {}s: stages [{}]",
            (summary.finished_at - summary.started_at).num_seconds(),
            summary
                .stages
                .iter()
                .map(Stage::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(summary)
    }

    /// PLINK 1.9 exits non-zero when the merge hits conflicting variants and
    /// lists them in <out>-merge.missnp. That failure is the input to the
    /// reconcile stage, so it only aborts when no fresh missnp was written.
    async fn first_merge(&self, primary: &BinaryFileset, secondary: &BinaryFileset) -> Result<()> {
        let out = self.config.out.as_path();
        let missnp = manifest_path(out);
        remove_stale(&missnp)?;

        match self
            .run_merge(
                primary.root(),
                secondary.root(),
                out,
                "First Merge after clean and extracting rsIDs",
            )
            .await
        {
            Ok(()) => Ok(()),
            Err(PlinkError::Failed { code, message, .. }) if missnp.is_file() => {
                warn!(
                    "First merge exited with code {:?} and wrote {}; continuing to exclusion ({})",
                    code,
                    missnp.display(),
                    message.lines().last().unwrap_or_default()
                );
                Ok(())
            }
            Err(e) => Err(e).with_context(|| format!("Merge into {:?} failed", out)),
        }
    }

    async fn merge(&self, bfile: &Path, bmerge: &Path, out: &Path, label: &str) -> Result<()> {
        self.run_merge(bfile, bmerge, out, label)
            .await
            .with_context(|| format!("Merge into {:?} failed", out))
    }

    async fn run_merge(
        &self,
        bfile: &Path,
        bmerge: &Path,
        out: &Path,
        label: &str,
    ) -> Result<(), PlinkError> {
        let args = PlinkArgs {
            bmerge: Some(bmerge.to_path_buf()),
            ..PlinkArgs::dataset(bfile, out)
        }
        .inherit(&self.config.base_args());

        self.runner.run(&args, label).await?;
        Ok(())
    }

    async fn exclude(
        &self,
        dataset: &BinaryFileset,
        exclusions: &Path,
        description: &str,
    ) -> Result<BinaryFileset> {
        let cleaned = dataset.with_suffix(EXCLUDED_SUFFIX);
        let args = PlinkArgs {
            exclude: Some(exclusions.to_path_buf()),
            ..PlinkArgs::dataset(dataset.root(), cleaned.root())
        }
        .inherit(&self.config.base_args());

        self.runner
            .run(
                &args,
                &format!(
                    "Excluding merged log and *.missnp file from {} [ {} ]",
                    description, dataset
                ),
            )
            .await
            .with_context(|| format!("Exclusion failed for {}", dataset))?;

        Ok(cleaned)
    }

    async fn final_merge(&self, primary: &BinaryFileset, secondary: &BinaryFileset) -> Result<()> {
        let label = format!(
            "Performing final merge of dataset [ {} ] and HapMap [ {} ].",
            primary, secondary
        );
        self.merge(primary.root(), secondary.root(), &self.config.out, &label)
            .await
    }
}

/// Delete a missnp left behind by an earlier run so only this run's counts
fn remove_stale(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            info!("Removed stale {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove stale {:?}", path)),
    }
}
