// ==============================================================================
// relabel.rs - SNP ID to rsID Relabelling
// ==============================================================================
// Description: Renames vendor SNP IDs in a dataset to rsIDs via --update-name
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::artifacts::TempArtifact;
use crate::models::{append_to_path, BinaryFileset, RS_UPDATED_SUFFIX, UNMAPPED_SUFFIX};
use crate::parsers::{BimParser, SnpReference};
use crate::plink::{PlinkArgs, PlinkRunner};

/// Which identifiers get renamed and which have no rsID
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelabelPlan {
    /// (old SNP ID, new rsID), first occurrence only
    pub updates: Vec<(String, String)>,
    pub unmapped: Vec<String>,
}

impl RelabelPlan {
    /// Identifiers already starting with "rs" are left alone
    pub fn build(snp_ids: &[String], reference: &SnpReference) -> Self {
        let mut plan = Self::default();
        let mut seen = HashSet::new();

        for id in snp_ids {
            if id.starts_with("rs") || !seen.insert(id.as_str()) {
                continue;
            }
            match reference.rsid_for(id) {
                Some(rsid) => plan.updates.push((id.clone(), rsid.to_string())),
                None => plan.unmapped.push(id.clone()),
            }
        }

        plan
    }
}

/// Outcome of relabelling one dataset
#[derive(Debug, Clone, Serialize)]
pub struct RelabelOutcome {
    /// Dataset to use downstream (the input itself when nothing was renamed)
    pub dataset: BinaryFileset,
    pub renamed: usize,
    pub unmapped: usize,
    pub unmapped_file: PathBuf,
}

/// Rename vendor SNP IDs in `dataset` to rsIDs.
///
/// Identifiers without an rsID are listed in `<dataset>_unmapped_snpIDs.txt`.
/// PLINK only runs when at least one identifier can be renamed.
pub async fn relabel_dataset<R: PlinkRunner>(
    runner: &R,
    dataset: &BinaryFileset,
    reference: &SnpReference,
    base_args: &PlinkArgs,
    keep_intermediate: bool,
) -> Result<RelabelOutcome> {
    if reference.is_empty() {
        warn!("SNP reference is empty; no identifiers can be relabelled");
    }
    info!("Relabelling SNP IDs in {}.bim using reference ({} entries)", dataset, reference.len());

    let snp_ids = BimParser::new()
        .snp_ids(dataset.bim())
        .with_context(|| format!("Failed to read marker file {:?}", dataset.bim()))?;
    let plan = RelabelPlan::build(&snp_ids, reference);

    let unmapped_file = append_to_path(dataset.root(), UNMAPPED_SUFFIX);
    write_lines(&unmapped_file, plan.unmapped.iter().map(String::as_str))?;
    if !plan.unmapped.is_empty() {
        warn!(
            "{} SNP IDs have no rsID; listed in {}",
            plan.unmapped.len(),
            unmapped_file.display()
        );
    }

    if plan.updates.is_empty() {
        info!("No SNP IDs to relabel in {}", dataset);
        return Ok(RelabelOutcome {
            dataset: dataset.clone(),
            renamed: 0,
            unmapped: plan.unmapped.len(),
            unmapped_file,
        });
    }

    let map = TempArtifact::new(
        dataset
            .directory()
            .join(format!("update_name_{}.txt", dataset.file_name())),
        keep_intermediate,
    );
    write_lines(
        map.path(),
        plan.updates.iter().map(|(old, new)| format!("{} {}", old, new)),
    )?;

    let relabelled = dataset.with_suffix(RS_UPDATED_SUFFIX);
    let args = PlinkArgs {
        update_name: Some(map.path().to_path_buf()),
        ..PlinkArgs::dataset(dataset.root(), relabelled.root())
    }
    .inherit(base_args);

    runner
        .run(&args, &format!("Swapping SNP IDs for rsIDs in [ {} ]", dataset.file_name()))
        .await
        .with_context(|| format!("SNP ID relabelling failed for {}", dataset))?;

    Ok(RelabelOutcome {
        dataset: relabelled,
        renamed: plan.updates.len(),
        unmapped: plan.unmapped.len(),
        unmapped_file,
    })
}

fn write_lines<I, S>(path: &Path, lines: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    for line in lines {
        writeln!(writer, "{}", line.as_ref())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingPlink;

    fn reference() -> SnpReference {
        SnpReference::from_pairs([("SNP_A-1", "rs100"), ("SNP_A-2", "---")])
    }

    #[test]
    fn test_plan() {
        let ids: Vec<String> = ["rs5", "SNP_A-1", "SNP_A-2", "SNP_A-9", "SNP_A-1"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let plan = RelabelPlan::build(&ids, &reference());

        assert_eq!(plan.updates, vec![("SNP_A-1".to_string(), "rs100".to_string())]);
        assert_eq!(plan.unmapped, vec!["SNP_A-2", "SNP_A-9"]);
    }

    #[tokio::test]
    async fn test_relabel_runs_update_name() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = BinaryFileset::new(dir.path().join("dset"));
        std::fs::write(dataset.bim(), "1\tSNP_A-1\t0\t1\tA\tG\n1\tSNP_A-2\t0\t2\tC\tT\n").unwrap();
        let plink = RecordingPlink::default();

        let outcome = relabel_dataset(&plink, &dataset, &reference(), &PlinkArgs::default(), false)
            .await
            .unwrap();

        assert_eq!(outcome.dataset.root(), dir.path().join("dset_RS_UPDATED"));
        assert_eq!(outcome.renamed, 1);
        assert_eq!(outcome.unmapped, 1);
        assert_eq!(std::fs::read_to_string(&outcome.unmapped_file).unwrap(), "SNP_A-2\n");

        let calls = plink.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.update_name.is_some());
        assert!(calls[0].0.make_bed);
        assert_eq!(plink.list_files(), vec!["SNP_A-1 rs100\n"]);
        assert!(!dir.path().join("update_name_dset.txt").exists());
    }

    #[tokio::test]
    async fn test_nothing_to_relabel_skips_plink() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = BinaryFileset::new(dir.path().join("dset"));
        std::fs::write(dataset.bim(), "1\trs1\t0\t1\tA\tG\n").unwrap();
        let plink = RecordingPlink::default();

        let outcome = relabel_dataset(&plink, &dataset, &reference(), &PlinkArgs::default(), false)
            .await
            .unwrap();

        assert_eq!(outcome.dataset, dataset);
        assert_eq!(outcome.renamed, 0);
        assert!(plink.calls().is_empty());
    }
}
