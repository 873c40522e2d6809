// ==============================================================================
// main.rs - PLINK Merge Wrapper Entry Point
// ==============================================================================
// Description: Merges a genotype dataset with a HapMap fileset through PLINK,
//              excluding SNPs reported as conflicting on the first attempt
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================
// Environment:
//   PLINK_BIN   path to the PLINK executable (default: `plink` on PATH)
//   RUST_LOG    tracing filter (default: plink_merger=info)
// ==============================================================================

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plink_merger::{MergePipeline, PipelineConfig, ReconcileMode, SystemPlink};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, arg_required_else_help = true)]
struct Args {
    /// Specify .bed, .bim and .fam (dataset root, no extension)
    #[arg(long)]
    bfile: PathBuf,

    /// Merge in a binary fileset (HapMap dataset root)
    #[arg(long)]
    bmerge: Option<PathBuf>,

    /// Specify output root filename
    #[arg(long)]
    out: PathBuf,

    /// SNP reference CSV used to convert vendor SNP IDs to rsIDs
    #[arg(long)]
    snp_ref: Option<PathBuf>,

    /// Pass --noweb to PLINK (run without the internet)
    #[arg(long)]
    noweb: bool,

    /// Pass --allow-no-sex to PLINK (keep samples with ambiguous sex)
    #[arg(long)]
    allow_no_sex: bool,

    /// Only scan the first N variants of each dataset (benchmarking/testing)
    #[arg(short = 'n', long = "max-records", visible_alias = "n")]
    max_records: Option<usize>,

    /// Drop identifiers listed by both the .missnp file and the .log
    #[arg(long)]
    dedup_exclusions: bool,

    /// Run the final merge even when no SNPs need excluding
    #[arg(long)]
    final_merge_always: bool,

    /// Keep extract/update-name lists after PLINK has used them
    #[arg(long)]
    keep_intermediate: bool,

    /// PLINK executable
    #[arg(long, env = "PLINK_BIN")]
    plink: Option<PathBuf>,

    /// Kill a PLINK invocation that runs longer than this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plink_merger=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let plink = SystemPlink::locate(args.plink.as_deref())
        .context("PLINK is required; install it or set PLINK_BIN")?
        .with_timeout(args.timeout_secs.map(Duration::from_secs));
    info!("Using PLINK at {:?}", plink.binary());

    let config = PipelineConfig {
        bfile: args.bfile,
        bmerge: args.bmerge,
        out: args.out,
        snp_ref: args.snp_ref,
        noweb: args.noweb,
        allow_no_sex: args.allow_no_sex,
        max_records: args.max_records,
        reconcile_mode: if args.dedup_exclusions {
            ReconcileMode::Dedup
        } else {
            ReconcileMode::Preserve
        },
        final_merge_without_exclusions: args.final_merge_always,
        keep_intermediate: args.keep_intermediate,
    };

    let summary = MergePipeline::new(plink, config).run().await?;

    match &summary.exclusions {
        Some(list) => info!(
            "Excluded {} entries listed in {:?}; merged output at {:?}",
            list.total, list.path, summary.out
        ),
        None if !summary.final_merge => warn!(
            "No conflicting SNPs reported; first merge output at {:?} is final",
            summary.out
        ),
        None => info!("Merged output at {:?}", summary.out),
    }

    if let Some(report) = &args.report {
        summary.write_json(report)?;
        info!("Run report written to {:?}", report);
    }

    Ok(())
}
