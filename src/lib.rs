// ==============================================================================
// lib.rs - PLINK Merge Wrapper Library
// ==============================================================================
// Description: Library interface for rsID-reconciled PLINK dataset merging
// Author: Matt Barham
// Created: 2026-10-15
// Modified: 2026-10-15
// Version: 1.0.0
// ==============================================================================

pub mod artifacts;
pub mod extractor;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod plink;
pub mod reconcile;
pub mod relabel;

#[cfg(test)]
pub(crate) mod testing;

pub use models::{BinaryFileset, ReconcileMode, Stage};
pub use pipeline::{MergePipeline, PipelineConfig, PipelineSummary};
pub use plink::{PlinkArgs, PlinkError, PlinkRunner, SystemPlink};
