//! # Engine Module
//!
//! Batch screening of structures for poorly modelled ligands.
//!
//! The engine ties the pure analysis in [`crate::core::analysis`] to the
//! outside world: it obtains parsed structures from a [`source::StructureSource`],
//! screens them with [`scanner::BatchScanner`] and hands every anomalous
//! conformer group to a [`report::ReportSink`].
//!
//! - **Configuration** ([`config`]) - Ligand codes, thresholds and scan options
//! - **Structure Sources** ([`source`]) - Locating and parsing structure files
//! - **Reports** ([`report`]) - Findings and the text report writer
//! - **Scanning** ([`scanner`]) - Per-structure screening and batch orchestration
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - Errors that abort a run

pub mod config;
pub mod error;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod source;
