//! # ligscreen
//!
//! Screens deposited macromolecular structures for a cryoprotectant ligand
//! (2-methyl-2,4-pentanediol, component codes `MPD` and `MRD`) and flags
//! every conformation whose B-factors suggest it was poorly modelled.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Typed structure models (`MolecularSystem`),
//!   the PDB reader and manifest loader, and the pure conformer and B-factor
//!   analysis.
//!
//! - **[`engine`]: The Batch Layer.** Configuration, structure sources, the
//!   report sink and the batch scanner that threads results through them.
//!
//! - **[`workflows`]: The Public API.** A single call that runs a complete
//!   screen from a manifest (or a directory of files) to a written report.

pub mod core;
pub mod engine;
pub mod workflows;
