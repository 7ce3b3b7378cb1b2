//! # Core Module
//!
//! This module provides the stateless building blocks of ligscreen: the
//! structure data model, file readers, and the per-residue quality checks.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Typed hierarchy of structure, chains, residues and atoms
//! - **File I/O** ([`io`]) - PDB coordinate reader and CSV identifier manifests
//! - **Quality Checks** ([`analysis`]) - Conformer resolution and B-factor classification
//!
//! Nothing in this module performs logging of findings or touches shared state;
//! orchestration lives in [`crate::engine`].

pub mod analysis;
pub mod io;
pub mod models;
