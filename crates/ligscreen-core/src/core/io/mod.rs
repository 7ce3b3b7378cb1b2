//! Provides input functionality for structure files and identifier lists.
//!
//! This module contains the structure readers (legacy PDB and PDBx/mmCIF, both
//! parsed by `pdbtbx` and converted into the typed model behind a small trait)
//! and the reader for the CSV manifest that lists which structures a screening
//! run should visit.

pub mod manifest;
pub mod pdb;
pub mod traits;
