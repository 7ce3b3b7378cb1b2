//! # Core Models Module
//!
//! This module contains the data structures used to represent a parsed
//! macromolecular structure in ligscreen.
//!
//! ## Overview
//!
//! A structure is modelled as a fixed hierarchy with typed accessors:
//!
//! - [`system`] - The complete structure, owning every component
//! - [`chain`] - A chain and its ordered residues
//! - [`residue`] - A residue (polymer monomer or ligand) and its ordered atoms
//! - [`atom`] - One atom record with its B-factor and alternate-location label
//! - [`ids`] - Unique identifier types for atoms, residues, and chains
//!
//! ## Usage
//!
//! ```ignore
//! use ligscreen::core::models::{atom::Atom, system::MolecularSystem};
//!
//! let mut system = MolecularSystem::with_identifier("1ABC");
//! let chain_id = system.add_chain('A');
//! let residue_id = system.add_residue(chain_id, 301, None, "MPD")?;
//! system.add_atom_to_residue(residue_id, Atom::new("C1", residue_id, 24.3))?;
//! ```

pub mod atom;
pub mod chain;
pub mod ids;
pub mod residue;
pub mod system;
