//! Per-residue quality checks.
//!
//! - [`conformers`] splits a residue's atoms into alternate-conformation groups
//!   without mutating any atom record.
//! - [`classifier`] computes B-factor statistics for one group and judges them
//!   against configurable thresholds.
//!
//! Both are pure functions over borrowed atoms; reporting is left to the
//! caller.

pub mod classifier;
pub mod conformers;
