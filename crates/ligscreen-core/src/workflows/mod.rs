//! # Workflows Module
//!
//! End-to-end entry points for library users.
//!
//! - **Screening Workflow** ([`screen`]) - Reads the identifier list, opens the
//!   report, scans every structure and returns the batch summary.

pub mod screen;
