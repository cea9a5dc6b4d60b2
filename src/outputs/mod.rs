//! Report output.
//!
//! - [`report`]: the plain-text report returned by every fact-check
//! - [`json`]: optional JSON copy of the report, written under a dated directory

pub mod json;
pub mod report;
