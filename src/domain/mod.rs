//! Domain model types shared across the probe pipeline.
//!
//! Everything here is constructed once and read-only afterwards: the run
//! configuration at startup, the probe reports as each probe completes.

pub mod models;

pub use models::{JsonOut, KeyDescriptor, ProbeKind, ProbeReport, ProbeStatus, RunConfig, RunSummary};
