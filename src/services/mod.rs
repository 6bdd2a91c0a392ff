//! Service layer containing the probe pipeline stages.
//!
//! ## Service map
//! - `config.rs` — CLI flags into a validated `RunConfig` (skip-all precedence).
//! - `auth.rs` — layered credential chain producing a bearer token.
//! - `vault.rs` — `KeyOps` seam + HTTP key vault client + error taxonomy.
//! - `probes.rs` — sign/verify/get probe sequencing and signature threading.
//! - `report.rs` — streaming text / batched JSON output of probe outcomes.
//!
//! ## Conventions
//! - Prefer pure helpers where possible.
//! - Side effects (network, subprocess, console) are explicit and localized.
//! - Data flows strictly forward: config -> auth -> probes -> report.

pub mod auth;
pub mod config;
pub mod probes;
pub mod report;
pub mod vault;
