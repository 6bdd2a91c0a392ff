use crate::cli::SignatureAlgorithm;
use serde::Serialize;

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

/// Validated run configuration, built once from the CLI and never mutated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub vault_url: String,
    pub key_name: String,
    pub algorithm: SignatureAlgorithm,
    pub run_sign: bool,
    pub run_verify: bool,
    pub run_get: bool,
}

impl RunConfig {
    pub fn any_probe(&self) -> bool {
        self.run_sign || self.run_verify || self.run_get
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Sign,
    Verify,
    Get,
}

impl ProbeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Sign => "SIGN",
            Self::Verify => "VERIFY",
            Self::Get => "GET",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Passed,
    Failed,
    Skipped,
}

/// Outcome of a single probe, created by the runner and consumed by the
/// reporter.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub probe: ProbeKind,
    pub status: ProbeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Base64 signature, sign probe only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Remote verification outcome, verify probe only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    /// Key metadata, get probe only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyDescriptor>,
}

impl ProbeReport {
    pub fn passed(probe: ProbeKind) -> Self {
        Self::bare(probe, ProbeStatus::Passed, None)
    }

    pub fn failed(probe: ProbeKind, detail: impl Into<String>) -> Self {
        Self::bare(probe, ProbeStatus::Failed, Some(detail.into()))
    }

    pub fn skipped(probe: ProbeKind, note: impl Into<String>) -> Self {
        Self::bare(probe, ProbeStatus::Skipped, Some(note.into()))
    }

    fn bare(probe: ProbeKind, status: ProbeStatus, detail: Option<String>) -> Self {
        Self {
            probe,
            status,
            detail,
            signature: None,
            verified: None,
            key: None,
        }
    }
}

/// Key metadata extracted by the get probe.
#[derive(Debug, Clone, Serialize)]
pub struct KeyDescriptor {
    pub key_id: Option<String>,
    pub key_type: String,
    pub hsm_protected: bool,
}

impl KeyDescriptor {
    /// The HSM flag is derived purely from the key type label: true iff the
    /// label carries the exact `-HSM` suffix (e.g. `RSA-HSM`, `EC-HSM`).
    pub fn from_label(key_id: Option<String>, key_type: impl Into<String>) -> Self {
        let key_type = key_type.into();
        let hsm_protected = key_type.ends_with("-HSM");
        Self {
            key_id,
            key_type,
            hsm_protected,
        }
    }
}

#[derive(Serialize)]
pub struct RunSummary {
    pub vault_url: String,
    pub key_name: String,
    pub algorithm: &'static str,
    pub probes: Vec<ProbeReport>,
}
