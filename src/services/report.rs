use crate::domain::{JsonOut, ProbeReport, ProbeStatus, RunConfig, RunSummary};

const COMPLETION_LINE: &str = "Permission probe completed.";
const NO_TESTS_LINE: &str = "No tests selected; nothing to probe.";

/// Emitted when every probe resolved disabled: one informational line, the
/// completion line, and no remote activity at all.
pub fn print_no_tests(json: bool) -> anyhow::Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut {
                ok: true,
                data: "no tests selected"
            })?
        );
    } else {
        println!("{NO_TESTS_LINE}");
        println!("{COMPLETION_LINE}");
    }
    Ok(())
}

/// Text mode prints each probe's block the moment that probe finishes, so an
/// interrupt mid-run leaves the completed results on screen. JSON mode stays
/// silent until `finish`, which prints the whole envelope in one piece.
pub struct Reporter {
    json: bool,
    emitted: usize,
}

impl Reporter {
    pub fn new(json: bool) -> Self {
        Self { json, emitted: 0 }
    }

    pub fn begin(&self, config: &RunConfig) {
        if self.json {
            return;
        }
        for line in header_lines(config) {
            println!("{line}");
        }
    }

    pub fn probe(&mut self, report: &ProbeReport) {
        if self.json {
            return;
        }
        self.emitted += 1;
        for line in probe_lines(self.emitted, report) {
            println!("{line}");
        }
    }

    pub fn finish(&self, summary: &RunSummary) -> anyhow::Result<()> {
        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&JsonOut {
                    ok: true,
                    data: summary
                })?
            );
        } else {
            println!();
            println!("{COMPLETION_LINE}");
        }
        Ok(())
    }
}

fn header_lines(config: &RunConfig) -> Vec<String> {
    vec![
        format!("Probing key permissions for key: {}", config.key_name),
        format!("Vault URL: {}", config.vault_url),
        format!("Algorithm: {}", config.algorithm.as_str()),
        String::new(),
    ]
}

fn probe_lines(number: usize, probe: &ProbeReport) -> Vec<String> {
    let label = probe.probe.label();
    let mut lines = vec![format!("{number}. Testing {label} permission...")];
    match probe.status {
        ProbeStatus::Passed => lines.push(format!("   {label} passed")),
        ProbeStatus::Failed => lines.push(format!(
            "   {label} failed: {}",
            probe.detail.as_deref().unwrap_or("unknown error")
        )),
        ProbeStatus::Skipped => lines.push(format!(
            "   {label} skipped: {}",
            probe.detail.as_deref().unwrap_or("not applicable")
        )),
    }
    if let Some(signature) = &probe.signature {
        lines.push(format!("   Signature: {signature}"));
    }
    if probe.status == ProbeStatus::Passed {
        if let Some(verified) = probe.verified {
            lines.push(format!("   Verification result: {verified}"));
        }
    }
    if let Some(key) = &probe.key {
        if let Some(id) = &key.key_id {
            lines.push(format!("   Key ID: {id}"));
        }
        lines.push(format!("   Key type: {}", key.key_type));
        lines.push(format!("   HSM protected: {}", key.hsm_protected));
    }
    lines
}
