use assert_cmd::Command;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

/// Shared harness: a mock vault endpoint plus a command builder with a
/// scrubbed environment, so runs never pick up ambient credentials.
pub struct TestEnv {
    rt: tokio::runtime::Runtime,
    pub server: MockServer,
}

impl TestEnv {
    pub fn new() -> Self {
        let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
        let server = rt.block_on(MockServer::start());
        Self { rt, server }
    }

    /// Command pre-wired with the mock vault URL and a pre-acquired token.
    pub fn cmd(&self) -> Command {
        let mut cmd = self.bare_cmd();
        cmd.args(["--vault-url", &self.server.uri(), "--key-name", "k1"]);
        cmd
    }

    /// Command with a scrubbed environment and no arguments yet.
    pub fn bare_cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("kvprobe").expect("binary builds");
        cmd.env_clear().env("KVPROBE_ACCESS_TOKEN", "itest-token");
        cmd
    }

    /// Command with no credential source at all.
    pub fn cmd_without_credentials(&self) -> Command {
        let mut cmd = Command::cargo_bin("kvprobe").expect("binary builds");
        cmd.env_clear()
            .args(["--vault-url", &self.server.uri(), "--key-name", "k1"]);
        cmd
    }

    pub fn mount(&self, mock: Mock) {
        self.rt.block_on(mock.mount(&self.server));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.rt
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    /// Body of the single request whose path ends with `suffix`.
    pub fn request_body(&self, suffix: &str) -> serde_json::Value {
        let requests = self.requests();
        let req = requests
            .iter()
            .find(|r| r.url.path().ends_with(suffix))
            .unwrap_or_else(|| panic!("no request with path suffix {suffix}"));
        serde_json::from_slice(&req.body).expect("request body is JSON")
    }

    pub fn mount_sign_ok(&self, signature: &[u8]) {
        self.mount(
            Mock::given(method("POST"))
                .and(path("/keys/k1/sign"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "kid": "https://v.vault.azure.net/keys/k1/abc",
                    "value": b64url(signature),
                }))),
        );
    }

    pub fn mount_sign_denied(&self) {
        self.mount(
            Mock::given(method("POST"))
                .and(path("/keys/k1/sign"))
                .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                    "error": {"code": "Forbidden", "message": "sign is not permitted"}
                }))),
        );
    }

    pub fn mount_verify(&self, value: bool) {
        self.mount(
            Mock::given(method("POST"))
                .and(path("/keys/k1/verify"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": value}))),
        );
    }

    pub fn mount_get_key(&self, kid: &str, kty: &str) {
        self.mount(
            Mock::given(method("GET"))
                .and(path("/keys/k1"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "key": {"kid": kid, "kty": kty}
                }))),
        );
    }
}

pub fn b64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}
