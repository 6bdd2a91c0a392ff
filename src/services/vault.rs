use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::cli::SignatureAlgorithm;

const API_VERSION: &str = "7.4";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(thiserror::Error, Debug)]
pub enum VaultError {
    #[error("{op} request failed: {source}")]
    Transport {
        op: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{op} rejected by service: {code} (HTTP {status}): {message}")]
    Rejected {
        op: &'static str,
        status: u16,
        code: String,
        message: String,
    },
    #[error("{op} returned an unexpected payload: {message}")]
    Payload { op: &'static str, message: String },
}

/// Raw key metadata as returned by the service.
#[derive(Debug, Clone)]
pub struct KeyRecord {
    pub kid: Option<String>,
    pub kty: String,
}

/// The remote key operations this tool probes. The HTTP client implements
/// it for real runs; tests substitute in-memory fakes.
pub trait KeyOps {
    fn sign(
        &self,
        key_name: &str,
        algorithm: SignatureAlgorithm,
        digest: &[u8],
    ) -> Result<Vec<u8>, VaultError>;

    fn verify(
        &self,
        key_name: &str,
        algorithm: SignatureAlgorithm,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<bool, VaultError>;

    fn get_key(&self, key_name: &str) -> Result<KeyRecord, VaultError>;
}

#[derive(Serialize)]
struct SignRequest<'a> {
    alg: &'a str,
    value: String,
}

#[derive(Deserialize)]
struct SignResponse {
    value: String,
}

#[derive(Serialize)]
struct VerifyRequest<'a> {
    alg: &'a str,
    digest: String,
    value: String,
}

#[derive(Deserialize)]
struct VerifyResponse {
    value: bool,
}

#[derive(Deserialize)]
struct KeyResponse {
    key: KeyBundle,
}

#[derive(Deserialize)]
struct KeyBundle {
    kid: Option<String>,
    kty: Option<String>,
}

#[derive(Deserialize, Default)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ErrorDetail,
}

#[derive(Deserialize, Default)]
struct ErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

/// Blocking HTTP client for the vault's key endpoints.
pub struct VaultClient {
    base: String,
    bearer: String,
    http: reqwest::blocking::Client,
}

impl VaultClient {
    pub fn new(vault_url: &str, bearer: String) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base: vault_url.trim_end_matches('/').to_string(),
            bearer,
            http,
        })
    }

    fn key_url(&self, key_name: &str, action: Option<&str>) -> String {
        match action {
            Some(action) => format!(
                "{}/keys/{}/{}?api-version={}",
                self.base, key_name, action, API_VERSION
            ),
            None => format!("{}/keys/{}?api-version={}", self.base, key_name, API_VERSION),
        }
    }

    fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        op: &'static str,
        url: &str,
        body: &B,
    ) -> Result<R, VaultError> {
        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.bearer)
            .json(body)
            .send()
            .map_err(|source| VaultError::Transport { op, source })?;
        Self::decode(op, resp)
    }

    fn get_json<R: DeserializeOwned>(&self, op: &'static str, url: &str) -> Result<R, VaultError> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.bearer)
            .send()
            .map_err(|source| VaultError::Transport { op, source })?;
        Self::decode(op, resp)
    }

    fn decode<R: DeserializeOwned>(
        op: &'static str,
        resp: reqwest::blocking::Response,
    ) -> Result<R, VaultError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            let envelope: ErrorEnvelope = serde_json::from_str(&body).unwrap_or_default();
            return Err(VaultError::Rejected {
                op,
                status: status.as_u16(),
                code: envelope
                    .error
                    .code
                    .unwrap_or_else(|| status.to_string()),
                message: envelope
                    .error
                    .message
                    .unwrap_or_else(|| "no error detail in response".to_string()),
            });
        }
        resp.json().map_err(|e| VaultError::Payload {
            op,
            message: e.to_string(),
        })
    }
}

impl KeyOps for VaultClient {
    fn sign(
        &self,
        key_name: &str,
        algorithm: SignatureAlgorithm,
        digest: &[u8],
    ) -> Result<Vec<u8>, VaultError> {
        let url = self.key_url(key_name, Some("sign"));
        let body = SignRequest {
            alg: algorithm.as_str(),
            value: encode_b64url(digest),
        };
        let resp: SignResponse = self.post_json("sign", &url, &body)?;
        decode_b64url("sign", &resp.value)
    }

    fn verify(
        &self,
        key_name: &str,
        algorithm: SignatureAlgorithm,
        digest: &[u8],
        signature: &[u8],
    ) -> Result<bool, VaultError> {
        let url = self.key_url(key_name, Some("verify"));
        let body = VerifyRequest {
            alg: algorithm.as_str(),
            digest: encode_b64url(digest),
            value: encode_b64url(signature),
        };
        let resp: VerifyResponse = self.post_json("verify", &url, &body)?;
        Ok(resp.value)
    }

    fn get_key(&self, key_name: &str) -> Result<KeyRecord, VaultError> {
        let url = self.key_url(key_name, None);
        let resp: KeyResponse = self.get_json("get", &url)?;
        let kty = resp.key.kty.ok_or_else(|| VaultError::Payload {
            op: "get",
            message: "key bundle has no key type".to_string(),
        })?;
        Ok(KeyRecord {
            kid: resp.key.kid,
            kty,
        })
    }
}

fn encode_b64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

fn decode_b64url(op: &'static str, value: &str) -> Result<Vec<u8>, VaultError> {
    URL_SAFE_NO_PAD
        .decode(value)
        .map_err(|e| VaultError::Payload {
            op,
            message: format!("invalid base64url value: {e}"),
        })
}
