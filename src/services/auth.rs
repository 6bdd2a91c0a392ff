use anyhow::{bail, Context};
use serde::Deserialize;
use std::io::IsTerminal;
use std::time::Duration;

/// Resource identifier the vault expects bearer tokens to be scoped to.
pub const VAULT_RESOURCE: &str = "https://vault.azure.net";

const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
const IMDS_TOKEN_ENDPOINT: &str = "http://169.254.169.254/metadata/identity/oauth2/token";
// Azure CLI's well-known public client id, reused for device-code logins.
const PUBLIC_CLIENT_ID: &str = "04b07795-8ddb-461a-bbee-02f9e1bf7b46";

const TOKEN_TIMEOUT: Duration = Duration::from_secs(10);
const IMDS_TIMEOUT: Duration = Duration::from_secs(2);

/// Layered credential discovery. Layers are tried in fixed order until one
/// yields a token; a layer that is not configured or fails is skipped in
/// favor of the next. Total failure is fatal for the run.
pub struct CredentialChain {
    authority: String,
    tenant: String,
    allow_interactive: bool,
}

#[derive(Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct AzTokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

#[derive(Deserialize)]
struct AzdTokenResponse {
    token: String,
}

#[derive(Deserialize)]
struct DeviceCodeResponse {
    device_code: String,
    message: String,
    expires_in: u64,
    interval: Option<u64>,
}

#[derive(Deserialize, Default)]
struct OAuthErrorResponse {
    #[serde(default)]
    error: String,
}

impl CredentialChain {
    pub fn from_env() -> Self {
        let authority = std::env::var("AZURE_AUTHORITY_HOST")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHORITY.to_string())
            .trim_end_matches('/')
            .to_string();
        let tenant = std::env::var("AZURE_TENANT_ID")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "organizations".to_string());
        Self {
            authority,
            tenant,
            allow_interactive: std::io::stderr().is_terminal(),
        }
    }

    /// Walk the chain for a bearer token usable against `resource`.
    pub fn acquire(&self, resource: &str) -> anyhow::Result<String> {
        let scope = format!("{resource}/.default");
        let mut attempts: Vec<String> = Vec::new();

        match pre_acquired_token() {
            Ok(token) => return Ok(token),
            Err(e) => attempts.push(format!("environment token: {e:#}")),
        }
        match self.env_service_principal(&scope) {
            Ok(token) => return Ok(token),
            Err(e) => attempts.push(format!("environment service principal: {e:#}")),
        }
        match managed_identity_token(resource) {
            Ok(token) => return Ok(token),
            Err(e) => attempts.push(format!("managed identity: {e:#}")),
        }
        match azure_cli_token(resource) {
            Ok(token) => return Ok(token),
            Err(e) => attempts.push(format!("az cli: {e:#}")),
        }
        match azd_cli_token(&scope) {
            Ok(token) => return Ok(token),
            Err(e) => attempts.push(format!("azd cli: {e:#}")),
        }
        match self.device_code_login(&scope) {
            Ok(token) => return Ok(token),
            Err(e) => attempts.push(format!("interactive login: {e:#}")),
        }

        bail!(
            "no credential source produced a token for {resource}:\n  {}",
            attempts.join("\n  ")
        )
    }

    fn env_service_principal(&self, scope: &str) -> anyhow::Result<String> {
        let tenant = non_empty_env("AZURE_TENANT_ID")?;
        let client_id = non_empty_env("AZURE_CLIENT_ID")?;
        let client_secret = non_empty_env("AZURE_CLIENT_SECRET")?;
        let http = short_client(TOKEN_TIMEOUT)?;
        client_credentials_token(
            &http,
            &self.authority,
            &tenant,
            &client_id,
            &client_secret,
            scope,
        )
    }

    fn device_code_login(&self, scope: &str) -> anyhow::Result<String> {
        if !self.allow_interactive {
            bail!("stderr is not a terminal; interactive login skipped");
        }
        let http = short_client(TOKEN_TIMEOUT)?;
        let start = http
            .post(format!(
                "{}/{}/oauth2/v2.0/devicecode",
                self.authority, self.tenant
            ))
            .form(&[("client_id", PUBLIC_CLIENT_ID), ("scope", scope)])
            .send()
            .context("device code request failed")?
            .error_for_status()
            .context("device code request rejected")?
            .json::<DeviceCodeResponse>()
            .context("unexpected device code response")?;

        eprintln!("{}", start.message);

        let token_url = format!("{}/{}/oauth2/v2.0/token", self.authority, self.tenant);
        let mut interval = start.interval.unwrap_or(5);
        let deadline = std::time::Instant::now() + Duration::from_secs(start.expires_in);
        while std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_secs(interval));
            let resp = http
                .post(&token_url)
                .form(&[
                    ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
                    ("client_id", PUBLIC_CLIENT_ID),
                    ("device_code", start.device_code.as_str()),
                ])
                .send()
                .context("device code poll failed")?;
            if resp.status().is_success() {
                let token: OAuthTokenResponse =
                    resp.json().context("unexpected token response")?;
                return Ok(token.access_token);
            }
            let body = resp.text().unwrap_or_default();
            let err: OAuthErrorResponse = serde_json::from_str(&body).unwrap_or_default();
            match err.error.as_str() {
                "authorization_pending" => continue,
                "slow_down" => interval += 5,
                _ => bail!("device code login failed: {body}"),
            }
        }
        bail!("device code expired before the login completed")
    }
}

fn pre_acquired_token() -> anyhow::Result<String> {
    non_empty_env("KVPROBE_ACCESS_TOKEN")
}

fn managed_identity_token(resource: &str) -> anyhow::Result<String> {
    if let (Ok(endpoint), Ok(header)) = (
        std::env::var("IDENTITY_ENDPOINT"),
        std::env::var("IDENTITY_HEADER"),
    ) {
        if !endpoint.is_empty() && !header.is_empty() {
            let http = short_client(TOKEN_TIMEOUT)?;
            return app_service_identity_token(&http, &endpoint, &header, resource);
        }
    }
    let http = short_client(IMDS_TIMEOUT)?;
    imds_identity_token(&http, IMDS_TOKEN_ENDPOINT, resource)
}

fn azure_cli_token(resource: &str) -> anyhow::Result<String> {
    let out = std::process::Command::new("az")
        .args([
            "account",
            "get-access-token",
            "--resource",
            resource,
            "--output",
            "json",
        ])
        .output()
        .context("az not runnable")?;
    if !out.status.success() {
        bail!(
            "az exited with {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }
    let token: AzTokenResponse =
        serde_json::from_slice(&out.stdout).context("unexpected az token output")?;
    Ok(token.access_token)
}

fn azd_cli_token(scope: &str) -> anyhow::Result<String> {
    let out = std::process::Command::new("azd")
        .args(["auth", "token", "--scope", scope, "--output", "json"])
        .output()
        .context("azd not runnable")?;
    if !out.status.success() {
        bail!(
            "azd exited with {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        );
    }
    let token: AzdTokenResponse =
        serde_json::from_slice(&out.stdout).context("unexpected azd token output")?;
    Ok(token.token)
}

fn client_credentials_token(
    http: &reqwest::blocking::Client,
    authority: &str,
    tenant: &str,
    client_id: &str,
    client_secret: &str,
    scope: &str,
) -> anyhow::Result<String> {
    let resp = http
        .post(format!("{authority}/{tenant}/oauth2/v2.0/token"))
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("scope", scope),
        ])
        .send()
        .context("token request failed")?;
    parse_token_response(resp)
}

fn app_service_identity_token(
    http: &reqwest::blocking::Client,
    endpoint: &str,
    header: &str,
    resource: &str,
) -> anyhow::Result<String> {
    let resp = http
        .get(endpoint)
        .query(&[("resource", resource), ("api-version", "2019-08-01")])
        .header("X-IDENTITY-HEADER", header)
        .send()
        .context("identity endpoint request failed")?;
    parse_token_response(resp)
}

fn imds_identity_token(
    http: &reqwest::blocking::Client,
    endpoint: &str,
    resource: &str,
) -> anyhow::Result<String> {
    let resp = http
        .get(endpoint)
        .query(&[("resource", resource), ("api-version", "2018-02-01")])
        .header("Metadata", "true")
        .send()
        .context("IMDS unreachable")?;
    parse_token_response(resp)
}

fn parse_token_response(resp: reqwest::blocking::Response) -> anyhow::Result<String> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().unwrap_or_default();
        bail!("token endpoint returned HTTP {status}: {}", body.trim());
    }
    let token: OAuthTokenResponse = resp.json().context("unexpected token response")?;
    Ok(token.access_token)
}

fn non_empty_env(name: &str) -> anyhow::Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => bail!("{name} is not set"),
    }
}

fn short_client(timeout: Duration) -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(2)))
        .build()?)
}
