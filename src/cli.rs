use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

#[derive(Parser, Debug)]
#[command(
    name = "kvprobe",
    version,
    about = "Probe sign/verify/get permissions on a key vault key"
)]
pub struct Cli {
    #[arg(
        long,
        value_parser = NonEmptyStringValueParser::new(),
        help = "Vault endpoint (e.g., https://myvault.vault.azure.net/)"
    )]
    pub vault_url: String,
    #[arg(
        long,
        value_parser = NonEmptyStringValueParser::new(),
        help = "Name of the key under test"
    )]
    pub key_name: String,
    #[arg(long, value_enum, default_value_t = SignatureAlgorithm::Rs256)]
    pub algorithm: SignatureAlgorithm,
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "true",
        help = "Run the sign probe [default: true]"
    )]
    pub test_sign: Option<bool>,
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "true",
        help = "Run the verify probe [default: true]"
    )]
    pub test_verify: Option<bool>,
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "true",
        help = "Run the get probe [default: true]"
    )]
    pub test_get: Option<bool>,
    #[arg(
        long,
        help = "Disable all probes; --test-* flags named on the command line still apply"
    )]
    pub skip_all: bool,
    #[arg(long, help = "Output machine-readable JSON")]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum SignatureAlgorithm {
    #[value(name = "RS256")]
    #[serde(rename = "RS256")]
    Rs256,
    #[value(name = "RS384")]
    #[serde(rename = "RS384")]
    Rs384,
    #[value(name = "RS512")]
    #[serde(rename = "RS512")]
    Rs512,
    #[value(name = "PS256")]
    #[serde(rename = "PS256")]
    Ps256,
    #[value(name = "PS384")]
    #[serde(rename = "PS384")]
    Ps384,
    #[value(name = "PS512")]
    #[serde(rename = "PS512")]
    Ps512,
    #[value(name = "ES256")]
    #[serde(rename = "ES256")]
    Es256,
    #[value(name = "ES256K")]
    #[serde(rename = "ES256K")]
    Es256k,
    #[value(name = "ES384")]
    #[serde(rename = "ES384")]
    Es384,
    #[value(name = "ES512")]
    #[serde(rename = "ES512")]
    Es512,
}

impl SignatureAlgorithm {
    /// Wire label as the service expects it.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rs256 => "RS256",
            Self::Rs384 => "RS384",
            Self::Rs512 => "RS512",
            Self::Ps256 => "PS256",
            Self::Ps384 => "PS384",
            Self::Ps512 => "PS512",
            Self::Es256 => "ES256",
            Self::Es256k => "ES256K",
            Self::Es384 => "ES384",
            Self::Es512 => "ES512",
        }
    }

    /// Expected signature size in bytes, used to size the all-zero
    /// placeholder when verify runs without a fresh signature.
    pub fn placeholder_len(&self) -> usize {
        match self {
            Self::Rs256 | Self::Rs384 | Self::Rs512 | Self::Ps256 | Self::Ps384 | Self::Ps512 => {
                256
            }
            Self::Es256 | Self::Es256k => 64,
            Self::Es384 => 96,
            Self::Es512 => 132,
        }
    }
}
