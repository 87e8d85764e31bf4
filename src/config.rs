//! 客户端配置：文件（YAML/JSON）+ 环境变量覆盖 + Keyring 中的 Token。
//!
//! Client configuration.
//!
//! A [`ClientConfig`] is loaded from a YAML or JSON file and/or the
//! `COMPREDICT_AI_CORE_*` environment variables; environment values win over
//! the file. The API token is the one secret that can also live in the OS
//! keyring (service `compredict-ai-core`, user `api-token`).

use crate::crypto::OaepDigest;
use crate::{Error, ErrorContext, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://core.compredict.ai/api/";
pub const DEFAULT_API_VERSION: &str = "v1";

pub const KEYRING_SERVICE: &str = "compredict-ai-core";
pub const KEYRING_USER: &str = "api-token";

pub const ENV_TOKEN: &str = "COMPREDICT_AI_CORE_KEY";
pub const ENV_CALLBACK: &str = "COMPREDICT_AI_CORE_CALLBACK";
pub const ENV_BASE_URL: &str = "COMPREDICT_AI_CORE_BASE_URL";
pub const ENV_API_VERSION: &str = "COMPREDICT_AI_CORE_API_VERSION";
pub const ENV_PPK: &str = "COMPREDICT_AI_CORE_PPK";
pub const ENV_PASSPHRASE: &str = "COMPREDICT_AI_CORE_PASSPHRASE";
pub const ENV_FAIL_ON_ERROR: &str = "COMPREDICT_AI_CORE_FAIL_ON_ERROR";
pub const ENV_VERIFY_PEER: &str = "COMPREDICT_AI_CORE_VERIFY_PEER";
pub const ENV_CONNECT_TIMEOUT: &str = "COMPREDICT_AI_CORE_CONNECT_TIMEOUT_SECS";
pub const ENV_TIMEOUT: &str = "COMPREDICT_AI_CORE_TIMEOUT_SECS";
pub const ENV_PROXY_URL: &str = "COMPREDICT_AI_CORE_PROXY_URL";
pub const ENV_OAEP_DIGEST: &str = "COMPREDICT_AI_CORE_OAEP_DIGEST";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Prefer the keyring or the environment over storing the token in a file.
    pub token: Option<String>,
    pub callback_url: Option<String>,
    pub base_url: String,
    pub api_version: String,
    /// PEM private key used to decrypt encrypted results.
    pub private_key_path: Option<PathBuf>,
    pub passphrase: Option<String>,
    pub fail_on_error: bool,
    pub verify_peer: bool,
    pub connect_timeout_secs: u64,
    pub timeout_secs: Option<u64>,
    pub proxy_url: Option<String>,
    pub oaep_digest: OaepDigest,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            token: None,
            callback_url: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            private_key_path: None,
            passphrase: None,
            fail_on_error: false,
            verify_peer: true,
            connect_timeout_secs: 10,
            timeout_secs: None,
            proxy_url: None,
            oaep_digest: OaepDigest::default(),
        }
    }
}

impl ClientConfig {
    /// Load a YAML or JSON file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::configuration_with_context(
                format!("cannot read config file: {}", e),
                ErrorContext::new()
                    .with_field_path(path.display().to_string())
                    .with_source("config"),
            )
        })?;
        Self::from_str(&content)
    }

    /// Parse YAML (JSON is accepted as the YAML subset it is).
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env()
    }

    pub fn apply_env(self) -> Result<Self> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup`; unset or empty variables leave the field alone.
    pub fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = var(ENV_TOKEN) {
            self.token = Some(v);
        }
        if let Some(v) = var(ENV_CALLBACK) {
            self.callback_url = Some(v);
        }
        if let Some(v) = var(ENV_BASE_URL) {
            self.base_url = v;
        }
        if let Some(v) = var(ENV_API_VERSION) {
            self.api_version = v;
        }
        if let Some(v) = var(ENV_PPK) {
            self.private_key_path = Some(PathBuf::from(v));
        }
        if let Some(v) = var(ENV_PASSPHRASE) {
            self.passphrase = Some(v);
        }
        if let Some(v) = var(ENV_FAIL_ON_ERROR) {
            self.fail_on_error = parse_bool(ENV_FAIL_ON_ERROR, &v)?;
        }
        if let Some(v) = var(ENV_VERIFY_PEER) {
            self.verify_peer = parse_bool(ENV_VERIFY_PEER, &v)?;
        }
        if let Some(v) = var(ENV_CONNECT_TIMEOUT) {
            self.connect_timeout_secs = parse_secs(ENV_CONNECT_TIMEOUT, &v)?;
        }
        if let Some(v) = var(ENV_TIMEOUT) {
            self.timeout_secs = Some(parse_secs(ENV_TIMEOUT, &v)?);
        }
        if let Some(v) = var(ENV_PROXY_URL) {
            self.proxy_url = Some(v);
        }
        if let Some(v) = var(ENV_OAEP_DIGEST) {
            self.oaep_digest = v.parse()?;
        }
        Ok(self)
    }
}

fn invalid_var(name: &str, value: &str, expected: &str) -> Error {
    Error::configuration_with_context(
        format!("invalid value for {}", name),
        ErrorContext::new()
            .with_field_path(name)
            .with_details(format!("expected {}, got '{}'", expected, value))
            .with_source("config"),
    )
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid_var(name, value, "a boolean")),
    }
}

fn parse_secs(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid_var(name, value, "a number of seconds"))
}

/// Token lookup when none is given explicitly: OS keyring, then `COMPREDICT_AI_CORE_KEY`.
pub fn resolve_token() -> Result<String> {
    if let Ok(entry) = Entry::new(KEYRING_SERVICE, KEYRING_USER) {
        if let Ok(token) = entry.get_password() {
            return Ok(token);
        }
    }

    std::env::var(ENV_TOKEN)
        .ok()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            Error::configuration_with_context(
                "no API token configured",
                ErrorContext::new()
                    .with_field_path("token")
                    .with_details(format!(
                        "set {} or store it in the keyring ({}/{})",
                        ENV_TOKEN, KEYRING_SERVICE, KEYRING_USER
                    ))
                    .with_source("config"),
            )
        })
}
