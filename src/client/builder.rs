use super::core::{Client, Settings};
use super::validation::{validate_token, validate_url};
use crate::config::{self, ClientConfig};
use crate::crypto::{OaepDigest, PrivateKey};
use crate::transport::{HttpSettings, HttpTransport, Requester, Transport};
use crate::{Error, ErrorContext, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Builder for [`Client`].
///
/// Only the token is mandatory; when it is not set explicitly, [`ClientBuilder::build`]
/// looks it up in the OS keyring and then in `COMPREDICT_AI_CORE_KEY`.
pub struct ClientBuilder {
    token: Option<String>,
    callback_url: Option<String>,
    base_url: String,
    api_version: String,
    private_key: Option<PrivateKey>,
    private_key_file: Option<(PathBuf, Option<String>)>,
    oaep_digest: Option<OaepDigest>,
    fail_on_error: bool,
    http: HttpSettings,
    /// Replaces the HTTP stack (primarily for testing).
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self {
            token: None,
            callback_url: None,
            base_url: config::DEFAULT_BASE_URL.to_string(),
            api_version: config::DEFAULT_API_VERSION.to_string(),
            private_key: None,
            private_key_file: None,
            oaep_digest: None,
            fail_on_error: false,
            http: HttpSettings::default(),
            transport: None,
        }
    }

    /// Start from a loaded configuration. Explicit setters called afterwards win.
    pub fn from_config(config: ClientConfig) -> Self {
        let mut builder = Self::new()
            .base_url(config.base_url)
            .api_version(config.api_version)
            .fail_on_error(config.fail_on_error)
            .verify_peer(config.verify_peer)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .oaep_digest(config.oaep_digest);
        builder.token = config.token;
        builder.callback_url = config.callback_url;
        builder.http.timeout = config.timeout_secs.map(Duration::from_secs);
        builder.http.proxy_url = config.proxy_url;
        if let Some(path) = config.private_key_path {
            builder.private_key_file = Some((path, config.passphrase));
        }
        builder
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    /// Service root without the API version (default `https://core.compredict.ai/api/`).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn private_key(mut self, key: PrivateKey) -> Self {
        self.private_key = Some(key);
        self
    }

    /// PEM key loaded at build time; `passphrase` unlocks an encrypted PKCS#8 key.
    pub fn private_key_file(mut self, path: impl Into<PathBuf>, passphrase: Option<String>) -> Self {
        self.private_key_file = Some((path.into(), passphrase));
        self
    }

    pub fn oaep_digest(mut self, digest: OaepDigest) -> Self {
        self.oaep_digest = Some(digest);
        self
    }

    pub fn fail_on_error(mut self, enabled: bool) -> Self {
        self.fail_on_error = enabled;
        self
    }

    pub fn verify_peer(mut self, enabled: bool) -> Self {
        self.http.verify_peer = enabled;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.http.connect_timeout = timeout;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.http.timeout = Some(timeout);
        self
    }

    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.http.proxy_url = Some(url.into());
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.http.user_agent = agent.into();
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Validate the configuration and build the client.
    pub fn build(self) -> Result<Client> {
        let token = match self.token {
            Some(token) => token,
            None => config::resolve_token()?,
        };
        validate_token(&token)?;

        if let Some(url) = &self.callback_url {
            validate_url(url, "callback_url")?;
        }
        validate_url(&self.base_url, "base_url")?;
        let endpoint_root = endpoint_root(&self.base_url, &self.api_version);

        let private_key = match (self.private_key, self.private_key_file) {
            (Some(key), _) => Some(key),
            (None, Some((path, passphrase))) => Some(PrivateKey::from_file(path, passphrase.as_deref())?),
            (None, None) => None,
        };
        let private_key = private_key.map(|key| match self.oaep_digest {
            Some(digest) => Arc::new(key.with_digest(digest)),
            None => Arc::new(key),
        });

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(self.http).map_err(|e| {
                Error::configuration_with_context(
                    format!("cannot build HTTP client: {}", e),
                    ErrorContext::new().with_source("client_builder"),
                )
            })?),
        };

        debug!(
            base_url = %endpoint_root,
            decryption = private_key.is_some(),
            fail_on_error = self.fail_on_error,
            "building AI Core client"
        );

        let requester = Requester::new(transport, endpoint_root, token);
        requester.set_fail_on_error(self.fail_on_error);

        Ok(Client::from_parts(
            requester,
            Settings {
                callback_url: self.callback_url,
                private_key,
            },
        ))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `{base}/{version}` without a trailing slash; request paths start with `/`.
fn endpoint_root(base_url: &str, api_version: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let version = api_version.trim_matches('/');
    if version.is_empty() {
        base.to_string()
    } else {
        format!("{}/{}", base, version)
    }
}
