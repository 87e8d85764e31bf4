use super::builder::ClientBuilder;
use super::validation::validate_url;
use crate::config::ClientConfig;
use crate::crypto::{self, PrivateKey};
use crate::transport::Requester;
use crate::Result;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

#[derive(Default)]
pub(crate) struct Settings {
    pub(crate) callback_url: Option<String>,
    pub(crate) private_key: Option<Arc<PrivateKey>>,
}

struct ClientInner {
    requester: Requester,
    settings: RwLock<Settings>,
}

/// Handle to the AI Core service.
///
/// Cloning is cheap and every clone shares the same configuration and
/// last-response bookkeeping; resources keep a clone for follow-up calls.
/// Calls from several threads are allowed but `last_*` diagnostics are not
/// isolated per caller.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    /// Client with default settings for the given 40-character token.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        ClientBuilder::new().token(token).build()
    }

    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Client configured from `COMPREDICT_AI_CORE_*` environment variables,
    /// with the token looked up in the OS keyring first.
    pub fn from_env() -> Result<Self> {
        ClientBuilder::from_config(ClientConfig::from_env()?).build()
    }

    pub(crate) fn from_parts(requester: Requester, settings: Settings) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                requester,
                settings: RwLock::new(settings),
            }),
        }
    }

    pub(crate) fn requester(&self) -> &Requester {
        &self.inner.requester
    }

    fn settings(&self) -> RwLockReadGuard<'_, Settings> {
        self.inner
            .settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn settings_mut(&self) -> RwLockWriteGuard<'_, Settings> {
        self.inner
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn callback_url(&self) -> Option<String> {
        self.settings().callback_url.clone()
    }

    /// Set the URL the service notifies when a task finishes.
    pub fn set_callback_url(&self, url: impl Into<String>) -> Result<()> {
        let url = url.into();
        validate_url(&url, "callback_url")?;
        self.settings_mut().callback_url = Some(url);
        Ok(())
    }

    pub fn clear_callback_url(&self) {
        self.settings_mut().callback_url = None;
    }

    /// Raise HTTP 4xx/5xx responses as [`crate::Error::Client`] /
    /// [`crate::Error::Server`] instead of returning [`crate::Outcome::Failed`].
    pub fn fail_on_error(&self, enabled: bool) {
        self.inner.requester.set_fail_on_error(enabled);
    }

    pub fn fails_on_error(&self) -> bool {
        self.inner.requester.fails_on_error()
    }

    /// Toggle TLS peer verification. Takes effect on the next request.
    pub fn verify_peer(&self, enabled: bool) -> Result<()> {
        self.inner.requester.set_verify_peer(enabled)
    }

    /// Endpoint root every path is appended to, API version included.
    pub fn base_url(&self) -> String {
        self.inner.requester.base_url()
    }

    /// Replace the endpoint root, API version included (e.g.
    /// `https://core.compredict.ai/api/v1`).
    pub fn set_base_url(&self, url: &str) -> Result<()> {
        validate_url(url, "base_url")?;
        self.inner
            .requester
            .set_base_url(url.trim_end_matches('/'));
        Ok(())
    }

    pub fn set_private_key(&self, key: PrivateKey) {
        self.settings_mut().private_key = Some(Arc::new(key));
    }

    /// Load the PEM key used to decrypt encrypted results.
    pub fn set_private_key_file(&self, path: impl AsRef<Path>, passphrase: Option<&str>) -> Result<()> {
        let key = PrivateKey::from_file(path, passphrase)?;
        self.set_private_key(key);
        Ok(())
    }

    pub fn private_key(&self) -> Option<Arc<PrivateKey>> {
        self.settings().private_key.clone()
    }

    /// Decrypt a base64 payload the service encrypted with our public key.
    pub fn rsa_decrypt(&self, encoded: &str) -> Result<Vec<u8>> {
        let key = self.private_key();
        crypto::decrypt(key.as_deref(), encoded)
    }

    /// Decoded error body of the last call, when it ended in a recorded HTTP error.
    pub fn last_error(&self) -> Option<Value> {
        self.inner.requester.last_error()
    }

    pub fn last_status(&self) -> Option<u16> {
        self.inner.requester.last_status()
    }

    pub fn last_latency(&self) -> Option<Duration> {
        self.inner.requester.last_latency()
    }

    pub fn last_transport_error(&self) -> Option<String> {
        self.inner.requester.last_transport_error()
    }

    pub fn last_headers(&self) -> Vec<(String, String)> {
        self.inner.requester.last_headers()
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let settings = self.settings();
        f.debug_struct("Client")
            .field("base_url", &self.base_url())
            .field("token", &"<redacted>")
            .field("callback_url", &settings.callback_url)
            .field("private_key", &settings.private_key.is_some())
            .field("fail_on_error", &self.fails_on_error())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::{client_with, Scripted};

    #[test]
    fn test_callback_url_is_validated() {
        let (client, _) = client_with(Scripted::new());
        assert!(client.set_callback_url("https://hooks.example/ai").is_ok());
        assert!(client.set_callback_url("https://hooks.example/ai").is_ok());
        assert_eq!(client.callback_url().as_deref(), Some("https://hooks.example/ai"));

        assert!(client.set_callback_url("hooks.example").is_err());
        assert_eq!(client.callback_url().as_deref(), Some("https://hooks.example/ai"));

        client.clear_callback_url();
        assert_eq!(client.callback_url(), None);
    }

    #[test]
    fn test_clones_share_configuration() {
        let (client, _) = client_with(Scripted::new());
        let other = client.clone();
        other.fail_on_error(true);
        assert!(client.fails_on_error());
        other.set_base_url("https://staging.example/api/v2/").unwrap();
        assert_eq!(client.base_url(), "https://staging.example/api/v2");
    }

    #[test]
    fn test_debug_redacts_token() {
        let (client, _) = client_with(Scripted::new());
        let rendered = format!("{:?}", client);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(crate::client::mock::TOKEN));
    }

    #[test]
    fn test_rsa_decrypt_requires_key() {
        let (client, _) = client_with(Scripted::new());
        assert!(matches!(
            client.rsa_decrypt("AAAA"),
            Err(crate::Error::MissingKey)
        ));
    }
}
