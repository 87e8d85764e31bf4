use super::{FileSource, Method, RequestBody, Transport, TransportError, TransportRequest, TransportResponse};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::redirect::Policy;
use reqwest::Proxy;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// Knobs for the underlying HTTP stack.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    /// Overall request timeout; `None` leaves uploads of large feature files unbounded.
    pub timeout: Option<Duration>,
    pub max_redirects: usize,
    pub verify_peer: bool,
    pub proxy_url: Option<String>,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: None,
            max_redirects: 5,
            verify_peer: true,
            proxy_url: None,
            user_agent: format!("compredict-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Blocking [`Transport`] backed by `reqwest`.
pub struct HttpTransport {
    settings: RwLock<HttpSettings>,
    client: RwLock<reqwest::blocking::Client>,
}

impl HttpTransport {
    pub fn new(settings: HttpSettings) -> Result<Self, TransportError> {
        let client = Self::build_client(&settings)?;
        Ok(Self {
            settings: RwLock::new(settings),
            client: RwLock::new(client),
        })
    }

    fn build_client(settings: &HttpSettings) -> Result<reqwest::blocking::Client, TransportError> {
        let mut builder = reqwest::blocking::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.timeout)
            .redirect(Policy::limited(settings.max_redirects))
            .danger_accept_invalid_certs(!settings.verify_peer)
            .user_agent(settings.user_agent.clone());

        if let Some(proxy_url) = &settings.proxy_url {
            let proxy = Proxy::all(proxy_url)?;
            builder = builder.proxy(proxy);
        }

        Ok(builder.build()?)
    }

    fn file_form(name: &str, part: &super::FilePart) -> Result<Form, TransportError> {
        let file = match &part.source {
            FileSource::Path(path) => Part::file(path)?,
            FileSource::Bytes(bytes) => Part::bytes(bytes.to_vec()),
        };
        let file = file
            .file_name(part.file_name.clone())
            .mime_str(&part.content_type)?;
        Ok(Form::new().part(name.to_string(), file))
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let client = self
            .client
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut req = match request.method {
            Method::Post => client.post(&request.url),
            Method::Delete => client.delete(&request.url),
            Method::Get => client.get(&request.url),
        };

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        for (k, v) in &request.headers {
            req = req.header(k.as_str(), v.as_str());
        }

        req = match request.body {
            RequestBody::Empty => req,
            RequestBody::Json(bytes) | RequestBody::Multipart { bytes, .. } => req.body(bytes),
            RequestBody::File { name, part } => req.multipart(Self::file_form(&name, &part)?),
        };

        let response = req.send()?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response.bytes()?;

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }

    fn set_verify_peer(&self, enabled: bool) -> Result<(), TransportError> {
        let mut settings = self.settings.write().unwrap_or_else(PoisonError::into_inner);
        if settings.verify_peer == enabled {
            return Ok(());
        }
        let mut updated = settings.clone();
        updated.verify_peer = enabled;
        let client = Self::build_client(&updated)?;
        *self.client.write().unwrap_or_else(PoisonError::into_inner) = client;
        *settings = updated;
        Ok(())
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field(
                "settings",
                &*self.settings.read().unwrap_or_else(PoisonError::into_inner),
            )
            .finish()
    }
}
