use super::{multipart, Method, RequestBody, Transport, TransportRequest, TransportResponse};
use crate::types::Outcome;
use crate::{Error, Result};
use bytes::Bytes;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Where the content of a file part comes from.
#[derive(Debug, Clone)]
pub enum FileSource {
    Bytes(Bytes),
    /// A file on disk. When it is the only part of a request it is uploaded
    /// directly by the HTTP stack instead of being encoded by hand.
    Path(PathBuf),
}

#[derive(Debug, Clone)]
pub struct FilePart {
    pub file_name: String,
    pub content_type: String,
    pub source: FileSource,
}

impl FilePart {
    pub fn bytes(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        content: impl Into<Bytes>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            source: FileSource::Bytes(content.into()),
        }
    }

    pub fn path(
        path: impl Into<PathBuf>,
        file_name: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            source: FileSource::Path(path.into()),
        }
    }

    fn load(&self) -> Result<Bytes> {
        match &self.source {
            FileSource::Bytes(b) => Ok(b.clone()),
            FileSource::Path(p) => Ok(Bytes::from(std::fs::read(p)?)),
        }
    }
}

/// A request against the service, relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    fields: Vec<(String, Value)>,
    files: Vec<(String, FilePart)>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            fields: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a query parameter only when a value is present.
    pub fn query_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn file(mut self, name: impl Into<String>, part: FilePart) -> Self {
        self.files.push((name.into(), part));
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Select the body encoding: JSON without files, a direct upload for a lone
    /// on-disk file, a hand-built multipart body otherwise.
    fn body(&self) -> Result<(RequestBody, Option<String>)> {
        if self.method != Method::Post {
            return Ok((RequestBody::Empty, None));
        }

        if self.files.is_empty() {
            let map: serde_json::Map<String, Value> = self.fields.iter().cloned().collect();
            let bytes = serde_json::to_vec(&Value::Object(map))?;
            return Ok((RequestBody::Json(bytes), Some("application/json".to_string())));
        }

        if let [(name, part)] = self.files.as_slice() {
            if matches!(part.source, FileSource::Path(_)) {
                if !self.fields.is_empty() {
                    let dropped: Vec<&str> = self.fields.iter().map(|(k, _)| k.as_str()).collect();
                    warn!(
                        path = %self.path,
                        ?dropped,
                        "direct file upload carries no form fields"
                    );
                }
                return Ok((
                    RequestBody::File {
                        name: name.clone(),
                        part: part.clone(),
                    },
                    None,
                ));
            }
        }

        let fields: Vec<(String, String)> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), field_text(v)))
            .collect();
        let contents = self
            .files
            .iter()
            .map(|(_, part)| part.load())
            .collect::<Result<Vec<_>>>()?;
        let files: Vec<multipart::EncodedFile<'_>> = self
            .files
            .iter()
            .zip(contents.iter())
            .map(|((name, part), content)| multipart::EncodedFile {
                name: name.as_str(),
                file_name: part.file_name.as_str(),
                content_type: part.content_type.as_str(),
                content: content.as_ref(),
            })
            .collect();

        let boundary = multipart::new_boundary();
        let bytes = multipart::encode(&boundary, &fields, &files);
        let content_type = multipart::content_type(&boundary);
        Ok((RequestBody::Multipart { boundary, bytes }, Some(content_type)))
    }
}

/// Text form of a field value inside a multipart body.
fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Decode a response body as JSON. Empty bodies become `null`; bodies that are
/// not JSON are kept as a JSON string holding the raw text.
fn decode_json(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

#[derive(Debug, Default)]
struct LastExchange {
    status: Option<u16>,
    latency: Option<Duration>,
    transport_error: Option<String>,
    headers: Vec<(String, String)>,
    error: Option<Value>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Executes [`ApiRequest`]s: authentication, body encoding, decoding and
/// HTTP error classification, plus last-response bookkeeping.
///
/// The bookkeeping is overwritten by every call; it is not isolated between
/// concurrent callers.
pub struct Requester {
    transport: Arc<dyn Transport>,
    base_url: RwLock<String>,
    token: String,
    fail_on_error: AtomicBool,
    last: Mutex<LastExchange>,
}

impl Requester {
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: RwLock::new(base_url.into()),
            token: token.into(),
            fail_on_error: AtomicBool::new(false),
            last: Mutex::new(LastExchange::default()),
        }
    }

    pub fn base_url(&self) -> String {
        self.base_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_base_url(&self, url: impl Into<String>) {
        *self.base_url.write().unwrap_or_else(PoisonError::into_inner) = url.into();
    }

    /// Raise 4xx/5xx responses as errors instead of recording them.
    pub fn set_fail_on_error(&self, enabled: bool) {
        self.fail_on_error.store(enabled, Ordering::SeqCst);
    }

    pub fn fails_on_error(&self) -> bool {
        self.fail_on_error.load(Ordering::SeqCst)
    }

    pub fn set_verify_peer(&self, enabled: bool) -> Result<()> {
        self.transport.set_verify_peer(enabled)?;
        Ok(())
    }

    /// Decoded error body of the last request, if it failed with an HTTP error.
    pub fn last_error(&self) -> Option<Value> {
        lock(&self.last).error.clone()
    }

    pub fn last_status(&self) -> Option<u16> {
        lock(&self.last).status
    }

    pub fn last_latency(&self) -> Option<Duration> {
        lock(&self.last).latency
    }

    pub fn last_transport_error(&self) -> Option<String> {
        lock(&self.last).transport_error.clone()
    }

    pub fn last_headers(&self) -> Vec<(String, String)> {
        lock(&self.last).headers.clone()
    }

    /// Execute and decode the body as JSON.
    pub fn json(&self, request: ApiRequest) -> Result<Outcome<Value>> {
        Ok(match self.execute(&request)? {
            Some(resp) => Outcome::Resource(decode_json(&resp.body)),
            None => Outcome::Failed,
        })
    }

    /// Execute and return the body bytes untouched.
    pub fn bytes(&self, request: ApiRequest) -> Result<Outcome<Bytes>> {
        Ok(match self.execute(&request)? {
            Some(resp) => Outcome::Resource(resp.body),
            None => Outcome::Failed,
        })
    }

    /// Single attempt. `Ok(None)` means an HTTP error was recorded as the last error.
    fn execute(&self, request: &ApiRequest) -> Result<Option<TransportResponse>> {
        *lock(&self.last) = LastExchange::default();

        let url = format!("{}{}", self.base_url(), request.path);
        let (body, content_type) = request.body()?;

        let mut headers = vec![(
            "Authorization".to_string(),
            format!("Token {}", self.token),
        )];
        if let Some(ct) = content_type {
            headers.push(("Content-Type".to_string(), ct));
        }

        debug!(method = %request.method, url = %url, body = body.kind(), "sending request");

        let started = Instant::now();
        let result = self.transport.send(TransportRequest {
            method: request.method,
            url,
            query: request.query.clone(),
            headers,
            body,
        });
        let latency = started.elapsed();

        let resp = match result {
            Ok(resp) => resp,
            Err(e) => {
                let mut last = lock(&self.last);
                last.latency = Some(latency);
                last.transport_error = Some(e.to_string());
                return Err(Error::Network(e));
            }
        };

        debug!(
            status = resp.status,
            latency_ms = latency.as_millis() as u64,
            "received response"
        );

        let mut last = lock(&self.last);
        last.status = Some(resp.status);
        last.latency = Some(latency);
        last.headers = resp.headers.clone();

        if (400..=599).contains(&resp.status) {
            let body = decode_json(&resp.body);
            if self.fails_on_error() {
                return Err(Error::from_status(resp.status, body));
            }
            warn!(
                status = resp.status,
                path = %request.path,
                "request failed; error recorded as last error"
            );
            last.error = Some(body);
            return Ok(None);
        }

        Ok(Some(resp))
    }
}

impl std::fmt::Debug for Requester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Requester")
            .field("base_url", &self.base_url())
            .field("fail_on_error", &self.fails_on_error())
            .finish_non_exhaustive()
    }
}
