//! Shared fixtures for integration tests.

#![allow(dead_code)]

use bytes::Bytes;
use compredict_client::transport::{Transport, TransportError, TransportRequest, TransportResponse};
use compredict_client::{Client, PrivateKey};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub const TOKEN: &str = "0123456789abcdef0123456789abcdef01234567";

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture_key() -> PrivateKey {
    PrivateKey::from_file(fixture("private_key.pem"), None).expect("fixture key")
}

/// In-process transport replaying queued responses; 200 `{}` once drained.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<(u16, Bytes)>>,
    seen: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, status: u16, body: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back((status, Bytes::copy_from_slice(body.as_bytes())));
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.seen.lock().unwrap().push(request);
        let (status, body) = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((200, Bytes::from_static(b"{}")));
        Ok(TransportResponse {
            status,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body,
        })
    }
}

pub fn scripted_client() -> (Client, Arc<ScriptedTransport>) {
    let transport = ScriptedTransport::new();
    let client = Client::builder()
        .token(TOKEN)
        .base_url("https://core.test/api/")
        .transport(transport.clone())
        .build()
        .expect("client");
    (client, transport)
}

/// A client talking HTTP to a mockito server. Paths are prefixed with `/v1`.
pub fn http_client(server: &mockito::ServerGuard) -> Client {
    Client::builder()
        .token(TOKEN)
        .base_url(server.url())
        .build()
        .expect("client")
}
