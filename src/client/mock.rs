//! Scripted in-process transport for unit tests.

use super::Client;
use crate::transport::{Transport, TransportError, TransportRequest, TransportResponse};
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

pub(crate) const TOKEN: &str = "0123456789abcdef0123456789abcdef01234567";
pub(crate) const BASE_URL: &str = "https://core.test/api";

/// Replies with queued responses in order; 200 `{}` once the queue is empty.
#[derive(Default)]
pub(crate) struct Scripted {
    replies: Mutex<VecDeque<(u16, Bytes)>>,
    seen: Mutex<Vec<TransportRequest>>,
}

impl Scripted {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push(&self, status: u16, body: impl Into<Bytes>) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back((status, body.into()));
    }

    pub(crate) fn requests(&self) -> Vec<TransportRequest> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Transport for Scripted {
    fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        let (status, body) = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or((200, Bytes::from_static(b"{}")));
        Ok(TransportResponse {
            status,
            headers: Vec::new(),
            body,
        })
    }
}

/// A client on top of `script`, against `{BASE_URL}/v1`.
pub(crate) fn client_with(script: Arc<Scripted>) -> (Client, Arc<Scripted>) {
    let client = Client::builder()
        .token(TOKEN)
        .base_url(BASE_URL)
        .transport(script.clone())
        .build()
        .expect("mock client");
    (client, script)
}
