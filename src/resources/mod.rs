//! 资源模型：把服务返回的 JSON 映射为强类型资源。
//!
//! # Resources
//!
//! Typed views over service payloads. Each resource is built from one JSON
//! object, keeps unrecognized keys in an `extra` map and holds a [`Client`]
//! handle for follow-up calls (refreshing a task, re-running a prediction).
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Algorithm`] | Algorithm with its versions |
//! | [`Algorithms`] | Lazily materialized list of algorithm summaries |
//! | [`Version`] | One version of an algorithm |
//! | [`Task`] | Asynchronous job, refreshed or canceled explicitly |
//! | [`Prediction`] | Synchronous, terminal result |

pub mod algorithm;
pub mod mapper;
pub mod prediction;
pub mod task;
pub mod version;

pub use algorithm::{Algorithm, Algorithms};
pub use mapper::{map_all_as, map_as, map_many, map_one};
pub use prediction::Prediction;
pub use task::{Task, TaskStatus};
pub use version::Version;

use crate::client::Client;
use crate::{crypto, Error, Result};
use serde_json::{Map, Value};

/// Closed set of resource types the service returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Algorithm,
    Version,
    Task,
    Prediction,
}

impl ResourceKind {
    /// A predict response is a [`Task`] when the service escalated the request
    /// to asynchronous processing (`job_id` present), a [`Prediction`] otherwise.
    pub fn for_prediction(payload: &Value) -> Self {
        match payload.get("job_id") {
            Some(v) if !v.is_null() => ResourceKind::Task,
            _ => ResourceKind::Prediction,
        }
    }
}

/// Any mapped resource.
#[derive(Debug, Clone)]
pub enum Resource {
    Algorithm(Algorithm),
    Version(Version),
    Task(Task),
    Prediction(Prediction),
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Algorithm(_) => ResourceKind::Algorithm,
            Resource::Version(_) => ResourceKind::Version,
            Resource::Task(_) => ResourceKind::Task,
            Resource::Prediction(_) => ResourceKind::Prediction,
        }
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self {
            Resource::Task(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_task_mut(&mut self) -> Option<&mut Task> {
        match self {
            Resource::Task(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_prediction(&self) -> Option<&Prediction> {
        match self {
            Resource::Prediction(p) => Some(p),
            _ => None,
        }
    }

    pub fn into_task(self) -> Option<Task> {
        match self {
            Resource::Task(t) => Some(t),
            _ => None,
        }
    }

    pub fn into_prediction(self) -> Option<Prediction> {
        match self {
            Resource::Prediction(p) => Some(p),
            _ => None,
        }
    }

    pub fn into_algorithm(self) -> Option<Algorithm> {
        match self {
            Resource::Algorithm(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_version(self) -> Option<Version> {
        match self {
            Resource::Version(v) => Some(v),
            _ => None,
        }
    }
}

/// Construction of a typed resource from one JSON object.
pub trait FromPayload: Sized {
    const KIND: ResourceKind;

    fn from_payload(payload: Map<String, Value>, client: &Client) -> Result<Self>;
}

/// Resolve a predictions/evaluations/monitors field. Encrypted fields go
/// through chunked RSA decryption; the plaintext is exposed as JSON when it
/// parses, as a JSON string otherwise.
pub(crate) fn resolve_result(raw: Option<Value>, encrypted: bool, client: &Client) -> Result<Option<Value>> {
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(v) if !encrypted => Ok(Some(v)),
        Some(Value::String(encoded)) => {
            let key = client.private_key();
            let plaintext = crypto::decrypt(key.as_deref(), &encoded)?;
            let text = String::from_utf8(plaintext)
                .map_err(|_| Error::decryption("decrypted payload is not valid UTF-8"))?;
            Ok(Some(
                serde_json::from_str(&text).unwrap_or(Value::String(text)),
            ))
        }
        Some(_) => Err(Error::decryption(
            "encrypted payload must be a base64 string",
        )),
    }
}
