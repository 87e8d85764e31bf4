//! Per-call options for predict and fit requests.

use crate::transport::FilePart;
use crate::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Name of the in-memory part carrying JSON feature data.
pub(crate) const FEATURES_FILE_NAME: &str = "features.json";

/// Feature data sent with a predict or fit request.
#[derive(Debug, Clone, PartialEq)]
pub enum Features {
    /// Serialized and sent as an in-memory `features.json` part.
    Json(Value),
    /// A file on disk, uploaded as is.
    File(PathBuf),
}

impl Features {
    pub(crate) fn into_part(self, content_type: &str) -> Result<FilePart> {
        Ok(match self {
            Features::Json(value) => {
                FilePart::bytes(FEATURES_FILE_NAME, content_type, serde_json::to_vec(&value)?)
            }
            Features::File(path) => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| FEATURES_FILE_NAME.to_string());
                FilePart::path(path, file_name, content_type)
            }
        })
    }
}

impl From<Value> for Features {
    fn from(value: Value) -> Self {
        Features::Json(value)
    }
}

impl From<PathBuf> for Features {
    fn from(path: PathBuf) -> Self {
        Features::File(path)
    }
}

impl From<&Path> for Features {
    fn from(path: &Path) -> Self {
        Features::File(path.to_path_buf())
    }
}

/// Whether, and how, the service should evaluate a prediction.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluate {
    Flag(bool),
    /// Custom evaluation settings, sent as compact JSON.
    Custom(Value),
}

impl Default for Evaluate {
    fn default() -> Self {
        Evaluate::Flag(true)
    }
}

impl Evaluate {
    pub(crate) fn to_value(&self) -> Value {
        match self {
            Evaluate::Flag(b) => Value::Bool(*b),
            Evaluate::Custom(v) => v.clone(),
        }
    }
}

impl From<bool> for Evaluate {
    fn from(flag: bool) -> Self {
        Evaluate::Flag(flag)
    }
}

impl From<Value> for Evaluate {
    fn from(value: Value) -> Self {
        match value {
            Value::Bool(b) => Evaluate::Flag(b),
            other => Evaluate::Custom(other),
        }
    }
}

/// Options of `POST /algorithms/{id}/predict`.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictOptions {
    pub evaluate: Evaluate,
    pub encrypt: bool,
    /// Echoed back by the service in the task/prediction and in callbacks.
    pub callback_param: Option<Value>,
    /// Overrides the client's callback URL for this call.
    pub callback_url: Option<String>,
    /// Algorithm version; the service's default version when `None`.
    pub version: Option<String>,
    /// Content type of the feature part.
    pub content_type: String,
}

impl Default for PredictOptions {
    fn default() -> Self {
        Self {
            evaluate: Evaluate::default(),
            encrypt: false,
            callback_param: None,
            callback_url: None,
            version: None,
            content_type: "application/json".to_string(),
        }
    }
}

impl PredictOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn evaluate(mut self, evaluate: impl Into<Evaluate>) -> Self {
        self.evaluate = evaluate.into();
        self
    }

    pub fn encrypt(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    pub fn callback_param(mut self, param: impl Into<Value>) -> Self {
        self.callback_param = Some(param.into());
        self
    }

    pub fn callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// Options of `POST /algorithms/{id}/fit`.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    pub version: Option<String>,
    /// Publish the trained model as a new version instead of updating `version`.
    pub export_new_version: Option<bool>,
    pub content_type: String,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            version: None,
            export_new_version: None,
            content_type: "application/json".to_string(),
        }
    }
}

impl FitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn export_new_version(mut self, export: bool) -> Self {
        self.export_new_version = Some(export);
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}
