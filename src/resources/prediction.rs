use super::{resolve_result, FromPayload, ResourceKind};
use crate::client::Client;
use crate::Result;
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
struct PredictionPayload {
    #[serde(default)]
    predictions: Option<Value>,
    #[serde(default)]
    evaluations: Option<Value>,
    #[serde(default)]
    monitors: Option<Value>,
    #[serde(default)]
    is_encrypted: Option<bool>,
    #[serde(default)]
    callback_param: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Result of a prediction the service answered synchronously.
///
/// A value, not a job: it never changes after construction.
#[derive(Debug, Clone)]
pub struct Prediction {
    predictions: Option<Value>,
    evaluations: Option<Value>,
    monitors: Option<Value>,
    is_encrypted: bool,
    callback_param: Option<Value>,
    extra: Map<String, Value>,
}

impl FromPayload for Prediction {
    const KIND: ResourceKind = ResourceKind::Prediction;

    fn from_payload(payload: Map<String, Value>, client: &Client) -> Result<Self> {
        let p: PredictionPayload = serde_json::from_value(Value::Object(payload))?;
        let is_encrypted = p.is_encrypted.unwrap_or(false);
        Ok(Self {
            predictions: resolve_result(p.predictions, is_encrypted, client)?,
            evaluations: resolve_result(p.evaluations, is_encrypted, client)?,
            monitors: resolve_result(p.monitors, is_encrypted, client)?,
            is_encrypted,
            callback_param: p.callback_param,
            extra: p.extra,
        })
    }
}

impl Prediction {
    pub fn predictions(&self) -> Option<&Value> {
        self.predictions.as_ref()
    }

    pub fn evaluations(&self) -> Option<&Value> {
        self.evaluations.as_ref()
    }

    pub fn monitors(&self) -> Option<&Value> {
        self.monitors.as_ref()
    }

    pub fn is_encrypted(&self) -> bool {
        self.is_encrypted
    }

    pub fn callback_param(&self) -> Option<&Value> {
        self.callback_param.as_ref()
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}
