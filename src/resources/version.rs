use super::{FromPayload, Resource, ResourceKind};
use crate::client::{Client, Features, PredictOptions};
use crate::types::{Artifact, Outcome, TemplateKind};
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
struct VersionPayload {
    #[serde(default)]
    algorithm_id: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    change_description: Option<String>,
    #[serde(default)]
    results: Option<Value>,
    #[serde(default)]
    features_format: Option<Value>,
    #[serde(default)]
    output_format: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// One version of an algorithm. Always belongs to exactly one algorithm.
#[derive(Debug, Clone)]
pub struct Version {
    algorithm_id: String,
    version: Option<String>,
    change_description: Option<String>,
    results: Option<Value>,
    features_format: Option<Value>,
    output_format: Option<Value>,
    extra: Map<String, Value>,
    last_result: Option<Box<Outcome<Resource>>>,
    client: Client,
}

impl FromPayload for Version {
    const KIND: ResourceKind = ResourceKind::Version;

    fn from_payload(payload: Map<String, Value>, client: &Client) -> Result<Self> {
        let p: VersionPayload = serde_json::from_value(Value::Object(payload))?;
        let algorithm_id = p
            .algorithm_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::missing_field("algorithm_id", "version"))?;
        Ok(Self {
            algorithm_id,
            version: p.version,
            change_description: p.change_description,
            results: p.results,
            features_format: p.features_format,
            output_format: p.output_format,
            extra: p.extra,
            last_result: None,
            client: client.clone(),
        })
    }
}

impl Version {
    pub fn algorithm_id(&self) -> &str {
        &self.algorithm_id
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn change_description(&self) -> Option<&str> {
        self.change_description.as_deref()
    }

    /// Estimated response time as reported by the service.
    pub fn response_time(&self) -> Option<String> {
        match self.results.as_ref()? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Input (`features_format`) or output (`output_format`) template.
    pub fn template(&self, kind: TemplateKind) -> Option<&Value> {
        match kind {
            TemplateKind::Input => self.features_format.as_ref(),
            TemplateKind::Output => self.output_format.as_ref(),
        }
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Unrecognized payload key.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Run this exact version. `options.version` is overridden.
    pub fn predict(&mut self, features: impl Into<Features>, options: PredictOptions) -> Result<Outcome<Resource>> {
        let options = match &self.version {
            Some(v) => options.version(v.clone()),
            None => options,
        };
        let outcome = self
            .client
            .get_prediction(&self.algorithm_id, features, &options)?;
        self.last_result = Some(Box::new(outcome.clone()));
        Ok(outcome)
    }

    /// Result of the last [`Version::predict`] call, if any.
    pub fn last_predictions(&self) -> Option<&Outcome<Resource>> {
        self.last_result.as_deref()
    }

    pub fn detailed_template(&self, kind: TemplateKind) -> Result<Outcome<Artifact>> {
        self.client
            .get_template(&self.algorithm_id, kind, self.version.as_deref())
    }

    pub fn detailed_graph(&self, kind: TemplateKind) -> Result<Outcome<Artifact>> {
        self.client
            .get_graph(&self.algorithm_id, kind, self.version.as_deref())
    }
}
