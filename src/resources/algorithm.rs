use super::{FromPayload, Resource, ResourceKind, Version};
use crate::client::{Client, Features, PredictOptions};
use crate::types::{Artifact, Outcome, TemplateKind};
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Deserialize)]
struct AlgorithmPayload {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    versions: Option<Vec<Value>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// An algorithm and the versions it ships with.
#[derive(Debug, Clone)]
pub struct Algorithm {
    id: String,
    name: Option<String>,
    description: Option<String>,
    versions: Vec<Version>,
    extra: Map<String, Value>,
    last_result: Option<Box<Outcome<Resource>>>,
    client: Client,
}

impl FromPayload for Algorithm {
    const KIND: ResourceKind = ResourceKind::Algorithm;

    fn from_payload(payload: Map<String, Value>, client: &Client) -> Result<Self> {
        let p: AlgorithmPayload = serde_json::from_value(Value::Object(payload))?;

        let versions = p
            .versions
            .unwrap_or_default()
            .into_iter()
            .map(|v| {
                let mut fields = match v {
                    Value::Object(map) => map,
                    _ => Map::new(),
                };
                fields.insert("algorithm_id".to_string(), Value::String(p.id.clone()));
                Version::from_payload(fields, client)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            id: p.id,
            name: p.name,
            description: p.description,
            versions,
            extra: p.extra,
            last_result: None,
            client: client.clone(),
        })
    }
}

impl Algorithm {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn versions(&self) -> &[Version] {
        &self.versions
    }

    pub fn version(&self, version: &str) -> Option<&Version> {
        self.versions.iter().find(|v| v.version() == Some(version))
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Response time of the default (first) version.
    pub fn response_time(&self) -> Option<String> {
        self.versions.first().and_then(Version::response_time)
    }

    /// Template of the default (first) version.
    pub fn template(&self, kind: TemplateKind) -> Option<&Value> {
        self.versions.first().and_then(|v| v.template(kind))
    }

    fn require_id(&self) -> Result<&str> {
        if self.id.is_empty() {
            return Err(Error::missing_field("id", "algorithm"));
        }
        Ok(&self.id)
    }

    pub fn predict(&mut self, features: impl Into<Features>, options: PredictOptions) -> Result<Outcome<Resource>> {
        let outcome = self
            .client
            .get_prediction(self.require_id()?, features, &options)?;
        self.last_result = Some(Box::new(outcome.clone()));
        Ok(outcome)
    }

    /// Result of the last [`Algorithm::predict`] call, if any.
    pub fn last_predictions(&self) -> Option<&Outcome<Resource>> {
        self.last_result.as_deref()
    }

    pub fn detailed_template(&self, kind: TemplateKind) -> Result<Outcome<Artifact>> {
        self.client.get_template(self.require_id()?, kind, None)
    }

    pub fn detailed_graph(&self, kind: TemplateKind) -> Result<Outcome<Artifact>> {
        self.client.get_graph(self.require_id()?, kind, None)
    }
}

/// Algorithm summaries as listed by the service.
///
/// Entries stay raw until looked up; [`Algorithms::get`] builds the
/// [`Algorithm`] on access.
#[derive(Debug, Clone)]
pub struct Algorithms {
    entries: Vec<Value>,
    client: Client,
}

impl Algorithms {
    pub fn new(entries: Vec<Value>, client: Client) -> Self {
        Self { entries, client }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().filter_map(entry_id).collect()
    }

    /// Linear lookup by id. `None` when no entry carries that id.
    pub fn get(&self, id: &str) -> Option<Result<Algorithm>> {
        self.entries
            .iter()
            .find(|e| entry_id(e) == Some(id))
            .map(|e| self.build(e))
    }

    /// Build every entry, in listing order.
    pub fn iter(&self) -> impl Iterator<Item = Result<Algorithm>> + '_ {
        self.entries.iter().map(|e| self.build(e))
    }

    pub fn raw(&self) -> &[Value] {
        &self.entries
    }

    fn build(&self, entry: &Value) -> Result<Algorithm> {
        let fields = entry.as_object().cloned().unwrap_or_default();
        Algorithm::from_payload(fields, &self.client)
    }
}

fn entry_id(entry: &Value) -> Option<&str> {
    entry.get("id").and_then(Value::as_str)
}

impl fmt::Display for Algorithms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.ids().join(","))
    }
}
