use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which side of an algorithm a template or graph describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateKind {
    #[default]
    Input,
    Output,
}

impl TemplateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateKind::Input => "input",
            TemplateKind::Output => "output",
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "input" => Ok(TemplateKind::Input),
            "output" => Ok(TemplateKind::Output),
            other => Err(crate::Error::validation(format!(
                "template type must be `input` or `output`, got `{}`",
                other
            ))),
        }
    }
}

/// A downloaded file: the raw bytes plus how the service wants it presented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Bytes,
    pub content_type: String,
    pub file_name: String,
}

impl Artifact {
    /// Input/output template of an algorithm (`{id}-{type}-template.json`).
    pub fn template(algorithm_id: &str, kind: TemplateKind, bytes: Bytes) -> Self {
        Self {
            bytes,
            content_type: "application/json".to_string(),
            file_name: format!("{}-{}-template.json", algorithm_id, kind),
        }
    }

    /// Graph of an algorithm (`{id}-graph.png`).
    pub fn graph(algorithm_id: &str, bytes: Bytes) -> Self {
        Self {
            bytes,
            content_type: "image/png".to_string(),
            file_name: format!("{}-graph.png", algorithm_id),
        }
    }

    /// `Content-Disposition` value for forwarding the artifact as a download.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename={}", self.file_name)
    }

    /// Write the artifact into `dir` under its suggested file name.
    pub fn save_in(&self, dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
