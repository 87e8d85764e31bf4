use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field path or configuration key that caused the error (e.g., "token", "task.job_id")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected length, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "client_builder", "crypto")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the AI Core client.
///
/// HTTP 4xx/5xx responses only surface as [`Error::Client`] / [`Error::Server`]
/// when the client is configured to fail on error; otherwise they are recorded
/// and the call returns [`crate::Outcome::Failed`]. Every other variant is
/// always raised.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level fault (DNS, connection, TLS, timeout). Never suppressible.
    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    #[error("Client error ({status}): {message}")]
    Client {
        status: u16,
        message: String,
        body: serde_json::Value,
    },

    #[error("Server error ({status}): {message}")]
    Server {
        status: u16,
        message: String,
        body: serde_json::Value,
    },

    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Returned message is encrypted but no private key was provided")]
    MissingKey,

    #[error("Decryption failed: {message}{}", format_context(.context))]
    DecryptionFailed {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    ConfigFile(#[from] serde_yaml::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::validation_with_context(msg, ErrorContext::new())
    }

    /// Create a new validation error with structured context
    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// A required identifier is absent from a payload or call.
    pub fn missing_field(field: &str, source: &str) -> Self {
        Self::validation_with_context(
            format!("{} is required", field),
            ErrorContext::new()
                .with_field_path(field)
                .with_source(source),
        )
    }

    pub fn decryption(msg: impl Into<String>) -> Self {
        Error::DecryptionFailed {
            message: msg.into(),
            context: ErrorContext::new().with_source("crypto"),
        }
    }

    /// Build the HTTP error for a 4xx/5xx status from the decoded response body.
    ///
    /// The message is taken from `errors[0]`, then `error`, then the raw body.
    pub fn from_status(status: u16, body: serde_json::Value) -> Self {
        let message = error_message(&body);
        if (500..=599).contains(&status) {
            Error::Server {
                status,
                message,
                body,
            }
        } else {
            Error::Client {
                status,
                message,
                body,
            }
        }
    }

    /// HTTP status carried by client/server errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Client { status, .. } | Error::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::Client { .. })
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Server { .. })
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Validation { context, .. }
            | Error::Configuration { context, .. }
            | Error::DecryptionFailed { context, .. } => Some(context),
            _ => None,
        }
    }
}

pub(crate) fn error_message(body: &serde_json::Value) -> String {
    if let Some(first) = body
        .get("errors")
        .and_then(|v| v.as_array())
        .and_then(|a| a.first())
    {
        return value_text(first);
    }
    if let Some(err) = body.get("error").filter(|v| !v.is_null()) {
        return value_text(err);
    }
    value_text(body)
}

fn value_text(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_status_splits_client_and_server() {
        let e = Error::from_status(429, json!({"error": "Too many requests"}));
        assert!(e.is_client_error());
        assert_eq!(e.status(), Some(429));
        assert_eq!(e.to_string(), "Client error (429): Too many requests");

        let e = Error::from_status(503, json!({"errors": ["maintenance", "retry later"]}));
        assert!(e.is_server_error());
        assert_eq!(e.to_string(), "Server error (503): maintenance");
    }

    #[test]
    fn test_error_message_falls_back_to_raw_body() {
        assert_eq!(error_message(&json!("gateway timeout")), "gateway timeout");
        assert_eq!(
            error_message(&json!({"detail": "nope"})),
            r#"{"detail":"nope"}"#
        );
    }

    #[test]
    fn test_validation_context_is_rendered() {
        let e = Error::validation_with_context(
            "A 40 character API Key must be provided",
            ErrorContext::new()
                .with_field_path("token")
                .with_details("got 12 characters"),
        );
        assert_eq!(
            e.to_string(),
            "Validation error: A 40 character API Key must be provided (field: token, details: got 12 characters)"
        );
        assert_eq!(e.context().and_then(|c| c.field_path.as_deref()), Some("token"));
    }
}
