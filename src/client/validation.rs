//! 配置校验：API Token 长度与回调 URL 格式。
//!
//! Client configuration validation.

use crate::{Error, ErrorContext, Result};
use url::Url;

/// Length of every AI Core API token.
pub const TOKEN_LENGTH: usize = 40;

/// Tokens are opaque but always exactly [`TOKEN_LENGTH`] characters long.
pub fn validate_token(token: &str) -> Result<()> {
    let len = token.chars().count();
    if len != TOKEN_LENGTH {
        return Err(Error::validation_with_context(
            format!("A {} character API Key must be provided", TOKEN_LENGTH),
            ErrorContext::new()
                .with_field_path("token")
                .with_details(format!("got {} characters", len))
                .with_source("client_validator"),
        ));
    }
    Ok(())
}

/// A URL must parse and carry a host (`http://`, `https://` and the like).
pub fn validate_url(url: &str, field: &str) -> Result<Url> {
    let invalid = |details: String| {
        Error::validation_with_context(
            format!("{} must be a valid URL", field),
            ErrorContext::new()
                .with_field_path(field)
                .with_details(details)
                .with_source("client_validator"),
        )
    };

    let parsed = Url::parse(url).map_err(|e| invalid(format!("{}: {}", url, e)))?;
    if !parsed.has_host() {
        return Err(invalid(format!("{}: missing host", url)));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_length() {
        assert!(validate_token(&"a".repeat(40)).is_ok());
        let err = validate_token(&"a".repeat(39)).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert_eq!(
            err.context().and_then(|c| c.details.as_deref()),
            Some("got 39 characters")
        );
        assert!(validate_token("").is_err());
        assert!(validate_token(&"a".repeat(41)).is_err());
    }

    #[test]
    fn test_urls() {
        assert!(validate_url("https://my.server/callback", "callback_url").is_ok());
        assert!(validate_url("http://localhost:8080", "callback_url").is_ok());
        assert!(validate_url("not a url", "callback_url").is_err());
        assert!(validate_url("mailto:ops@example.com", "callback_url").is_err());
        assert!(validate_url("", "callback_url").is_err());
    }
}
