//! Error handling for navwatch
//!
//! Defines the domain error types and establishes a unified Result type
//! using anyhow for context chaining and error propagation.

use thiserror::Error;

/// Core error types for NAV report operations
#[derive(Error, Debug)]
pub enum NavError {
    #[error("column not found: {0}")]
    MissingColumn(&'static str),

    #[error("unsupported file format: {0}. Supported formats: .csv, .txt")]
    UnsupportedFormat(String),

    #[error("no as-of date available: pass --as-of, set `as_of` in the config, or provide dated records")]
    NoAsOfDate,

    #[error("no webhook configured: set `webhook_url` in the config or NAVWATCH_WEBHOOK_URL")]
    NoWebhook,

    #[error("webhook rejected the message: HTTP {status}: {body}")]
    WebhookRejected { status: u16, body: String },

    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for navwatch operations
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting_is_readable() {
        let err = NavError::MissingColumn("currency");
        assert_eq!(err.to_string(), "column not found: currency");

        let err = NavError::WebhookRejected {
            status: 404,
            body: "no_team".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "webhook rejected the message: HTTP 404: no_team"
        );
    }

    #[test]
    fn test_anyhow_context_chains_errors() {
        use anyhow::Context;
        let result: Result<()> =
            Err(anyhow::Error::new(NavError::NoWebhook)).context("failed to send stale alert");
        match result {
            Err(e) => {
                assert!(e.to_string().contains("failed to send stale alert"));
                assert!(format!("{:?}", e).contains("no webhook configured"));
                assert!(matches!(
                    e.downcast_ref::<NavError>(),
                    Some(NavError::NoWebhook)
                ));
            }
            Ok(_) => panic!("expected error"),
        }
    }
}
