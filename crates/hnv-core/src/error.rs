// ── Core error types ──
//
// Domain errors from hnv-core. Callers never see HTTP status codes or
// JSON parse failures directly; the `From<hnv_api::Error>` impl
// translates transport-layer errors into domain-appropriate variants.

use std::time::Duration;

use thiserror::Error;

use crate::resource::ResourceKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Model errors (local, never retried) ─────────────────────────
    #[error("Validation failed: {kind} requires `{field}`")]
    Validation { kind: ResourceKind, field: String },

    #[error("Invalid value for `{field}`: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("Field `{field}` is static and already set")]
    StaticField { field: String },

    #[error("Field `{field}` cannot be changed on a finalized model")]
    Finalized { field: String },

    #[error("{kind} has no field named `{field}`")]
    UnknownField { kind: ResourceKind, field: String },

    #[error("Operation not supported: {operation} on {kind}")]
    Unsupported {
        operation: &'static str,
        kind: ResourceKind,
    },

    // ── Controller errors ────────────────────────────────────────────
    #[error("Service error: {message}")]
    Service { message: String },

    #[error("Resource not found: {endpoint}")]
    NotFound { endpoint: String },

    #[error("Operation timed out after {}s", .elapsed.as_secs_f64())]
    Timeout { elapsed: Duration },

    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Returns `true` for the delete-completion signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for local model errors raised before any request.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::InvalidField { .. }
                | Self::StaticField { .. }
                | Self::Finalized { .. }
                | Self::UnknownField { .. }
        )
    }

    pub(crate) fn service(message: impl Into<String>) -> Self {
        Self::Service {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<hnv_api::Error> for CoreError {
    fn from(err: hnv_api::Error) -> Self {
        match err {
            hnv_api::Error::NotFound { endpoint } => CoreError::NotFound { endpoint },
            hnv_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            hnv_api::Error::Transport(ref e) => {
                let status = err.status();
                if status == Some(404) {
                    CoreError::NotFound {
                        endpoint: e.url().map(|u| u.path().to_string()).unwrap_or_default(),
                    }
                } else if e.is_connect() || e.is_timeout() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status,
                    }
                }
            }
            hnv_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            hnv_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            hnv_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            hnv_api::Error::Deserialization { message, body: _ } => CoreError::Service {
                message: format!("malformed controller response: {message}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_survives_translation() {
        let err: CoreError = hnv_api::Error::NotFound {
            endpoint: "/networking/v1/virtualNetworks/vn1".into(),
        }
        .into();
        assert!(err.is_not_found());
    }

    #[test]
    fn malformed_body_is_a_service_error() {
        let err: CoreError = hnv_api::Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        }
        .into();
        assert!(matches!(err, CoreError::Service { .. }));
    }

    #[test]
    fn validation_classification() {
        let err = CoreError::StaticField {
            field: "is_primary".into(),
        };
        assert!(err.is_validation());
        assert!(!CoreError::service("boom").is_validation());
    }

    #[test]
    fn timeout_message_reports_seconds() {
        let err = CoreError::Timeout {
            elapsed: Duration::from_secs(30),
        };
        assert_eq!(err.to_string(), "Operation timed out after 30s");
    }
}
