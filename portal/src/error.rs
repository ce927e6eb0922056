use reqwest::StatusCode;
use thiserror::Error;

use crate::notify::Notification;

/// Every way a portal action can fail.
#[derive(Debug, Error)]
pub enum PortalError {
    /// The request never produced a response (DNS, connect, timeout, TLS).
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered 401. The session has already been purged.
    #[error("session expired, please log in again")]
    Unauthorized,

    /// Input rejected locally, before any request was sent.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    /// The backend rejected the request or reported `success: false`.
    #[error("{message}")]
    Backend {
        status: Option<StatusCode>,
        message: String,
    },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session store error: {0}")]
    Session(String),
}

pub type Result<T> = std::result::Result<T, PortalError>;

impl PortalError {
    /// Create validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create backend error from a status and an optional envelope message
    pub fn backend(status: Option<StatusCode>, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| match status {
                Some(s) => format!("request failed with status {}", s),
                None => "request failed".to_string(),
            });
        Self::Backend { status, message }
    }

    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Text shown to the patient. Backend messages are passed through as-is,
    /// everything else falls back to the supplied default.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Backend { message, .. } => message.clone(),
            Self::Validation { message, .. } => message.clone(),
            Self::Unauthorized => self.to_string(),
            _ => fallback.to_string(),
        }
    }

    /// Convert into the dismissible error toast raised by the failing action.
    pub fn notification(&self, title: &str, fallback: &str) -> Notification {
        if self.is_validation() {
            Notification::warning(title, self.user_message(fallback))
        } else {
            Notification::error(title, self.user_message(fallback))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Level;

    #[test]
    fn test_backend_message_falls_back_to_status() {
        let err = PortalError::backend(Some(StatusCode::CONFLICT), None);
        assert_eq!(err.to_string(), "request failed with status 409 Conflict");

        let err = PortalError::backend(Some(StatusCode::CONFLICT), Some("  ".to_string()));
        assert!(err.to_string().contains("409"));
    }

    #[test]
    fn test_backend_message_is_shown_to_user() {
        let err = PortalError::backend(
            Some(StatusCode::BAD_REQUEST),
            Some("Slot no longer available".to_string()),
        );
        assert_eq!(
            err.user_message("Failed to book appointment"),
            "Slot no longer available"
        );
    }

    #[test]
    fn test_transport_like_errors_use_fallback() {
        let err = PortalError::session("disk full");
        assert_eq!(err.user_message("Failed to load"), "Failed to load");
    }

    #[test]
    fn test_validation_becomes_warning() {
        let err = PortalError::validation("reportFile", "Maximum file size is 10MB");
        let toast = err.notification("File Too Large", "upload failed");
        assert_eq!(toast.level, Level::Warning);
        assert_eq!(toast.description, "Maximum file size is 10MB");
        assert!(toast.dismissible);
    }
}
