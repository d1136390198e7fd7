//! Binding error types.
//!
//! Only [`BindError`] ever escapes a bind call. [`ConversionError`] describes
//! a single failed source attempt and is absorbed by the binder, which moves
//! on to the next candidate source.

use crate::SourceId;
use http::StatusCode;
use thiserror::Error;

/// Result type alias using [`BindError`].
pub type BindResult<T> = Result<T, BindError>;

/// Fatal failure of a whole bind operation.
///
/// A caller either receives a fully bound model or one of these errors, never
/// a partially initialised model.
///
/// # Example
///
/// ```rust
/// use thales_core::{BindError, SourceId};
/// use http::StatusCode;
///
/// let err = BindError::body_parse(SourceId::Body, "expected value at line 1 column 1");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.error_code(), "BODY_PARSE_FAILED");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    /// A body payload was present but malformed.
    #[error("failed to parse {origin} payload: {reason}")]
    BodyParse {
        /// Source whose payload could not be parsed.
        origin: SourceId,
        /// Parser diagnostic.
        reason: String,
    },

    /// The body payload exceeded the configured size limit.
    #[error("{origin} payload too large: max {max_size} bytes, got {actual_size} bytes")]
    PayloadTooLarge {
        /// Source whose payload was rejected.
        origin: SourceId,
        /// Configured limit.
        max_size: usize,
        /// Actual payload size.
        actual_size: usize,
    },

    /// No hydration handler produced an object and the model could not be
    /// constructed by its factory or default constructor.
    #[error("cannot construct model `{model}`: {reason}")]
    ModelConstruction {
        /// Type name of the model.
        model: &'static str,
        /// Why construction failed.
        reason: String,
    },

    /// The surrounding request was cancelled while binding.
    #[error("binding of `{model}` was cancelled")]
    Cancelled {
        /// Type name of the model.
        model: &'static str,
    },
}

impl BindError {
    /// Creates a body parse error.
    #[must_use]
    pub fn body_parse(source: SourceId, reason: impl Into<String>) -> Self {
        Self::BodyParse {
            origin: source,
            reason: reason.into(),
        }
    }

    /// Creates a payload-too-large error.
    #[must_use]
    pub fn payload_too_large(source: SourceId, max_size: usize, actual_size: usize) -> Self {
        Self::PayloadTooLarge {
            origin: source,
            max_size,
            actual_size,
        }
    }

    /// Creates a model construction error.
    #[must_use]
    pub fn model_construction(model: &'static str, reason: impl Into<String>) -> Self {
        Self::ModelConstruction {
            model,
            reason: reason.into(),
        }
    }

    /// Creates a cancellation error.
    #[must_use]
    pub fn cancelled(model: &'static str) -> Self {
        Self::Cancelled { model }
    }

    /// Returns true if the error was caused by the request payload.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::BodyParse { .. } | Self::PayloadTooLarge { .. })
    }

    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BodyParse { .. } => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ModelConstruction { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Returns the error code suitable for error envelopes.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BodyParse { .. } => "BODY_PARSE_FAILED",
            Self::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            Self::ModelConstruction { .. } => "MODEL_CONSTRUCTION_FAILED",
            Self::Cancelled { .. } => "BIND_CANCELLED",
        }
    }
}

/// A raw value from one source could not be converted to a property's type.
///
/// Never fatal: the binder treats it as "no value" for that attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert {raw:?} to {target}: {reason}")]
pub struct ConversionError {
    /// The raw value (or a short description of it).
    pub raw: String,
    /// Target type name.
    pub target: &'static str,
    /// Why the conversion failed.
    pub reason: String,
}

impl ConversionError {
    /// Creates a conversion error for the target type `T`.
    #[must_use]
    pub fn new<T>(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            target: std::any::type_name::<T>(),
            reason: reason.into(),
        }
    }

    /// Creates an error for an attempt that supplied no raw values at all.
    #[must_use]
    pub fn empty<T>() -> Self {
        Self::new::<T>("", "no raw values")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_parse_error() {
        let err = BindError::body_parse(SourceId::Body, "trailing comma");

        assert!(err.is_client_error());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "BODY_PARSE_FAILED");
        assert!(err.to_string().contains("Body"));
        assert!(err.to_string().contains("trailing comma"));
    }

    #[test]
    fn test_payload_too_large_error() {
        let err = BindError::payload_too_large(SourceId::Form, 1024, 2048);

        assert!(err.is_client_error());
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(err.to_string().contains("1024"));
        assert!(err.to_string().contains("2048"));
    }

    #[test]
    fn test_model_construction_error() {
        let err = BindError::model_construction("app::Widget", "factory returned nothing");

        assert!(!err.is_client_error());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "MODEL_CONSTRUCTION_FAILED");
        assert!(err.to_string().contains("app::Widget"));
    }

    #[test]
    fn test_cancelled_error() {
        let err = BindError::cancelled("app::Widget");

        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.error_code(), "BIND_CANCELLED");
    }

    #[test]
    fn test_conversion_error() {
        let err = ConversionError::new::<i32>("x", "invalid digit found in string");

        assert_eq!(err.target, "i32");
        assert!(err.to_string().contains("\"x\""));
        assert!(err.to_string().contains("i32"));
    }
}
