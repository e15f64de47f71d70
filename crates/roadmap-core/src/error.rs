//! Error types for the roadmap core.
//!
//! This module defines the error hierarchy for configuration loading, the
//! generative-language transport, and study-content validation. None of these
//! errors escape the content gateway's public sentinel operations; they exist so
//! the failure reason is typed and logged before it is absorbed.

use std::path::PathBuf;

/// A specialized `Result` type for roadmap core operations.
pub type Result<T> = std::result::Result<T, PlannerError>;

/// Errors that can occur inside the roadmap core.
///
/// Variants carry actionable suggestions where possible.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your roadmap.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    /// The service credential was not provided.
    #[error("Missing API credential: environment variable '{var}' is not set\n\nSuggestion: Export {var} with your generative-language API key")]
    MissingCredential {
        /// Name of the environment variable that was consulted.
        var: String,
    },

    // ========================================================================
    // Generative Service Errors
    // ========================================================================
    /// The generative-language service returned an error.
    #[error("LLM API error ({kind}): {message}\n\nSuggestion: {suggestion}")]
    LlmApiError {
        /// The kind of API error.
        kind: LlmErrorKind,
        /// Detailed error message from the API or transport.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    /// The service answered but produced no usable text.
    #[error("LLM returned an empty response: {reason}")]
    EmptyResponse {
        /// Why the response was considered empty (no candidates, blocked prompt, ...).
        reason: String,
    },

    // ========================================================================
    // Study Content Errors
    // ========================================================================
    /// The structured reply was not valid JSON of the expected shape.
    #[error("Study content could not be parsed: {message}")]
    ContentParse {
        /// Description of the parse failure.
        message: String,
    },

    /// The structured reply parsed but violates the content contract.
    #[error("Study content failed validation: {message}")]
    ContentInvalid {
        /// Description of the violated rule.
        message: String,
    },

    // ========================================================================
    // Study Session Errors
    // ========================================================================
    /// No study session is open.
    #[error("No study session is open\n\nSuggestion: Open a session for a task first")]
    NoActiveSession,

    /// The session is not in a state that allows the operation.
    #[error("Study session conflict: {message}")]
    SessionConflict {
        /// Why the operation is not allowed right now.
        message: String,
    },

    /// The chosen option does not exist on the current quiz item.
    #[error("Option {option} is out of range (quiz has {count} options)")]
    InvalidAnswer {
        /// The chosen option index.
        option: usize,
        /// Number of options on the quiz item.
        count: usize,
    },

    // ========================================================================
    // General I/O Errors
    // ========================================================================
    /// A file exists but could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Categories of LLM API errors for structured error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Authentication failure (invalid API key, expired credentials).
    Authentication,
    /// Rate limit exceeded.
    RateLimit,
    /// Server error (5xx responses).
    Server,
    /// Network connectivity issues.
    Network,
    /// Other unclassified errors.
    Other,
}

impl std::fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authentication => write!(f, "authentication"),
            Self::RateLimit => write!(f, "rate_limit"),
            Self::Server => write!(f, "server"),
            Self::Network => write!(f, "network"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl LlmErrorKind {
    /// Classifies an HTTP status code returned by the service.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            429 => Self::RateLimit,
            500..=599 => Self::Server,
            _ => Self::Other,
        }
    }

    /// Returns a suggestion message for this error kind.
    #[must_use]
    pub const fn suggestion(&self) -> &'static str {
        match self {
            Self::Authentication => "Check your API key or credentials",
            Self::RateLimit => "Wait a moment before asking again",
            Self::Server => "Try again later; the generative service may be experiencing issues",
            Self::Network => "Check your network connection",
            Self::Other => "Check the generative service's status page",
        }
    }
}

impl PlannerError {
    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `MissingCredential` error.
    #[must_use]
    pub fn missing_credential(var: impl Into<String>) -> Self {
        Self::MissingCredential { var: var.into() }
    }

    /// Creates a new `LlmApiError` with automatic suggestion based on error kind.
    #[must_use]
    pub fn llm_api_error(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        let suggestion = kind.suggestion().to_string();
        Self::LlmApiError {
            kind,
            message: message.into(),
            suggestion,
        }
    }

    /// Creates a new `EmptyResponse` error.
    #[must_use]
    pub fn empty_response(reason: impl Into<String>) -> Self {
        Self::EmptyResponse {
            reason: reason.into(),
        }
    }

    /// Creates a new `ContentParse` error.
    #[must_use]
    pub fn content_parse(message: impl Into<String>) -> Self {
        Self::ContentParse {
            message: message.into(),
        }
    }

    /// Creates a new `ContentInvalid` error.
    #[must_use]
    pub fn content_invalid(message: impl Into<String>) -> Self {
        Self::ContentInvalid {
            message: message.into(),
        }
    }

    /// Creates a new `SessionConflict` error.
    #[must_use]
    pub fn session_conflict(message: impl Into<String>) -> Self {
        Self::SessionConflict {
            message: message.into(),
        }
    }

    /// Returns `true` if this error is transient, i.e. asking again later may succeed.
    ///
    /// Nothing in the core retries; the flag only decides how loudly a failure is logged.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::LlmApiError {
                kind: LlmErrorKind::RateLimit | LlmErrorKind::Server | LlmErrorKind::Network,
                ..
            }
        )
    }

    /// Returns `true` if this error comes from a malformed model reply.
    #[must_use]
    pub const fn is_content_error(&self) -> bool {
        matches!(
            self,
            Self::ContentParse { .. } | Self::ContentInvalid { .. } | Self::EmptyResponse { .. }
        )
    }
}
