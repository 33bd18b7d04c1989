//! Error types for the caching engine.
//!
//! Tier-level failures (an unreachable Redis, a bad blob file) are caught and
//! logged at the tier boundary and never reach callers; the variants here
//! surface only at construction time or at the typed serialization boundary.

use std::fmt;

/// Type alias for a cache result.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur in the caching engine.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// A selected tier lacks required parameters or a parameter is invalid.
    ///
    /// Raised at construction time so a misconfigured cache fails fast
    /// instead of silently no-opping on first use.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// A value could not be serialized or deserialized for storage.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// A remote or file tier could not be reached.
    ///
    /// Always non-fatal during normal operation: reads degrade to a miss and
    /// writes to a no-op for that tier only.
    #[error("Tier '{tier}' unavailable: {message}")]
    TierUnavailable {
        /// Name of the affected tier.
        tier: String,
        /// Description of the failure.
        message: String,
    },

    /// An internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl CacheError {
    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `Serialization` error.
    #[must_use]
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a new `TierUnavailable` error.
    #[must_use]
    pub fn tier_unavailable(tier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TierUnavailable {
            tier: tier.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a configuration error.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns `true` if this is a serialization error.
    #[must_use]
    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Serialization { .. } => ErrorCategory::Serialization,
            Self::TierUnavailable { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Categories of cache errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid or incomplete configuration.
    Configuration,
    /// Value serialization/deserialization failure.
    Serialization,
    /// Infrastructure/connection error.
    Infrastructure,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Serialization => write!(f, "serialization"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
