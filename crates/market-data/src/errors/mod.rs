//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all vendor operations
//! - [`RetryClass`]: Classification for determining retry behavior

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while talking to an options data vendor.
///
/// Absence of data is *not* modelled here for the happy paths: an empty
/// chain after normalization is a valid outcome. These variants describe
/// collaborator failures that callers must be able to tell apart from
/// "no data".
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The vendor does not know the symbol.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The vendor returned no chain for an expiration it advertised.
    #[error("No option chain for {symbol} expiring {expiration}")]
    NoChainForExpiration {
        /// Underlying symbol
        symbol: String,
        /// Requested expiration (YYYY-MM-DD)
        expiration: String,
    },

    /// An expiration string could not be parsed as a calendar date.
    #[error("Invalid expiration date: {0}")]
    InvalidExpiration(String),

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A provider-specific error occurred (HTTP status, unparseable body).
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// A whole response failed validation (e.g. no usable underlying price).
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// The provider does not implement the requested operation.
    #[error("{provider} does not support '{operation}'")]
    NotSupported {
        /// Operation name
        operation: String,
        /// The provider asked
        provider: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use optionwatch_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { provider: "TRADIER".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::SymbolNotFound("INVALID".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::SymbolNotFound(_)
            | Self::InvalidExpiration(_)
            | Self::ValidationFailed { .. } => RetryClass::Never,

            Self::RateLimited { .. } | Self::Timeout { .. } | Self::Network(_) => {
                RetryClass::WithBackoff
            }

            Self::ProviderError { .. }
            | Self::NoChainForExpiration { .. }
            | Self::NotSupported { .. } => RetryClass::NextProvider,
        }
    }

    pub(crate) fn provider(provider: &str, message: impl Into<String>) -> Self {
        Self::ProviderError {
            provider: provider.to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_not_found_never_retries() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_invalid_expiration_never_retries() {
        let error = MarketDataError::InvalidExpiration("2024-13-40".to_string());
        assert_eq!(error.retry_class(), RetryClass::Never);
    }

    #[test]
    fn test_rate_limited_retries_with_backoff() {
        let error = MarketDataError::RateLimited {
            provider: "TRADIER".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_timeout_retries_with_backoff() {
        let error = MarketDataError::Timeout {
            provider: "YAHOO".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    }

    #[test]
    fn test_missing_chain_tries_next_provider() {
        let error = MarketDataError::NoChainForExpiration {
            symbol: "TSLA".to_string(),
            expiration: "2024-03-15".to_string(),
        };
        assert_eq!(error.retry_class(), RetryClass::NextProvider);
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::SymbolNotFound("INVALID".to_string());
        assert_eq!(format!("{}", error), "Symbol not found: INVALID");

        let error = MarketDataError::provider("TRADIER", "HTTP error: 500");
        assert_eq!(
            format!("{}", error),
            "Provider error: TRADIER - HTTP error: 500"
        );

        let error = MarketDataError::NoChainForExpiration {
            symbol: "QQQ".to_string(),
            expiration: "2024-06-21".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "No option chain for QQQ expiring 2024-06-21"
        );
    }
}
