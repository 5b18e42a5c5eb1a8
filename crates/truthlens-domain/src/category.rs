//! Failure categories shared by every layer

use std::fmt;

/// Classification of a failed analysis call
///
/// Carried on every error response so callers can tell transient failures
/// from ones that will repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Required credential or setting missing
    Configuration,

    /// Client exceeded its request allowance
    RateLimit,

    /// The completion call itself failed
    Upstream,

    /// The completion call succeeded but its payload broke the schema
    ResponseContract,
}

impl ErrorCategory {
    /// Get the wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "configuration-error",
            ErrorCategory::RateLimit => "rate-limit-error",
            ErrorCategory::Upstream => "upstream-failure",
            ErrorCategory::ResponseContract => "response-contract-failure",
        }
    }

    /// Whether the same request may succeed if tried again unchanged
    ///
    /// Rate-limit rejections clear on their own too, but only after the
    /// window rolls over; callers read `Retry-After` for those.
    pub fn is_retriable(&self) -> bool {
        matches!(self, ErrorCategory::Upstream)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_upstream_is_retriable() {
        assert!(ErrorCategory::Upstream.is_retriable());
        assert!(!ErrorCategory::ResponseContract.is_retriable());
        assert!(!ErrorCategory::Configuration.is_retriable());
        assert!(!ErrorCategory::RateLimit.is_retriable());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(ErrorCategory::ResponseContract.to_string(), "response-contract-failure");
        assert_eq!(ErrorCategory::RateLimit.as_str(), "rate-limit-error");
    }
}
