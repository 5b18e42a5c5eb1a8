//! Request module - the article submitted for analysis

use std::fmt;

/// Default cap on article length, in characters
///
/// Bounds prompt cost and upstream latency.
pub const MAX_INPUT_CHARS: usize = 5000;

/// Correlation identifier for a single analysis call, based on UUIDv7
///
/// Only lives as long as the call; it exists so log lines and the response
/// header can be tied together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u128);

impl RequestId {
    /// Generate a new UUIDv7-based RequestId
    ///
    /// # Examples
    ///
    /// ```
    /// use truthlens_domain::RequestId;
    ///
    /// let a = RequestId::new();
    /// let b = RequestId::new();
    /// assert_ne!(a, b);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Rejection raised while constructing an [`AnalysisRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// Text exceeds the character cap
    TooLong {
        /// Character count of the submitted text
        actual: usize,
        /// Cap in force
        max: usize,
    },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::TooLong { actual, max } => write!(
                f,
                "input_text too long: {} characters (max: {})",
                actual, max
            ),
        }
    }
}

impl std::error::Error for RequestError {}

/// Article text submitted for analysis
///
/// Immutable once built. Length is counted in Unicode scalar values, not
/// bytes, so non-ASCII articles get the same allowance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    input_text: String,
}

impl AnalysisRequest {
    /// Create a request capped at [`MAX_INPUT_CHARS`]
    ///
    /// # Examples
    ///
    /// ```
    /// use truthlens_domain::AnalysisRequest;
    ///
    /// let request = AnalysisRequest::new("Sample article.").unwrap();
    /// assert_eq!(request.input_text(), "Sample article.");
    /// assert!(AnalysisRequest::new("x".repeat(5001)).is_err());
    /// ```
    pub fn new(input_text: impl Into<String>) -> Result<Self, RequestError> {
        Self::with_max_chars(input_text, MAX_INPUT_CHARS)
    }

    /// Create a request with a custom character cap
    pub fn with_max_chars(
        input_text: impl Into<String>,
        max_chars: usize,
    ) -> Result<Self, RequestError> {
        let input_text = input_text.into();
        let actual = input_text.chars().count();
        if actual > max_chars {
            return Err(RequestError::TooLong {
                actual,
                max: max_chars,
            });
        }

        Ok(Self { input_text })
    }

    /// The article text
    pub fn input_text(&self) -> &str {
        &self.input_text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_at_cap_is_accepted() {
        let text = "a".repeat(MAX_INPUT_CHARS);
        assert!(AnalysisRequest::new(text).is_ok());
    }

    #[test]
    fn test_request_over_cap_is_rejected() {
        let err = AnalysisRequest::new("a".repeat(MAX_INPUT_CHARS + 1)).unwrap_err();
        assert_eq!(
            err,
            RequestError::TooLong {
                actual: MAX_INPUT_CHARS + 1,
                max: MAX_INPUT_CHARS
            }
        );
        assert!(err.to_string().contains("5001"));
    }

    #[test]
    fn test_cap_counts_characters_not_bytes() {
        // 'é' is two bytes in UTF-8
        let text = "é".repeat(10);
        assert_eq!(text.len(), 20);
        assert!(AnalysisRequest::with_max_chars(text, 10).is_ok());
    }

    #[test]
    fn test_empty_text_is_allowed() {
        assert!(AnalysisRequest::new("").is_ok());
    }

    #[test]
    fn test_request_id_display_is_uuid() {
        let id = RequestId::new();
        let text = id.to_string();
        assert_eq!(text.len(), 36);
        assert_eq!(uuid::Uuid::parse_str(&text).unwrap().as_u128(), id.value());
    }
}
