//! TruthLens Analyzer
//!
//! Turns article text into a validated bias/accuracy assessment using a
//! completion API.
//!
//! # Architecture
//!
//! ```text
//! Text → PromptBuilder → CompletionProvider → normalize_response → validate_analysis → AnalysisResult
//! ```
//!
//! Failures are classified, never retried here and never swallowed:
//! configuration, upstream, or response contract (see [`AnalysisError`]).
//!
//! # Example Usage
//!
//! ```
//! use truthlens_analyzer::{Analyzer, AnalyzerConfig};
//! use truthlens_domain::Bias;
//! use truthlens_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::new(
//!     r#"{"factual_accuracy": 80, "bias": "left", "emotional_tone": "neutral", "recommendation": "Fine."}"#,
//! );
//! let analyzer = Analyzer::new(llm, AnalyzerConfig::default());
//!
//! let request = analyzer.request("City council approves new budget.")?;
//! let result = analyzer.analyze(&request).await?;
//!
//! assert_eq!(result.bias(), Bias::Left);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod analyzer;
mod config;
mod error;
mod normalize;
mod prompt;
mod schema;


pub use analyzer::Analyzer;
pub use config::{AnalyzerConfig, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
pub use error::{AnalysisError, SchemaError};
pub use normalize::normalize_response;
pub use prompt::PromptBuilder;
pub use schema::{validate_analysis, REQUIRED_FIELDS};
