//! TruthLens Domain Layer
//!
//! Value types shared by every other crate. It has no dependencies beyond
//! `uuid` and holds no I/O.
//!
//! ## Key Concepts
//!
//! - **AnalysisRequest**: article text, capped in length, immutable
//! - **AnalysisResult**: a validated assessment; cannot be built out of domain
//! - **Bias / EmotionalTone**: closed sets, so consumers match exhaustively
//! - **ErrorCategory**: the four ways a call can fail

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod category;
pub mod request;

// Re-exports for convenience
pub use analysis::{AnalysisResult, Bias, EmotionalTone, MAX_FACTUAL_ACCURACY, MIN_FACTUAL_ACCURACY};
pub use category::ErrorCategory;
pub use request::{AnalysisRequest, RequestError, RequestId, MAX_INPUT_CHARS};
