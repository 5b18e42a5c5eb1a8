//! Validate normalized completion text against the analysis schema

use crate::error::SchemaError;
use serde_json::{Map, Value};
use truthlens_domain::{
    AnalysisResult, Bias, EmotionalTone, MAX_FACTUAL_ACCURACY, MIN_FACTUAL_ACCURACY,
};

/// Keys every analysis object must carry, in reporting order
pub const REQUIRED_FIELDS: [&str; 4] = ["factual_accuracy", "bias", "emotional_tone", "recommendation"];

/// Parse and check a normalized completion
///
/// Rules run in a fixed order and the first failure wins: presence of all
/// keys, then `factual_accuracy`, `bias`, `emotional_tone` and finally the
/// type of `recommendation`. Unknown extra keys are ignored.
pub fn validate_analysis(normalized: &str) -> Result<AnalysisResult, SchemaError> {
    let json: Value = serde_json::from_str(normalized)?;

    let obj = json
        .as_object()
        .ok_or_else(|| SchemaError::Malformed(format!("expected a JSON object, found {}", kind(&json))))?;

    check_required(obj)?;

    let factual_accuracy = factual_accuracy(&obj["factual_accuracy"])?;

    let bias = obj["bias"]
        .as_str()
        .and_then(Bias::parse)
        .ok_or_else(|| SchemaError::OutOfDomain {
            field: "bias",
            expected: one_of(Bias::ALL.iter().map(Bias::as_str)),
            found: obj["bias"].to_string(),
        })?;

    let emotional_tone = obj["emotional_tone"]
        .as_str()
        .and_then(EmotionalTone::parse)
        .ok_or_else(|| SchemaError::OutOfDomain {
            field: "emotional_tone",
            expected: one_of(EmotionalTone::ALL.iter().map(EmotionalTone::as_str)),
            found: obj["emotional_tone"].to_string(),
        })?;

    let recommendation = obj["recommendation"]
        .as_str()
        .ok_or_else(|| SchemaError::OutOfDomain {
            field: "recommendation",
            expected: "a string".to_string(),
            found: obj["recommendation"].to_string(),
        })?;

    AnalysisResult::new(factual_accuracy, bias, emotional_tone, recommendation).map_err(|e| {
        SchemaError::OutOfDomain {
            field: "factual_accuracy",
            expected: e,
            found: factual_accuracy.to_string(),
        }
    })
}

fn check_required(obj: &Map<String, Value>) -> Result<(), SchemaError> {
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !obj.contains_key(**field))
        .map(|field| field.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::MissingFields(missing))
    }
}

/// Accept integral JSON numbers in range, including forms like `72.0`
fn factual_accuracy(value: &Value) -> Result<u8, SchemaError> {
    let out_of_domain = || SchemaError::OutOfDomain {
        field: "factual_accuracy",
        expected: format!(
            "a whole number between {} and {}",
            MIN_FACTUAL_ACCURACY, MAX_FACTUAL_ACCURACY
        ),
        found: value.to_string(),
    };

    let number = value.as_f64().ok_or_else(out_of_domain)?;
    if number.fract() != 0.0
        || number < f64::from(MIN_FACTUAL_ACCURACY)
        || number > f64::from(MAX_FACTUAL_ACCURACY)
    {
        return Err(out_of_domain());
    }

    Ok(number as u8)
}

fn one_of<'a>(values: impl Iterator<Item = &'a str>) -> String {
    format!("one of: {}", values.collect::<Vec<_>>().join(", "))
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
