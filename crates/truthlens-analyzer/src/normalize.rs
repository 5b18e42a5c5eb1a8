//! Strip incidental formatting from completion text
//!
//! Models sometimes wrap JSON in a markdown code fence even when told not
//! to. This removes the fence and nothing else: trailing commentary, several
//! objects or truncated JSON are left for the validator to reject.

const FENCE: &str = "```";

/// Remove a wrapping triple-backtick fence, with optional language tag
///
/// Whitespace is trimmed before and after. Nested fence layers are peeled
/// until none remain, which keeps the function idempotent.
///
/// # Examples
///
/// ```
/// use truthlens_analyzer::normalize_response;
///
/// assert_eq!(normalize_response("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(normalize_response("  {\"a\": 1}  "), "{\"a\": 1}");
/// ```
pub fn normalize_response(raw: &str) -> &str {
    let mut text = raw.trim();
    loop {
        let stripped = strip_fence_once(text);
        if stripped.len() == text.len() {
            return text;
        }
        text = stripped;
    }
}

fn strip_fence_once(text: &str) -> &str {
    let mut text = text.trim();

    if let Some(rest) = text.strip_prefix(FENCE) {
        text = strip_language_tag(rest);
    }
    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }

    text.trim()
}

/// Drop a language hint such as `json` sitting right after the opening fence
fn strip_language_tag(text: &str) -> &str {
    if !text.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return text;
    }

    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.')))
        .unwrap_or(text.len());
    &text[end..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BODY: &str = r#"{"factual_accuracy": 72, "bias": "neutral"}"#;

    #[test]
    fn test_plain_json_is_untouched() {
        assert_eq!(normalize_response(BODY), BODY);
    }

    #[test]
    fn test_fence_with_language_tag() {
        let raw = format!("```json\n{}\n```", BODY);
        assert_eq!(normalize_response(&raw), BODY);
    }

    #[test]
    fn test_fence_without_language_tag() {
        let raw = format!("```\n{}\n```", BODY);
        assert_eq!(normalize_response(&raw), BODY);
    }

    #[test]
    fn test_other_language_tags() {
        assert_eq!(normalize_response("```JSON\n{}\n```"), "{}");
        assert_eq!(normalize_response("```json5\n{}\n```"), "{}");
    }

    #[test]
    fn test_fence_on_same_line() {
        assert_eq!(normalize_response("```json{}```"), "{}");
        assert_eq!(normalize_response("```{}```"), "{}");
    }

    #[test]
    fn test_surrounding_whitespace_is_trimmed() {
        let raw = format!("\n\n   ```json\n  {}  \n```   \n", BODY);
        assert_eq!(normalize_response(&raw), BODY);
    }

    #[test]
    fn test_only_opening_fence() {
        let raw = format!("```json\n{}", BODY);
        assert_eq!(normalize_response(&raw), BODY);
    }

    #[test]
    fn test_trailing_commentary_is_not_repaired() {
        let raw = format!("```json\n{}\n```\nHope this helps!", BODY);
        let normalized = normalize_response(&raw);
        assert!(normalized.ends_with("Hope this helps!"));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(normalize_response(""), "");
        assert_eq!(normalize_response("```"), "");
        assert_eq!(normalize_response("``````"), "");
        assert_eq!(normalize_response("````"), "`");
    }

    #[test]
    fn test_nested_fences_are_peeled() {
        let raw = format!("```\n```json\n{}\n```\n```", BODY);
        assert_eq!(normalize_response(&raw), BODY);
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(raw in ".{0,64}") {
            let once = normalize_response(&raw);
            prop_assert_eq!(normalize_response(once), once);
        }

        #[test]
        fn prop_fenced_inputs_are_idempotent(
            tag in "(json|JSON)?",
            body in "[ -~\n]{0,48}",
            pad in "[ \n\t]{0,3}",
        ) {
            let raw = format!("{pad}```{tag}\n{body}\n```{pad}");
            let once = normalize_response(&raw);
            prop_assert_eq!(normalize_response(once), once);
        }

        #[test]
        fn prop_fence_yields_inner_text(body in "\\{[a-z0-9 :\",]{0,40}\\}") {
            let raw = format!("```json\n{}\n```", body);
            prop_assert_eq!(normalize_response(&raw), body.as_str());
        }
    }
}
