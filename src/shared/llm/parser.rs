use lazy_static::lazy_static;
use regex::Regex;

use super::LlmResponse;

lazy_static! {
    /// Trailing commas before } or ] (a common model mistake)
    static ref TRAILING_COMMA_RE: Regex = Regex::new(r",(\s*[}\]])").unwrap();
}

/// Pull the JSON object out of a raw model response.
///
/// Models wrap output in fenced code blocks or surround it with prose
/// despite instructions not to; tolerate all of it. Tried in order:
/// fenced ```json block, generic fenced block, bare object, first `{`
/// to last `}`.
pub fn extract_json_string(text: &str) -> Result<String, String> {
    if text.contains("```json") {
        return text
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim().to_string())
            .ok_or_else(|| "unterminated ```json block".to_string());
    }

    if let Some(start) = text.find("```") {
        let block_start = start + 3;
        // Skip an optional language tag on the fence line
        if let Some(newline) = text[block_start..].find('\n') {
            let json_start = block_start + newline + 1;
            if let Some(end) = text[json_start..].find("```") {
                return Ok(text[json_start..json_start + end].trim().to_string());
            }
        }
    }

    let trimmed = text.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed.to_string());
    }

    let start = text
        .find('{')
        .ok_or_else(|| "no JSON object in response".to_string())?;
    let end = text
        .rfind('}')
        .ok_or_else(|| "incomplete JSON object in response".to_string())?;

    if start < end {
        Ok(text[start..=end].to_string())
    } else {
        Err("invalid JSON boundaries in response".to_string())
    }
}

fn try_parse<T>(text: &str) -> Result<T, String>
where
    T: LlmResponse,
{
    let json_str = extract_json_string(text)?;

    // Fast path: the response was valid as-is
    if let Ok(parsed) = serde_json::from_str::<T>(&json_str) {
        return Ok(parsed);
    }

    // Cheap mechanical fix, then retry
    let fixed = TRAILING_COMMA_RE.replace_all(&json_str, "$1").to_string();
    if let Ok(parsed) = serde_json::from_str::<T>(&fixed) {
        tracing::debug!("LLM JSON parsed after trailing-comma fix");
        return Ok(parsed);
    }

    // Full structural repair as the last resort
    let options = llm_json::RepairOptions::default();
    if let Ok(repaired) = llm_json::repair_json(&json_str, &options) {
        if let Ok(parsed) = serde_json::from_str::<T>(&repaired) {
            tracing::debug!("LLM JSON parsed after llm_json repair");
            return Ok(parsed);
        }
    }

    Err(format!(
        "unparseable LLM response: {}",
        json_str.chars().take(200).collect::<String>()
    ))
}

/// Parse a model response into `T`, falling back to a marked default
/// when every strategy fails. This function never errors: the classifier
/// sits upstream of ticket creation in a live phone call, and an intake
/// that throws is worse than one that defaults.
pub fn parse_with_fallback<T>(text: &str) -> T
where
    T: LlmResponse,
{
    match try_parse::<T>(text) {
        Ok(parsed) => parsed,
        Err(error_msg) => {
            tracing::warn!("LLM response parsing failed, using fallback: {}", error_msg);
            let mut fallback = T::default();
            fallback.mark_as_fallback(error_msg);
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemars::JsonSchema;
    use serde::Deserialize;

    fn default_true() -> bool {
        true
    }

    #[derive(Debug, Default, Deserialize, JsonSchema)]
    struct Sample {
        label: String,
        note: Option<String>,

        #[serde(default = "default_true")]
        #[schemars(skip)]
        parsed_ok: bool,

        #[schemars(skip)]
        parse_error: Option<String>,
    }

    impl LlmResponse for Sample {
        fn mark_as_fallback(&mut self, error_message: String) {
            self.parsed_ok = false;
            self.parse_error = Some(error_message);
        }

        fn is_success(&self) -> bool {
            self.parsed_ok
        }
    }

    #[test]
    fn extracts_from_json_fence() {
        let raw = "Sure, here you go:\n```json\n{\"label\": \"a\"}\n```\nDone.";
        assert_eq!(extract_json_string(raw).unwrap(), "{\"label\": \"a\"}");
    }

    #[test]
    fn extracts_from_generic_fence() {
        let raw = "```\n{\"label\": \"a\"}\n```";
        assert_eq!(extract_json_string(raw).unwrap(), "{\"label\": \"a\"}");
    }

    #[test]
    fn extracts_embedded_object() {
        let raw = "prefix {\"label\": \"a\"} suffix";
        assert_eq!(extract_json_string(raw).unwrap(), "{\"label\": \"a\"}");
    }

    #[test]
    fn no_object_is_an_error() {
        assert!(extract_json_string("nothing here").is_err());
    }

    #[test]
    fn trailing_comma_is_repaired() {
        let result: Sample = parse_with_fallback("{\"label\": \"x\", \"note\": \"y\",}");
        assert!(result.is_success());
        assert_eq!(result.label, "x");
        assert_eq!(result.note.as_deref(), Some("y"));
    }

    #[test]
    fn garbage_becomes_marked_fallback() {
        let result: Sample = parse_with_fallback("the model refused to answer");
        assert!(!result.is_success());
        assert!(result.parse_error.is_some());
        assert!(result.label.is_empty());
    }

    #[test]
    fn schema_excludes_internal_fields() {
        let schema = Sample::json_schema_string();
        assert!(schema.contains("label"));
        assert!(!schema.contains("parsed_ok"));
        assert!(!schema.contains("parse_error"));
    }
}
