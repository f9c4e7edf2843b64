use schemars::gen::SchemaGenerator;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

/// Trait for structured LLM outputs that degrade gracefully.
///
/// A type implementing this trait can always be produced from a model
/// response: if parsing fails the `Default` value is used and marked as
/// a fallback, so callers can tell "classified normally" apart from
/// "defaulted due to upstream failure".
pub trait LlmResponse: DeserializeOwned + Default + JsonSchema {
    /// Record that this value is a fallback and why
    fn mark_as_fallback(&mut self, error_message: String);

    /// Whether the value came from a successful parse
    fn is_success(&self) -> bool;

    /// JSON schema string embedded into prompts
    fn json_schema_string() -> String {
        let mut gen = SchemaGenerator::default();
        let schema = gen.root_schema_for::<Self>();
        serde_json::to_string_pretty(&schema).unwrap_or_else(|_| "{}".to_string())
    }
}
