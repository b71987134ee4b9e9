use schemars::JsonSchema;
use serde::de::DeserializeOwned;

/// Marker for types the model is forced to emit as JSON matching their own
/// schema (relevance judgements, composed briefings). Auto-implemented for
/// anything `serde`/`schemars` already derive for.
pub trait StructuredOutput: JsonSchema + DeserializeOwned {
    fn schema_name() -> String {
        Self::schema_name_static()
    }

    fn schema_name_static() -> String {
        std::any::type_name::<Self>()
            .rsplit("::")
            .next()
            .unwrap_or("Output")
            .to_string()
    }
}

impl<T: JsonSchema + DeserializeOwned> StructuredOutput for T {}

/// Strips `schemars`' `$ref`/`definitions` indirection, which Claude's and
/// OpenAI's strict JSON-schema tool modes don't resolve, into an inlined
/// object schema.
pub fn strict_schema_for<T: JsonSchema>() -> serde_json::Value {
    let mut settings = schemars::gen::SchemaSettings::draft07();
    settings.inline_subschemas = true;
    let generator = settings.into_generator();
    let schema = generator.into_root_schema_for::<T>();
    serde_json::to_value(schema.schema).unwrap_or(serde_json::json!({}))
}
