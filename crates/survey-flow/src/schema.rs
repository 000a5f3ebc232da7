use schemars::schema_for;
use serde_json::Value;

use crate::respondent::RespondentMetadata;
use crate::spec::{Question, SurveyConfig};

/// JSON Schema of the authored catalog document.
pub fn catalog_schema() -> Value {
    serde_json::to_value(schema_for!(Vec<Question>)).unwrap_or(Value::Null)
}

/// JSON Schema of the routing/piping configuration document.
pub fn config_schema() -> Value {
    serde_json::to_value(schema_for!(SurveyConfig)).unwrap_or(Value::Null)
}

/// JSON Schema of the respondent metadata document.
pub fn respondent_schema() -> Value {
    serde_json::to_value(schema_for!(RespondentMetadata)).unwrap_or(Value::Null)
}
