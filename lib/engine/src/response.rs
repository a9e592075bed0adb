use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// The response to a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// The rendered result, one key per requested root field.
    pub data: Value,
    /// Failed execution units and schema violations found while rendering.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Requested root fields that were skipped.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// Maps the output keys to IRIs.
    #[serde(rename = "@context")]
    pub context: BTreeMap<String, String>,
}
