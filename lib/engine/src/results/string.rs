use crate::results::FieldInfo;
use serde_json::Value;
use std::collections::BTreeSet;

/// The values found for a scalar field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringResult {
    info: FieldInfo,
    values: BTreeSet<String>,
    errors: Vec<String>,
}

impl StringResult {
    pub fn new(info: FieldInfo) -> Self {
        Self {
            info,
            values: BTreeSet::new(),
            errors: Vec::new(),
        }
    }

    pub fn info(&self) -> &FieldInfo {
        &self.info
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn add(&mut self, value: impl Into<String>) {
        self.values.insert(value.into());
    }

    /// The values in ascending lexical order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    /// Unions the values of `other` into this result.
    pub fn merge(&mut self, other: StringResult) {
        if other.info.name != self.info.name {
            let message = format!(
                "Cannot merge the values of '{}' into the values of '{}'",
                other.info.name, self.info.name
            );
            tracing::warn!("{message}");
            self.errors.push(message);
            return;
        }
        self.errors.extend(other.errors);
        self.values.extend(other.values);
    }

    pub(crate) fn push_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub(crate) fn render(&self, diagnostics: &mut Vec<String>) -> Value {
        diagnostics.extend(self.errors.iter().cloned());
        let items = self
            .info
            .paginate(self.values.iter().collect())
            .into_iter()
            .map(|value| Value::String(value.clone()))
            .collect();
        self.info.render_cardinality(items, diagnostics)
    }
}
