use crate::results::object::ObjectResult;
use crate::results::{FieldInfo, FieldResult};
use serde_json::{Map, Value};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// The root of a response: one result per requested root field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRootResult {
    info: FieldInfo,
    fields: BTreeMap<String, FieldResult>,
    errors: Vec<String>,
}

impl Default for QueryRootResult {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryRootResult {
    pub fn new() -> Self {
        Self {
            info: FieldInfo::query_root(),
            fields: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn info(&self) -> &FieldInfo {
        &self.info
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// The result of the root field with node id `node_id`.
    pub fn get(&self, node_id: &str) -> Option<&FieldResult> {
        self.fields.get(node_id)
    }

    /// Merges the result of a root field, or all root fields of another root.
    pub fn merge(&mut self, other: FieldResult) {
        match other {
            FieldResult::Root(other) => {
                self.errors.extend(other.errors);
                for field in other.fields.into_values() {
                    self.merge(field);
                }
            }
            field => match self.fields.entry(field.info().node_id.clone()) {
                Entry::Occupied(mut entry) => entry.get_mut().merge(field),
                Entry::Vacant(entry) => {
                    entry.insert(field);
                }
            },
        }
    }

    pub(crate) fn graft(&mut self, fragment: &ObjectResult) {
        for field in self.fields.values_mut() {
            field.graft(fragment);
        }
    }

    pub(crate) fn push_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub(crate) fn render(&self, diagnostics: &mut Vec<String>) -> Value {
        diagnostics.extend(self.errors.iter().cloned());
        let data: Map<String, Value> = self
            .fields
            .values()
            .map(|field| {
                (
                    field.info().output_name().to_owned(),
                    field.render(diagnostics),
                )
            })
            .collect();
        Value::Object(data)
    }
}
