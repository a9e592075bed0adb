use crate::results::{FieldInfo, FieldResult};
use serde_json::{Map, Value};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// The sub-results of one entity, keyed by the node id of the sub-field.
pub type Subfields = BTreeMap<String, FieldResult>;

/// The entities found for an object-typed field.
///
/// Entities are keyed by their IRI. For fields of the literal placeholder type, the key is the
/// lexical form of the literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectResult {
    info: FieldInfo,
    entities: BTreeMap<String, Subfields>,
    errors: Vec<String>,
}

impl ObjectResult {
    pub fn new(info: FieldInfo) -> Self {
        Self {
            info,
            entities: BTreeMap::new(),
            errors: Vec::new(),
        }
    }

    pub fn info(&self) -> &FieldInfo {
        &self.info
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Adds an entity without sub-results. Adding an existing entity has no effect.
    pub fn add_object(&mut self, id: impl Into<String>) {
        self.entities.entry(id.into()).or_default();
    }

    /// Adds an entity and merges `subfields` into the sub-results it already has.
    pub fn add_object_with(&mut self, id: impl Into<String>, subfields: Subfields) {
        let existing = self.entities.entry(id.into()).or_default();
        merge_subfields(existing, subfields);
    }

    /// The sub-results of the entity `id`.
    pub fn get(&self, id: &str) -> Option<&Subfields> {
        self.entities.get(id)
    }

    /// Iterates over the entities in ascending order of their key.
    pub fn entities(&self) -> impl Iterator<Item = (&str, &Subfields)> {
        self.entities.iter().map(|(id, fields)| (id.as_str(), fields))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Unions the entities of `other` into this result.
    pub fn merge(&mut self, other: ObjectResult) {
        if other.info.name != self.info.name {
            let message = format!(
                "Cannot merge the results of '{}' into the results of '{}'",
                other.info.name, self.info.name
            );
            tracing::warn!("{message}");
            self.errors.push(message);
            return;
        }
        self.errors.extend(other.errors);
        for (id, subfields) in other.entities {
            self.add_object_with(id, subfields);
        }
    }

    /// See [`FieldResult::graft`].
    pub fn graft(&mut self, fragment: &ObjectResult) {
        if self.info.node_id == fragment.info.node_id {
            for (id, subfields) in &fragment.entities {
                if let Some(existing) = self.entities.get_mut(id) {
                    merge_subfields(existing, subfields.clone());
                }
            }
            self.errors.extend(fragment.errors.iter().cloned());
            return;
        }
        for subfields in self.entities.values_mut() {
            for result in subfields.values_mut() {
                result.graft(fragment);
            }
        }
    }

    pub(crate) fn push_error(&mut self, error: String) {
        self.errors.push(error);
    }

    pub(crate) fn render(&self, diagnostics: &mut Vec<String>) -> Value {
        diagnostics.extend(self.errors.iter().cloned());
        let entities = self.info.paginate(self.entities.values().collect());
        let items = entities
            .into_iter()
            .map(|subfields| {
                let object: Map<String, Value> = subfields
                    .values()
                    .map(|result| {
                        (
                            result.info().output_name().to_owned(),
                            result.render(diagnostics),
                        )
                    })
                    .collect();
                Value::Object(object)
            })
            .collect();
        self.info.render_cardinality(items, diagnostics)
    }
}

/// Merges sub-results field by field.
pub(crate) fn merge_subfields(existing: &mut Subfields, subfields: Subfields) {
    for (node_id, result) in subfields {
        match existing.entry(node_id) {
            Entry::Occupied(mut entry) => entry.get_mut().merge(result),
            Entry::Vacant(entry) => {
                entry.insert(result);
            }
        }
    }
}
