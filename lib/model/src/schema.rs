use crate::error::validate_iri;
use crate::vocab::{is_builtin_field, LITERAL_TYPE, SCALAR_TYPES};
use crate::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The resolved federation schema.
///
/// The schema maps every object type and field to the IRIs used in the stores and to the services
/// that own them. It is the output of the schema construction step and is treated as read-only by
/// the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederationSchema {
    /// Object types by name.
    #[serde(default)]
    pub types: BTreeMap<String, TypeConfig>,
    /// Global field table, mapping a field name to its predicate IRI.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldConfig>,
    /// Fields of the root `Query` type.
    #[serde(default)]
    pub query_fields: BTreeMap<String, QueryFieldConfig>,
    /// Fields of the root `Mutation` type.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mutation_fields: BTreeMap<String, MutationFieldConfig>,
    /// The service that mutations are written to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_service: Option<String>,
}

/// An object type of the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeConfig {
    /// The IRI used as `rdf:type` for entities of this type.
    pub id: String,
    /// Type IRIs that are treated as equivalent to `id`.
    #[serde(default)]
    pub same_as: BTreeSet<String>,
    /// The fields declared on this type.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldOfTypeConfig>,
}

/// A field as declared on one particular type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldOfTypeConfig {
    /// The services that own the field. More than one service results in a fan-out.
    #[serde(default)]
    pub services: Vec<String>,
    /// Name of the output type (an object type, a scalar or the literal placeholder).
    pub target_name: String,
    /// Whether the field returns a list.
    #[serde(default)]
    pub is_list: bool,
}

/// An entry of the global field table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConfig {
    /// The predicate IRI of the field.
    pub id: String,
    /// Predicate IRIs that are treated as equivalent to `id`.
    #[serde(default)]
    pub same_as: BTreeSet<String>,
}

/// A field of the root `Query` type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFieldConfig {
    /// The services that own the field. An empty list is tolerated and skips the field.
    #[serde(default)]
    pub services: Vec<String>,
    /// The object type returned by the field.
    pub target_name: String,
    /// Whether the field lists entities or looks them up by identifier.
    #[serde(default)]
    pub kind: QueryFieldKind,
    /// Whether the field returns a list.
    #[serde(default = "default_true")]
    pub is_list: bool,
}

/// The two kinds of root fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryFieldKind {
    /// Lists entities of the target type, optionally paged with `limit`/`offset`/`order`.
    #[default]
    Get,
    /// Looks up entities of the target type by the identifiers given in `_id`.
    GetById,
}

/// A field of the root `Mutation` type.
///
/// The arguments of a mutation field are `_id` and the fields of the target type. Object values
/// (`{ "_id": ..., ... }`) link to and describe nested entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationFieldConfig {
    /// The object type whose entities are written.
    pub target_name: String,
    /// Whether the field adds or removes triples.
    pub action: MutationAction,
}

/// What a mutation field does with the triples described by its arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MutationAction {
    /// Adds the entity, its type and the given field values.
    Insert,
    /// Removes the given field values, or the whole entity if only `_id` is given.
    Delete,
}

fn default_true() -> bool {
    true
}

impl FederationSchema {
    /// Returns the configuration of the object type `name`.
    pub fn type_config(&self, name: &str) -> Result<&TypeConfig, ConfigurationError> {
        self.types
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownType(name.to_owned()))
    }

    /// Returns the configuration of `field` as declared on `type_name`.
    pub fn field_of_type(
        &self,
        type_name: &str,
        field: &str,
    ) -> Result<&FieldOfTypeConfig, ConfigurationError> {
        self.type_config(type_name)?
            .fields
            .get(field)
            .ok_or_else(|| ConfigurationError::UnknownField {
                type_name: type_name.to_owned(),
                field: field.to_owned(),
            })
    }

    /// Returns the configuration of the root field `name`.
    pub fn query_field(&self, name: &str) -> Result<&QueryFieldConfig, ConfigurationError> {
        self.query_fields
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownQueryField(name.to_owned()))
    }

    /// Returns the configuration of the mutation field `name`.
    pub fn mutation_field(&self, name: &str) -> Result<&MutationFieldConfig, ConfigurationError> {
        self.mutation_fields
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownMutationField(name.to_owned()))
    }

    /// Returns the predicate IRI of `field`, if the field table knows it.
    pub fn field_iri(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(|f| f.id.as_str())
    }

    /// Returns the predicate IRI of `field` followed by all equivalent predicate IRIs.
    pub fn field_iris(&self, field: &str) -> Result<Vec<&str>, ConfigurationError> {
        let config = self
            .fields
            .get(field)
            .ok_or_else(|| ConfigurationError::UnknownField {
                type_name: String::new(),
                field: field.to_owned(),
            })?;
        Ok(equivalents(&config.id, &config.same_as))
    }

    /// Returns the IRI of the type `name` followed by all equivalent type IRIs.
    pub fn type_iris(&self, name: &str) -> Result<Vec<&str>, ConfigurationError> {
        let config = self.type_config(name)?;
        Ok(equivalents(&config.id, &config.same_as))
    }

    /// Returns whether `name` is an object type whose entities are identified by IRIs.
    pub fn is_object_type(&self, name: &str) -> bool {
        name != LITERAL_TYPE && !SCALAR_TYPES.contains(&name) && self.types.contains_key(name)
    }

    /// Checks that every referenced service exists, every non-builtin field has a predicate IRI,
    /// and that all IRIs are valid. Mutation fields additionally need a mutation service.
    pub fn validate(&self, is_known_service: impl Fn(&str) -> bool) -> Result<(), ConfigurationError> {
        let check_services = |services: &[String]| {
            services
                .iter()
                .find(|s| !is_known_service(s))
                .map_or(Ok(()), |s| Err(ConfigurationError::UnknownService(s.clone())))
        };

        for field in self.fields.values() {
            validate_iri(&field.id)?;
            field.same_as.iter().try_for_each(|iri| validate_iri(iri))?;
        }
        for (type_name, config) in &self.types {
            validate_iri(&config.id)?;
            config.same_as.iter().try_for_each(|iri| validate_iri(iri))?;
            for (field, field_config) in &config.fields {
                check_services(&field_config.services)?;
                if !is_builtin_field(field) && !self.fields.contains_key(field) {
                    return Err(ConfigurationError::UnknownField {
                        type_name: type_name.clone(),
                        field: field.clone(),
                    });
                }
            }
        }
        for (name, config) in &self.query_fields {
            check_services(&config.services)?;
            if !self.types.contains_key(&config.target_name) {
                return Err(ConfigurationError::UnknownType(format!(
                    "{} (target of query field '{name}')",
                    config.target_name
                )));
            }
        }
        for (name, config) in &self.mutation_fields {
            if !self.types.contains_key(&config.target_name) {
                return Err(ConfigurationError::UnknownType(format!(
                    "{} (target of mutation field '{name}')",
                    config.target_name
                )));
            }
        }
        match &self.mutation_service {
            Some(service) if !is_known_service(service.as_str()) => {
                return Err(ConfigurationError::UnknownService(service.clone()))
            }
            None if !self.mutation_fields.is_empty() => {
                return Err(ConfigurationError::MissingMutationService)
            }
            _ => {}
        }
        Ok(())
    }
}

fn equivalents<'a>(id: &'a str, same_as: &'a BTreeSet<String>) -> Vec<&'a str> {
    let mut iris = vec![id];
    iris.extend(same_as.iter().map(String::as_str).filter(|iri| *iri != id));
    iris
}
