use crate::LoadError;
use fedql_engine::FederationEngine;
use fedql_model::{FederationConfig, ServiceKind};
use std::fs;
use std::path::Path;
use tracing::info;

/// Reads and validates the federation configuration at `path`.
///
/// Relative paths of local stores are resolved against the directory of the configuration file.
pub fn load_config(path: impl AsRef<Path>) -> Result<FederationConfig, LoadError> {
    let path = path.as_ref();
    let document = fs::read_to_string(path).map_err(|error| LoadError::Io {
        path: path.to_owned(),
        error,
    })?;
    let mut config = FederationConfig::from_json(&document)?;

    if let Some(base) = path.parent() {
        for service in &mut config.services {
            if let ServiceKind::LocalModel { filepath, .. } = &mut service.kind {
                if filepath.is_relative() {
                    *filepath = base.join(&*filepath);
                }
            }
        }
    }
    info!(
        path = %path.display(),
        services = config.services.len(),
        "Loaded federation configuration"
    );
    Ok(config)
}

/// Creates an engine for the federation configuration at `path`.
///
/// The configuration document looks like:
/// ```json
/// {
///   "services": [
///     { "id": "people", "type": "LocalModel", "filepath": "people.ttl" },
///     { "id": "dbpedia", "type": "SparqlEndpoint", "url": "https://dbpedia.org/sparql" }
///   ],
///   "schema": {
///     "types": {
///       "Person": {
///         "id": "http://schema.org/Person",
///         "fields": { "name": { "services": ["people"], "targetName": "String" } }
///       }
///     },
///     "fields": { "name": { "id": "http://schema.org/name" } },
///     "queryFields": { "people": { "services": ["people"], "targetName": "Person" } },
///     "mutationService": "people",
///     "mutationFields": { "insert_Person": { "targetName": "Person", "action": "insert" } }
///   },
///   "execution": { "workers": 16, "timeoutMs": 60000, "batchSize": 100 }
/// }
/// ```
pub fn load_engine(path: impl AsRef<Path>) -> Result<FederationEngine, LoadError> {
    Ok(FederationEngine::new(load_config(path)?)?)
}
