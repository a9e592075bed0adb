use crate::{ConfigurationError, FederationSchema};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Default number of concurrent backend calls.
pub const DEFAULT_WORKERS: usize = 16;
/// Default deadline of a single backend call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Default maximum number of identifiers bound in a single backend query.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// The configuration of a whole federation: its services, its schema and how queries are run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FederationConfig {
    /// The data sources of the federation.
    pub services: Vec<ServiceConfig>,
    /// The resolved federation schema.
    pub schema: FederationSchema,
    /// Execution settings.
    #[serde(default)]
    pub execution: ExecutionConfig,
}

impl FederationConfig {
    /// Parses a configuration document in JSON and validates it.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that service ids are unique, that the schema only references configured services
    /// and that the execution settings are usable.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut ids = HashSet::new();
        for service in &self.services {
            if !ids.insert(service.id.as_str()) {
                return Err(ConfigurationError::DuplicateService(service.id.clone()));
            }
        }
        self.schema.validate(|id| ids.contains(id))?;
        self.execution.validate()
    }
}

/// One data source of the federation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// The id by which the schema refers to this service.
    pub id: String,
    /// The kind of backend and its settings.
    #[serde(flatten)]
    pub kind: ServiceKind,
}

/// The closed set of supported backends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServiceKind {
    /// A remote SPARQL endpoint.
    SparqlEndpoint {
        /// The query URL of the endpoint. Updates are sent to `<url>/update`.
        url: String,
        /// The named graph that is queried, the default graph if absent.
        #[serde(default)]
        graph: Option<String>,
        /// User for HTTP basic authentication.
        #[serde(default)]
        user: Option<String>,
        /// Password for HTTP basic authentication.
        #[serde(default)]
        password: Option<String>,
    },
    /// An in-process store loaded from an RDF file.
    LocalModel {
        /// The file the store is loaded from and persisted to.
        filepath: PathBuf,
        /// The RDF format of the file, guessed from the extension if absent.
        #[serde(default)]
        filetype: Option<String>,
        /// The named graph that is queried, the default graph if absent.
        #[serde(default)]
        graph: Option<String>,
    },
}

impl ServiceKind {
    /// The named graph this service restricts its queries to.
    pub fn graph(&self) -> Option<&str> {
        match self {
            Self::SparqlEndpoint { graph, .. } | Self::LocalModel { graph, .. } => graph.as_deref(),
        }
    }
}

/// Settings of the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionConfig {
    /// Size of the shared worker pool, i.e., the maximum number of concurrent backend calls.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Deadline of a single backend call in milliseconds. `null` disables the deadline.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: Option<u64>,
    /// Maximum number of identifiers bound in a single backend query.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl ExecutionConfig {
    /// The deadline of a single backend call.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Checks that the pool and the batches are not empty.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.workers == 0 {
            return Err(ConfigurationError::InvalidExecutionSetting(
                "workers must be at least 1".to_owned(),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigurationError::InvalidExecutionSetting(
                "batchSize must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            timeout_ms: default_timeout_ms(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "The default timeout is far below u64::MAX milliseconds"
)]
fn default_timeout_ms() -> Option<u64> {
    Some(DEFAULT_TIMEOUT.as_millis() as u64)
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_kinds() {
        let json = r#"{
            "services": [
                { "id": "dbpedia", "type": "SparqlEndpoint", "url": "http://dbpedia.org/sparql", "graph": "http://dbpedia.org" },
                { "id": "local", "type": "LocalModel", "filepath": "data/people.ttl" }
            ],
            "schema": {},
            "execution": { "timeoutMs": null }
        }"#;
        let config = FederationConfig::from_json(json).unwrap();
        assert_eq!(config.services[0].kind.graph(), Some("http://dbpedia.org"));
        assert!(matches!(
            &config.services[1].kind,
            ServiceKind::LocalModel { filetype: None, .. }
        ));
        assert_eq!(config.execution.timeout(), None);
        assert_eq!(config.execution.workers, DEFAULT_WORKERS);
        assert_eq!(config.execution.batch_size, DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_default_execution() {
        let json = r#"{ "services": [], "schema": {} }"#;
        let config = FederationConfig::from_json(json).unwrap();
        assert_eq!(config.execution.timeout(), Some(DEFAULT_TIMEOUT));
    }

    #[test]
    fn test_duplicate_service() {
        let json = r#"{
            "services": [
                { "id": "a", "type": "LocalModel", "filepath": "a.ttl" },
                { "id": "a", "type": "LocalModel", "filepath": "b.ttl" }
            ],
            "schema": {}
        }"#;
        assert!(matches!(
            FederationConfig::from_json(json),
            Err(ConfigurationError::DuplicateService(id)) if id == "a"
        ));
    }

    #[test]
    fn test_unknown_service_kind() {
        let json = r#"{
            "services": [{ "id": "a", "type": "Neo4j", "url": "bolt://localhost" }],
            "schema": {}
        }"#;
        assert!(matches!(
            FederationConfig::from_json(json),
            Err(ConfigurationError::Document(_))
        ));
    }
}
