use crate::adapter::{FanOutAdapter, LocalStoreAdapter, RemoteStoreAdapter, SourceAdapter};
use crate::error::EngineError;
use dashmap::DashMap;
use fedql_model::pattern::ServiceSet;
use fedql_model::{ConfigurationError, ServiceConfig, ServiceKind};
use fedql_store::MemoryStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// The adapters of an engine, keyed by service id.
///
/// Fan-out adapters are created on first use and shared by all later requests that need the same
/// set of services.
#[derive(Debug, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn SourceAdapter>>,
    fan_outs: DashMap<String, Arc<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates one adapter per configured service. Local stores are loaded eagerly.
    pub fn from_services(services: &[ServiceConfig]) -> Result<Self, EngineError> {
        let mut registry = Self::new();
        for service in services {
            let adapter: Arc<dyn SourceAdapter> = match &service.kind {
                ServiceKind::SparqlEndpoint {
                    url,
                    graph,
                    user,
                    password,
                } => {
                    let adapter = RemoteStoreAdapter::new(&service.id, url, graph.clone());
                    match user {
                        Some(user) => Arc::new(adapter.with_credentials(user, password.clone())),
                        None => Arc::new(adapter),
                    }
                }
                ServiceKind::LocalModel {
                    filepath,
                    filetype,
                    graph,
                } => {
                    let store = MemoryStore::open(filepath, filetype.as_deref())?;
                    Arc::new(LocalStoreAdapter::new(&service.id, store, graph.clone()))
                }
            };
            info!(service = %service.id, "Registered service");
            registry.register(adapter)?;
        }
        Ok(registry)
    }

    /// Adds an adapter under its own id.
    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) -> Result<(), ConfigurationError> {
        let id = adapter.id().to_owned();
        if self.adapters.contains_key(&id) {
            return Err(ConfigurationError::DuplicateService(id));
        }
        self.adapters.insert(id, adapter);
        Ok(())
    }

    /// The adapter of the service `id`.
    pub fn get(&self, id: &str) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(id).map(Arc::clone)
    }

    /// Returns whether a service with this id is registered.
    pub fn contains(&self, id: &str) -> bool {
        self.adapters.contains_key(id)
    }

    /// The adapter answering for `services`: the service itself, or the fan-out over all of them.
    pub fn resolve(&self, services: &ServiceSet) -> Result<Arc<dyn SourceAdapter>, ConfigurationError> {
        let lookup = |id: &str| {
            self.get(id)
                .ok_or_else(|| ConfigurationError::UnknownService(id.to_owned()))
        };
        if !services.is_fan_out() {
            return lookup(services.id().as_str());
        }

        let id = services.id();
        if let Some(adapter) = self.fan_outs.get(&id) {
            return Ok(Arc::clone(adapter.value()));
        }
        let members = services
            .members()
            .iter()
            .map(|member| lookup(member.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let adapter = self
            .fan_outs
            .entry(id.clone())
            .or_insert_with(|| {
                let adapter: Arc<dyn SourceAdapter> = Arc::new(FanOutAdapter::new(id, members));
                adapter
            });
        Ok(Arc::clone(adapter.value()))
    }
}
