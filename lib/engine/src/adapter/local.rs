use crate::adapter::{execute_batched, ExecutionOutcome, ExecutionRequest, SourceAdapter};
use crate::error::AdapterError;
use async_trait::async_trait;
use fedql_store::MemoryStore;
use tracing::debug;

/// Answers fragments with an in-process [`MemoryStore`].
///
/// Updates are persisted to the backing file of the store before they become visible.
#[derive(Debug, Clone)]
pub struct LocalStoreAdapter {
    id: String,
    store: MemoryStore,
    graph: Option<String>,
}

impl LocalStoreAdapter {
    pub fn new(id: impl Into<String>, store: MemoryStore, graph: Option<String>) -> Self {
        Self {
            id: id.into(),
            store,
            graph,
        }
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

#[async_trait]
impl SourceAdapter for LocalStoreAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    fn graph(&self) -> Option<&str> {
        self.graph.as_deref()
    }

    async fn execute(&self, request: ExecutionRequest<'_>) -> Result<ExecutionOutcome, AdapterError> {
        execute_batched(&self.id, self.graph(), request, |query| {
            let store = self.store.clone();
            async move { Ok(store.query(&query).await?) }
        })
        .await
    }

    async fn update(&self, update: &str) -> Result<(), AdapterError> {
        self.store.update(update).await?;
        debug!(adapter = %self.id, "Applied update");
        Ok(())
    }
}
