use crate::adapter::{ExecutionOutcome, ExecutionRequest, SourceAdapter};
use crate::error::AdapterError;
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use tracing::warn;

/// Answers fragments owned by several services by asking every member and unioning the answers.
///
/// A failing member only loses its own contribution and is reported in
/// [`ExecutionOutcome::errors`]. The fan-out fails if every member fails.
#[derive(Debug, Clone)]
pub struct FanOutAdapter {
    id: String,
    members: Vec<Arc<dyn SourceAdapter>>,
}

impl FanOutAdapter {
    pub fn new(id: impl Into<String>, members: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self {
            id: id.into(),
            members,
        }
    }

    pub fn members(&self) -> &[Arc<dyn SourceAdapter>] {
        &self.members
    }
}

#[async_trait]
impl SourceAdapter for FanOutAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    async fn execute(&self, request: ExecutionRequest<'_>) -> Result<ExecutionOutcome, AdapterError> {
        let outcomes = join_all(self.members.iter().map(|member| member.execute(request))).await;

        let mut merged: Option<ExecutionOutcome> = None;
        let mut failures = Vec::new();
        let mut first_error = None;
        for (member, outcome) in self.members.iter().zip(outcomes) {
            match outcome {
                Ok(outcome) => match merged.as_mut() {
                    Some(merged) => merged.merge(outcome),
                    None => merged = Some(outcome),
                },
                Err(error) => {
                    warn!(adapter = %self.id, member = member.id(), %error, "Fan-out member failed");
                    failures.push(format!(
                        "Execution on service '{}' failed: {error}",
                        member.id()
                    ));
                    first_error.get_or_insert(error);
                }
            }
        }
        match (merged, first_error) {
            (Some(mut merged), _) => {
                merged.errors.extend(failures);
                Ok(merged)
            }
            (None, Some(error)) => Err(error),
            (None, None) => Err(AdapterError::NoMembers(self.id.clone())),
        }
    }
}
