//! Federated query execution over RDF sources.
//!
//! A query is turned into a [`QueryPattern`](fedql_model::pattern::QueryPattern), split into an
//! [`ExecutionPlan`] of per-service units, compiled to SPARQL, executed concurrently and merged
//! into a single [`Response`].

pub mod adapter;
pub mod compiler;
mod context;
mod engine;
pub mod error;
pub mod plan;
mod pool;
mod response;
pub mod results;
mod scheduler;

pub use context::ld_context;
pub use engine::FederationEngine;
pub use error::{AdapterError, EngineError};
pub use plan::ExecutionPlan;
pub use pool::{ExecutionEnv, WorkerPool};
pub use response::Response;
pub use scheduler::Scheduler;
