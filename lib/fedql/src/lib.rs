#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]

mod error;
mod load;

pub use error::LoadError;
pub use fedql_engine::{EngineError, FederationEngine, Response};
pub use load::{load_config, load_engine};

pub mod model {
    pub use fedql_model::*;
}

pub mod store {
    pub use fedql_store::*;
}

pub mod engine {
    pub use fedql_engine::*;
}
