//! retweet-bot domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `policy`: Pluggable candidate filters
//! - `query`: Search query and time window construction
//! - `usecases`: Decision pipeline, action executor and the retweet job

pub mod model;
pub mod policy;
pub mod ports;
pub mod query;
pub mod usecases;

pub use model::*;
pub use ports::*;
pub use query::IdentifierKind;
