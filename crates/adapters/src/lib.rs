//! retweet-bot adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `state`: JSON file and in-memory state stores
//! - `x`: X (Twitter) API search and retweet adapters

mod state_json;
mod state_memory;

pub mod x_api;

/// Re-exports for state adapters
pub mod state {
    pub use crate::state_json::{JsonStateStore, StatePaths};
    pub use crate::state_memory::InMemoryStateStore;
}

/// Re-exports for X API adapters
pub mod x {
    pub use crate::x_api::{
        CredentialsError, StubRetweeter, StubSearch, XCredentials, XRetweeter, XSearchClient,
        XUser,
    };
}
