//! Application use cases / business logic

pub mod execute;
pub mod run;
pub mod select;

pub use execute::{ActionExecutor, ExecuteConfig};
pub use run::{RetweetJob, RetweetJobConfig, RunError};
pub use select::DecisionPipeline;
