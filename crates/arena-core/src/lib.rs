pub mod config;
pub mod engine;
pub mod errors;
pub mod evaluator;
pub mod judge;
pub mod metrics_api;
pub mod model;
pub mod providers;
pub mod report;
pub mod storage;
pub mod submitter;

pub use engine::{RoundController, RoundOutcome};
pub use errors::{ConfigError, ErrorClass, RoundError};
pub use storage::{AggregationStore, StoreError, StoreHandle};
