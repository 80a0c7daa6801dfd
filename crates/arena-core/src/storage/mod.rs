pub mod error;
pub mod retry;
pub mod schema;
pub mod store;
mod store_internal;

pub use error::StoreError;
pub use retry::RetryPolicy;
pub use store::{AggregationStore, StoreHandle, StoreOptions};

pub(crate) fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}
