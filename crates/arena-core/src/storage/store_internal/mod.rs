//! Internal split for the aggregation store.
//!
//! Everything here is synchronous and operates on a borrowed connection or
//! transaction; the async facade in `store.rs` owns threading and retries.

pub(crate) mod executions;
pub(crate) mod helpers;
pub(crate) mod leader_board;
pub(crate) mod rounds;
pub(crate) mod validate;
