//! - prompt.rs: system prompt constants
//! - client.rs: judgment call and reply parsing

pub(crate) mod client;
pub(crate) mod prompt;
