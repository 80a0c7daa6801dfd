pub mod json;
pub mod progress;
