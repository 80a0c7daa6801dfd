pub mod controller;
pub mod decision;
pub mod finalize;
pub mod prompt;

pub use controller::{ControllerState, RoundCallback, RoundController, RoundOutcome, RunContext};
