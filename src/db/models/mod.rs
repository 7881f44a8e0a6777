pub mod attempt;

pub use attempt::{AttemptRecord, InsertOutcome};
