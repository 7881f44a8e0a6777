pub mod commands;
pub mod gate;
pub mod profile;
pub mod store;

pub use crate::db::AttemptRecord;
pub use gate::{AttemptGate, RejectReason, SubmitOutcome, Submission};
pub use profile::{Badge, ProfileStats};
pub use store::{AttemptStore, MemoryAttemptStore};
