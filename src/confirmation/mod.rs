pub mod commands;
pub mod engine;
pub mod registry;
pub mod state;

pub use engine::{ConfirmationConfig, ConfirmationEngine, ConfirmationEvent};
pub use registry::{Observation, SessionId, SessionRegistry, SessionSnapshot};
pub use state::{ConfirmationState, ConfirmationStatus};
