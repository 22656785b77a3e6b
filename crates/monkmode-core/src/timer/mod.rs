mod engine;
mod stage;

pub use engine::{SessionTimer, TimerPhase, TimerSnapshot, DRIFT_THRESHOLD_MS};
pub use stage::StageDefinition;
