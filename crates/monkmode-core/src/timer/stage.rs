use serde::{Deserialize, Serialize};

/// One scripted segment of a meditation session with a fixed target duration.
///
/// Supplied by the exercise catalog at timer construction. The timer only
/// reads it; ordering of the surrounding sequence is meaningful (a session
/// traverses stages in list order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    pub id: String,
    /// Target duration in whole seconds.
    pub duration_sec: u64,
}

impl StageDefinition {
    pub fn new(id: impl Into<String>, duration_sec: u64) -> Self {
        Self {
            id: id.into(),
            duration_sec,
        }
    }
}
