use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerSnapshot;

/// Every observable timer transition produces an Event.
///
/// Operations return their events in order; within one operation a
/// `StageCompleted` always precedes the event that publishes the advanced
/// state. The caller dispatches them: state updates go to presentation,
/// `StageCompleted` triggers the chime, `SessionCompleted` drives session
/// records and streak bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Full state snapshot; fired on tick, pause, resume, reconcile and
    /// stage transition.
    StateUpdated {
        snapshot: TimerSnapshot,
        at: DateTime<Utc>,
    },
    /// A stage ran to natural exhaustion. The chime trigger.
    StageCompleted {
        stage_index: usize,
        stage_id: String,
        at: DateTime<Utc>,
    },
    /// The whole sequence was traversed. Fired exactly once per timer
    /// instance, never via cancellation.
    SessionCompleted {
        total_elapsed_sec: u64,
        stage_index: usize,
        total_stages: usize,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub(crate) fn state_updated(snapshot: TimerSnapshot) -> Self {
        Event::StateUpdated {
            snapshot,
            at: Utc::now(),
        }
    }

    pub(crate) fn stage_completed(stage_index: usize, stage_id: &str) -> Self {
        Event::StageCompleted {
            stage_index,
            stage_id: stage_id.to_string(),
            at: Utc::now(),
        }
    }

    pub(crate) fn session_completed(
        total_elapsed_sec: u64,
        stage_index: usize,
        total_stages: usize,
    ) -> Self {
        Event::SessionCompleted {
            total_elapsed_sec,
            stage_index,
            total_stages,
            at: Utc::now(),
        }
    }
}
