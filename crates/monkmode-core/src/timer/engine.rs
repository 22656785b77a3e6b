//! Session timer implementation.
//!
//! The timer is a wall-clock-based state machine. It does not use internal
//! threads - the caller drives it by calling `tick()` on a nominal one-second
//! cadence and `reconcile()` whenever the host resumes from suspension. The
//! cadence is never trusted: every entry point recomputes elapsed real time
//! from the last reference timestamp, so a throttled or suspended host cannot
//! undercount elapsed time.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused -> Finished
//! ```
//!
//! `Finished` is terminal. It is reached by natural exhaustion of the stage
//! sequence (which emits `SessionCompleted` exactly once) or by `cancel()`
//! (which never emits it).
//!
//! ## Usage
//!
//! ```ignore
//! let mut timer = SessionTimer::new(stages)?;
//! timer.start();
//! // On a ~1s cadence:
//! for event in timer.tick() { /* dispatch */ }
//! // On foreground transition:
//! for event in timer.reconcile() { /* dispatch */ }
//! ```

use serde::{Deserialize, Serialize};

use super::stage::StageDefinition;
use crate::error::TimerError;
use crate::events::Event;

/// Gap beyond which a regular tick is treated as a suspension event and
/// corrected reconciliation-style instead of a one-second decrement.
pub const DRIFT_THRESHOLD_MS: u64 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    Idle,
    Running,
    Paused,
    Finished,
}

/// Read-only view of the timer state, published with every state update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub current_stage_index: usize,
    pub stage_id: String,
    pub remaining_sec: u64,
    pub total_stages: usize,
    pub is_paused: bool,
    pub is_finished: bool,
    pub total_elapsed_sec: u64,
}

/// Countdown timer over an ordered stage sequence.
///
/// Operates on wall-clock deltas -- no internal thread. Each operation is a
/// synchronous transition over in-memory state and returns the observable
/// events it produced, in order. A `StageCompleted` event always precedes the
/// event that publishes the advanced state, so a chime collaborator fires
/// before any observer sees the new stage index.
///
/// Serializable so a host can park the timer between process invocations and
/// `reconcile()` the gap on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionTimer {
    stages: Vec<StageDefinition>,
    phase: TimerPhase,
    current_stage_index: usize,
    /// Remaining whole seconds in the current stage.
    remaining_sec: u64,
    /// Cumulative elapsed seconds across the session. Monotonic; never
    /// exceeds the sum of traversed/partial stage durations.
    total_elapsed_sec: u64,
    /// Timestamp (ms since epoch) of the last moment the state was known to
    /// be accurate. `None` while not running.
    #[serde(default)]
    last_reference_ms: Option<u64>,
}

impl SessionTimer {
    /// Create a timer over a non-empty stage sequence.
    ///
    /// # Errors
    /// Fails if the sequence is empty or any stage has a zero duration; the
    /// timer cannot be constructed in a valid state.
    pub fn new(stages: Vec<StageDefinition>) -> Result<Self, TimerError> {
        if stages.is_empty() {
            return Err(TimerError::EmptyStages);
        }
        if let Some(index) = stages.iter().position(|s| s.duration_sec == 0) {
            return Err(TimerError::ZeroDurationStage {
                index,
                id: stages[index].id.clone(),
            });
        }
        let remaining_sec = stages[0].duration_sec;
        Ok(Self {
            stages,
            phase: TimerPhase::Idle,
            current_stage_index: 0,
            remaining_sec,
            total_elapsed_sec: 0,
            last_reference_ms: None,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_paused(&self) -> bool {
        self.phase == TimerPhase::Paused
    }

    pub fn is_finished(&self) -> bool {
        self.phase == TimerPhase::Finished
    }

    pub fn current_stage_index(&self) -> usize {
        self.current_stage_index
    }

    pub fn remaining_sec(&self) -> u64 {
        self.remaining_sec
    }

    pub fn total_elapsed_sec(&self) -> u64 {
        self.total_elapsed_sec
    }

    pub fn current_stage(&self) -> &StageDefinition {
        // Invariant: current_stage_index < stages.len(), enforced by advance().
        &self.stages[self.current_stage_index]
    }

    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }

    pub fn total_stages(&self) -> usize {
        self.stages.len()
    }

    /// Build a full state snapshot.
    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            current_stage_index: self.current_stage_index,
            stage_id: self.current_stage().id.clone(),
            remaining_sec: self.remaining_sec,
            total_stages: self.stages.len(),
            is_paused: self.phase == TimerPhase::Paused,
            is_finished: self.phase == TimerPhase::Finished,
            total_elapsed_sec: self.total_elapsed_sec,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin (or resume) ticking. No-op while running or finished.
    pub fn start(&mut self) -> Vec<Event> {
        self.start_at(now_ms())
    }

    /// Freeze the countdown. Does not alter remaining or elapsed time.
    /// No-op unless running.
    pub fn pause(&mut self) -> Vec<Event> {
        match self.phase {
            TimerPhase::Running => {
                self.phase = TimerPhase::Paused;
                self.last_reference_ms = None;
                vec![Event::state_updated(self.snapshot())]
            }
            _ => Vec::new(),
        }
    }

    /// Resume from pause. The pause interval is never charged as elapsed
    /// time. No-op unless paused.
    pub fn resume(&mut self) -> Vec<Event> {
        self.resume_at(now_ms())
    }

    /// Skip to the next stage immediately. Time already ticked in the current
    /// stage stays accounted; the unspent remainder is forfeited. Skipping
    /// the last stage completes the session. No-op once finished.
    pub fn skip(&mut self) -> Vec<Event> {
        self.skip_at(now_ms())
    }

    /// Abandon the session. Terminal and unconditional; never emits
    /// `SessionCompleted`. No-op once finished.
    pub fn cancel(&mut self) -> Vec<Event> {
        if self.phase == TimerPhase::Finished {
            return Vec::new();
        }
        self.phase = TimerPhase::Finished;
        self.last_reference_ms = None;
        Vec::new()
    }

    /// Catch up after the host was suspended (device locked, app
    /// backgrounded). Accounts only for time since the last reference point,
    /// so back-to-back calls are idempotent. No-op unless running.
    pub fn reconcile(&mut self) -> Vec<Event> {
        self.reconcile_at(now_ms())
    }

    /// Periodic tick, nominally once per second. The interval is not
    /// trusted: a gap beyond [`DRIFT_THRESHOLD_MS`] is corrected
    /// reconciliation-style. No-op unless running.
    pub fn tick(&mut self) -> Vec<Event> {
        self.tick_at(now_ms())
    }

    // ── Clock-explicit variants ──────────────────────────────────────
    // The public commands above pass the system clock; tests drive these
    // directly with synthetic timestamps.

    pub(crate) fn start_at(&mut self, now: u64) -> Vec<Event> {
        match self.phase {
            TimerPhase::Idle | TimerPhase::Paused => {
                self.phase = TimerPhase::Running;
                self.last_reference_ms = Some(now);
                vec![Event::state_updated(self.snapshot())]
            }
            TimerPhase::Running | TimerPhase::Finished => Vec::new(),
        }
    }

    pub(crate) fn resume_at(&mut self, now: u64) -> Vec<Event> {
        if self.phase != TimerPhase::Paused {
            return Vec::new();
        }
        self.phase = TimerPhase::Running;
        self.last_reference_ms = Some(now);
        vec![Event::state_updated(self.snapshot())]
    }

    pub(crate) fn skip_at(&mut self, now: u64) -> Vec<Event> {
        if self.phase == TimerPhase::Finished {
            return Vec::new();
        }
        self.advance(now)
    }

    pub(crate) fn reconcile_at(&mut self, now: u64) -> Vec<Event> {
        if self.phase != TimerPhase::Running {
            return Vec::new();
        }
        let last = match self.last_reference_ms {
            Some(t) => t,
            None => {
                self.last_reference_ms = Some(now);
                return Vec::new();
            }
        };
        // saturating_sub: a backwards clock reads as zero elapsed.
        let elapsed_sec = now.saturating_sub(last) / 1000;
        if elapsed_sec == 0 {
            return Vec::new();
        }
        self.last_reference_ms = Some(now);
        self.apply_elapsed(elapsed_sec);
        if self.remaining_sec == 0 {
            self.complete_stage(now)
        } else {
            vec![Event::state_updated(self.snapshot())]
        }
    }

    pub(crate) fn tick_at(&mut self, now: u64) -> Vec<Event> {
        if self.phase != TimerPhase::Running {
            return Vec::new();
        }
        let last = self.last_reference_ms.unwrap_or(now);
        let elapsed_ms = now.saturating_sub(last);
        // Beyond the drift threshold the process was delayed or briefly
        // suspended; apply whole elapsed seconds instead of assuming one.
        let elapsed_sec = if elapsed_ms > DRIFT_THRESHOLD_MS {
            elapsed_ms / 1000
        } else {
            1
        };
        self.last_reference_ms = Some(now);
        self.apply_elapsed(elapsed_sec);
        if self.remaining_sec == 0 {
            self.complete_stage(now)
        } else {
            vec![Event::state_updated(self.snapshot())]
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Credit elapsed seconds against the current stage. The credit is capped
    /// at what the stage still owes: a suspension longer than the stage never
    /// inflates `total_elapsed_sec` past the stage's own duration.
    fn apply_elapsed(&mut self, elapsed_sec: u64) {
        let credited = elapsed_sec.min(self.remaining_sec);
        self.remaining_sec -= credited;
        self.total_elapsed_sec += credited;
    }

    /// The current stage ran to exhaustion: emit the chime trigger, then
    /// advance. The `StageCompleted` event is ordered before the event that
    /// publishes the transition.
    fn complete_stage(&mut self, now: u64) -> Vec<Event> {
        let stage = self.current_stage();
        let mut events = vec![Event::stage_completed(self.current_stage_index, &stage.id)];
        events.extend(self.advance(now));
        events
    }

    /// Move to the next stage, or finish the session after the last one.
    /// Every transition path (tick, skip, reconcile) routes through here, so
    /// the reference timestamp is always refreshed and the next tick never
    /// sees a stale delta.
    fn advance(&mut self, now: u64) -> Vec<Event> {
        let next = self.current_stage_index + 1;
        if next >= self.stages.len() {
            self.phase = TimerPhase::Finished;
            self.last_reference_ms = None;
            vec![Event::session_completed(
                self.total_elapsed_sec,
                self.current_stage_index,
                self.stages.len(),
            )]
        } else {
            self.current_stage_index = next;
            self.remaining_sec = self.stages[next].duration_sec;
            self.last_reference_ms = Some(now);
            vec![Event::state_updated(self.snapshot())]
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stages(defs: &[(&str, u64)]) -> Vec<StageDefinition> {
        defs.iter()
            .map(|(id, sec)| StageDefinition::new(*id, *sec))
            .collect()
    }

    fn two_stage_timer() -> SessionTimer {
        SessionTimer::new(stages(&[("a", 5), ("b", 3)])).unwrap()
    }

    fn completion_count(events: &[Event]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, Event::SessionCompleted { .. }))
            .count()
    }

    #[test]
    fn construction_rejects_empty_stages() {
        assert!(matches!(
            SessionTimer::new(Vec::new()),
            Err(TimerError::EmptyStages)
        ));
    }

    #[test]
    fn construction_rejects_zero_duration_stage() {
        let err = SessionTimer::new(stages(&[("a", 5), ("empty", 0)])).unwrap_err();
        assert!(matches!(
            err,
            TimerError::ZeroDurationStage { index: 1, .. }
        ));
    }

    #[test]
    fn initial_state() {
        let timer = two_stage_timer();
        let snap = timer.snapshot();
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(snap.current_stage_index, 0);
        assert_eq!(snap.stage_id, "a");
        assert_eq!(snap.remaining_sec, 5);
        assert_eq!(snap.total_stages, 2);
        assert_eq!(snap.total_elapsed_sec, 0);
        assert!(!snap.is_paused);
        assert!(!snap.is_finished);
    }

    #[test]
    fn start_pause_resume() {
        let mut timer = two_stage_timer();
        assert!(!timer.start_at(0).is_empty());
        assert_eq!(timer.phase(), TimerPhase::Running);

        // Starting again is a no-op.
        assert!(timer.start_at(100).is_empty());

        assert!(!timer.pause().is_empty());
        assert_eq!(timer.phase(), TimerPhase::Paused);

        // Pausing again is a no-op.
        assert!(timer.pause().is_empty());

        assert!(!timer.resume_at(200).is_empty());
        assert_eq!(timer.phase(), TimerPhase::Running);

        // Resuming while running is a no-op.
        assert!(timer.resume_at(300).is_empty());
    }

    #[test]
    fn tick_is_ignored_before_start() {
        let mut timer = two_stage_timer();
        assert!(timer.tick_at(1000).is_empty());
        assert_eq!(timer.remaining_sec(), 5);
    }

    #[test]
    fn natural_run_completes_with_sum_of_durations() {
        let mut timer = two_stage_timer();
        timer.start_at(0);

        for t in 1..=4u64 {
            let events = timer.tick_at(t * 1000);
            assert!(matches!(events[0], Event::StateUpdated { .. }));
        }
        assert_eq!(timer.remaining_sec(), 1);
        assert_eq!(timer.total_elapsed_sec(), 4);

        // Fifth tick exhausts stage "a": chime first, then the new stage.
        let events = timer.tick_at(5000);
        assert!(matches!(
            &events[0],
            Event::StageCompleted { stage_id, stage_index: 0, .. } if stage_id == "a"
        ));
        match &events[1] {
            Event::StateUpdated { snapshot, .. } => {
                assert_eq!(snapshot.stage_id, "b");
                assert_eq!(snapshot.remaining_sec, 3);
                assert_eq!(snapshot.total_elapsed_sec, 5);
            }
            other => panic!("expected StateUpdated, got {other:?}"),
        }

        timer.tick_at(6000);
        timer.tick_at(7000);
        let events = timer.tick_at(8000);
        assert!(matches!(
            &events[0],
            Event::StageCompleted { stage_id, .. } if stage_id == "b"
        ));
        match &events[1] {
            Event::SessionCompleted {
                total_elapsed_sec,
                stage_index,
                total_stages,
                ..
            } => {
                assert_eq!(*total_elapsed_sec, 8);
                assert_eq!(*stage_index, 1);
                assert_eq!(*total_stages, 2);
            }
            other => panic!("expected SessionCompleted, got {other:?}"),
        }
        assert!(timer.is_finished());

        // Terminal: nothing moves afterwards.
        assert!(timer.tick_at(9000).is_empty());
        assert!(timer.skip_at(9000).is_empty());
        assert!(timer.reconcile_at(9000).is_empty());
        assert!(timer.start_at(9000).is_empty());
    }

    #[test]
    fn pause_freezes_the_clock() {
        let mut timer = two_stage_timer();
        timer.start_at(0);
        timer.tick_at(1000);
        timer.tick_at(2000);
        assert_eq!(timer.remaining_sec(), 3);
        assert_eq!(timer.total_elapsed_sec(), 2);

        timer.pause();
        // An arbitrary real-time delay passes while paused.
        let events = timer.resume_at(1_000_000);
        assert_eq!(timer.remaining_sec(), 3);
        assert_eq!(timer.total_elapsed_sec(), 2);
        match &events[0] {
            Event::StateUpdated { snapshot, .. } => assert!(!snapshot.is_paused),
            other => panic!("expected StateUpdated, got {other:?}"),
        }

        // The next tick charges only the time since resume.
        timer.tick_at(1_001_000);
        assert_eq!(timer.remaining_sec(), 2);
        assert_eq!(timer.total_elapsed_sec(), 3);
    }

    #[test]
    fn reconcile_while_paused_is_a_noop() {
        let mut timer = two_stage_timer();
        timer.start_at(0);
        timer.tick_at(1000);
        timer.pause();
        assert!(timer.reconcile_at(500_000).is_empty());
        assert_eq!(timer.remaining_sec(), 4);
        assert_eq!(timer.total_elapsed_sec(), 1);
    }

    #[test]
    fn reconcile_is_idempotent_in_quick_succession() {
        let mut timer = two_stage_timer();
        timer.start_at(0);
        timer.tick_at(1000);
        timer.tick_at(2000);

        // Sub-second gap: nothing to account for.
        assert!(timer.reconcile_at(2400).is_empty());
        assert!(timer.reconcile_at(2999).is_empty());
        assert_eq!(timer.remaining_sec(), 3);
        assert_eq!(timer.total_elapsed_sec(), 2);

        // A real gap is credited once, then the immediate second call no-ops.
        let events = timer.reconcile_at(4000);
        assert!(!events.is_empty());
        assert_eq!(timer.remaining_sec(), 1);
        assert!(timer.reconcile_at(4001).is_empty());
        assert_eq!(timer.remaining_sec(), 1);
        assert_eq!(timer.total_elapsed_sec(), 4);
    }

    #[test]
    fn reconcile_caps_credit_at_stage_remaining() {
        // Stage "a" (5s), 2 seconds ticked, then a simulated 10-second gap.
        let mut timer = two_stage_timer();
        timer.start_at(0);
        timer.tick_at(1000);
        timer.tick_at(2000);
        assert_eq!(timer.remaining_sec(), 3);

        let events = timer.reconcile_at(12_000);
        // Stage "a" completes; only the 3 seconds it still owed are credited.
        assert!(matches!(
            &events[0],
            Event::StageCompleted { stage_id, .. } if stage_id == "a"
        ));
        match &events[1] {
            Event::StateUpdated { snapshot, .. } => {
                assert_eq!(snapshot.stage_id, "b");
                assert_eq!(snapshot.remaining_sec, 3);
                assert_eq!(snapshot.total_elapsed_sec, 5);
            }
            other => panic!("expected StateUpdated, got {other:?}"),
        }
        // The gap overshoot does not leak into the next stage either.
        timer.tick_at(13_000);
        assert_eq!(timer.remaining_sec(), 2);
    }

    #[test]
    fn delayed_tick_applies_drift_correction() {
        let mut timer = two_stage_timer();
        timer.start_at(0);
        // 3.2s since the reference point: three whole seconds, not one.
        timer.tick_at(3200);
        assert_eq!(timer.remaining_sec(), 2);
        assert_eq!(timer.total_elapsed_sec(), 3);

        // 1.4s is within the drift threshold: standard one-second decrement.
        timer.tick_at(4600);
        assert_eq!(timer.remaining_sec(), 1);
        assert_eq!(timer.total_elapsed_sec(), 4);
    }

    #[test]
    fn backwards_clock_reads_as_zero() {
        let mut timer = two_stage_timer();
        timer.start_at(10_000);
        assert!(timer.reconcile_at(4000).is_empty());
        assert_eq!(timer.remaining_sec(), 5);
        assert_eq!(timer.total_elapsed_sec(), 0);
    }

    #[test]
    fn skip_at_stage_start_adds_no_elapsed_time() {
        let mut timer = two_stage_timer();
        timer.start_at(0);
        let events = timer.skip_at(100);
        match &events[0] {
            Event::StateUpdated { snapshot, .. } => {
                assert_eq!(snapshot.stage_id, "b");
                assert_eq!(snapshot.remaining_sec, 3);
                assert_eq!(snapshot.total_elapsed_sec, 0);
            }
            other => panic!("expected StateUpdated, got {other:?}"),
        }
    }

    #[test]
    fn skip_forfeits_the_unspent_remainder() {
        let mut timer = two_stage_timer();
        timer.start_at(0);
        timer.tick_at(1000);
        timer.tick_at(2000);
        timer.skip_at(2100);
        // The two ticked seconds stay accounted; the three unspent do not.
        assert_eq!(timer.total_elapsed_sec(), 2);
        assert_eq!(timer.current_stage_index(), 1);
        assert_eq!(timer.remaining_sec(), 3);
    }

    #[test]
    fn skip_refreshes_the_reference_timestamp() {
        let mut timer = two_stage_timer();
        timer.start_at(0);
        timer.tick_at(1000);
        // Skip at t=50s; the next tick one second later must not see a 49s
        // stale delta.
        timer.skip_at(50_000);
        timer.tick_at(51_000);
        assert_eq!(timer.remaining_sec(), 2);
        assert_eq!(timer.total_elapsed_sec(), 2);
    }

    #[test]
    fn skip_on_last_stage_completes_the_session() {
        let mut timer = two_stage_timer();
        timer.start_at(0);
        timer.skip_at(100);
        let events = timer.skip_at(200);
        assert_eq!(completion_count(&events), 1);
        assert!(timer.is_finished());
        // Skip bypasses the chime: advance only.
        assert!(!events
            .iter()
            .any(|e| matches!(e, Event::StageCompleted { .. })));
    }

    #[test]
    fn cancel_is_terminal_and_silent() {
        let mut timer = two_stage_timer();
        timer.start_at(0);
        timer.tick_at(1000);
        let events = timer.cancel();
        assert!(events.is_empty());
        assert!(timer.is_finished());
        assert!(timer.cancel().is_empty());
        assert!(timer.start_at(2000).is_empty());
        assert!(timer.tick_at(2000).is_empty());
    }

    #[test]
    fn start_from_paused_acts_as_resume() {
        let mut timer = two_stage_timer();
        timer.start_at(0);
        timer.tick_at(1000);
        timer.pause();
        timer.start_at(500_000);
        assert_eq!(timer.phase(), TimerPhase::Running);
        timer.tick_at(501_000);
        assert_eq!(timer.total_elapsed_sec(), 2);
    }

    #[test]
    fn reconcile_to_exact_zero_triggers_stage_completion() {
        let mut timer = two_stage_timer();
        timer.start_at(0);
        timer.tick_at(1000);
        timer.tick_at(2000);
        // Exactly the 3 remaining seconds.
        let events = timer.reconcile_at(5000);
        assert!(matches!(events[0], Event::StageCompleted { .. }));
        assert_eq!(timer.current_stage_index(), 1);
    }

    #[test]
    fn survives_serde_round_trip() {
        let mut timer = two_stage_timer();
        timer.start_at(0);
        timer.tick_at(1000);
        let json = serde_json::to_string(&timer).unwrap();
        let mut restored: SessionTimer = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.remaining_sec(), 4);
        // A parked timer reconciles the gap on load.
        let events = restored.reconcile_at(3000);
        assert!(!events.is_empty());
        assert_eq!(restored.remaining_sec(), 2);
    }

    proptest! {
        /// After exactly sum(durations) one-second ticks with no pauses or
        /// skips, the session finishes with total_elapsed == sum and exactly
        /// one completion event.
        #[test]
        fn ticking_out_any_sequence_completes_once(
            durations in prop::collection::vec(1u64..120, 1..8)
        ) {
            let defs: Vec<StageDefinition> = durations
                .iter()
                .enumerate()
                .map(|(i, d)| StageDefinition::new(format!("stage-{i}"), *d))
                .collect();
            let total: u64 = durations.iter().sum();

            let mut timer = SessionTimer::new(defs).unwrap();
            timer.start_at(0);

            let mut completions = 0;
            let mut last_elapsed = 0;
            for t in 1..=total {
                let events = timer.tick_at(t * 1000);
                completions += completion_count(&events);
                // Monotonic non-decreasing across every operation.
                prop_assert!(timer.total_elapsed_sec() >= last_elapsed);
                last_elapsed = timer.total_elapsed_sec();
            }

            prop_assert!(timer.is_finished());
            prop_assert_eq!(timer.total_elapsed_sec(), total);
            prop_assert_eq!(completions, 1);
            // Inert afterwards.
            prop_assert!(timer.tick_at((total + 1) * 1000).is_empty());
        }
    }
}
