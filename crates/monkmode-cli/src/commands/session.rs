//! Session control.
//!
//! The timer is parked in the kv store between invocations. Every
//! state-reading command reconciles the wall-clock gap since the last
//! invocation first, so a session keeps correct time no matter how long the
//! process was gone -- the CLI equivalent of the mobile app returning to the
//! foreground.

use std::io::Write;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use monkmode_core::{Catalog, Config, Database, Event, SessionRecord, SessionTimer, Streaks};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SESSION_KEY: &str = "active_session";

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a session from a preset
    Start {
        /// Preset id (defaults to the configured default_preset)
        #[arg(long)]
        preset: Option<String>,
    },
    /// Reconcile against the wall clock and print current state
    Status,
    /// Pause the running session
    Pause,
    /// Resume a paused session
    Resume,
    /// Skip to the next exercise
    Skip,
    /// Abandon the session without completing it
    Cancel,
}

/// The timer plus the bookkeeping needed to write a session record when it
/// ends.
#[derive(Serialize, Deserialize)]
struct ActiveSession {
    id: String,
    preset_id: String,
    started_at: DateTime<Utc>,
    timer: SessionTimer,
}

fn load_active(db: &Database) -> Option<ActiveSession> {
    let json = db.kv_get(SESSION_KEY).ok()??;
    serde_json::from_str(&json).ok()
}

fn require_active(db: &Database) -> Result<ActiveSession, Box<dyn std::error::Error>> {
    load_active(db).ok_or_else(|| "no active session (run `session start`)".into())
}

/// Park the timer, or clear it once the session is over.
fn persist(db: &Database, active: &ActiveSession) -> Result<(), Box<dyn std::error::Error>> {
    if active.timer.is_finished() {
        db.kv_delete(SESSION_KEY)?;
    } else {
        db.kv_set(SESSION_KEY, &serde_json::to_string(active)?)?;
    }
    Ok(())
}

/// Transition chime. Fire-and-forget: a failed cue never halts the session.
fn chime(config: &Config) {
    if config.sound.enabled {
        print!("\x07");
        let _ = std::io::stdout().flush();
    }
}

/// Print each event and run its side effects, in the order the timer emitted
/// them: the chime fires before the advanced state is shown.
fn dispatch(
    db: &Database,
    config: &Config,
    active: &ActiveSession,
    events: &[Event],
) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        match event {
            Event::StageCompleted { .. } => chime(config),
            Event::SessionCompleted {
                total_elapsed_sec,
                total_stages,
                ..
            } => {
                db.record_session(&SessionRecord {
                    id: active.id.clone(),
                    preset_id: active.preset_id.clone(),
                    started_at: active.started_at,
                    ended_at: Some(Utc::now()),
                    completed_stages: *total_stages as u64,
                    total_stages: *total_stages as u64,
                    elapsed_sec: *total_elapsed_sec,
                })?;
            }
            Event::StateUpdated { .. } => {}
        }
        println!("{}", serde_json::to_string_pretty(event)?);
    }
    Ok(())
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load()?;

    match action {
        SessionAction::Start { preset } => {
            if let Some(existing) = load_active(&db) {
                if !existing.timer.is_finished() {
                    return Err("a session is already in progress (cancel it first)".into());
                }
            }

            let preset_id = preset.unwrap_or_else(|| config.default_preset.clone());
            // Resolve before constructing the timer: an unknown or broken
            // preset declines the session up front.
            let stages = Catalog::builtin().stages(&preset_id)?;
            let mut timer = SessionTimer::new(stages)?;
            let events = timer.start();

            let active = ActiveSession {
                id: Uuid::new_v4().to_string(),
                preset_id,
                started_at: Utc::now(),
                timer,
            };

            // A session that begins today counts toward the daily streak.
            let mut streaks = Streaks::load(&db)?;
            if streaks.credit(Utc::now().date_naive()) {
                streaks.save(&db)?;
            }

            dispatch(&db, &config, &active, &events)?;
            persist(&db, &active)?;
        }
        SessionAction::Status => {
            let mut active = require_active(&db)?;
            let events = active.timer.reconcile();
            dispatch(&db, &config, &active, &events)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&active.timer.snapshot())?
            );
            persist(&db, &active)?;
        }
        SessionAction::Pause => {
            let mut active = require_active(&db)?;
            let events = active.timer.reconcile();
            dispatch(&db, &config, &active, &events)?;
            let events = active.timer.pause();
            dispatch(&db, &config, &active, &events)?;
            persist(&db, &active)?;
        }
        SessionAction::Resume => {
            let mut active = require_active(&db)?;
            let events = active.timer.resume();
            dispatch(&db, &config, &active, &events)?;
            persist(&db, &active)?;
        }
        SessionAction::Skip => {
            let mut active = require_active(&db)?;
            let events = active.timer.reconcile();
            dispatch(&db, &config, &active, &events)?;
            let events = active.timer.skip();
            dispatch(&db, &config, &active, &events)?;
            persist(&db, &active)?;
        }
        SessionAction::Cancel => {
            let mut active = require_active(&db)?;
            // Account for wall time up to the cancellation, then stop.
            let events = active.timer.reconcile();
            dispatch(&db, &config, &active, &events)?;
            let snapshot = active.timer.snapshot();
            active.timer.cancel();

            if !snapshot.is_finished {
                // Abandoned session: completed stages are the ones fully
                // traversed before the current index.
                db.record_session(&SessionRecord {
                    id: active.id.clone(),
                    preset_id: active.preset_id.clone(),
                    started_at: active.started_at,
                    ended_at: Some(Utc::now()),
                    completed_stages: snapshot.current_stage_index as u64,
                    total_stages: snapshot.total_stages as u64,
                    elapsed_sec: snapshot.total_elapsed_sec,
                })?;
            }
            db.kv_delete(SESSION_KEY)?;
            println!("session cancelled");
        }
    }
    Ok(())
}
