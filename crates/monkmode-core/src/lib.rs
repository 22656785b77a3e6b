//! # MonkMode Core Library
//!
//! Core business logic for MonkMode, a guided-meditation session timer.
//! CLI-first: all operations are available through the standalone
//! `monkmode-cli` binary, which is a thin layer over this library.
//!
//! ## Architecture
//!
//! - **Session timer**: a wall-clock-based state machine. The caller drives
//!   it with periodic `tick()` calls and invokes `reconcile()` after the host
//!   was suspended; all time accounting is derived from wall-clock deltas,
//!   never from the tick cadence.
//! - **Catalog**: built-in exercises and presets; a preset resolves to the
//!   stage sequence the timer consumes.
//! - **Storage**: SQLite session records plus a kv store, TOML configuration.
//! - **Streaks**: daily practice streak bookkeeping over the kv store.
//!
//! ## Key Components
//!
//! - [`SessionTimer`]: core timer state machine
//! - [`Catalog`]: exercise/preset data
//! - [`Database`]: session and statistics persistence
//! - [`Config`]: application configuration
//! - [`Streaks`]: daily streak tracking

pub mod catalog;
pub mod error;
pub mod events;
pub mod storage;
pub mod streaks;
pub mod timer;

pub use catalog::{Catalog, Exercise, Preset};
pub use error::{CatalogError, ConfigError, CoreError, StorageError, TimerError};
pub use events::Event;
pub use storage::{Config, Database, SessionRecord, Stats};
pub use streaks::Streaks;
pub use timer::{SessionTimer, StageDefinition, TimerPhase, TimerSnapshot};
