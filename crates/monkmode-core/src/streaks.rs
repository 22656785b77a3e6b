//! Daily practice streak bookkeeping.
//!
//! A day is credited the first time a session starts on it. Consecutive
//! credited days grow the current streak; a gap resets it. Consumes timer
//! output at the caller's discretion -- the timer itself knows nothing about
//! streaks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage::Database;

const STREAKS_KEY: &str = "streaks";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streaks {
    pub last_credited_date: Option<NaiveDate>,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_days: u32,
}

impl Streaks {
    /// Credit a practice day. Returns `true` if the day was newly credited;
    /// a second session on an already-credited day is a no-op.
    pub fn credit(&mut self, date: NaiveDate) -> bool {
        match self.last_credited_date {
            Some(last) if last == date => false,
            Some(last) if last.succ_opt() == Some(date) => {
                self.current_streak += 1;
                self.longest_streak = self.longest_streak.max(self.current_streak);
                self.total_days += 1;
                self.last_credited_date = Some(date);
                true
            }
            _ => {
                // First ever day, or the streak broke.
                self.current_streak = 1;
                self.longest_streak = self.longest_streak.max(1);
                self.total_days += 1;
                self.last_credited_date = Some(date);
                true
            }
        }
    }

    /// Whether practicing on `today` keeps (or starts) the streak.
    pub fn would_maintain(&self, today: NaiveDate) -> bool {
        match self.last_credited_date {
            None => true,
            Some(last) => last == today || last.succ_opt() == Some(today),
        }
    }

    /// Load from the kv store, defaulting to empty streaks.
    pub fn load(db: &Database) -> Result<Self, StorageError> {
        match db.kv_get(STREAKS_KEY)? {
            Some(json) => {
                serde_json::from_str(&json).map_err(|e| StorageError::QueryFailed(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Persist to the kv store.
    pub fn save(&self, db: &Database) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(self).map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        db.kv_set(STREAKS_KEY, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn first_day_starts_the_streak() {
        let mut streaks = Streaks::default();
        assert!(streaks.credit(date("2026-08-01")));
        assert_eq!(streaks.current_streak, 1);
        assert_eq!(streaks.longest_streak, 1);
        assert_eq!(streaks.total_days, 1);
    }

    #[test]
    fn same_day_is_not_credited_twice() {
        let mut streaks = Streaks::default();
        assert!(streaks.credit(date("2026-08-01")));
        assert!(!streaks.credit(date("2026-08-01")));
        assert_eq!(streaks.total_days, 1);
        assert_eq!(streaks.current_streak, 1);
    }

    #[test]
    fn consecutive_days_grow_the_streak() {
        let mut streaks = Streaks::default();
        streaks.credit(date("2026-08-01"));
        streaks.credit(date("2026-08-02"));
        streaks.credit(date("2026-08-03"));
        assert_eq!(streaks.current_streak, 3);
        assert_eq!(streaks.longest_streak, 3);
        assert_eq!(streaks.total_days, 3);
    }

    #[test]
    fn a_gap_resets_but_keeps_the_longest() {
        let mut streaks = Streaks::default();
        streaks.credit(date("2026-08-01"));
        streaks.credit(date("2026-08-02"));
        streaks.credit(date("2026-08-03"));
        streaks.credit(date("2026-08-07"));
        assert_eq!(streaks.current_streak, 1);
        assert_eq!(streaks.longest_streak, 3);
        assert_eq!(streaks.total_days, 4);
    }

    #[test]
    fn crosses_month_boundaries() {
        let mut streaks = Streaks::default();
        streaks.credit(date("2026-08-31"));
        streaks.credit(date("2026-09-01"));
        assert_eq!(streaks.current_streak, 2);
    }

    #[test]
    fn would_maintain() {
        let mut streaks = Streaks::default();
        assert!(streaks.would_maintain(date("2026-08-05")));
        streaks.credit(date("2026-08-05"));
        assert!(streaks.would_maintain(date("2026-08-05")));
        assert!(streaks.would_maintain(date("2026-08-06")));
        assert!(!streaks.would_maintain(date("2026-08-08")));
    }

    #[test]
    fn persists_through_the_kv_store() {
        let db = Database::open_memory().unwrap();
        let mut streaks = Streaks::load(&db).unwrap();
        assert_eq!(streaks, Streaks::default());
        streaks.credit(date("2026-08-01"));
        streaks.save(&db).unwrap();
        assert_eq!(Streaks::load(&db).unwrap(), streaks);
    }
}
