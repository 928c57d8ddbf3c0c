use crate::{Error, Result};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One calendar day's usage in the quota store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    pub date: NaiveDate,
    pub count: u32,
}

/// Enforces the per-day action cap against a date-keyed CSV store.
///
/// The store on disk is the single source of truth: it is loaded at
/// startup and rewritten after every successful reservation, so a
/// restarted process resumes from the persisted count. Previous days'
/// rows are kept for inspection; a day rollover starts the new day at
/// zero and never carries unspent quota forward.
///
/// Single-process design: concurrent processes sharing the same store
/// are not coordinated.
pub struct QuotaTracker {
    path: PathBuf,
    limit: u32,
    today: QuotaState,
    history: Vec<QuotaState>,
}

impl QuotaTracker {
    /// Open (or initialize) the quota store at `path` with the given
    /// daily limit.
    pub fn open(path: impl Into<PathBuf>, limit: u32) -> Result<Self> {
        if limit == 0 {
            return Err(Error::Config(
                "daily limit must be a positive integer".to_string(),
            ));
        }

        let path = path.into();
        let mut history = Vec::new();

        if path.exists() {
            let mut reader = csv::Reader::from_path(&path)?;
            for row in reader.deserialize::<QuotaState>() {
                history.push(row?);
            }
        }

        let today_date = Local::now().date_naive();
        let today = history
            .iter()
            .find(|state| state.date == today_date)
            .cloned()
            .unwrap_or(QuotaState {
                date: today_date,
                count: 0,
            });
        history.retain(|state| state.date != today_date);

        tracing::debug!(
            "Quota store loaded: {}/{} used for {}",
            today.count,
            limit,
            today.date
        );

        Ok(Self {
            path,
            limit,
            today,
            history,
        })
    }

    /// Try to reserve one action for today.
    ///
    /// On permit the count is incremented and persisted before returning,
    /// so a crash immediately afterwards can only over-count by the
    /// reservation just made. Returns false without touching the store
    /// once the limit is reached.
    pub fn try_reserve(&mut self) -> Result<bool> {
        self.roll_over_if_needed();

        if self.today.count >= self.limit {
            tracing::warn!(
                "Daily action limit reached ({}/{})",
                self.today.count,
                self.limit
            );
            return Ok(false);
        }

        self.today.count += 1;
        self.persist()?;

        tracing::debug!("Reserved action {}/{}", self.today.count, self.limit);
        Ok(true)
    }

    /// Actions already counted for the current calendar day.
    pub fn used_today(&self) -> u32 {
        if self.today.date == Local::now().date_naive() {
            self.today.count
        } else {
            // Day rolled over since the last reservation; nothing spent yet.
            0
        }
    }

    /// Actions still permitted today.
    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used_today())
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    fn roll_over_if_needed(&mut self) {
        let now = Local::now().date_naive();
        if self.today.date != now {
            tracing::info!("Day rolled over to {}, quota reset", now);
            let finished = std::mem::replace(
                &mut self.today,
                QuotaState {
                    date: now,
                    count: 0,
                },
            );
            self.history.push(finished);
        }
    }

    fn persist(&self) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.path)?;
        for state in &self.history {
            writer.serialize(state)?;
        }
        writer.serialize(&self.today)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn store_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("quota.csv")
    }

    #[test]
    fn test_permits_never_exceed_limit() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = QuotaTracker::open(store_path(&dir), 3).unwrap();

        let permits: Vec<bool> = (0..5).map(|_| tracker.try_reserve().unwrap()).collect();

        assert_eq!(permits, vec![true, true, true, false, false]);
        assert_eq!(tracker.used_today(), 3);
        assert_eq!(tracker.remaining(), 0);
    }

    #[test]
    fn test_count_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);

        {
            let mut tracker = QuotaTracker::open(&path, 5).unwrap();
            assert!(tracker.try_reserve().unwrap());
        }

        // Simulates a restart after the record step: the persisted count
        // must be 1, not 0 and not 2.
        let tracker = QuotaTracker::open(&path, 5).unwrap();
        assert_eq!(tracker.used_today(), 1);
        assert_eq!(tracker.remaining(), 4);
    }

    #[test]
    fn test_new_day_starts_at_zero_even_when_yesterday_was_full() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);

        let yesterday = Local::now().date_naive() - ChronoDuration::days(1);
        let mut writer = csv::Writer::from_path(&path).unwrap();
        writer
            .serialize(QuotaState {
                date: yesterday,
                count: 2,
            })
            .unwrap();
        writer.flush().unwrap();

        let mut tracker = QuotaTracker::open(&path, 2).unwrap();
        assert_eq!(tracker.used_today(), 0);
        assert!(tracker.try_reserve().unwrap());
        assert_eq!(tracker.used_today(), 1);
    }

    #[test]
    fn test_history_rows_are_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = store_path(&dir);

        let yesterday = Local::now().date_naive() - ChronoDuration::days(1);
        let mut writer = csv::Writer::from_path(&path).unwrap();
        writer
            .serialize(QuotaState {
                date: yesterday,
                count: 7,
            })
            .unwrap();
        writer.flush().unwrap();

        {
            let mut tracker = QuotaTracker::open(&path, 10).unwrap();
            assert!(tracker.try_reserve().unwrap());
        }

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<QuotaState> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert!(rows.contains(&QuotaState {
            date: yesterday,
            count: 7
        }));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(QuotaTracker::open(store_path(&dir), 0).is_err());
    }
}
