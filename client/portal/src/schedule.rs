//! Persisted next-refresh target and the countdown derived from it.

use chrono::{DateTime, Utc};
use std::{fmt, time::Duration};

use crate::store::{PreferenceStore, NEXT_UPDATE_KEY};

pub const UPDATING_LABEL: &str = "Обновление...";

/// Writes `now + interval` as the next refresh target and returns it in
/// epoch milliseconds.
pub fn reset_schedule(store: &dyn PreferenceStore, now: DateTime<Utc>, interval: Duration) -> i64 {
    let next = now.timestamp_millis() + interval.as_millis() as i64;
    if let Err(err) = store.set(NEXT_UPDATE_KEY, &next.to_string()) {
        tracing::warn!(error = %err, "failed to persist refresh schedule");
    }
    next
}

pub fn next_refresh_at(store: &dyn PreferenceStore) -> Option<i64> {
    store
        .get(NEXT_UPDATE_KEY)
        .and_then(|value| value.trim().parse::<i64>().ok())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Remaining { minutes: i64, seconds: i64 },
    /// Target absent, unreadable or already passed.
    Updating,
}

impl Countdown {
    pub fn compute(next_refresh_ms: Option<i64>, now: DateTime<Utc>) -> Self {
        let Some(next) = next_refresh_ms else {
            return Countdown::Updating;
        };
        let left = next - now.timestamp_millis();
        if left <= 0 {
            return Countdown::Updating;
        }
        Countdown::Remaining {
            minutes: left / 60_000,
            seconds: (left % 60_000) / 1000,
        }
    }

    pub fn read(store: &dyn PreferenceStore, now: DateTime<Utc>) -> Self {
        Self::compute(next_refresh_at(store), now)
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Countdown::Remaining { minutes, seconds } => {
                write!(f, "Следующее обновление через {minutes}:{seconds:02}")
            }
            Countdown::Updating => f.write_str(UPDATING_LABEL),
        }
    }
}
