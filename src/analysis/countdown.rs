use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

/// Time left until `release_at`, or `None` once it has passed. `now` is
/// always supplied by the caller.
pub fn countdown(release_at: DateTime<FixedOffset>, now: DateTime<Utc>) -> Option<Countdown> {
    let remaining = release_at.with_timezone(&Utc) - now;
    if remaining <= chrono::Duration::zero() {
        return None;
    }

    let total_minutes = remaining.num_minutes();
    Some(Countdown {
        days: total_minutes / (24 * 60),
        hours: (total_minutes / 60) % 24,
        minutes: total_minutes % 60,
    })
}
