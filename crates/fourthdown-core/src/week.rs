// NFL week windows.
//
// A week runs from Tuesday 08:00 UTC to the next Tuesday 08:00 UTC, so
// every Thursday, Sunday and Monday night game of week N (Monday night kicks
// off after midnight UTC) falls inside window N.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Hour (UTC) on Tuesday at which one week rolls over to the next.
const ROLLOVER_HOUR: i64 = 8;

fn opener(season_start: NaiveDate) -> DateTime<Utc> {
    season_start.and_time(NaiveTime::MIN).and_utc() + Duration::hours(ROLLOVER_HOUR)
}

/// One scoring week and the UTC interval its games kick off in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekWindow {
    pub week: u32,
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end.
    pub end: DateTime<Utc>,
}

impl WeekWindow {
    /// Window for `week` (1-based) given the Tuesday that opens week 1.
    pub fn for_week(season_start: NaiveDate, week: u32) -> Self {
        let offset = Duration::days(7 * i64::from(week.saturating_sub(1)));
        let start = opener(season_start) + offset;
        WeekWindow {
            week,
            start,
            end: start + Duration::days(7),
        }
    }

    /// The week whose window contains `now`. Dates before the season opener
    /// resolve to week 1.
    pub fn containing(season_start: NaiveDate, now: DateTime<Utc>) -> Self {
        let elapsed = now - opener(season_start);
        let elapsed_days = elapsed.num_days();
        let week = if elapsed < Duration::zero() {
            1
        } else {
            (elapsed_days / 7) as u32 + 1
        };
        Self::for_week(season_start, week)
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}
