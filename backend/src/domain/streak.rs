//! Consecutive-day submission streaks.

use chrono::NaiveDate;

/// A user's streak as of their latest submission.
///
/// ## Invariants
/// - `current == (end - start).num_days() + 1`, and so `current >= 1`.
/// - `max` never decreases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Streak {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub current: u32,
    pub max: u32,
}

impl Streak {
    /// First submission ever.
    pub const fn begin(today: NaiveDate) -> Self {
        Self {
            start: today,
            end: today,
            current: 1,
            max: 1,
        }
    }

    /// Fold one submission made on `today` into an optional prior streak.
    pub fn advance(prior: Option<Self>, today: NaiveDate) -> Self {
        prior.map_or_else(|| Self::begin(today), |streak| streak.record_submission(today))
    }

    /// Apply a submission on `today`.
    ///
    /// Same day keeps the length; the day after extends it; anything else
    /// starts over at one, carrying the broken streak into `max`.
    #[must_use]
    pub fn record_submission(self, today: NaiveDate) -> Self {
        if self.end == today {
            return Self { end: today, ..self };
        }
        let max = self.max.max(self.current);
        if today.pred_opt() == Some(self.end) {
            return Self {
                end: today,
                current: span_days(self.start, today),
                max,
                ..self
            };
        }
        Self {
            start: today,
            end: today,
            current: 1,
            max,
        }
    }
}

fn span_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let days = end.signed_duration_since(start).num_days().saturating_add(1);
    u32::try_from(days).unwrap_or(1).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn day_one() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 27).expect("valid date")
    }

    fn plus(day: NaiveDate, days: u64) -> NaiveDate {
        day.checked_add_days(chrono::Days::new(days)).expect("in range")
    }

    #[rstest]
    fn first_submission_starts_at_one(day_one: NaiveDate) {
        assert_eq!(Streak::advance(None, day_one), Streak::begin(day_one));
    }

    #[rstest]
    fn consecutive_day_extends(day_one: NaiveDate) {
        let next = Streak::advance(Some(Streak::begin(day_one)), plus(day_one, 1));
        assert_eq!(next.current, 2);
        assert_eq!(next.start, day_one);
        assert_eq!(next.end, plus(day_one, 1));
    }

    #[rstest]
    fn same_day_is_a_no_op(day_one: NaiveDate) {
        let streak = Streak::begin(day_one).record_submission(plus(day_one, 1));
        assert_eq!(streak.record_submission(plus(day_one, 1)), streak);
    }

    #[rstest]
    fn extension_crosses_month_and_leap_day(day_one: NaiveDate) {
        let streak = (1..=4).fold(Streak::begin(day_one), |streak, offset| {
            streak.record_submission(plus(day_one, offset))
        });
        assert_eq!(streak.current, 5);
        assert_eq!(streak.end, NaiveDate::from_ymd_opt(2024, 3, 2).expect("valid"));
    }

    #[rstest]
    fn gap_resets_and_keeps_longest(day_one: NaiveDate) {
        let three_days = (1..=2).fold(Streak::begin(day_one), |streak, offset| {
            streak.record_submission(plus(day_one, offset))
        });
        let reset = three_days.record_submission(plus(day_one, 4));
        assert_eq!(reset.current, 1);
        assert_eq!(reset.start, plus(day_one, 4));
        assert_eq!(reset.end, plus(day_one, 4));
        assert_eq!(reset.max, 3);
    }

    #[rstest]
    fn reset_never_lowers_max(day_one: NaiveDate) {
        let streak = Streak {
            start: day_one,
            end: day_one,
            current: 1,
            max: 9,
        };
        assert_eq!(streak.record_submission(plus(day_one, 2)).max, 9);
    }

    #[rstest]
    fn max_lags_the_running_streak_until_it_breaks(day_one: NaiveDate) {
        let streak = Streak::begin(day_one)
            .record_submission(plus(day_one, 1))
            .record_submission(plus(day_one, 2));
        assert_eq!(streak.current, 3);
        assert_eq!(streak.max, 2);
    }

    #[rstest]
    fn current_matches_span(day_one: NaiveDate) {
        let streak = (1..=6).fold(Streak::begin(day_one), |streak, offset| {
            streak.record_submission(plus(day_one, offset))
        });
        assert_eq!(
            i64::from(streak.current),
            (streak.end - streak.start).num_days() + 1
        );
    }
}
