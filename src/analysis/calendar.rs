//! "Now" seen through a fixed UTC offset.
//!
//! Day boundaries, calendar-day equality and hour-of-day all go through here
//! so that the aggregator and post-processing agree on what "today" means.

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveTime, Timelike, Utc, Weekday};

#[derive(Debug, Clone, Copy)]
pub struct LocalCalendar {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

impl LocalCalendar {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self { now, offset }
    }

    pub fn today(&self) -> NaiveDate {
        self.local_date(self.now)
    }

    pub fn tomorrow(&self) -> NaiveDate {
        self.today() + Days::new(1)
    }

    pub fn start_of_today(&self) -> DateTime<Utc> {
        self.start_of(self.today())
    }

    /// Local midnight of `date` as a UTC instant.
    pub fn start_of(&self, date: NaiveDate) -> DateTime<Utc> {
        (date.and_time(NaiveTime::MIN) - self.offset).and_utc()
    }

    /// Sunday of the current week.
    pub fn start_of_week_date(&self) -> NaiveDate {
        let today = self.today();
        today - Days::new(u64::from(today.weekday().num_days_from_sunday()))
    }

    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    pub fn local_hour(&self, instant: DateTime<Utc>) -> u32 {
        instant.with_timezone(&self.offset).hour()
    }
}

/// The first `target` on or after `from`.
///
/// With `allow_today == false` a `from` that already is `target` rolls a full
/// week forward, so the result is always strictly in the future.
pub fn next_weekday(from: NaiveDate, target: Weekday, allow_today: bool) -> NaiveDate {
    let ahead = (7 + target.num_days_from_sunday() - from.weekday().num_days_from_sunday()) % 7;
    let ahead = if ahead == 0 && !allow_today { 7 } else { ahead };
    from + Days::new(u64::from(ahead))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn next_friday_from_every_weekday() {
        // 2024-06-09 is a Sunday
        let expected = [
            (date(2024, 6, 9), date(2024, 6, 14)),
            (date(2024, 6, 10), date(2024, 6, 14)),
            (date(2024, 6, 11), date(2024, 6, 14)),
            (date(2024, 6, 12), date(2024, 6, 14)),
            (date(2024, 6, 13), date(2024, 6, 14)),
            (date(2024, 6, 14), date(2024, 6, 21)),
            (date(2024, 6, 15), date(2024, 6, 21)),
        ];
        for (from, friday) in expected {
            assert_eq!(next_weekday(from, Weekday::Fri, false), friday, "from {from}");
        }
    }

    #[test]
    fn next_monday_from_every_weekday() {
        let expected = [
            (date(2024, 6, 9), date(2024, 6, 10)),
            (date(2024, 6, 10), date(2024, 6, 17)),
            (date(2024, 6, 11), date(2024, 6, 17)),
            (date(2024, 6, 12), date(2024, 6, 17)),
            (date(2024, 6, 13), date(2024, 6, 17)),
            (date(2024, 6, 14), date(2024, 6, 17)),
            (date(2024, 6, 15), date(2024, 6, 17)),
        ];
        for (from, monday) in expected {
            assert_eq!(next_weekday(from, Weekday::Mon, false), monday, "from {from}");
        }
    }

    #[test]
    fn allow_today_keeps_same_day() {
        assert_eq!(next_weekday(date(2024, 6, 14), Weekday::Fri, true), date(2024, 6, 14));
        assert_eq!(next_weekday(date(2024, 6, 13), Weekday::Fri, true), date(2024, 6, 14));
    }

    #[test]
    fn day_boundaries_follow_the_offset() {
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        let cal = LocalCalendar::new(Utc.with_ymd_and_hms(2024, 6, 10, 23, 30, 0).unwrap(), kst);

        assert_eq!(cal.today(), date(2024, 6, 11));
        assert_eq!(cal.tomorrow(), date(2024, 6, 12));
        assert_eq!(
            cal.start_of_today(),
            Utc.with_ymd_and_hms(2024, 6, 10, 15, 0, 0).unwrap()
        );
        assert_eq!(cal.local_hour(Utc.with_ymd_and_hms(2024, 6, 10, 23, 30, 0).unwrap()), 8);
        // Tuesday -> Sunday before
        assert_eq!(cal.start_of_week_date(), date(2024, 6, 9));
    }
}
