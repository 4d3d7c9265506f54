//! Relative-date anchors embedded in the parsing prompt.
//!
//! Anchors are always computed in Korea Standard Time (UTC+9) regardless of
//! the server's reporting offset, and rendered as `<date>T<hh>:00:00.000Z`:
//! the calendar date is the KST one while the suffix stays a literal `Z`.

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Utc, Weekday};

use super::calendar::next_weekday;
use crate::domain::vocabulary::{RelativeDay, TimeOfDay};

const KST_OFFSET_HOURS: i64 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateAnchors {
    pub today: NaiveDate,
    pub tomorrow: NaiveDate,
    pub day_after_tomorrow: NaiveDate,
    pub this_friday: NaiveDate,
    pub next_monday: NaiveDate,
}

impl DateAnchors {
    pub fn at(now: DateTime<Utc>) -> Self {
        let today = (now + Duration::hours(KST_OFFSET_HOURS)).date_naive();

        Self {
            today,
            tomorrow: today + Days::new(1),
            day_after_tomorrow: today + Days::new(2),
            this_friday: next_weekday(today, Weekday::Fri, false),
            next_monday: next_weekday(today, Weekday::Mon, false),
        }
    }

    pub fn date_of(&self, day: RelativeDay) -> NaiveDate {
        match day {
            RelativeDay::Today => self.today,
            RelativeDay::Tomorrow => self.tomorrow,
            RelativeDay::DayAfterTomorrow => self.day_after_tomorrow,
            RelativeDay::ThisFriday => self.this_friday,
            RelativeDay::NextMonday => self.next_monday,
        }
    }

    /// Timestamp the model should emit for `day` at `hour`.
    pub fn timestamp(&self, day: RelativeDay, hour: u32) -> String {
        format!("{}T{:02}:00:00.000Z", self.date_of(day).format("%Y-%m-%d"), hour)
    }

    /// Timestamp for `day` at a named time of day, or the default hour.
    pub fn resolve(&self, day: RelativeDay, time: Option<TimeOfDay>) -> String {
        self.timestamp(day, time.map(|t| t.hour()).unwrap_or(TimeOfDay::DEFAULT_HOUR))
    }

    pub fn weekday_name(&self) -> &'static str {
        korean_weekday(self.today.weekday())
    }
}

pub fn korean_weekday(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "월요일",
        Weekday::Tue => "화요일",
        Weekday::Wed => "수요일",
        Weekday::Thu => "목요일",
        Weekday::Fri => "금요일",
        Weekday::Sat => "토요일",
        Weekday::Sun => "일요일",
    }
}
