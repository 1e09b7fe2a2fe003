//! Weekly opening schedule and delivery-window checks
//!
//! The schedule is expressed in local wall-clock time in an IANA time zone,
//! so opening hours follow daylight saving changes. Every public method takes
//! and returns UTC instants.

use crate::core::error::OrderError;
use chrono::{DateTime, Datelike, Duration, NaiveDateTime, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Opening hours for one day of the week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub day: Weekday,
    pub open: NaiveTime,
    pub close: NaiveTime,
    #[serde(default)]
    pub closed: bool,
}

impl OpeningHours {
    pub fn new(day: Weekday, open: NaiveTime, close: NaiveTime) -> Self {
        Self {
            day,
            open,
            close,
            closed: false,
        }
    }

    pub fn closed(day: Weekday) -> Self {
        Self {
            day,
            open: NaiveTime::MIN,
            close: NaiveTime::MIN,
            closed: true,
        }
    }

    /// Opening time is inclusive, closing time exclusive
    pub fn contains(&self, time: NaiveTime) -> bool {
        !self.closed && self.open < self.close && time >= self.open && time < self.close
    }

    fn opens(&self) -> bool {
        !self.closed && self.open < self.close
    }
}

/// Weekly schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningSchedule {
    /// Time zone of the business's wall clock, e.g. `Europe/Paris`
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    pub days: Vec<OpeningHours>,
}

fn default_timezone() -> Tz {
    chrono_tz::Europe::Paris
}

impl Default for OpeningSchedule {
    /// Monday to Saturday 09:00–19:00, closed on Sunday
    fn default() -> Self {
        let open = NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN);
        let close = NaiveTime::from_hms_opt(19, 0, 0).unwrap_or(NaiveTime::MIN);
        let mut days: Vec<OpeningHours> = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ]
        .into_iter()
        .map(|day| OpeningHours::new(day, open, close))
        .collect();
        days.push(OpeningHours::closed(Weekday::Sun));

        Self {
            timezone: default_timezone(),
            days,
        }
    }
}

impl OpeningSchedule {
    /// Hours for a weekday; days missing from the schedule are closed
    pub fn hours_for(&self, day: Weekday) -> Option<&OpeningHours> {
        self.days.iter().find(|h| h.day == day)
    }
}

/// Answers "is the business open at T" and "when does it next open"
#[derive(Debug, Clone)]
pub struct OpeningScheduleManager {
    schedule: OpeningSchedule,
    lead_time: Duration,
}

impl OpeningScheduleManager {
    pub fn new(schedule: OpeningSchedule, lead_time: Duration) -> Self {
        Self {
            schedule,
            lead_time,
        }
    }

    pub fn schedule(&self) -> &OpeningSchedule {
        &self.schedule
    }

    pub fn lead_time(&self) -> Duration {
        self.lead_time
    }

    fn to_local(&self, at: DateTime<Utc>) -> NaiveDateTime {
        at.with_timezone(&self.schedule.timezone).naive_local()
    }

    /// Ambiguous times resolve to the earlier instant; times skipped by a
    /// daylight saving jump move one hour forward
    fn to_utc(&self, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        let tz = self.schedule.timezone;
        tz.from_local_datetime(&local)
            .earliest()
            .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn is_open_at(&self, at: DateTime<Utc>) -> bool {
        let local = self.to_local(at);
        self.schedule
            .hours_for(local.weekday())
            .is_some_and(|hours| hours.contains(local.time()))
    }

    /// First instant strictly after the lead time
    pub fn earliest_allowed(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.lead_time + Duration::minutes(1)
    }

    /// Lead time strictly exceeded and the business open at that instant
    pub fn is_valid_delivery_datetime(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        at > now + self.lead_time && self.is_open_at(at)
    }

    /// `at` itself when open, otherwise the next opening within a week
    pub fn next_opening_time(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.is_open_at(at) {
            return Some(at);
        }

        let local = self.to_local(at);
        (0..=7).find_map(|days_ahead| {
            let date = local.date() + Duration::days(days_ahead);
            let hours = self.schedule.hours_for(date.weekday())?;
            if !hours.opens() || (days_ahead == 0 && local.time() >= hours.open) {
                return None;
            }
            self.to_utc(date.and_time(hours.open))
        })
    }

    /// Earliest instant an order placed now could be delivered
    pub fn earliest_delivery(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.next_opening_time(self.earliest_allowed(now))
    }

    /// Reject a delivery time, suggesting the next valid one when there is one
    pub fn check_delivery(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), OrderError> {
        if self.is_valid_delivery_datetime(at, now) {
            return Ok(());
        }

        let reason = if at <= now + self.lead_time {
            format!(
                "deliveries must be booked more than {} hours in advance",
                self.lead_time.num_hours()
            )
        } else {
            "the business is closed at this time".to_string()
        };

        Err(OrderError::InvalidDeliveryWindow {
            requested: at,
            reason,
            next_opening: self.next_opening_time(at.max(self.earliest_allowed(now))),
        })
    }
}
