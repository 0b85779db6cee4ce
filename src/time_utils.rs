use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;

/// Long-form date in fixed English presentation, e.g. "Sunday, March 10, 2024".
pub const DATE_FORMAT: &str = "%A, %B %-d, %Y";

/// Where a zone's calendar date sits relative to the viewer's own date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDay {
    Today,
    Tomorrow,
    Yesterday,
}

impl RelativeDay {
    /// Only offsets of -1, 0 and 1 day get a label.
    pub fn from_offset(days: i64) -> Option<Self> {
        match days {
            0 => Some(RelativeDay::Today),
            1 => Some(RelativeDay::Tomorrow),
            -1 => Some(RelativeDay::Yesterday),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RelativeDay::Today => "today",
            RelativeDay::Tomorrow => "tomorrow",
            RelativeDay::Yesterday => "yesterday",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            RelativeDay::Today => "Same day as you",
            RelativeDay::Tomorrow => "Tomorrow for you",
            RelativeDay::Yesterday => "Yesterday for you",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSnapshot {
    pub hours: String,
    pub minutes: String,
    pub seconds: String,
    pub meridiem: &'static str,
    pub date_label: String,
    pub relative_day: Option<RelativeDay>,
}

impl TimeSnapshot {
    pub fn time_string(&self) -> String {
        format!("{}:{}:{} {}", self.hours, self.minutes, self.seconds, self.meridiem)
    }
}

/// Render `instant` as wall-clock time in `tz` and label its calendar date
/// against `viewer_date`.
///
/// The day offset is a plain `NaiveDate` difference, so a DST shift in either
/// zone never turns into a fractional day.
pub fn compute_snapshot(tz: &Tz, instant: DateTime<Utc>, viewer_date: NaiveDate) -> TimeSnapshot {
    let local = instant.with_timezone(tz);
    let hour = local.hour();
    let hour12 = if hour == 0 { 12 } else if hour > 12 { hour - 12 } else { hour };
    let offset = local.date_naive().signed_duration_since(viewer_date).num_days();

    TimeSnapshot {
        hours: format!("{:02}", hour12),
        minutes: format!("{:02}", local.minute()),
        seconds: format!("{:02}", local.second()),
        meridiem: if hour >= 12 { "PM" } else { "AM" },
        date_label: local.format(DATE_FORMAT).to_string(),
        relative_day: RelativeDay::from_offset(offset),
    }
}

/// Snapshot for the real current instant, measured against the viewer's
/// local date at that same instant.
pub fn current_snapshot(tz: &Tz) -> TimeSnapshot {
    let now = Utc::now();
    let viewer_date = now.with_timezone(&chrono::Local).date_naive();
    compute_snapshot(tz, now, viewer_date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::{America, Asia, Australia, Pacific};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn same_inputs_give_identical_snapshots() {
        let instant = utc(2024, 6, 1, 12, 34, 56);
        let a = compute_snapshot(&Australia::Brisbane, instant, date(2024, 6, 1));
        let b = compute_snapshot(&Australia::Brisbane, instant, date(2024, 6, 1));
        assert_eq!(a, b);
    }

    #[test]
    fn los_angeles_on_spring_forward_morning() {
        // 10:00Z is the instant PST (UTC-8) becomes PDT (UTC-7).
        let snap = compute_snapshot(&America::Los_Angeles, utc(2024, 3, 10, 10, 0, 0), date(2024, 3, 10));
        assert_eq!(snap.hours, "03");
        assert_eq!(snap.minutes, "00");
        assert_eq!(snap.seconds, "00");
        assert_eq!(snap.meridiem, "AM");
        assert_eq!(snap.time_string(), "03:00:00 AM");
        assert_eq!(snap.date_label, "Sunday, March 10, 2024");
        assert_eq!(snap.relative_day, Some(RelativeDay::Today));
    }

    #[test]
    fn dst_transition_does_not_shift_relative_day() {
        let viewer = date(2024, 3, 10);
        let before = compute_snapshot(&America::Los_Angeles, utc(2024, 3, 10, 9, 59, 59), viewer);
        let after = compute_snapshot(&America::Los_Angeles, utc(2024, 3, 10, 10, 0, 1), viewer);
        assert_eq!(before.time_string(), "01:59:59 AM");
        assert_eq!(after.time_string(), "03:00:01 AM");
        assert_eq!(before.relative_day, Some(RelativeDay::Today));
        assert_eq!(after.relative_day, Some(RelativeDay::Today));

        // Late on the 10th PDT is still the 10th; PST would have said the same.
        let late = compute_snapshot(&America::Los_Angeles, utc(2024, 3, 11, 6, 59, 0), viewer);
        assert_eq!(late.time_string(), "11:59:00 PM");
        assert_eq!(late.relative_day, Some(RelativeDay::Today));
    }

    #[test]
    fn relative_day_follows_zone_calendar_date() {
        // 2024-01-15T20:00Z is already the 16th in Brisbane (UTC+10)
        // and still the 15th in Los Angeles (UTC-8).
        let instant = utc(2024, 1, 15, 20, 0, 0);
        let brisbane = compute_snapshot(&Australia::Brisbane, instant, date(2024, 1, 15));
        assert_eq!(brisbane.relative_day, Some(RelativeDay::Tomorrow));
        assert_eq!(brisbane.date_label, "Tuesday, January 16, 2024");
        assert_eq!(brisbane.time_string(), "06:00:00 AM");

        let reno = compute_snapshot(&America::Los_Angeles, instant, date(2024, 1, 16));
        assert_eq!(reno.relative_day, Some(RelativeDay::Yesterday));
        assert_eq!(reno.time_string(), "12:00:00 PM");
    }

    #[test]
    fn offsets_beyond_one_day_get_no_label() {
        // Kiritimati is UTC+14, Pago Pago UTC-11.
        let instant = utc(2024, 5, 1, 11, 30, 0);
        let kiritimati = compute_snapshot(&Pacific::Kiritimati, instant, date(2024, 4, 30));
        assert_eq!(kiritimati.relative_day, None);
        let pago = compute_snapshot(&Pacific::Pago_Pago, instant, date(2024, 5, 3));
        assert_eq!(pago.relative_day, None);
        let far = compute_snapshot(&Asia::Tokyo, instant, date(2023, 5, 1));
        assert_eq!(far.relative_day, None);
    }

    #[test]
    fn midnight_and_noon_use_twelve() {
        let midnight = compute_snapshot(&chrono_tz::UTC, utc(2024, 2, 29, 0, 5, 9), date(2024, 2, 29));
        assert_eq!(midnight.time_string(), "12:05:09 AM");
        assert_eq!(midnight.date_label, "Thursday, February 29, 2024");
        let noon = compute_snapshot(&chrono_tz::UTC, utc(2024, 2, 29, 12, 0, 0), date(2024, 2, 29));
        assert_eq!(noon.time_string(), "12:00:00 PM");
    }

    #[test]
    fn offset_mapping_covers_every_label() {
        assert_eq!(RelativeDay::from_offset(0), Some(RelativeDay::Today));
        assert_eq!(RelativeDay::from_offset(1), Some(RelativeDay::Tomorrow));
        assert_eq!(RelativeDay::from_offset(-1), Some(RelativeDay::Yesterday));
        assert_eq!(RelativeDay::from_offset(2), None);
        assert_eq!(RelativeDay::from_offset(-2), None);
        assert_eq!(RelativeDay::Tomorrow.badge(), "Tomorrow for you");
        assert_eq!(RelativeDay::Yesterday.as_str(), "yesterday");
    }
}
