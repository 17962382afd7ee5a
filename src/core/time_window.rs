use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeWindowError {
    /// Not a "HH:MM" string with hour 0-23 and minute 0-59
    MalformedTime(String),
    /// A time was entered but its date picker is empty
    TimeWithoutDate,
    /// The local time falls into a DST gap
    NonexistentLocalTime(String),
    EndNotAfterStart,
    BeforeEpoch,
}

impl fmt::Display for TimeWindowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindowError::MalformedTime(value) => write!(f, "Invalid time '{}', expected HH:MM", value),
            TimeWindowError::TimeWithoutDate => write!(f, "Select a date before setting the time"),
            TimeWindowError::NonexistentLocalTime(value) => write!(f, "Local time {} does not exist", value),
            TimeWindowError::EndNotAfterStart => write!(f, "Mint end must be after mint start"),
            TimeWindowError::BeforeEpoch => write!(f, "Date is before 1970-01-01"),
        }
    }
}

impl std::error::Error for TimeWindowError {}

fn time_field(text: &str, max: u32) -> Option<u32> {
    if text.is_empty() || text.len() > 2 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<u32>().ok().filter(|value| *value <= max)
}

/// Parse a "HH:MM" time input; seconds are always zero
pub fn parse_time_of_day(text: &str) -> Result<NaiveTime, TimeWindowError> {
    let malformed = || TimeWindowError::MalformedTime(text.to_string());

    let mut parts = text.trim().split(':');
    let (hours, minutes) = match (parts.next(), parts.next(), parts.next()) {
        (Some(hours), Some(minutes), None) => (hours, minutes),
        _ => return Err(malformed()),
    };

    let hours = time_field(hours, 23).ok_or_else(malformed)?;
    let minutes = time_field(minutes, 59).ok_or_else(malformed)?;

    NaiveTime::from_hms_opt(hours, minutes, 0).ok_or_else(malformed)
}

fn at_local_time<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: NaiveTime) -> Result<DateTime<Tz>, TimeWindowError> {
    let naive = date.and_time(time);
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| TimeWindowError::NonexistentLocalTime(naive.to_string()))
}

/// Same calendar day as `base` (in its zone) at the given "HH:MM"
///
/// Returns a new instant; `base` is left untouched.
pub fn with_time_of_day<Tz: TimeZone>(base: &DateTime<Tz>, time: &str) -> Result<DateTime<Tz>, TimeWindowError> {
    let time = parse_time_of_day(time)?;
    at_local_time(&base.timezone(), base.date_naive(), time)
}

/// One date picker plus its time input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateTimeField {
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
}

impl DateTimeField {
    pub fn new(date: Option<NaiveDate>, time: Option<&str>) -> Self {
        let mut field = Self { date, time: None };
        field.set_time(time.unwrap_or_default());
        field
    }

    pub fn set_date(&mut self, date: Option<NaiveDate>) {
        self.date = date;
    }

    /// Empty input clears the time
    pub fn set_time(&mut self, text: &str) {
        let trimmed = text.trim();
        self.time = if trimmed.is_empty() { None } else { Some(trimmed.to_string()) };
    }

    pub fn is_set(&self) -> bool {
        self.date.is_some()
    }

    /// Resolve to an instant in `tz`, midnight when only the date is set
    pub fn resolve<Tz: TimeZone>(&self, tz: &Tz) -> Result<Option<DateTime<Utc>>, TimeWindowError> {
        let date = match (self.date, self.time.as_deref()) {
            (None, None) => return Ok(None),
            (None, Some(_)) => return Err(TimeWindowError::TimeWithoutDate),
            (Some(date), _) => date,
        };

        let time = match self.time.as_deref() {
            Some(text) => parse_time_of_day(text)?,
            None => NaiveTime::MIN,
        };

        at_local_time(tz, date, time).map(|instant| Some(instant.with_timezone(&Utc)))
    }
}

/// Public mint window; an absent end leaves minting open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintWindow {
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
}

impl MintWindow {
    /// Start must not precede the epoch; a present end must be after start
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Result<Self, TimeWindowError> {
        to_unix_seconds(&start)?;
        if let Some(end) = end {
            if end <= start {
                return Err(TimeWindowError::EndNotAfterStart);
            }
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    pub fn start_seconds(&self) -> u64 {
        self.start.timestamp().max(0) as u64
    }

    pub fn end_seconds(&self) -> Option<u64> {
        self.end.map(|end| end.timestamp().max(0) as u64)
    }
}

/// Whole seconds since the epoch, sub-second part dropped
pub fn to_unix_seconds(instant: &DateTime<Utc>) -> Result<u64, TimeWindowError> {
    u64::try_from(instant.timestamp()).map_err(|_| TimeWindowError::BeforeEpoch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, FixedOffset, Timelike};

    fn base() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(2 * 3600).unwrap()
            .with_ymd_and_hms(2026, 10, 17, 23, 41, 17).unwrap()
            + chrono::Duration::milliseconds(250)
    }

    #[test]
    fn merges_every_valid_time_keeping_the_date() {
        let base = base();
        for hour in 0..24 {
            for minute in 0..60 {
                let text = format!("{:02}:{:02}", hour, minute);
                let merged = with_time_of_day(&base, &text).unwrap();
                assert_eq!(merged.date_naive(), base.date_naive());
                assert_eq!((merged.hour(), merged.minute(), merged.second()), (hour, minute, 0));
                assert_eq!(merged.nanosecond(), 0);
            }
        }
    }

    #[test]
    fn base_instant_is_not_modified() {
        let base = base();
        let copy = base;
        let _ = with_time_of_day(&base, "10:00").unwrap();
        assert_eq!(base, copy);
        assert_eq!(base.minute(), 41);
    }

    #[test]
    fn single_digit_fields_are_accepted() {
        let merged = with_time_of_day(&base(), "9:5").unwrap();
        assert_eq!((merged.hour(), merged.minute()), (9, 5));
    }

    #[test]
    fn malformed_times_are_rejected() {
        for text in ["", "10", "10:", ":30", "10:30:00", "24:00", "12:60", "ab:cd", "-1:30", "1 0:30", "+1:30", "100:00"] {
            assert_eq!(
                with_time_of_day(&base(), text),
                Err(TimeWindowError::MalformedTime(text.to_string())),
                "input {:?}",
                text
            );
        }
    }

    #[test]
    fn field_resolution_rules() {
        let tz = Utc;
        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();

        assert_eq!(DateTimeField::default().resolve(&tz), Ok(None));

        let midnight = DateTimeField::new(Some(date), None).resolve(&tz).unwrap().unwrap();
        assert_eq!((midnight.hour(), midnight.minute()), (0, 0));

        let ten = DateTimeField::new(Some(date), Some("10:00")).resolve(&tz).unwrap().unwrap();
        assert_eq!((ten.day(), ten.hour()), (17, 10));

        assert_eq!(
            DateTimeField::new(None, Some("10:00")).resolve(&tz),
            Err(TimeWindowError::TimeWithoutDate)
        );
        assert!(matches!(
            DateTimeField::new(Some(date), Some("10h")).resolve(&tz),
            Err(TimeWindowError::MalformedTime(_))
        ));
    }

    #[test]
    fn field_resolves_in_the_given_zone() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let instant = DateTimeField::new(Some(date), Some("22:30")).resolve(&tz).unwrap().unwrap();
        assert_eq!(instant, Utc.with_ymd_and_hms(2026, 10, 18, 3, 30, 0).unwrap());
    }

    #[test]
    fn blank_time_input_clears_the_time() {
        let mut field = DateTimeField::new(None, Some("10:00"));
        field.set_time("  ");
        assert_eq!(field.time, None);
    }

    #[test]
    fn window_requires_end_after_start() {
        let start = Utc.with_ymd_and_hms(2026, 10, 17, 10, 0, 0).unwrap();
        assert_eq!(MintWindow::new(start, Some(start)), Err(TimeWindowError::EndNotAfterStart));
        assert_eq!(
            MintWindow::new(start, Some(start - chrono::Duration::minutes(1))),
            Err(TimeWindowError::EndNotAfterStart)
        );

        let open = MintWindow::new(start, None).unwrap();
        assert_eq!(open.end_seconds(), None);
        assert_eq!(open.start_seconds(), start.timestamp() as u64);

        let closed = MintWindow::new(start, Some(start + chrono::Duration::days(1))).unwrap();
        assert_eq!(closed.end_seconds(), Some(start.timestamp() as u64 + 86_400));

        let pre_epoch = Utc.with_ymd_and_hms(1969, 7, 20, 20, 17, 0).unwrap();
        assert_eq!(MintWindow::new(pre_epoch, None), Err(TimeWindowError::BeforeEpoch));
    }

    #[test]
    fn unix_seconds_drop_subseconds_and_reject_pre_epoch() {
        let instant = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::milliseconds(999);
        assert_eq!(to_unix_seconds(&instant), Ok(1_767_225_600));

        let old = Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(to_unix_seconds(&old), Err(TimeWindowError::BeforeEpoch));
    }
}
