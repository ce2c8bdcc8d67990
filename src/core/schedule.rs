use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use crate::core::error::{LunchError, Result};
use crate::models::TimeWindow;

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Source of the current instant
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at one instant, for tests and replays
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Turns a user-supplied lunch time into an absolute compatibility window
///
/// Times are interpreted in one fixed named time zone; the window is
/// `[start, start + window)`.
#[derive(Clone)]
pub struct ScheduleResolver {
    time_zone: Tz,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl ScheduleResolver {
    pub fn new(time_zone: Tz, window_minutes: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            time_zone,
            window: Duration::minutes(window_minutes.max(1)),
            clock,
        }
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Today's date in the configured zone
    pub fn today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.time_zone).date_naive()
    }

    /// Resolve `HH:MM:SS` or `HH:MM` on `date` into a window
    pub fn resolve(&self, time_of_day: &str, date: NaiveDate) -> Result<TimeWindow> {
        let time = parse_time_of_day(time_of_day)?;
        let local = date.and_time(time);

        // A time inside a DST gap does not exist; an ambiguous one takes the earlier instant
        let start = self
            .time_zone
            .from_local_datetime(&local)
            .earliest()
            .ok_or_else(|| {
                LunchError::ScheduleParse(format!(
                    "{} does not exist on {} in {}",
                    time_of_day, date, self.time_zone
                ))
            })?
            .with_timezone(&Utc);

        Ok(self.window_from(start))
    }

    /// Resolve against today's date
    pub fn resolve_today(&self, time_of_day: &str) -> Result<TimeWindow> {
        self.resolve(time_of_day, self.today())
    }

    pub fn window_from(&self, start: DateTime<Utc>) -> TimeWindow {
        TimeWindow {
            start,
            end: start + self.window,
        }
    }

    /// Local time of day of an instant in the configured zone
    pub fn local_time(&self, instant: DateTime<Utc>) -> NaiveTime {
        instant.with_timezone(&self.time_zone).time()
    }

    /// Format an instant as local `HH:MM`
    pub fn format_hhmm(&self, instant: DateTime<Utc>) -> String {
        instant.with_timezone(&self.time_zone).format("%H:%M").to_string()
    }

    /// Whether two daily lunch slots starting at `a` and `b` overlap
    ///
    /// Only the local time of day matters, so schedules set on different days
    /// still compare; the comparison wraps around midnight.
    pub fn daily_windows_overlap(&self, a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
        let a = seconds_of_day(self.local_time(a));
        let b = seconds_of_day(self.local_time(b));
        let diff = (a - b).abs();
        let circular = diff.min(SECONDS_PER_DAY - diff);
        circular < self.window.num_seconds()
    }
}

fn seconds_of_day(time: NaiveTime) -> i64 {
    time.num_seconds_from_midnight() as i64
}

/// Parse a time of day, accepting `HH:MM:SS` and `HH:MM`
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime> {
    let trimmed = input.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| LunchError::ScheduleParse(format!("'{}' is not HH:MM:SS or HH:MM", input)))
}
