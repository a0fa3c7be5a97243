//! Observation time windows
//!
//! Frame timestamps are stored twice: `datetime_obs` (calendar) and `JD`,
//! the latter as a truncated Julian day (`JD - 2400000`). Callers give bounds in
//! either unit; Julian-day bounds are shifted into store units before comparison.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Offset between full Julian days and the store's `JD` column
pub const TRUNCATED_JD_OFFSET: f64 = 2_400_000.0;

/// Full Julian day → store units
pub fn to_truncated_jd(jd: f64) -> f64 {
    jd - TRUNCATED_JD_OFFSET
}

/// Store units → full Julian day
pub fn from_truncated_jd(truncated: f64) -> f64 {
    truncated + TRUNCATED_JD_OFFSET
}

/// Unit of the caller's time bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeKind {
    #[default]
    Calendar,
    JulianDay,
}

impl FromStr for TimeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "calendar" => Ok(TimeKind::Calendar),
            "julian_day" | "jd" => Ok(TimeKind::JulianDay),
            other => Err(Error::InvalidInput(format!(
                "Unknown time kind {:?} (expected calendar or julian_day)",
                other
            ))),
        }
    }
}

impl fmt::Display for TimeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeKind::Calendar => write!(f, "calendar"),
            TimeKind::JulianDay => write!(f, "julian_day"),
        }
    }
}

/// Inclusive observation-time bounds in the caller's unit
#[derive(Debug, Clone, PartialEq)]
pub enum TimeWindow {
    Calendar {
        min: Option<NaiveDateTime>,
        max: Option<NaiveDateTime>,
    },
    /// Full Julian days (e.g. 2459000.5)
    JulianDay { min: Option<f64>, max: Option<f64> },
}

impl Default for TimeWindow {
    fn default() -> Self {
        TimeWindow::Calendar {
            min: None,
            max: None,
        }
    }
}

impl TimeWindow {
    /// No constraint on either side
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Build a window from form/query text; empty strings mean "no bound"
    pub fn parse(kind: TimeKind, min: Option<&str>, max: Option<&str>) -> Result<Self> {
        let min = min.map(str::trim).filter(|s| !s.is_empty());
        let max = max.map(str::trim).filter(|s| !s.is_empty());

        match kind {
            TimeKind::Calendar => Ok(TimeWindow::Calendar {
                min: min.map(|s| parse_calendar(s, false)).transpose()?,
                max: max.map(|s| parse_calendar(s, true)).transpose()?,
            }),
            TimeKind::JulianDay => Ok(TimeWindow::JulianDay {
                min: min.map(parse_julian_day).transpose()?,
                max: max.map(parse_julian_day).transpose()?,
            }),
        }
    }

    pub fn kind(&self) -> TimeKind {
        match self {
            TimeWindow::Calendar { .. } => TimeKind::Calendar,
            TimeWindow::JulianDay { .. } => TimeKind::JulianDay,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        match self {
            TimeWindow::Calendar { min, max } => min.is_none() && max.is_none(),
            TimeWindow::JulianDay { min, max } => min.is_none() && max.is_none(),
        }
    }

    /// Julian-day bounds in store units; `(None, None)` for calendar windows
    pub fn truncated_jd_bounds(&self) -> (Option<f64>, Option<f64>) {
        match self {
            TimeWindow::JulianDay { min, max } => {
                (min.map(to_truncated_jd), max.map(to_truncated_jd))
            }
            TimeWindow::Calendar { .. } => (None, None),
        }
    }

    /// Whether a frame with these stored values passes the window.
    ///
    /// Mirrors SQL comparison: a missing value never satisfies a present bound.
    pub fn admits(&self, timestamp: Option<NaiveDateTime>, truncated_jd: Option<f64>) -> bool {
        match self {
            TimeWindow::Calendar { min, max } => within(timestamp, *min, *max),
            TimeWindow::JulianDay { .. } => {
                let (min, max) = self.truncated_jd_bounds();
                within(truncated_jd, min, max)
            }
        }
    }
}

fn within<T: PartialOrd + Copy>(value: Option<T>, min: Option<T>, max: Option<T>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    min.map_or(true, |lo| value >= lo) && max.map_or(true, |hi| value <= hi)
}

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Date-only upper bounds extend to the last instant of that day
fn parse_calendar(text: &str, upper: bool) -> Result<NaiveDateTime> {
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(dt);
        }
    }

    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| {
        Error::InvalidInput(format!(
            "Invalid date/time {:?} (expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS)",
            text
        ))
    })?;

    let time = if upper {
        NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    };
    time.map(|t| date.and_time(t))
        .ok_or_else(|| Error::Internal("invalid end-of-day time".to_string()))
}

fn parse_julian_day(text: &str) -> Result<f64> {
    match text.parse::<f64>() {
        Ok(jd) if jd.is_finite() => Ok(jd),
        _ => Err(Error::InvalidInput(format!(
            "Invalid Julian day {:?} (expected a finite number)",
            text
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_truncated_jd_offset() {
        assert_eq!(to_truncated_jd(2_459_000.0), 59_000.0);
        assert_eq!(from_truncated_jd(59_000.5), 2_459_000.5);
    }

    #[test]
    fn test_time_kind_from_str() {
        assert_eq!("calendar".parse::<TimeKind>().unwrap(), TimeKind::Calendar);
        assert_eq!("".parse::<TimeKind>().unwrap(), TimeKind::Calendar);
        assert_eq!("julian_day".parse::<TimeKind>().unwrap(), TimeKind::JulianDay);
        assert_eq!("JD".parse::<TimeKind>().unwrap(), TimeKind::JulianDay);
        assert!(matches!("mjd".parse::<TimeKind>(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_julian_window_in_store_units() {
        let window =
            TimeWindow::parse(TimeKind::JulianDay, Some("2459000.0"), None).unwrap();
        assert_eq!(window.truncated_jd_bounds(), (Some(59_000.0), None));
        assert!(window.admits(None, Some(59_000.0)));
        assert!(!window.admits(None, Some(58_999.9)));
    }

    #[test]
    fn test_calendar_formats() {
        let window = TimeWindow::parse(
            TimeKind::Calendar,
            Some("2021-03-04T05:06:07"),
            Some("2021-03-05 01:02:03.5"),
        )
        .unwrap();
        match window {
            TimeWindow::Calendar { min, max } => {
                assert_eq!(min, Some(dt("2021-03-04 05:06:07")));
                assert_eq!(
                    max,
                    Some(NaiveDateTime::parse_from_str("2021-03-05 01:02:03.5", "%Y-%m-%d %H:%M:%S%.f").unwrap())
                );
            }
            other => panic!("unexpected window {:?}", other),
        }
    }

    #[test]
    fn test_date_only_bounds_cover_whole_day() {
        let window =
            TimeWindow::parse(TimeKind::Calendar, Some("2021-03-04"), Some("2021-03-04")).unwrap();
        assert!(window.admits(Some(dt("2021-03-04 00:00:00")), None));
        assert!(window.admits(Some(dt("2021-03-04 23:59:59")), None));
        assert!(!window.admits(Some(dt("2021-03-05 00:00:00")), None));
        assert!(!window.admits(Some(dt("2021-03-03 23:59:59")), None));
    }

    #[test]
    fn test_inclusive_bounds() {
        let t1 = dt("2021-01-01 00:00:00");
        let t2 = dt("2021-01-02 00:00:00");
        let window = TimeWindow::Calendar {
            min: Some(t1),
            max: Some(t1),
        };
        assert!(window.admits(Some(t1), None));
        assert!(!window.admits(Some(t2), None));
    }

    #[test]
    fn test_missing_values() {
        let unbounded = TimeWindow::unbounded();
        assert!(unbounded.is_unbounded());
        assert!(unbounded.admits(None, None));

        let bounded = TimeWindow::JulianDay {
            min: None,
            max: Some(2_459_001.0),
        };
        assert!(!bounded.admits(Some(dt("2021-01-01 00:00:00")), None));
    }

    #[test]
    fn test_empty_strings_are_absent_bounds() {
        let window = TimeWindow::parse(TimeKind::JulianDay, Some(""), Some("  ")).unwrap();
        assert!(window.is_unbounded());
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        assert!(matches!(
            TimeWindow::parse(TimeKind::Calendar, Some("yesterday"), None),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            TimeWindow::parse(TimeKind::JulianDay, None, Some("inf")),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            TimeWindow::parse(TimeKind::JulianDay, Some("2459000,5"), None),
            Err(Error::InvalidInput(_))
        ));
    }
}
