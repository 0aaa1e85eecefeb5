//! Civil date/time of a center → absolute instants.
//!
//! Appointment dates and times are wall-clock values in the center's zone.
//! Every window comparison goes through [`scheduled_instant`] first.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc};
use jiff::{civil, tz::TimeZone};
use thiserror::Error;

use crate::error::AppError;
use crate::models::center;

#[derive(Debug, Error)]
pub enum CivilTimeError {
    #[error("unknown timezone '{name}': {reason}")]
    UnknownTimezone { name: String, reason: String },

    #[error("invalid civil date/time {date} {time}: {reason}")]
    InvalidDateTime {
        date: NaiveDate,
        time: NaiveTime,
        reason: String,
    },
}

impl From<CivilTimeError> for AppError {
    fn from(e: CivilTimeError) -> Self {
        AppError::Internal(e.to_string())
    }
}

/// Resolve an IANA zone name. `UTC` never touches the tz database.
pub fn resolve_timezone(name: &str) -> Result<TimeZone, CivilTimeError> {
    let name = name.trim();
    if name.eq_ignore_ascii_case("utc") {
        return Ok(TimeZone::UTC);
    }
    TimeZone::get(name).map_err(|e| CivilTimeError::UnknownTimezone {
        name: name.to_string(),
        reason: e.to_string(),
    })
}

/// Combine a civil date and time in `tz` into a UTC instant.
///
/// Times inside a DST gap resolve forward, times inside a fold resolve to the
/// earlier offset (jiff's "compatible" disambiguation).
pub fn scheduled_instant(
    date: NaiveDate,
    time: NaiveTime,
    tz: &TimeZone,
) -> Result<DateTime<Utc>, CivilTimeError> {
    let invalid = |reason: String| CivilTimeError::InvalidDateTime { date, time, reason };

    let year = i16::try_from(date.year()).map_err(|e| invalid(e.to_string()))?;
    let local = civil::DateTime::new(
        year,
        date.month() as i8,
        date.day() as i8,
        time.hour() as i8,
        time.minute() as i8,
        time.second() as i8,
        0,
    )
    .map_err(|e| invalid(e.to_string()))?;

    let zoned = local
        .to_zoned(tz.clone())
        .map_err(|e| invalid(e.to_string()))?;
    let ts = zoned.timestamp();

    DateTime::<Utc>::from_timestamp(ts.as_second(), 0)
        .ok_or_else(|| invalid("instant out of range".to_string()))
}

/// Per-sweep zone lookup: centers share a handful of zones, so each name is resolved once.
pub struct ZoneResolver {
    default_zone: TimeZone,
    cache: HashMap<String, TimeZone>,
}

impl ZoneResolver {
    pub fn new(default_zone: TimeZone) -> Self {
        Self {
            default_zone,
            cache: HashMap::new(),
        }
    }

    pub fn for_center(&mut self, center: &center::Model) -> Result<TimeZone, CivilTimeError> {
        match center.timezone.as_deref().map(str::trim) {
            None | Some("") => Ok(self.default_zone.clone()),
            Some(name) => {
                if let Some(tz) = self.cache.get(name) {
                    return Ok(tz.clone());
                }
                let tz = resolve_timezone(name)?;
                self.cache.insert(name.to_string(), tz.clone());
                Ok(tz)
            }
        }
    }
}
