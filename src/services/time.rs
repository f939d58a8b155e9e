use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Wire format for every persisted and presented timestamp, e.g. `2024-03-01T12:00:00-0300`
pub const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Human readable format used for `formatted_date`
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M";

const WIRE_LEN: usize = 24;
const OFFSET_START: usize = 19;

#[derive(Debug, Error)]
pub enum TimeError {
    #[error("Unknown time zone: {0}")]
    UnknownZone(String),

    #[error("Invalid timestamp '{0}', expected YYYY-MM-DDTHH:MM:SS+HHMM")]
    InvalidTimestamp(String),
}

/// Clock and timestamp codec bound to one named zone
#[derive(Debug, Clone, Copy)]
pub struct TimeService {
    zone: Tz,
}

impl TimeService {
    pub fn new(zone_name: &str) -> Result<Self, TimeError> {
        let zone = zone_name
            .trim()
            .parse::<Tz>()
            .map_err(|_| TimeError::UnknownZone(zone_name.to_string()))?;
        Ok(Self { zone })
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    pub fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    pub fn to_iso8601(&self, at: &DateTime<Utc>) -> String {
        at.with_timezone(&self.zone).format(WIRE_FORMAT).to_string()
    }

    pub fn to_display_format(&self, at: &DateTime<Utc>) -> String {
        at.with_timezone(&self.zone).format(DISPLAY_FORMAT).to_string()
    }

    /// Parse a wire timestamp. Colon offsets, `Z` and fractional seconds are rejected.
    pub fn from_iso8601(&self, value: &str) -> Result<DateTime<Utc>, TimeError> {
        if !has_wire_shape(value) {
            return Err(TimeError::InvalidTimestamp(value.to_string()));
        }
        DateTime::parse_from_str(value, WIRE_FORMAT)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|_| TimeError::InvalidTimestamp(value.to_string()))
    }
}

fn has_wire_shape(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != WIRE_LEN || bytes[10] != b'T' {
        return false;
    }
    matches!(bytes[OFFSET_START], b'+' | b'-')
        && bytes[OFFSET_START + 1..].iter().all(u8::is_ascii_digit)
}
