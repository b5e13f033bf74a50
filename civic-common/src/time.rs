//! Timestamp utilities
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings with microsecond
//! precision so that lexical order in SQL matches chronological order.

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};

use crate::{Error, Result};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp for storage
pub fn to_storage(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub fn parse_storage(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp '{}': {}", s, e)))
}

/// Which end of a date range a bare `YYYY-MM-DD` date bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEdge {
    /// Start of the named day
    Start,
    /// Exclusive upper bound: start of the following day, or one
    /// microsecond past an explicit timestamp
    End,
}

/// Parse a user-supplied range bound: RFC 3339 timestamp or plain date
pub fn parse_range_bound(s: &str, edge: RangeEdge) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        let dt = dt.with_timezone(&Utc);
        return Ok(match edge {
            RangeEdge::Start => dt,
            RangeEdge::End => dt + Duration::microseconds(1),
        });
    }

    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| Error::InvalidArgument(format!("Invalid date: {}", s)))?;
    let date = match edge {
        RangeEdge::Start => date,
        RangeEdge::End => date
            .succ_opt()
            .ok_or_else(|| Error::InvalidArgument(format!("Date out of range: {}", s)))?,
    };

    Ok(date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
}
