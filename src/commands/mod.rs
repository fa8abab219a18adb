//! Subcommand implementations

pub mod download;
pub mod market;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, Utc};

/// Parse an end boundary: epoch milliseconds, "YYYY-MM-DD HH:MM:SS" or
/// "YYYY-MM-DD" (UTC). `None` means now.
pub fn parse_end_time(value: Option<&str>) -> Result<i64> {
    let Some(value) = value.map(str::trim) else {
        return Ok(Utc::now().timestamp_millis());
    };

    if let Ok(ms) = value.parse::<i64>() {
        return Ok(ms);
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc().timestamp_millis());
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .with_context(|| {
            format!(
                "Invalid end time '{}'. Use epoch ms, YYYY-MM-DD or 'YYYY-MM-DD HH:MM:SS'",
                value
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_end_time() {
        assert_eq!(parse_end_time(Some("1609459200000")).unwrap(), 1_609_459_200_000);
        assert_eq!(parse_end_time(Some("2021-01-01")).unwrap(), 1_609_459_200_000);
        assert_eq!(
            parse_end_time(Some("2021-01-01 01:00:00")).unwrap(),
            1_609_462_800_000
        );
        assert!(parse_end_time(Some("01/01/2021")).is_err());
        assert!(parse_end_time(None).unwrap() > 1_609_459_200_000);
    }
}
