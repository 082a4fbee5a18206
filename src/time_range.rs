use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{DashboardError, Result};

/// Window used when a range query is issued without an explicit range.
pub const DEFAULT_WINDOW_MINUTES: u32 = 60;

/// Upper bound on a relative window: thirty days.
const MAX_WINDOW_MINUTES: u32 = 30 * 24 * 60;

/// A relative time window such as `15m`, `6h` or `1d`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeRange {
    minutes: u32,
}

impl TimeRange {
    pub const LAST_15_MINUTES: TimeRange = TimeRange { minutes: 15 };
    pub const LAST_30_MINUTES: TimeRange = TimeRange { minutes: 30 };
    pub const LAST_60_MINUTES: TimeRange = TimeRange { minutes: 60 };

    pub fn from_minutes(minutes: u32) -> Result<Self> {
        if minutes == 0 || minutes > MAX_WINDOW_MINUTES {
            return Err(DashboardError::InvalidTimeRange(format!(
                "{minutes} minutes is outside 1..={MAX_WINDOW_MINUTES}"
            )));
        }
        Ok(TimeRange { minutes })
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn seconds(&self) -> i64 {
        i64::from(self.minutes) * 60
    }

    /// Minutes covered by an optional range, falling back to the default window.
    pub fn window_minutes(range: Option<&TimeRange>) -> u32 {
        range.map(TimeRange::minutes).unwrap_or(DEFAULT_WINDOW_MINUTES)
    }
}

impl FromStr for TimeRange {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || DashboardError::InvalidTimeRange(s.to_string());

        let (digits, per_unit) = if let Some(n) = s.strip_suffix('m') {
            (n, 1)
        } else if let Some(n) = s.strip_suffix('h') {
            (n, 60)
        } else if let Some(n) = s.strip_suffix('d') {
            (n, 24 * 60)
        } else {
            return Err(invalid());
        };

        let count: u32 = digits.parse().map_err(|_| invalid())?;
        let minutes = count.checked_mul(per_unit).ok_or_else(invalid)?;
        TimeRange::from_minutes(minutes)
    }
}

impl TryFrom<String> for TimeRange {
    type Error = DashboardError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TimeRange> for String {
    fn from(range: TimeRange) -> Self {
        range.to_string()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.minutes;
        if m % (24 * 60) == 0 {
            write!(f, "{}d", m / (24 * 60))
        } else if m % 60 == 0 && m > 60 {
            write!(f, "{}h", m / 60)
        } else {
            write!(f, "{m}m")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        assert_eq!("15m".parse::<TimeRange>().unwrap().minutes(), 15);
        assert_eq!("2h".parse::<TimeRange>().unwrap().minutes(), 120);
        assert_eq!("1d".parse::<TimeRange>().unwrap().minutes(), 1440);
        assert_eq!(" 30m ".parse::<TimeRange>().unwrap().seconds(), 1800);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "m", "15", "abcm", "-5m", "0m", "1.5h", "999999d"] {
            assert!(bad.parse::<TimeRange>().is_err(), "{bad:?} should fail");
        }
    }

    #[test]
    fn test_display_round_trips() {
        for s in ["15m", "60m", "2h", "1d", "90m"] {
            let range: TimeRange = s.parse().unwrap();
            assert_eq!(range.to_string().parse::<TimeRange>().unwrap(), range);
        }
        assert_eq!("60m".parse::<TimeRange>().unwrap().to_string(), "60m");
    }

    #[test]
    fn test_default_window() {
        assert_eq!(TimeRange::window_minutes(None), DEFAULT_WINDOW_MINUTES);
        let range: TimeRange = "5m".parse().unwrap();
        assert_eq!(TimeRange::window_minutes(Some(&range)), 5);
    }

    #[test]
    fn test_serde_as_string() {
        let range: TimeRange = serde_json::from_str("\"30m\"").unwrap();
        assert_eq!(range.minutes(), 30);
        assert_eq!(serde_json::to_string(&range).unwrap(), "\"30m\"");
        assert!(serde_json::from_str::<TimeRange>("\"soon\"").is_err());
    }
}
