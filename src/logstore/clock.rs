//! Fixed-timezone timestamps for log records
//!
//! Timestamps are rendered in a named timezone rather than the host's local
//! time so that logs written on different machines stay comparable.

use crate::ConfigError;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Format used for every timestamp written to the logs
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timezone used when none is configured
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

/// Renders wall-clock time in a fixed named timezone
#[derive(Debug, Clone, Copy)]
pub struct LogClock {
    tz: Tz,
}

impl LogClock {
    /// Creates a clock for an IANA timezone name such as `Asia/Kolkata`
    pub fn new(timezone: &str) -> Result<Self, ConfigError> {
        let tz = timezone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(timezone.to_string()))?;
        Ok(Self { tz })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Returns the current time formatted for a log record
    pub fn now(&self) -> String {
        self.format(Utc::now())
    }

    /// Formats an instant in this clock's timezone
    pub fn format(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.tz)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }
}

impl Default for LogClock {
    fn default() -> Self {
        Self {
            tz: chrono_tz::Asia::Kolkata,
        }
    }
}
