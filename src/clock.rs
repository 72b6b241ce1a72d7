//! Wall-clock abstraction.
//!
//! Upload timestamps and link expiry both derive from a [`Clock`] injected
//! through `AppState`, so tests can pin time and assert exact expiries.

use std::time::SystemTime;

/// Source of the current wall-clock time.
pub trait Clock: Send + Sync + 'static {
    /// Current time.
    fn now(&self) -> SystemTime;

    /// Current time as seconds since the Unix epoch.
    fn unix_now(&self) -> u64 {
        self.now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Default clock backed by [`SystemTime::now`].
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Fixed clock for deterministic tests.
pub struct FixedClock(pub SystemTime);

impl FixedClock {
    /// Create a clock pinned to `secs` seconds past the Unix epoch.
    pub fn at_unix(secs: u64) -> Self {
        Self(SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(secs))
    }
}

impl Clock for FixedClock {
    fn now(&self) -> SystemTime {
        self.0
    }
}

/// Format a time as an ISO-8601 UTC timestamp with millisecond precision.
pub fn format_iso8601(time: SystemTime) -> String {
    let datetime: chrono::DateTime<chrono::Utc> = time.into();
    datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

// -- Tests --------------------------------------------------------------------
