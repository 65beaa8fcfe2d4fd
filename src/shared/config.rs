// This is free and unencumbered software released into the public domain.

use core::time::Duration;

/// Consecutive preview failures after which a session closes itself.
pub const PREVIEW_FAIL_LIMIT: u32 = 10;

/// Event poll timeout while draining after a still capture.
pub const CAPTURE_EVENT_TIMEOUT: Duration = Duration::from_millis(100);

/// Event poll timeout while letting the camera settle after a config push.
pub const SETTLE_EVENT_TIMEOUT: Duration = Duration::from_millis(10);

/// Maximum distance between a real target and a matching radio choice.
pub const REAL_MATCH_TOLERANCE: f64 = 0.1;

#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub preview_fail_limit: u32,
    pub capture_event_timeout: Duration,
    pub settle_event_timeout: Duration,
    pub real_match_tolerance: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            preview_fail_limit: PREVIEW_FAIL_LIMIT,
            capture_event_timeout: CAPTURE_EVENT_TIMEOUT,
            settle_event_timeout: SETTLE_EVENT_TIMEOUT,
            real_match_tolerance: REAL_MATCH_TOLERANCE,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preview_fail_limit(mut self, n: u32) -> Self {
        self.preview_fail_limit = n.max(1);
        self
    }

    pub fn with_capture_event_timeout(mut self, timeout: Duration) -> Self {
        self.capture_event_timeout = timeout;
        self
    }

    pub fn with_settle_event_timeout(mut self, timeout: Duration) -> Self {
        self.settle_event_timeout = timeout;
        self
    }

    pub fn with_real_match_tolerance(mut self, tolerance: f64) -> Self {
        self.real_match_tolerance = tolerance.abs();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_tunables() {
        let config = SessionConfig::default();
        assert_eq!(config.preview_fail_limit, 10);
        assert_eq!(config.capture_event_timeout, Duration::from_millis(100));
        assert_eq!(config.settle_event_timeout, Duration::from_millis(10));
        assert_eq!(config.real_match_tolerance, 0.1);
    }

    #[test]
    fn fail_limit_is_at_least_one() {
        let config = SessionConfig::new().with_preview_fail_limit(0);
        assert_eq!(config.preview_fail_limit, 1);
    }
}
