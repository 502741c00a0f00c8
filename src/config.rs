// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Log configuration.

use crate::error::Error;
use crate::error::Result;

/// Group duration used when none is given.
pub const DEFAULT_GROUP_DURATION: f64 = 2.0;

/// Settings fixed for the lifetime of a `GroupedLog`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Config {
    group_duration: f64,
}

impl Config {
    /// Create a config with the given group duration.
    ///
    /// The duration is the largest gap between two consecutive entries that
    /// still keeps them in the same group. It must be finite and non-negative.
    pub fn new(group_duration: f64) -> Result<Config> {
        if !group_duration.is_finite() || group_duration < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "group duration must be finite and non-negative, got {group_duration}"
            )));
        }
        return Ok(Config { group_duration });
    }

    pub fn group_duration(&self) -> f64 {
        return self.group_duration;
    }
}

impl Default for Config {
    fn default() -> Self {
        return Config { group_duration: DEFAULT_GROUP_DURATION };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_duration() {
        assert_eq!(Config::default().group_duration(), 2.0);
    }

    #[test]
    fn zero_duration_is_allowed() {
        assert_eq!(Config::new(0.0).unwrap().group_duration(), 0.0);
    }

    #[test]
    fn rejects_bad_durations() {
        assert!(matches!(Config::new(-1.0), Err(Error::InvalidConfig(_))));
        assert!(matches!(Config::new(f64::NAN), Err(Error::InvalidConfig(_))));
        assert!(matches!(Config::new(f64::INFINITY), Err(Error::InvalidConfig(_))));
    }
}
