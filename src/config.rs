use std::path::PathBuf;
use std::time::Duration;

use crate::browser::LaunchOptions;

pub const CHROME_ENV: &str = "SPA_DOCS_CHROME";
pub const HEADFUL_ENV: &str = "SPA_DOCS_HEADFUL";
pub const INITIAL_WAIT_ENV: &str = "SPA_DOCS_INITIAL_WAIT_MS";
pub const SETTLE_WAIT_ENV: &str = "SPA_DOCS_SETTLE_WAIT_MS";

pub const DEFAULT_INITIAL_WAIT: Duration = Duration::from_millis(3000);
pub const DEFAULT_SETTLE_WAIT: Duration = Duration::from_millis(500);

/// Change-detection budget: 20 samples, 500 ms apart.
pub const POLL_ATTEMPTS: u32 = 20;
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for PollBudget {
    fn default() -> Self {
        Self {
            attempts: POLL_ATTEMPTS,
            interval: POLL_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverTiming {
    /// Pause after the first load so the framework can render its navigation.
    pub initial_wait: Duration,
    pub poll: PollBudget,
    /// Pause after change detection, before extraction.
    pub settle_wait: Duration,
}

impl Default for DriverTiming {
    fn default() -> Self {
        Self {
            initial_wait: DEFAULT_INITIAL_WAIT,
            poll: PollBudget::default(),
            settle_wait: DEFAULT_SETTLE_WAIT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub launch: LaunchOptions,
    pub timing: DriverTiming,
}

impl ScrapeConfig {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();

        Self {
            launch: LaunchOptions {
                binary: parse_binary_path(var(CHROME_ENV).as_deref()),
                headful: parse_flag(var(HEADFUL_ENV).as_deref()),
            },
            timing: DriverTiming {
                initial_wait: parse_wait_ms(var(INITIAL_WAIT_ENV).as_deref(), DEFAULT_INITIAL_WAIT),
                poll: PollBudget::default(),
                settle_wait: parse_wait_ms(var(SETTLE_WAIT_ENV).as_deref(), DEFAULT_SETTLE_WAIT),
            },
        }
    }
}

pub fn parse_binary_path(value: Option<&str>) -> Option<PathBuf> {
    value
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}

pub fn parse_flag(value: Option<&str>) -> bool {
    matches!(
        value.map(|raw| raw.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}

pub fn parse_wait_ms(value: Option<&str>, default: Duration) -> Duration {
    match value.map(str::trim).filter(|raw| !raw.is_empty()) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => {
                tracing::warn!(value = raw, default = ?default, "ignoring non-numeric wait override");
                default
            }
        },
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn default_budget_is_a_ten_second_ceiling() {
        let budget = PollBudget::default();
        assert_eq!(budget.interval * budget.attempts, Duration::from_secs(10));
    }

    #[test]
    fn flag_accepts_common_truthy_spellings() {
        assert!(parse_flag(Some("1")));
        assert!(parse_flag(Some(" TRUE ")));
        assert!(parse_flag(Some("on")));
        assert!(!parse_flag(Some("0")));
        assert!(!parse_flag(Some("")));
        assert!(!parse_flag(None));
    }

    #[test]
    fn wait_override_parses_milliseconds_or_keeps_default() {
        assert_eq!(
            parse_wait_ms(Some("1500"), DEFAULT_INITIAL_WAIT),
            Duration::from_millis(1500)
        );
        assert_eq!(parse_wait_ms(Some("soon"), DEFAULT_SETTLE_WAIT), DEFAULT_SETTLE_WAIT);
        assert_eq!(parse_wait_ms(None, DEFAULT_SETTLE_WAIT), DEFAULT_SETTLE_WAIT);
    }

    #[test]
    fn blank_binary_override_means_path_search() {
        assert_eq!(parse_binary_path(Some("  ")), None);
        assert_eq!(
            parse_binary_path(Some("/usr/bin/chromium")),
            Some(PathBuf::from("/usr/bin/chromium"))
        );
    }
}
