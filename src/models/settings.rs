// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user analytics settings and the manual-refresh cooldown.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time_utils::epoch_millis;

const DEFAULT_FREQUENCY_HOURS: i64 = 6;
const MILLIS_PER_HOUR: i64 = 60 * 60 * 1000;
const MILLIS_PER_MINUTE: i64 = 60 * 1000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Minimum spacing between manual refreshes, e.g. `"6h"`
    #[serde(default = "default_frequency")]
    pub refresh_frequency: String,
    /// Epoch milliseconds of the last manual refresh
    #[serde(default)]
    pub last_refresh: i64,
}

fn default_frequency() -> String {
    format!("{DEFAULT_FREQUENCY_HOURS}h")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_frequency: default_frequency(),
            last_refresh: 0,
        }
    }
}

/// Outcome of a cooldown check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshCheck {
    Allowed,
    Wait { hours: i64, minutes: i64 },
}

impl RefreshCheck {
    pub fn message(&self) -> Option<String> {
        match self {
            RefreshCheck::Allowed => None,
            RefreshCheck::Wait { hours, minutes } => Some(format!(
                "Please wait {hours}h {minutes}m before refreshing (based on your settings)"
            )),
        }
    }
}

impl Settings {
    /// Parse `"<n>h"`; anything unparsable falls back to six hours.
    pub fn frequency_hours(&self) -> i64 {
        parse_frequency(&self.refresh_frequency).unwrap_or(DEFAULT_FREQUENCY_HOURS)
    }

    pub fn check_refresh(&self, now: DateTime<Utc>) -> RefreshCheck {
        let next_refresh = self.last_refresh + self.frequency_hours() * MILLIS_PER_HOUR;
        let now_ms = epoch_millis(now);
        if now_ms >= next_refresh {
            return RefreshCheck::Allowed;
        }

        let remaining = next_refresh - now_ms;
        RefreshCheck::Wait {
            hours: remaining / MILLIS_PER_HOUR,
            minutes: (remaining % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE,
        }
    }
}

/// Parse a refresh frequency such as `"12h"`.
pub fn parse_frequency(value: &str) -> Option<i64> {
    value.trim().trim_end_matches('h').parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_default_allows_first_refresh() {
        assert_eq!(Settings::default().check_refresh(Utc::now()), RefreshCheck::Allowed);
    }

    #[test]
    fn test_cooldown_remaining() {
        let now = Utc::now();
        let settings = Settings {
            refresh_frequency: "6h".to_string(),
            last_refresh: epoch_millis(now - Duration::minutes(90)),
        };

        let check = settings.check_refresh(now);
        assert_eq!(check, RefreshCheck::Wait { hours: 4, minutes: 30 });
        assert_eq!(
            check.message().unwrap(),
            "Please wait 4h 30m before refreshing (based on your settings)"
        );
    }

    #[test]
    fn test_garbage_frequency_defaults_to_six_hours() {
        let settings = Settings {
            refresh_frequency: "often".to_string(),
            last_refresh: 0,
        };
        assert_eq!(settings.frequency_hours(), 6);
    }

    #[test]
    fn test_browser_field_names() {
        let settings: Settings =
            serde_json::from_str(r#"{"refreshFrequency":"12h","lastRefresh":5}"#).unwrap();
        assert_eq!(settings.frequency_hours(), 12);
        assert_eq!(settings.last_refresh, 5);
    }
}
