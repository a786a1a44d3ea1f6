// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! System status published by `GET /api/system/status`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub maintenance_mode: bool,
    #[serde(default)]
    pub maintenance_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub maintenance_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub announcement: Option<String>,
    #[serde(default)]
    pub announcement_active: bool,
}

impl SystemStatus {
    /// Manual toggle, or `now` inside a declared `[start, end]` window.
    pub fn is_maintenance_active(&self, now: DateTime<Utc>) -> bool {
        if self.maintenance_mode {
            return true;
        }
        match (self.maintenance_start, self.maintenance_end) {
            (Some(start), Some(end)) => start <= now && now <= end,
            _ => false,
        }
    }

    /// Announcement text, only while the banner is switched on.
    pub fn active_announcement(&self) -> Option<&str> {
        if self.announcement_active {
            self.announcement.as_deref().filter(|a| !a.is_empty())
        } else {
            None
        }
    }
}
