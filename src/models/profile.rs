// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile as returned by `GET /api/users/me`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Starter,
    Professional,
    Business,
}

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Starter, Plan::Professional, Plan::Business];

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Starter => "starter",
            Plan::Professional => "professional",
            Plan::Business => "business",
        }
    }

    /// Strict parse for request bodies.
    pub fn parse(value: &str) -> Option<Plan> {
        match value.trim().to_ascii_lowercase().as_str() {
            "starter" => Some(Plan::Starter),
            "professional" => Some(Plan::Professional),
            "business" => Some(Plan::Business),
            _ => None,
        }
    }

    /// Unknown tiers collapse to the most restrictive one.
    pub fn parse_lossy(value: &str) -> Plan {
        Self::parse(value).unwrap_or(Plan::Starter)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Plan {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Plan::parse_lossy(&raw))
    }
}

/// Profile plan: null, missing or blank means no plan was chosen.
fn deserialize_selected_plan<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Plan>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .filter(|value| !value.trim().is_empty())
        .map(|value| Plan::parse_lossy(&value)))
}

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
    Banned,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Banned => "banned",
        }
    }

    pub fn parse(value: &str) -> Option<Role> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            "banned" => Some(Role::Banned),
            _ => None,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::parse(&raw).unwrap_or_default())
    }
}

/// Profile record owned by the session.
///
/// `plan == None` means the user signed in but never chose a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_selected_plan")]
    pub plan: Option<Plan>,
    #[serde(default)]
    pub plan_status: Option<String>,
    #[serde(default)]
    pub trial_ends_at: Option<String>,
    #[serde(default)]
    pub role: Role,
}

impl Profile {
    /// Name shown in the sidebar and greetings.
    pub fn display_name(&self) -> String {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .filter(|local| !local.is_empty())
                .unwrap_or("there")
                .to_string(),
        }
    }

    /// Up to two uppercase initials taken from the display name.
    pub fn initials(&self) -> String {
        self.display_name()
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_json(plan: serde_json::Value, role: &str) -> Profile {
        serde_json::from_value(serde_json::json!({
            "id": "u1",
            "email": "jane@example.com",
            "name": "jane ann doe",
            "plan": plan,
            "role": role,
        }))
        .unwrap()
    }

    #[test]
    fn test_null_plan_means_unselected() {
        let profile = profile_json(serde_json::Value::Null, "user");
        assert_eq!(profile.plan, None);
    }

    #[test]
    fn test_blank_plan_means_unselected() {
        assert_eq!(profile_json(serde_json::json!(""), "user").plan, None);
        assert_eq!(profile_json(serde_json::json!("   "), "user").plan, None);

        let missing: Profile = serde_json::from_value(serde_json::json!({ "id": "u1" })).unwrap();
        assert_eq!(missing.plan, None);
    }

    #[test]
    fn test_unknown_plan_is_selected_starter() {
        let profile = profile_json(serde_json::json!("enterprise"), "user");
        assert_eq!(profile.plan, Some(Plan::Starter));
    }

    #[test]
    fn test_unknown_role_is_user() {
        let profile = profile_json(serde_json::json!("business"), "superuser");
        assert_eq!(profile.role, Role::User);
        assert_eq!(profile.plan, Some(Plan::Business));
    }

    #[test]
    fn test_initials() {
        let profile = profile_json(serde_json::Value::Null, "user");
        assert_eq!(profile.initials(), "JA");

        let unnamed = Profile {
            name: None,
            ..profile
        };
        assert_eq!(unnamed.display_name(), "jane");
        assert_eq!(unnamed.initials(), "J");
    }
}
