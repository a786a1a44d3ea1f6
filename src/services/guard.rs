// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route guard decision.
//!
//! Pure function of session facts, requested path, and system status.
//! The checks run in a fixed order and the first match wins:
//!
//! 1. loading (profile reload or first status check pending)
//! 2. maintenance, unless the caller is an admin
//! 3. sign-in redirect
//! 4. banned account
//! 5. plan selection redirect
//! 6. plan-gated feature
//! 7. admin-only area
//! 8. render
//!
//! JSON actions always carry a session and run only the status and account
//! stages; see [`evaluate_action`].

use chrono::{DateTime, Utc};

use crate::models::{Plan, Role, SystemStatus};
use crate::services::plans::{can_access_feature, Feature, UpgradePrompt};
use crate::services::session::SessionFacts;

pub const SIGN_IN_PATH: &str = "/sign-in";
pub const CHOOSE_PLAN_PATH: &str = "/choose-plan";
pub const PAYMENT_PATH: &str = "/payment";
pub const DEFAULT_LANDING: &str = "/dashboard";

/// Paths reachable before a plan is chosen.
const PLAN_EXEMPT_PATHS: [&str; 2] = [CHOOSE_PLAN_PATH, PAYMENT_PATH];

const FEATURE_PATHS: [(&str, Feature); 3] = [
    ("/voice-coach", Feature::VoiceCoach),
    ("/hook-detector", Feature::Vlm),
    ("/create-post", Feature::CreatePost),
];

const ADMIN_PREFIX: &str = "/admin";

pub struct GuardInput<'a> {
    /// Requested path, without query
    pub path: &'a str,
    /// Path plus query, used for the sign-in return address
    pub return_to: &'a str,
    pub session: Option<SessionFacts>,
    pub status: &'a SystemStatus,
    pub first_check_done: bool,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum GuardDecision {
    Loading,
    Maintenance {
        ends_at: Option<DateTime<Utc>>,
        announcement: Option<String>,
    },
    SignIn {
        location: String,
    },
    Banned,
    ChoosePlan,
    UpgradeRequired(UpgradePrompt),
    Forbidden,
    Render,
}

fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Feature a view path is gated behind, if any.
pub fn gated_feature(path: &str) -> Option<Feature> {
    FEATURE_PATHS
        .iter()
        .find(|(prefix, _)| under(path, prefix))
        .map(|(_, feature)| *feature)
}

pub fn sign_in_location(return_to: &str) -> String {
    format!("{}?from={}", SIGN_IN_PATH, urlencoding::encode(return_to))
}

/// Post sign-in destination: `from` when it is a same-origin path.
pub fn safe_redirect(from: Option<&str>) -> String {
    match from.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.contains("://")
                && !under(path, SIGN_IN_PATH) =>
        {
            path.to_string()
        }
        _ => DEFAULT_LANDING.to_string(),
    }
}

pub fn evaluate(input: &GuardInput<'_>) -> GuardDecision {
    let role = input.session.map(|s| s.role);

    if !input.first_check_done || input.session.is_some_and(|s| !s.resolved) {
        return GuardDecision::Loading;
    }

    if input.status.is_maintenance_active(input.now) && role != Some(Role::Admin) {
        return maintenance_decision(input.status);
    }

    let Some(session) = input.session else {
        return GuardDecision::SignIn {
            location: sign_in_location(input.return_to),
        };
    };

    if session.role == Role::Banned {
        return GuardDecision::Banned;
    }

    let is_admin = session.role.is_admin();
    if session.plan.is_none()
        && !is_admin
        && !PLAN_EXEMPT_PATHS.iter().any(|p| under(input.path, p))
    {
        return GuardDecision::ChoosePlan;
    }

    if let Some(feature) = gated_feature(input.path) {
        if !can_access_feature(session.plan, session.role, feature) {
            return GuardDecision::UpgradeRequired(UpgradePrompt::new(session.plan, feature));
        }
    }

    if under(input.path, ADMIN_PREFIX) && !is_admin {
        return GuardDecision::Forbidden;
    }

    GuardDecision::Render
}

fn maintenance_decision(status: &SystemStatus) -> GuardDecision {
    GuardDecision::Maintenance {
        ends_at: status.maintenance_end,
        announcement: status.active_announcement().map(str::to_string),
    }
}

/// Gate for a signed-in JSON action: loading, maintenance, then banned.
///
/// Plan and feature checks are left to the individual actions, so a user
/// without a plan can still pick one.
pub fn evaluate_action(
    session: SessionFacts,
    status: &SystemStatus,
    first_check_done: bool,
    now: DateTime<Utc>,
) -> GuardDecision {
    if !first_check_done {
        return GuardDecision::Loading;
    }
    if status.is_maintenance_active(now) && !session.role.is_admin() {
        return maintenance_decision(status);
    }
    if session.role == Role::Banned {
        return GuardDecision::Banned;
    }
    GuardDecision::Render
}

/// Plan to report for a session in view payloads.
pub fn effective_plan(plan: Option<Plan>) -> Plan {
    plan.unwrap_or(Plan::Starter)
}
