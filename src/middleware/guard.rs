// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Route guard middleware for views and JSON actions.

use crate::error::AppError;
use crate::middleware::auth::CurrentSession;
use crate::services::guard::{self, GuardDecision, GuardInput, CHOOSE_PLAN_PATH};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use chrono::Utc;
use std::sync::Arc;

/// Decide whether the requested view may render.
///
/// Expects [`crate::middleware::auth::resolve_session`] to have run.
pub async fn guard_view(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    state.monitor.poke(&state.background);
    let monitor = state.monitor.state();

    let session = request
        .extensions()
        .get::<CurrentSession>()
        .map(|current| current.0.clone());
    let facts = match session {
        Some(session) => Some(session.facts().await),
        None => None,
    };
    let path = request.uri().path().to_string();
    let return_to = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| path.clone());

    let decision = guard::evaluate(&GuardInput {
        path: &path,
        return_to: &return_to,
        session: facts,
        status: &monitor.status,
        first_check_done: monitor.first_check_done,
        now: Utc::now(),
    });

    match decision {
        GuardDecision::Render => next.run(request).await,
        other => {
            tracing::debug!(path = %path, decision = ?other, "View blocked by guard");
            decision_response(other)
        }
    }
}

/// Hold JSON actions during maintenance and refuse banned accounts.
///
/// Expects [`crate::middleware::auth::require_session`] to have run.
pub async fn guard_action(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let monitor = state.monitor.state();
    if !monitor.first_check_done {
        state.monitor.poke(&state.background);
    }

    let Some(CurrentSession(session)) = request.extensions().get::<CurrentSession>().cloned()
    else {
        return AppError::Unauthorized.into_response();
    };
    let facts = session.facts().await;

    match guard::evaluate_action(facts, &monitor.status, monitor.first_check_done, Utc::now()) {
        GuardDecision::Render => next.run(request).await,
        other => {
            tracing::debug!(
                path = %request.uri().path(),
                user_id = %session.user_id(),
                decision = ?other,
                "Action blocked by guard"
            );
            decision_response(other)
        }
    }
}

fn decision_response(decision: GuardDecision) -> Response {
    match decision {
        GuardDecision::Loading => (
            StatusCode::SERVICE_UNAVAILABLE,
            [(header::RETRY_AFTER, "1")],
            Json(serde_json::json!({ "state": "loading" })),
        )
            .into_response(),
        GuardDecision::Maintenance {
            ends_at,
            announcement,
        } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "state": "maintenance",
                "maintenance_end": ends_at.map(format_utc_rfc3339),
                "announcement": announcement,
            })),
        )
            .into_response(),
        GuardDecision::SignIn { location } => Redirect::to(&location).into_response(),
        GuardDecision::Banned => (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "error": "account_banned",
                "details": "This account has been suspended",
            })),
        )
            .into_response(),
        GuardDecision::ChoosePlan => Redirect::to(CHOOSE_PLAN_PATH).into_response(),
        GuardDecision::UpgradeRequired(prompt) => {
            (StatusCode::FORBIDDEN, Json(prompt)).into_response()
        }
        GuardDecision::Forbidden => {
            AppError::Forbidden("Admin access required".to_string()).into_response()
        }
        GuardDecision::Render => StatusCode::NO_CONTENT.into_response(),
    }
}
