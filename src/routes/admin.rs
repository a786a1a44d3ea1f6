// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin user management.

use crate::error::{AppError, Result};
use crate::middleware::CurrentSession;
use crate::models::{Plan, Role};
use crate::routes::views::{load_admin_users, AdminUsersQuery, AdminUsersView};
use crate::services::Session;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}/role", put(set_role))
        .route("/api/admin/users/{id}/plan", put(set_plan))
}

async fn require_admin(session: &Session) -> Result<()> {
    if session.facts().await.role.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

async fn list_users(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Query(query): Query<AdminUsersQuery>,
) -> Result<Json<AdminUsersView>> {
    require_admin(&session).await?;
    Ok(Json(
        load_admin_users(&state, session.access_token(), &query).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct RoleUpdate {
    pub role: String,
}

async fn set_role(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(user_id): Path<String>,
    Json(body): Json<RoleUpdate>,
) -> Result<StatusCode> {
    require_admin(&session).await?;
    let role = Role::parse(&body.role)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown role: {}", body.role)))?;

    state
        .backend
        .admin_set_role(session.access_token(), &user_id, role)
        .await?;
    tracing::info!(
        admin_id = %session.user_id(),
        target_user = %user_id,
        role = role.as_str(),
        "Role updated"
    );

    // An admin editing their own role needs the guard to see it.
    if user_id == session.user_id() {
        session.refresh_profile(&state.backend).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct PlanChange {
    pub plan: String,
}

async fn set_plan(
    State(state): State<Arc<AppState>>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
    Path(user_id): Path<String>,
    Json(body): Json<PlanChange>,
) -> Result<StatusCode> {
    require_admin(&session).await?;
    let plan = Plan::parse(&body.plan)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown plan: {}", body.plan)))?;

    state
        .backend
        .admin_set_plan(session.access_token(), &user_id, plan)
        .await?;
    tracing::info!(
        admin_id = %session.user_id(),
        target_user = %user_id,
        plan = %plan,
        "Plan updated"
    );

    if user_id == session.user_id() {
        session.refresh_profile(&state.backend).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
