// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in and sign-out.
//!
//! The identity provider's access token is exchanged for a gateway session;
//! the browser only ever holds the signed session cookie.

use crate::error::{AppError, Result};
use crate::middleware::auth::{
    create_session_token, decode_session_token, remove_session_cookie, request_token,
    session_cookie,
};
use crate::models::{Plan, Profile, Role};
use crate::services::guard::safe_redirect;
use crate::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-out", post(sign_out))
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub access_token: String,
    /// Path the user was bounced from
    #[serde(default)]
    pub from: Option<String>,
}

/// Profile fields the client renders.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProfileSummary {
    pub id: String,
    pub email: String,
    pub name: String,
    pub initials: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string | null"))]
    pub plan: Option<Plan>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub role: Role,
    pub plan_status: Option<String>,
    pub trial_ends_at: Option<String>,
}

impl From<&Profile> for ProfileSummary {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.id.clone(),
            email: profile.email.clone(),
            name: profile.display_name(),
            initials: profile.initials(),
            plan: profile.plan,
            role: profile.role,
            plan_status: profile.plan_status.clone(),
            trial_ends_at: profile.trial_ends_at.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SignInResponse {
    pub redirect_to: String,
    /// Same value as the cookie, for clients that send `Authorization`
    pub session_token: String,
    pub user: ProfileSummary,
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(body): Json<SignInRequest>,
) -> Result<impl IntoResponse> {
    let session = state.sessions.sign_in(&body.access_token).await?;

    let token = create_session_token(
        session.id(),
        &state.config.session_signing_key,
        state.config.session_ttl_days,
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;

    let profile = session.profile().await;
    let redirect_to = safe_redirect(body.from.as_deref());
    tracing::info!(user_id = %profile.id, redirect_to = %redirect_to, "User signed in");

    let jar = jar.add(session_cookie(token.clone(), &state.config));
    Ok((
        jar,
        Json(SignInResponse {
            redirect_to,
            session_token: token,
            user: ProfileSummary::from(&profile),
        }),
    ))
}

/// Tear down the caller's session. Succeeds without one.
async fn sign_out(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> impl IntoResponse {
    let session_id = request_token(&jar, &headers)
        .and_then(|token| decode_session_token(&token, &state.config.session_signing_key));
    if let Some(id) = session_id {
        state.sessions.sign_out(&id);
    }

    (remove_session_cookie(jar), StatusCode::NO_CONTENT)
}
