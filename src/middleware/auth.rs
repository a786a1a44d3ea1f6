// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie authentication middleware.

use crate::config::Config;
use crate::error::AppError;
use crate::services::{Session, SessionId};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "socialleaf_session";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (session id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Session attached to the request by [`resolve_session`].
#[derive(Clone)]
pub struct CurrentSession(pub Arc<Session>);

/// Create a JWT naming a session.
pub fn create_session_token(
    session_id: &SessionId,
    signing_key: &[u8],
    ttl_days: i64,
) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: session_id.to_string(),
        iat: now,
        exp: now + ttl_days.max(1) as usize * 24 * 60 * 60,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Session id from a valid, unexpired token.
pub fn decode_session_token(token: &str, signing_key: &[u8]) -> Option<SessionId> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &key, &validation)
        .ok()
        .map(|data| SessionId::from(data.claims.sub))
}

pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::days(config.session_ttl_days))
        .build()
}

/// Expire the session cookie.
pub fn remove_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/"))
}

/// Token from the session cookie, else from `Authorization: Bearer`.
pub fn request_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

pub fn find_session(state: &AppState, jar: &CookieJar, request: &Request) -> Option<Arc<Session>> {
    let token = request_token(jar, request.headers())?;
    let session_id = decode_session_token(&token, &state.config.session_signing_key)?;
    state.sessions.get(&session_id)
}

/// Attach the caller's session, if any. Never rejects.
pub async fn resolve_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(session) = find_session(&state, &jar, &request) {
        request.extensions_mut().insert(CurrentSession(session));
    }
    next.run(request).await
}

/// Middleware that requires a live session.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match find_session(&state, &jar, &request) {
        Some(session) => {
            request.extensions_mut().insert(CurrentSession(session));
            next.run(request).await
        }
        None => AppError::Unauthorized.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"test_session_key_32_bytes_long!!";

    #[test]
    fn test_token_roundtrip() {
        let id = SessionId::from("abc123");
        let token = create_session_token(&id, KEY, 7).unwrap();
        assert_eq!(decode_session_token(&token, KEY), Some(id));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let token = create_session_token(&SessionId::from("abc123"), KEY, 7).unwrap();
        assert_eq!(decode_session_token(&token, b"some_other_key_entirely_32_bytes"), None);
        assert_eq!(decode_session_token("not.a.jwt", KEY), None);
    }

    #[test]
    fn test_request_token_prefers_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer from-header".parse().unwrap());
        assert_eq!(
            request_token(&CookieJar::new(), &headers).as_deref(),
            Some("from-header")
        );

        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "from-cookie"));
        assert_eq!(request_token(&jar, &headers).as_deref(), Some("from-cookie"));
        assert_eq!(request_token(&CookieJar::new(), &HeaderMap::new()), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("jwt".to_string(), &Config::test_default());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.secure(), Some(false));
    }
}
