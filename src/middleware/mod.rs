// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (authentication, route guard, security).

pub mod auth;
pub mod guard;
pub mod security;

pub use auth::{require_session, resolve_session, CurrentSession};
pub use guard::{guard_action, guard_view};
