// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod backend;
pub mod guard;
pub mod maintenance;
pub mod plans;
pub mod report;
pub mod scope;
pub mod session;
pub mod social;
pub mod storage;

pub use backend::{BackendClient, PostUpload};
pub use guard::{GuardDecision, GuardInput};
pub use maintenance::{MaintenanceMonitor, MonitorState, StatusSource};
pub use plans::{can_access_feature, Feature, UpgradePrompt};
pub use scope::TaskScope;
pub use session::{Session, SessionFacts, SessionId, SessionStore, SocialConfig};
pub use social::{SocialDataService, SocialSnapshot};
pub use storage::{SessionStorage, StorageEvent, UserStore};
