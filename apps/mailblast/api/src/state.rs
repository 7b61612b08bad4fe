//! Application state management.
//!
//! The state is cloned per handler invocation; the mailer is behind an `Arc`
//! so clones share the underlying HTTP connection pool. No cross-request
//! state exists beyond these read-only handles; each campaign run owns its
//! own job and counters.

use std::sync::Arc;

use domain_dispatch::Mailer;

use crate::config::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: Config,
    /// Mail provider used for every campaign send
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(config: Config, mailer: Arc<dyn Mailer>) -> Self {
        Self { config, mailer }
    }
}
