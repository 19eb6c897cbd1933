//! Shared per-process state handed to every request

use sessiongate_core::auth::{AuthGate, RevocationRegistry, SessionService, TokenCodec};
use sessiongate_core::{AuthConfig, Result};
use sessiongate_store::{ProjectStore, StorageEngine, UserStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionService<UserStore>>,
    pub gate: AuthGate,
    pub registry: Arc<RevocationRegistry>,
    pub users: UserStore,
    pub projects: ProjectStore,
}

impl AppState {
    pub fn new(config: &AuthConfig, engine: &StorageEngine) -> Result<Self> {
        let users = UserStore::new(engine)?;
        let projects = ProjectStore::new(engine)?;

        let codec = Arc::new(TokenCodec::new(config));
        let registry = Arc::new(RevocationRegistry::new());
        let sessions = SessionService::new(
            config,
            Arc::new(users.clone()),
            codec.clone(),
            registry.clone(),
        )?;

        Ok(AppState {
            sessions: Arc::new(sessions),
            gate: AuthGate::new(codec, registry.clone()),
            registry,
            users,
            projects,
        })
    }
}
