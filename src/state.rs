// src/state.rs
use std::sync::Arc;

use crate::services::{
    generation::GenerationClient,
    session_router::{SessionIdPolicy, SessionRouter},
    session_store::SessionStore,
};

pub type SharedState = Arc<AppState>;

#[derive(Debug)]
pub struct AppState {
    pub router: SessionRouter,
}

impl AppState {
    pub fn new(client: Arc<dyn GenerationClient>, store: Arc<dyn SessionStore>) -> Self {
        Self { router: SessionRouter::new(client, store) }
    }

    pub fn with_policy(mut self, policy: SessionIdPolicy) -> Self {
        self.router = self.router.with_policy(policy);
        self
    }
}
