//! Application state shared across routes

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::config::Config;
use crate::game::versus::VersusDuel;
use crate::game::SessionRegistry;
use crate::progression::ProgressionLedger;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionRegistry>,
    pub progression: Arc<ProgressionLedger>,
    pub duels: Arc<DashMap<Uuid, VersusDuel>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            sessions: Arc::new(SessionRegistry::new()),
            progression: Arc::new(ProgressionLedger::new()),
            duels: Arc::new(DashMap::new()),
        }
    }
}
