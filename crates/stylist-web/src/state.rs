//! Application state.

use std::sync::Arc;
use std::time::Duration;
use stylist_core::{Backends, ReportService, SessionStore, Settings, StylistResult};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionStore,
    pub reports: Arc<ReportService>,
}

impl AppState {
    pub fn new(settings: &Settings, backends: Arc<dyn Backends>) -> StylistResult<Self> {
        Ok(Self {
            sessions: SessionStore::new(Duration::from_secs(settings.session.idle_timeout_secs)),
            reports: Arc::new(ReportService::new(backends, settings.models.clone())?),
        })
    }
}
