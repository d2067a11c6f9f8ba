//! Per-user session state.
//!
//! A session holds the pasted keys, the last submitted selections and the
//! last generated report. Sessions never see each other; the store lock is
//! only held for short synchronous updates.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::credentials::Credentials;
use crate::error::{StylistError, StylistResult};
use crate::image::UploadedImage;
use crate::preferences::StylePreferences;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for SessionId {
    type Err = StylistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| StylistError::SessionNotFound(s.to_string()))
    }
}

/// The result kept after a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReport {
    pub report: String,
    pub image: UploadedImage,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Empty,
    Running,
    Ready,
}

#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    pub credentials: Credentials,
    /// Selections from the last submission, without the image.
    pub preferences: StylePreferences,
    result: Option<Arc<StoredReport>>,
    running: bool,
    created_at: DateTime<Utc>,
    last_seen: Instant,
}

impl Session {
    fn new(id: SessionId) -> Self {
        Self {
            id,
            credentials: Credentials::default(),
            preferences: StylePreferences::default(),
            result: None,
            running: false,
            created_at: Utc::now(),
            last_seen: Instant::now(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn phase(&self) -> RunPhase {
        if self.running {
            RunPhase::Running
        } else if self.result.is_some() {
            RunPhase::Ready
        } else {
            RunPhase::Empty
        }
    }

    /// The last stored report, kept while a new run is in flight.
    pub fn result(&self) -> Option<Arc<StoredReport>> {
        self.result.clone()
    }

    /// Enter `Running`. Only one run per session at a time.
    pub fn begin_run(&mut self) -> StylistResult<()> {
        if self.running {
            return Err(StylistError::RunInProgress);
        }
        self.running = true;
        Ok(())
    }

    /// Replace any previous result and enter `Ready`.
    pub fn finish_run(&mut self, report: StoredReport) -> Arc<StoredReport> {
        let stored = Arc::new(report);
        self.result = Some(stored.clone());
        self.running = false;
        stored
    }

    /// Leave `Running` without touching the previous result.
    pub fn abort_run(&mut self) {
        self.running = false;
    }
}

/// In-memory session registry.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
    idle_timeout: Duration,
}

impl SessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Start a new, empty session.
    pub async fn create(&self) -> SessionId {
        let id = SessionId::new();
        self.sessions.write().await.insert(id, Session::new(id));
        debug!(session = %id, "Session started");
        id
    }

    /// Look up a presented session id and mark it as recently used.
    /// Unknown or absent ids yield `None`; nothing is created.
    pub async fn touch(&self, presented: Option<SessionId>) -> Option<SessionId> {
        let id = presented?;
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(&id)?;
        session.last_seen = Instant::now();
        Some(id)
    }

    /// Apply `f` to the session and mark it as recently used.
    pub async fn update<R>(&self, id: SessionId, f: impl FnOnce(&mut Session) -> R) -> StylistResult<R> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| StylistError::SessionNotFound(id.to_string()))?;
        session.last_seen = Instant::now();
        Ok(f(session))
    }

    /// A copy of the session for rendering.
    pub async fn snapshot(&self, id: SessionId) -> StylistResult<Session> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| StylistError::SessionNotFound(id.to_string()))
    }

    /// End a session, dropping its keys and result.
    pub async fn end(&self, id: SessionId) -> bool {
        let removed = self.sessions.write().await.remove(&id).is_some();
        if removed {
            debug!(session = %id, "Session ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop sessions idle for at least the configured timeout, measured at `now`.
    /// Sessions with a run in flight are kept.
    pub async fn purge_idle_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| {
            session.running || now.saturating_duration_since(session.last_seen) < self.idle_timeout
        });
        before - sessions.len()
    }

    pub async fn purge_idle(&self) -> usize {
        self.purge_idle_at(Instant::now()).await
    }

    /// Periodically purge idle sessions in the background.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let purged = store.purge_idle().await;
                if purged > 0 {
                    info!(purged, "Expired idle sessions");
                }
            }
        })
    }
}
