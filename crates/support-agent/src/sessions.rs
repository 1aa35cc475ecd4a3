//! Session history store.
//!
//! Maps a caller-supplied session id to its conversation turns. Sessions are
//! created lazily and evicted when idle past the TTL, when the store exceeds
//! `max_sessions` (least recently used first), and each session keeps at most
//! `max_turns` turns.
//!
//! Every session has its own async mutex. The answer pipeline holds it for the
//! whole request, so two requests on the same session run one after the other
//! and neither append is lost.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use support_types::{SessionSettings, Turn};

/// Retention limits for the store.
#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    pub ttl: Duration,
    pub max_sessions: usize,
    pub max_turns: usize,
}

impl Default for SessionStoreConfig {
    fn default() -> Self {
        Self::from(&SessionSettings::default())
    }
}

impl From<&SessionSettings> for SessionStoreConfig {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            ttl: Duration::from_secs(settings.ttl_secs),
            max_sessions: settings.max_sessions.max(1),
            max_turns: settings.max_turns.max(2),
        }
    }
}

struct Session {
    turns: tokio::sync::Mutex<Vec<Turn>>,
    max_turns: usize,
}

struct Slot {
    session: Arc<Session>,
    last_access: Instant,
}

impl Slot {
    /// A handle outside the store still refers to this session.
    fn in_use(&self) -> bool {
        Arc::strong_count(&self.session) > 1
    }

    fn expired(&self, now: Instant, ttl: Duration) -> bool {
        now.duration_since(self.last_access) > ttl && !self.in_use()
    }
}

/// Shared handle to one session's history.
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    session: Arc<Session>,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Exclusive access to the session's turns.
    pub async fn lock(&self) -> SessionGuard<'_> {
        SessionGuard {
            turns: self.session.turns.lock().await,
            max_turns: self.session.max_turns,
        }
    }
}

/// Locked view of a session's turns.
pub struct SessionGuard<'a> {
    turns: tokio::sync::MutexGuard<'a, Vec<Turn>>,
    max_turns: usize,
}

impl SessionGuard<'_> {
    /// Prior turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Append one human/assistant exchange, dropping the oldest exchanges
    /// beyond the turn limit.
    pub fn append_exchange(&mut self, human: Turn, assistant: Turn) {
        self.turns.push(human);
        self.turns.push(assistant);

        if self.turns.len() > self.max_turns {
            let mut excess = self.turns.len() - self.max_turns;
            // Keep exchanges whole
            excess += excess % 2;
            let len = self.turns.len();
            self.turns.drain(..excess.min(len));
        }
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// In-memory session store with TTL and size-capped eviction.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Slot>>,
    config: SessionStoreConfig,
}

impl SessionStore {
    pub fn new(config: SessionStoreConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &SessionStoreConfig {
        &self.config
    }

    fn map(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Get the session for `session_id`, creating an empty one on first use.
    pub fn get_or_create(&self, session_id: &str) -> SessionHandle {
        let now = Instant::now();
        let mut map = self.map();

        let expired = map
            .get(session_id)
            .is_some_and(|slot| slot.expired(now, self.config.ttl));
        if expired {
            debug!(session_id, "Session expired, starting fresh");
            map.remove(session_id);
        }

        if !map.contains_key(session_id) && map.len() >= self.config.max_sessions {
            self.evict(&mut map, now);
        }

        let slot = map
            .entry(session_id.to_string())
            .and_modify(|slot| slot.last_access = now)
            .or_insert_with(|| {
                debug!(session_id, "Creating session");
                Slot {
                    session: Arc::new(Session {
                        turns: tokio::sync::Mutex::new(Vec::new()),
                        max_turns: self.config.max_turns,
                    }),
                    last_access: now,
                }
            });

        SessionHandle {
            id: session_id.to_string(),
            session: Arc::clone(&slot.session),
        }
    }

    /// Make room for one more session: drop expired ones, then the least
    /// recently used until under the cap. Sessions held by a request are
    /// never dropped, so the cap may be exceeded while all of them are busy.
    fn evict(&self, map: &mut HashMap<String, Slot>, now: Instant) {
        let ttl = self.config.ttl;
        map.retain(|_, slot| !slot.expired(now, ttl));

        while map.len() >= self.config.max_sessions {
            let oldest = map
                .iter()
                .filter(|(_, slot)| !slot.in_use())
                .min_by_key(|(_, slot)| slot.last_access)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    debug!(session_id = %id, "Evicting least recently used session");
                    map.remove(&id);
                }
                None => break,
            }
        }
    }

    /// Snapshot of a session's turns, if it exists.
    pub async fn history(&self, session_id: &str) -> Option<Vec<Turn>> {
        let session = {
            let map = self.map();
            Arc::clone(&map.get(session_id)?.session)
        };
        let turns = session.turns.lock().await;
        Some(turns.clone())
    }

    /// Drop a session. Returns whether it existed.
    pub fn remove(&self, session_id: &str) -> bool {
        self.map().remove(session_id).is_some()
    }

    /// Drop every session idle past the TTL that no request holds. Returns
    /// how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let ttl = self.config.ttl;
        let mut map = self.map();
        let before = map.len();
        map.retain(|_, slot| !slot.expired(now, ttl));
        before - map.len()
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    /// Periodically purge expired sessions until the returned task is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let removed = store.purge_expired();
                if removed > 0 {
                    info!(removed, remaining = store.len(), "Purged expired sessions");
                }
            }
        })
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionStoreConfig::default())
    }
}
