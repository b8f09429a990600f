//! In-memory session store.
//!
//! The map from session id to transcript sits behind a short-lived std mutex
//! that is only held to look up, insert or remove an entry. Each transcript
//! has its own async mutex; a conversation turn holds it for its whole
//! duration, which serializes turns on one session while turns on other
//! sessions proceed independently. Appends go through the invariant-checked
//! `Transcript::append` on that held handle. Sessions live until cleared;
//! there is no expiry. Clearing drops only the map entry, so a turn already
//! holding the handle finishes on the detached transcript and the next turn
//! with that id starts fresh.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use brewbot_core::{SessionId, Transcript};
use tokio::sync::Mutex as AsyncMutex;

pub type SessionHandle = Arc<AsyncMutex<Transcript>>;

#[derive(Clone, Debug)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, SessionHandle>>>,
    system_prompt: Arc<str>,
}

impl SessionStore {
    pub fn new(system_prompt: impl Into<Arc<str>>) -> Self {
        Self { sessions: Arc::default(), system_prompt: system_prompt.into() }
    }

    /// Returns the session's transcript handle, seeding a new transcript with
    /// the system prompt when the id is unknown. The flag is true on creation.
    pub fn get_or_create(&self, id: &SessionId) -> (SessionHandle, bool) {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = sessions.get(id) {
            return (Arc::clone(handle), false);
        }

        let handle = Arc::new(AsyncMutex::new(Transcript::new(&*self.system_prompt)));
        sessions.insert(id.clone(), Arc::clone(&handle));
        (handle, true)
    }

    /// Copy of the session's transcript, waiting for any in-flight turn.
    pub async fn transcript(&self, id: &SessionId) -> Option<Transcript> {
        let handle = self.handle(id)?;
        let transcript = handle.lock().await;
        Some(transcript.clone())
    }

    /// Drops the session. Unknown ids are a no-op; returns whether one existed.
    pub fn clear(&self, id: &SessionId) -> bool {
        let mut sessions = self.sessions.lock().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn handle(&self, id: &SessionId) -> Option<SessionHandle> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner).get(id).map(Arc::clone)
    }
}
