use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::debug;
use tripcover_core::{
    CollectedInfo, ConversationContext, ConversationTurn, SessionError, SessionId, Stage,
};

/// Narrow view of the per-session state the conversation reads and writes.
///
/// Implementations must give read-your-writes consistency per session id.
/// Concurrent turns for the same session are not serialized by the caller.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn stage(&self, session_id: &SessionId) -> Result<Option<Stage>, SessionError>;
    async fn set_stage(&self, session_id: &SessionId, stage: Stage) -> Result<(), SessionError>;

    async fn collected_info(&self, session_id: &SessionId) -> Result<CollectedInfo, SessionError>;
    /// Inserts every entry, replacing existing keys.
    async fn merge_collected_info(
        &self,
        session_id: &SessionId,
        entries: CollectedInfo,
    ) -> Result<(), SessionError>;
    async fn remove_collected_info(
        &self,
        session_id: &SessionId,
        key: &str,
    ) -> Result<(), SessionError>;

    async fn conversation_context(
        &self,
        session_id: &SessionId,
    ) -> Result<ConversationContext, SessionError>;
    /// Inserts every entry, replacing existing keys.
    async fn update_conversation_context(
        &self,
        session_id: &SessionId,
        entries: ConversationContext,
    ) -> Result<(), SessionError>;
    async fn remove_conversation_context(
        &self,
        session_id: &SessionId,
        key: &str,
    ) -> Result<(), SessionError>;

    async fn append_history(
        &self,
        session_id: &SessionId,
        turn: ConversationTurn,
    ) -> Result<(), SessionError>;
    async fn history(&self, session_id: &SessionId) -> Result<Vec<ConversationTurn>, SessionError>;

    /// Wipes all state held for `session_id`.
    async fn clear(&self, session_id: &SessionId) -> Result<(), SessionError>;
}

#[derive(Debug)]
struct SessionRecord {
    stage: Option<Stage>,
    collected_info: CollectedInfo,
    conversation_context: ConversationContext,
    history: Vec<ConversationTurn>,
    last_write: Instant,
}

impl SessionRecord {
    fn new(now: Instant) -> Self {
        Self {
            stage: None,
            collected_info: CollectedInfo::new(),
            conversation_context: ConversationContext::new(),
            history: Vec::new(),
            last_write: now,
        }
    }
}

/// Process-local store. Sessions are created on first write.
///
/// With an idle timeout, a session that has not been written for that long
/// reads as empty and is evicted on the next write to any session.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionId, SessionRecord>>,
    idle_timeout: Option<Duration>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self { idle_timeout: Some(idle_timeout), ..Self::default() }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, SessionRecord>>, SessionError> {
        self.sessions.lock().map_err(|_| SessionError::Poisoned)
    }

    fn is_idle(&self, record: &SessionRecord, now: Instant) -> bool {
        self.idle_timeout
            .is_some_and(|timeout| now.saturating_duration_since(record.last_write) >= timeout)
    }

    fn read<R>(
        &self,
        session_id: &SessionId,
        read: impl FnOnce(Option<&SessionRecord>) -> R,
    ) -> Result<R, SessionError> {
        let now = Instant::now();
        let sessions = self.lock()?;
        Ok(read(sessions.get(session_id).filter(|record| !self.is_idle(record, now))))
    }

    fn write<R>(
        &self,
        session_id: &SessionId,
        write: impl FnOnce(&mut SessionRecord) -> R,
    ) -> Result<R, SessionError> {
        let now = Instant::now();
        let mut sessions = self.lock()?;

        if self.idle_timeout.is_some() {
            let before = sessions.len();
            sessions.retain(|_, record| !self.is_idle(record, now));
            let evicted = before - sessions.len();
            if evicted > 0 {
                debug!(
                    event_name = "session_store.idle_evicted",
                    evicted,
                    remaining = sessions.len(),
                    "idle sessions evicted"
                );
            }
        }

        let record =
            sessions.entry(session_id.clone()).or_insert_with(|| SessionRecord::new(now));
        record.last_write = now;
        Ok(write(record))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn stage(&self, session_id: &SessionId) -> Result<Option<Stage>, SessionError> {
        self.read(session_id, |record| record.and_then(|record| record.stage))
    }

    async fn set_stage(&self, session_id: &SessionId, stage: Stage) -> Result<(), SessionError> {
        self.write(session_id, |record| record.stage = Some(stage))
    }

    async fn collected_info(&self, session_id: &SessionId) -> Result<CollectedInfo, SessionError> {
        self.read(session_id, |record| {
            record.map(|record| record.collected_info.clone()).unwrap_or_default()
        })
    }

    async fn merge_collected_info(
        &self,
        session_id: &SessionId,
        entries: CollectedInfo,
    ) -> Result<(), SessionError> {
        self.write(session_id, |record| record.collected_info.extend(entries))
    }

    async fn remove_collected_info(
        &self,
        session_id: &SessionId,
        key: &str,
    ) -> Result<(), SessionError> {
        self.write(session_id, |record| {
            record.collected_info.remove(key);
        })
    }

    async fn conversation_context(
        &self,
        session_id: &SessionId,
    ) -> Result<ConversationContext, SessionError> {
        self.read(session_id, |record| {
            record.map(|record| record.conversation_context.clone()).unwrap_or_default()
        })
    }

    async fn update_conversation_context(
        &self,
        session_id: &SessionId,
        entries: ConversationContext,
    ) -> Result<(), SessionError> {
        self.write(session_id, |record| record.conversation_context.extend(entries))
    }

    async fn remove_conversation_context(
        &self,
        session_id: &SessionId,
        key: &str,
    ) -> Result<(), SessionError> {
        self.write(session_id, |record| {
            record.conversation_context.remove(key);
        })
    }

    async fn append_history(
        &self,
        session_id: &SessionId,
        turn: ConversationTurn,
    ) -> Result<(), SessionError> {
        self.write(session_id, |record| record.history.push(turn))
    }

    async fn history(&self, session_id: &SessionId) -> Result<Vec<ConversationTurn>, SessionError> {
        self.read(session_id, |record| {
            record.map(|record| record.history.clone()).unwrap_or_default()
        })
    }

    async fn clear(&self, session_id: &SessionId) -> Result<(), SessionError> {
        self.lock()?.remove(session_id);
        Ok(())
    }
}
