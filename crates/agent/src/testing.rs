//! Session store double shared by the unit tests.

use async_trait::async_trait;
use tripcover_core::{
    CollectedInfo, ConversationContext, ConversationTurn, SessionError, SessionId, Stage,
};

use crate::session::{InMemorySessionStore, SessionStore};

/// Delegates to an in-memory store but fails the chosen operations.
#[derive(Default)]
pub struct BrokenStore {
    pub inner: InMemorySessionStore,
    /// Fail `collected_info` reads.
    pub fail_reads: bool,
    pub fail_stage_writes: bool,
}

#[async_trait]
impl SessionStore for BrokenStore {
    async fn stage(&self, session_id: &SessionId) -> Result<Option<Stage>, SessionError> {
        self.inner.stage(session_id).await
    }

    async fn set_stage(&self, session_id: &SessionId, stage: Stage) -> Result<(), SessionError> {
        if self.fail_stage_writes {
            return Err(SessionError::Unavailable("stage write refused".to_string()));
        }
        self.inner.set_stage(session_id, stage).await
    }

    async fn collected_info(&self, session_id: &SessionId) -> Result<CollectedInfo, SessionError> {
        if self.fail_reads {
            return Err(SessionError::Unavailable("read refused".to_string()));
        }
        self.inner.collected_info(session_id).await
    }

    async fn merge_collected_info(
        &self,
        session_id: &SessionId,
        entries: CollectedInfo,
    ) -> Result<(), SessionError> {
        self.inner.merge_collected_info(session_id, entries).await
    }

    async fn remove_collected_info(
        &self,
        session_id: &SessionId,
        key: &str,
    ) -> Result<(), SessionError> {
        self.inner.remove_collected_info(session_id, key).await
    }

    async fn conversation_context(
        &self,
        session_id: &SessionId,
    ) -> Result<ConversationContext, SessionError> {
        self.inner.conversation_context(session_id).await
    }

    async fn update_conversation_context(
        &self,
        session_id: &SessionId,
        entries: ConversationContext,
    ) -> Result<(), SessionError> {
        self.inner.update_conversation_context(session_id, entries).await
    }

    async fn remove_conversation_context(
        &self,
        session_id: &SessionId,
        key: &str,
    ) -> Result<(), SessionError> {
        self.inner.remove_conversation_context(session_id, key).await
    }

    async fn append_history(
        &self,
        session_id: &SessionId,
        turn: ConversationTurn,
    ) -> Result<(), SessionError> {
        self.inner.append_history(session_id, turn).await
    }

    async fn history(&self, session_id: &SessionId) -> Result<Vec<ConversationTurn>, SessionError> {
        self.inner.history(session_id).await
    }

    async fn clear(&self, session_id: &SessionId) -> Result<(), SessionError> {
        self.inner.clear(session_id).await
    }
}
