use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};
use tripcover_core::domain::session::keys;
use tripcover_core::{
    render_plan_comparison, ApplicationError, ConversationContext, QuotePayload, SessionId, Stage,
};

use crate::quote_api::QuoteApi;
use crate::reply::AgentReply;
use crate::session::SessionStore;

pub const LOST_DETAILS_REPLY: &str = "I seem to have lost your details. Let's start over.";
pub const EMPTY_PRICE_LIST_REPLY: &str =
    "I'm sorry, I couldn't retrieve the price list. Please try again.";
pub const QUOTE_FAILURE_REPLY: &str = "I'm sorry, I ran into an error while generating your quote.";

/// Turns the collected payload into a priced plan comparison.
///
/// Stage transitions:
/// - missing payload: `PayloadCollection`
/// - quotation failure or empty price list: unchanged
/// - success: `PlanSelection`, with the premiums kept in
///   `conversation_context.official_premiums`
/// - any other failure: `Initial`
pub struct QuoteManager {
    sessions: Arc<dyn SessionStore>,
    quote_api: Arc<dyn QuoteApi>,
}

impl QuoteManager {
    pub fn new(sessions: Arc<dyn SessionStore>, quote_api: Arc<dyn QuoteApi>) -> Self {
        Self { sessions, quote_api }
    }

    /// Only fails when resetting the stage after an internal fault fails too.
    pub async fn generate_quotes(
        &self,
        session_id: &SessionId,
    ) -> Result<AgentReply, ApplicationError> {
        match self.try_generate(session_id).await {
            Ok(reply) => Ok(reply),
            Err(fault) => {
                error!(
                    event_name = "quote_manager.generation_failed",
                    session_id = %session_id,
                    error_class = fault.error_class(),
                    error = %fault,
                    "quote generation failed, resetting session stage"
                );
                self.sessions.set_stage(session_id, Stage::Initial).await?;
                Ok(AgentReply::new(QUOTE_FAILURE_REPLY))
            }
        }
    }

    async fn try_generate(&self, session_id: &SessionId) -> Result<AgentReply, ApplicationError> {
        let collected = self.sessions.collected_info(session_id).await?;
        let Some(payload) = collected.get(keys::PAYLOAD).and_then(QuotePayload::from_stored) else {
            warn!(
                event_name = "quote_manager.payload_missing",
                session_id = %session_id,
                "no payload stored, restarting collection"
            );
            self.sessions.set_stage(session_id, Stage::PayloadCollection).await?;
            return Ok(AgentReply::new(LOST_DETAILS_REPLY));
        };

        let result = self.quote_api.fetch_quotes(&payload).await;
        if !result.success {
            warn!(
                event_name = "quote_manager.quotation_failed",
                session_id = %session_id,
                mode = self.quote_api.mode().as_str(),
                error = result.first_error(),
                "quotation service reported failure"
            );
            return Ok(AgentReply::new(format!(
                "Sorry, there was an error getting the quote: {}",
                result.first_error()
            )));
        }

        if result.premiums.is_empty() {
            warn!(
                event_name = "quote_manager.premiums_missing",
                session_id = %session_id,
                "quotation succeeded without premiums"
            );
            return Ok(AgentReply::new(EMPTY_PRICE_LIST_REPLY));
        }

        let comparison = render_plan_comparison(&result.premiums);
        let plans = result.premiums.len();

        self.sessions.set_stage(session_id, Stage::PlanSelection).await?;
        let mut context = ConversationContext::new();
        context.insert(keys::OFFICIAL_PREMIUMS.to_string(), Value::Object(result.premiums));
        self.sessions.update_conversation_context(session_id, context).await?;

        info!(
            event_name = "quote_manager.quotes_presented",
            session_id = %session_id,
            plans,
            "plan comparison ready"
        );
        Ok(AgentReply::new(comparison))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::{json, Map, Value};
    use tripcover_core::{QuoteApiResult, QuotePayload, SessionId, Stage};

    use super::{QuoteManager, EMPTY_PRICE_LIST_REPLY, LOST_DETAILS_REPLY, QUOTE_FAILURE_REPLY};
    use crate::quote_api::{mock_premiums, MockQuoteApi, QuoteApi, QuoteApiMode};
    use crate::session::{InMemorySessionStore, SessionStore};
    use crate::testing::BrokenStore;

    struct ScriptedQuoteApi {
        result: QuoteApiResult,
        calls: AtomicUsize,
    }

    impl ScriptedQuoteApi {
        fn new(result: QuoteApiResult) -> Self {
            Self { result, calls: AtomicUsize::new(0) }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl QuoteApi for ScriptedQuoteApi {
        fn mode(&self) -> QuoteApiMode {
            QuoteApiMode::Mock
        }

        async fn fetch_quotes(&self, _payload: &QuotePayload) -> QuoteApiResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    async fn session_with_payload(store: &dyn SessionStore, id: &str) -> SessionId {
        let session = SessionId::from(id);
        store
            .merge_collected_info(
                &session,
                object(json!({ "payload": { "destination": "Japan", "travellers": 2 } })),
            )
            .await
            .expect("payload stored");
        store.set_stage(&session, Stage::QuoteGeneration).await.expect("stage stored");
        session
    }

    #[tokio::test]
    async fn missing_payload_restarts_collection_without_calling_api() {
        let store = Arc::new(InMemorySessionStore::new());
        let api = Arc::new(ScriptedQuoteApi::new(QuoteApiResult::succeeded(mock_premiums())));
        let manager = QuoteManager::new(store.clone(), api.clone());
        let session = SessionId::from("sess-no-payload");
        store.set_stage(&session, Stage::QuoteGeneration).await.expect("stage");

        let reply = manager.generate_quotes(&session).await.expect("reply");

        assert_eq!(reply.output, LOST_DETAILS_REPLY);
        assert_eq!(store.stage(&session).await.expect("stage"), Some(Stage::PayloadCollection));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn empty_payload_counts_as_missing() {
        let store = Arc::new(InMemorySessionStore::new());
        let api = Arc::new(ScriptedQuoteApi::new(QuoteApiResult::succeeded(mock_premiums())));
        let manager = QuoteManager::new(store.clone(), api.clone());
        let session = SessionId::from("sess-empty-payload");
        store
            .merge_collected_info(&session, object(json!({ "payload": {} })))
            .await
            .expect("payload");

        let reply = manager.generate_quotes(&session).await.expect("reply");

        assert_eq!(reply.output, LOST_DETAILS_REPLY);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test]
    async fn api_failure_surfaces_first_error_and_keeps_stage() {
        let store = Arc::new(InMemorySessionStore::new());
        let failure = QuoteApiResult {
            success: false,
            errors: vec!["Destination not covered".to_string(), "second".to_string()],
            premiums: Map::new(),
        };
        let manager =
            QuoteManager::new(store.clone(), Arc::new(ScriptedQuoteApi::new(failure)));
        let session = session_with_payload(store.as_ref(), "sess-api-failure").await;

        let reply = manager.generate_quotes(&session).await.expect("reply");

        assert_eq!(
            reply.output,
            "Sorry, there was an error getting the quote: Destination not covered"
        );
        assert_eq!(store.stage(&session).await.expect("stage"), Some(Stage::QuoteGeneration));
        assert!(store.conversation_context(&session).await.expect("context").is_empty());
    }

    #[tokio::test]
    async fn api_failure_without_errors_uses_generic_text() {
        let store = Arc::new(InMemorySessionStore::new());
        let failure = QuoteApiResult { success: false, errors: Vec::new(), premiums: Map::new() };
        let manager =
            QuoteManager::new(store.clone(), Arc::new(ScriptedQuoteApi::new(failure)));
        let session = session_with_payload(store.as_ref(), "sess-api-generic").await;

        let reply = manager.generate_quotes(&session).await.expect("reply");

        assert_eq!(reply.output, "Sorry, there was an error getting the quote: Unknown API error");
    }

    #[tokio::test]
    async fn empty_premiums_ask_for_retry() {
        let store = Arc::new(InMemorySessionStore::new());
        let manager = QuoteManager::new(
            store.clone(),
            Arc::new(ScriptedQuoteApi::new(QuoteApiResult::succeeded(Map::new()))),
        );
        let session = session_with_payload(store.as_ref(), "sess-empty-premiums").await;

        let reply = manager.generate_quotes(&session).await.expect("reply");

        assert_eq!(reply.output, EMPTY_PRICE_LIST_REPLY);
        assert_eq!(store.stage(&session).await.expect("stage"), Some(Stage::QuoteGeneration));
    }

    #[tokio::test]
    async fn success_presents_plans_and_stores_official_premiums() {
        let store = Arc::new(InMemorySessionStore::new());
        let manager = QuoteManager::new(store.clone(), Arc::new(MockQuoteApi));
        let session = session_with_payload(store.as_ref(), "sess-success").await;

        let reply = manager.generate_quotes(&session).await.expect("reply");

        let positions: Vec<usize> = ["S$21.00", "S$28.00", "S$36.50", "S$47.00"]
            .iter()
            .map(|price| reply.output.find(price).expect("price shown"))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]), "catalog order");
        assert!(reply.output.ends_with("or type 'cancel' to start over."));

        assert_eq!(store.stage(&session).await.expect("stage"), Some(Stage::PlanSelection));
        let context = store.conversation_context(&session).await.expect("context");
        assert_eq!(context["official_premiums"], Value::Object(mock_premiums()));
    }

    #[tokio::test]
    async fn partial_premiums_skip_missing_plans() {
        let store = Arc::new(InMemorySessionStore::new());
        let premiums = object(json!({ "silver": { "discounted_premium": 30 } }));
        let manager = QuoteManager::new(
            store.clone(),
            Arc::new(ScriptedQuoteApi::new(QuoteApiResult::succeeded(premiums))),
        );
        let session = session_with_payload(store.as_ref(), "sess-partial").await;

        let reply = manager.generate_quotes(&session).await.expect("reply");

        assert!(reply.output.contains("**Silver Plan**"));
        assert!(reply.output.contains("S$30.00"));
        assert!(!reply.output.contains("**Gold Plan**"));
        assert_eq!(store.stage(&session).await.expect("stage"), Some(Stage::PlanSelection));
    }

    #[tokio::test]
    async fn internal_fault_resets_stage_and_apologises() {
        let store = Arc::new(BrokenStore { fail_reads: true, ..BrokenStore::default() });
        let manager = QuoteManager::new(store.clone(), Arc::new(MockQuoteApi));
        let session = SessionId::from("sess-fault");
        store.set_stage(&session, Stage::QuoteGeneration).await.expect("stage");

        let reply = manager.generate_quotes(&session).await.expect("apology reply");

        assert_eq!(reply.output, QUOTE_FAILURE_REPLY);
        assert_eq!(store.stage(&session).await.expect("stage"), Some(Stage::Initial));
    }

    #[tokio::test]
    async fn failed_reset_propagates() {
        let store = Arc::new(BrokenStore {
            fail_reads: true,
            fail_stage_writes: true,
            ..BrokenStore::default()
        });
        let manager = QuoteManager::new(store, Arc::new(MockQuoteApi));

        let outcome = manager.generate_quotes(&SessionId::from("sess-double-fault")).await;

        assert!(outcome.is_err());
    }
}
