use std::sync::Arc;

use tracing::{debug, error, info};
use tripcover_core::domain::session::keys;
use tripcover_core::{
    is_greeting, ApplicationError, ConversationTurn, DomainError, SessionId, StageEngine,
    TravelQuoteFlow, TurnAction, TurnTrigger,
};

use crate::payload::{FormPayloadAgent, PayloadAgent};
use crate::plan_selection::{OfficialPremiumSelector, PlanSelectionHandler};
use crate::quote_api::QuoteApi;
use crate::quote_manager::QuoteManager;
use crate::reply::AgentReply;
use crate::session::SessionStore;

pub const CRITICAL_FAILURE_REPLY: &str =
    "I'm sorry, a critical error occurred. Please start over by saying 'hi'.";
pub const DEFAULT_GREETING_REPLY: &str = "Hello! How can I help you today?";

/// Single entry point for a user message.
pub struct Orchestrator {
    sessions: Arc<dyn SessionStore>,
    payload_agent: Arc<dyn PayloadAgent>,
    quote_manager: QuoteManager,
    plan_selection: Arc<dyn PlanSelectionHandler>,
    engine: StageEngine<TravelQuoteFlow>,
}

impl Orchestrator {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        payload_agent: Arc<dyn PayloadAgent>,
        quote_manager: QuoteManager,
        plan_selection: Arc<dyn PlanSelectionHandler>,
    ) -> Self {
        Self {
            sessions,
            payload_agent,
            quote_manager,
            plan_selection,
            engine: StageEngine::default(),
        }
    }

    /// Wires the form agent and the official-premium selector around `sessions`.
    pub fn with_defaults(sessions: Arc<dyn SessionStore>, quote_api: Arc<dyn QuoteApi>) -> Self {
        Self::new(
            sessions.clone(),
            Arc::new(FormPayloadAgent::new(sessions.clone())),
            QuoteManager::new(sessions.clone(), quote_api),
            Arc::new(OfficialPremiumSelector::new(sessions)),
        )
    }

    /// Always returns text for the user. Failures are logged and replaced by
    /// `CRITICAL_FAILURE_REPLY`.
    pub async fn handle_message(&self, user_message: &str, session_id: &SessionId) -> String {
        match self.run_turn(user_message, session_id).await {
            Ok(output) => output,
            Err(failure) => {
                error!(
                    event_name = "orchestrator.turn_failed",
                    session_id = %session_id,
                    error_class = failure.error_class(),
                    error = %failure,
                    "conversation turn failed"
                );
                CRITICAL_FAILURE_REPLY.to_string()
            }
        }
    }

    /// Runs the turn on its own task so a panicking handler also ends in
    /// `CRITICAL_FAILURE_REPLY`.
    pub async fn handle_message_isolated(
        self: &Arc<Self>,
        user_message: String,
        session_id: SessionId,
    ) -> String {
        let orchestrator = Arc::clone(self);
        let turn_session = session_id.clone();
        let turn = tokio::spawn(async move {
            orchestrator.handle_message(&user_message, &turn_session).await
        });

        match turn.await {
            Ok(output) => output,
            Err(join_error) => {
                error!(
                    event_name = "orchestrator.turn_aborted",
                    session_id = %session_id,
                    panicked = join_error.is_panic(),
                    "conversation turn did not complete"
                );
                CRITICAL_FAILURE_REPLY.to_string()
            }
        }
    }

    async fn run_turn(
        &self,
        user_message: &str,
        session_id: &SessionId,
    ) -> Result<String, ApplicationError> {
        let current =
            if is_greeting(user_message) { None } else { self.sessions.stage(session_id).await? };
        let plan = self.engine.plan(current, user_message);

        let mut reply: Option<AgentReply> = None;
        for action in &plan.actions {
            match action {
                TurnAction::ResetSession => self.sessions.clear(session_id).await?,
                TurnAction::ForgetTrip => self.forget_trip(session_id).await?,
                TurnAction::EnterStage(stage) => self.sessions.set_stage(session_id, *stage).await?,
                TurnAction::CollectPayload => {
                    let history = self.sessions.history(session_id).await?;
                    reply = Some(self.payload_agent.run(user_message, &history, session_id).await?);
                }
                TurnAction::GenerateQuotes => {
                    reply = Some(self.quote_manager.generate_quotes(session_id).await?);
                }
                TurnAction::SelectPlan => {
                    reply = Some(self.plan_selection.select(user_message, session_id).await?);
                }
            }
        }

        let mut output = reply
            .ok_or_else(|| {
                DomainError::InvariantViolation(format!(
                    "turn plan {:?} produced no reply",
                    plan.actions
                ))
            })?
            .output;
        if plan.trigger == TurnTrigger::Greeting && output.trim().is_empty() {
            output = DEFAULT_GREETING_REPLY.to_string();
        }

        self.sessions
            .append_history(session_id, ConversationTurn::new(user_message, output.clone()))
            .await?;

        info!(
            event_name = "orchestrator.turn_completed",
            session_id = %session_id,
            stage = plan.from.map(|stage| stage.as_str()).unwrap_or("unset"),
            trigger = ?plan.trigger,
            "conversation turn completed"
        );
        Ok(output)
    }

    async fn forget_trip(&self, session_id: &SessionId) -> Result<(), ApplicationError> {
        for key in [keys::PAYLOAD, keys::DRAFT] {
            self.sessions.remove_collected_info(session_id, key).await?;
        }
        for key in [keys::OFFICIAL_PREMIUMS, keys::SELECTED_PLAN, keys::SELECTED_PREMIUM] {
            self.sessions.remove_conversation_context(session_id, key).await?;
        }
        debug!(
            event_name = "orchestrator.trip_forgotten",
            session_id = %session_id,
            "finished trip cleared"
        );
        Ok(())
    }
}
