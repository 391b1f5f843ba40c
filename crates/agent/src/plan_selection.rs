use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};
use tripcover_core::domain::quote::{discounted_premium, quoted_premium};
use tripcover_core::domain::session::keys;
use tripcover_core::{
    format_premium, ApplicationError, ConversationContext, PlanTier, PremiumTable, SessionId,
    Stage, PLAN_CATALOG,
};

use crate::reply::AgentReply;
use crate::session::SessionStore;

pub const CANCEL_REPLY: &str =
    "No problem, I've cleared your trip details. Tell me about your next trip when you're ready.";
pub const PRICES_LOST_REPLY: &str =
    "I no longer have the prices I showed you. Send any message and I'll fetch them again.";

/// Handles the message that answers a plan comparison.
#[async_trait]
pub trait PlanSelectionHandler: Send + Sync {
    async fn select(
        &self,
        user_message: &str,
        session_id: &SessionId,
    ) -> Result<AgentReply, ApplicationError>;
}

/// Accepts only plans present in `conversation_context.official_premiums`, so the
/// confirmed price is always the one the user was shown.
pub struct OfficialPremiumSelector {
    sessions: Arc<dyn SessionStore>,
}

impl OfficialPremiumSelector {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    async fn cancel(&self, session_id: &SessionId) -> Result<AgentReply, ApplicationError> {
        self.sessions.remove_collected_info(session_id, keys::PAYLOAD).await?;
        self.sessions.remove_collected_info(session_id, keys::DRAFT).await?;
        self.sessions.set_stage(session_id, Stage::PayloadCollection).await?;
        info!(event_name = "plan_selection.cancelled", session_id = %session_id, "quote cancelled");
        Ok(AgentReply::new(CANCEL_REPLY))
    }
}

#[async_trait]
impl PlanSelectionHandler for OfficialPremiumSelector {
    async fn select(
        &self,
        user_message: &str,
        session_id: &SessionId,
    ) -> Result<AgentReply, ApplicationError> {
        if user_message.trim().eq_ignore_ascii_case("cancel") {
            return self.cancel(session_id).await;
        }

        let context = self.sessions.conversation_context(session_id).await?;
        let Some(Value::Object(premiums)) = context.get(keys::OFFICIAL_PREMIUMS) else {
            warn!(
                event_name = "plan_selection.premiums_missing",
                session_id = %session_id,
                "no official premiums in context, returning to quote generation"
            );
            self.sessions.set_stage(session_id, Stage::QuoteGeneration).await?;
            return Ok(AgentReply::new(PRICES_LOST_REPLY));
        };

        let choice = PlanTier::parse(user_message)
            .and_then(|tier| quoted_premium(premiums, tier.key()).map(|record| (tier, record)));
        let Some((tier, record)) = choice else {
            return Ok(AgentReply::new(format!(
                "Please pick one of the quoted plans: {}. Or type 'cancel' to start over.",
                quoted_plan_names(premiums).join(", ")
            )));
        };

        let price = format_premium(discounted_premium(record));
        let mut selection = ConversationContext::new();
        selection.insert(keys::SELECTED_PLAN.to_string(), Value::from(tier.key()));
        selection.insert(keys::SELECTED_PREMIUM.to_string(), record.clone());
        self.sessions.update_conversation_context(session_id, selection).await?;
        self.sessions.set_stage(session_id, Stage::PlanConfirmed).await?;

        info!(
            event_name = "plan_selection.confirmed",
            session_id = %session_id,
            plan = tier.key(),
            premium = %price,
            "plan selected"
        );
        Ok(AgentReply::new(format!(
            "Great choice! You've selected the {} Plan at {price}. \
             Say 'hi' any time to quote another trip.",
            tier.display_name()
        )))
    }
}

fn quoted_plan_names(premiums: &PremiumTable) -> Vec<&'static str> {
    PLAN_CATALOG
        .iter()
        .filter(|entry| quoted_premium(premiums, entry.tier.key()).is_some())
        .map(|entry| entry.tier.display_name())
        .collect()
}
