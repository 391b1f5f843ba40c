use tracing::debug;

use crate::flows::states::{Stage, TurnAction, TurnPlan, TurnTrigger};

pub trait ConversationFlow {
    fn route(&self, current: Option<Stage>, trigger: TurnTrigger) -> TurnPlan;
}

/// Trip-detail collection, quotation, then plan choice.
#[derive(Clone, Debug, Default)]
pub struct TravelQuoteFlow;

impl ConversationFlow for TravelQuoteFlow {
    fn route(&self, current: Option<Stage>, trigger: TurnTrigger) -> TurnPlan {
        route_travel_quote(current, trigger)
    }
}

pub struct StageEngine<F> {
    flow: F,
}

impl<F> StageEngine<F>
where
    F: ConversationFlow,
{
    pub fn new(flow: F) -> Self {
        Self { flow }
    }

    pub fn plan(&self, current: Option<Stage>, message: &str) -> TurnPlan {
        let plan = self.flow.route(current, TurnTrigger::classify(message));
        debug!(
            event_name = "flow.turn_planned",
            from = current.map(Stage::as_str).unwrap_or("unset"),
            trigger = ?plan.trigger,
            actions = ?plan.actions,
            "conversation turn planned"
        );
        plan
    }
}

impl Default for StageEngine<TravelQuoteFlow> {
    fn default() -> Self {
        Self::new(TravelQuoteFlow)
    }
}

fn route_travel_quote(current: Option<Stage>, trigger: TurnTrigger) -> TurnPlan {
    use Stage::{Initial, PayloadCollection, PlanConfirmed, PlanSelection, QuoteGeneration};
    use TurnAction::{
        CollectPayload, EnterStage, ForgetTrip, GenerateQuotes, ResetSession, SelectPlan,
    };

    let actions = match (trigger, current) {
        (TurnTrigger::Greeting, _) => vec![ResetSession, CollectPayload],
        (TurnTrigger::Message, None | Some(Initial) | Some(PayloadCollection)) => {
            vec![EnterStage(PayloadCollection), CollectPayload]
        }
        (TurnTrigger::Message, Some(QuoteGeneration)) => vec![GenerateQuotes],
        (TurnTrigger::Message, Some(PlanSelection)) => vec![SelectPlan],
        (TurnTrigger::Message, Some(PlanConfirmed)) => {
            vec![ForgetTrip, EnterStage(PayloadCollection), CollectPayload]
        }
    };

    TurnPlan { from: current, trigger, actions }
}
