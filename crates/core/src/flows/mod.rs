pub mod engine;
pub mod states;

pub use engine::{ConversationFlow, StageEngine, TravelQuoteFlow};
pub use states::{is_greeting, Stage, TurnAction, TurnPlan, TurnTrigger};
