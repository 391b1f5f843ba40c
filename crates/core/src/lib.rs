//! Domain core for the travel-insurance quote conversation.
//!
//! Holds the conversation stage machine, the plan catalog, the quote payload and
//! quotation result shapes, comparison rendering, configuration and the error
//! taxonomy. Nothing in this crate performs I/O beyond reading configuration.

pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod quotation;

pub use domain::plan::{PlanEntry, PlanTier, PLAN_CATALOG};
pub use domain::quote::{PremiumTable, QuoteApiResult, QuotePayload};
pub use domain::session::{CollectedInfo, ConversationContext, ConversationTurn, SessionId};
pub use errors::{ApplicationError, DomainError, SessionError};
pub use flows::{
    is_greeting, ConversationFlow, Stage, StageEngine, TravelQuoteFlow, TurnAction, TurnPlan,
    TurnTrigger,
};
pub use quotation::comparison::{format_premium, render_plan_comparison};
