//! Conversation runtime for travel-insurance quoting.
//!
//! One user message is one turn. The `Orchestrator` reads the session stage,
//! routes the message through the stage engine and hands it to the matching
//! handler:
//! 1. **Payload collection** (`payload`) gathers trip details into a quote payload
//! 2. **Quote generation** (`quote_manager`) prices every plan through `quote_api`
//! 3. **Plan selection** (`plan_selection`) checks the user's choice against the
//!    premiums that were shown
//!
//! Session state lives behind the `SessionStore` seam (`session`); nothing here
//! keeps state between turns.
//!
//! # Failure model
//!
//! Quotation transport and HTTP failures come back as unsuccessful
//! `QuoteApiResult`s. Every other failure is an `ApplicationError` that travels
//! up to the orchestrator, which answers with a fixed apology instead.

pub mod payload;
pub mod plan_selection;
pub mod quote_api;
pub mod quote_manager;
pub mod reply;
pub mod runtime;
pub mod session;

#[cfg(test)]
mod testing;

pub use payload::{FormPayloadAgent, PayloadAgent};
pub use plan_selection::{OfficialPremiumSelector, PlanSelectionHandler};
pub use quote_api::{quote_api_from_config, HttpQuoteApi, MockQuoteApi, QuoteApi, QuoteApiMode};
pub use quote_manager::QuoteManager;
pub use reply::AgentReply;
pub use runtime::{Orchestrator, CRITICAL_FAILURE_REPLY};
pub use session::{InMemorySessionStore, SessionStore};
