use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Phase of a conversation; decides which handler sees the next message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Initial,
    PayloadCollection,
    QuoteGeneration,
    PlanSelection,
    PlanConfirmed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::PayloadCollection => "payload_collection",
            Self::QuoteGeneration => "quote_generation",
            Self::PlanSelection => "plan_selection",
            Self::PlanConfirmed => "plan_confirmed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "initial" => Ok(Self::Initial),
            "payload_collection" => Ok(Self::PayloadCollection),
            "quote_generation" => Ok(Self::QuoteGeneration),
            "plan_selection" => Ok(Self::PlanSelection),
            "plan_confirmed" => Ok(Self::PlanConfirmed),
            other => Err(DomainError::UnknownStage(other.to_owned())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnTrigger {
    /// "hi" or "hello", ignoring case and surrounding whitespace.
    Greeting,
    Message,
}

impl TurnTrigger {
    pub fn classify(message: &str) -> Self {
        if is_greeting(message) {
            Self::Greeting
        } else {
            Self::Message
        }
    }
}

pub fn is_greeting(message: &str) -> bool {
    matches!(message.trim().to_lowercase().as_str(), "hi" | "hello")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnAction {
    /// Wipe every piece of session state.
    ResetSession,
    /// Drop the finished trip's details, premiums and selection. History stays.
    ForgetTrip,
    EnterStage(Stage),
    CollectPayload,
    GenerateQuotes,
    SelectPlan,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnPlan {
    pub from: Option<Stage>,
    pub trigger: TurnTrigger,
    pub actions: Vec<TurnAction>,
}
