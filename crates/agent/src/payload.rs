use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::info;
use tripcover_core::domain::session::keys;
use tripcover_core::{
    is_greeting, ApplicationError, CollectedInfo, ConversationTurn, SessionId, Stage,
};

use crate::reply::AgentReply;
use crate::session::SessionStore;

/// Collects trip details for a session.
///
/// The agent owns `collected_info.payload`: it stores the finished payload there
/// and moves the session to `Stage::QuoteGeneration` once collection is complete.
#[async_trait]
pub trait PayloadAgent: Send + Sync {
    async fn run(
        &self,
        user_message: &str,
        history: &[ConversationTurn],
        session_id: &SessionId,
    ) -> Result<AgentReply, ApplicationError>;
}

pub const REQUIRED_FIELDS: [&str; 5] =
    ["trip_type", "destination", "departure_date", "return_date", "travellers"];

/// Deterministic agent that reads `field: value` (or `field=value`) pairs.
///
/// Pairs may be split by newlines, commas or semicolons. Fields gathered so far
/// live in `collected_info.draft` until every required field is present.
pub struct FormPayloadAgent {
    sessions: Arc<dyn SessionStore>,
}

impl FormPayloadAgent {
    pub fn new(sessions: Arc<dyn SessionStore>) -> Self {
        Self { sessions }
    }

    async fn load_draft(
        &self,
        session_id: &SessionId,
    ) -> Result<Map<String, Value>, ApplicationError> {
        let collected = self.sessions.collected_info(session_id).await?;
        Ok(match collected.get(keys::DRAFT) {
            Some(Value::Object(draft)) => draft.clone(),
            _ => Map::new(),
        })
    }
}

#[async_trait]
impl PayloadAgent for FormPayloadAgent {
    async fn run(
        &self,
        user_message: &str,
        _history: &[ConversationTurn],
        session_id: &SessionId,
    ) -> Result<AgentReply, ApplicationError> {
        if is_greeting(user_message) {
            self.sessions.set_stage(session_id, Stage::PayloadCollection).await?;
            return Ok(AgentReply::new(welcome_message()));
        }

        let parsed = parse_fields(user_message);
        let mut draft = self.load_draft(session_id).await?;
        for (field, value) in &parsed.accepted {
            draft.insert((*field).to_string(), value.clone());
        }

        let missing = missing_fields(&draft);
        let mut entries = CollectedInfo::new();
        entries.insert(keys::DRAFT.to_string(), Value::Object(draft.clone()));

        if missing.is_empty() {
            entries.insert(keys::PAYLOAD.to_string(), Value::Object(draft.clone()));
            self.sessions.merge_collected_info(session_id, entries).await?;
            self.sessions.set_stage(session_id, Stage::QuoteGeneration).await?;
            info!(
                event_name = "payload.collection_completed",
                session_id = %session_id,
                "trip details complete, quote generation is next"
            );
            return Ok(AgentReply::new(format!(
                "Thanks! I have everything I need:\n{}\n\nSend any message to see your quotes.",
                summarize(&draft)
            )));
        }

        self.sessions.merge_collected_info(session_id, entries).await?;

        let mut reply = String::new();
        if parsed.accepted.is_empty() {
            reply.push_str("Please share your trip details as `field: value` pairs.");
        } else {
            reply.push_str("Got it.");
        }
        if !parsed.rejected.is_empty() {
            reply.push_str(&format!(" I couldn't use: {}.", parsed.rejected.join(", ")));
        }
        reply.push_str(&format!(" I still need: {}.", missing.join(", ")));
        Ok(AgentReply::new(reply))
    }
}

fn welcome_message() -> String {
    format!(
        "Hello! I can get you travel insurance quotes. Please tell me your {} \
         (for example `destination: Japan, travellers: 2`).",
        REQUIRED_FIELDS.join(", ")
    )
}

#[derive(Debug, Default, PartialEq)]
struct ParsedFields {
    accepted: Vec<(&'static str, Value)>,
    rejected: Vec<String>,
}

fn parse_fields(message: &str) -> ParsedFields {
    let mut parsed = ParsedFields::default();

    for segment in message.split(['\n', ',', ';']) {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let Some((raw_key, raw_value)) = segment.split_once([':', '=']) else {
            parsed.rejected.push(segment.to_string());
            continue;
        };

        let value = raw_value.trim();
        match canonical_field(raw_key) {
            Some(field) if !value.is_empty() => match field_value(field, value) {
                Some(value) => parsed.accepted.push((field, value)),
                None => parsed.rejected.push(segment.to_string()),
            },
            _ => parsed.rejected.push(segment.to_string()),
        }
    }

    parsed
}

fn canonical_field(raw_key: &str) -> Option<&'static str> {
    let normalized = raw_key.trim().to_ascii_lowercase().replace([' ', '-'], "_");
    let field = match normalized.as_str() {
        "trip_type" | "trip" | "type" => "trip_type",
        "destination" | "to" | "country" => "destination",
        "departure_date" | "departure" | "depart" | "start_date" => "departure_date",
        "return_date" | "return" | "end_date" => "return_date",
        "travellers" | "travelers" | "pax" => "travellers",
        _ => return None,
    };
    Some(field)
}

fn field_value(field: &str, value: &str) -> Option<Value> {
    if field == "travellers" {
        return value.parse::<u32>().ok().filter(|count| *count > 0).map(Value::from);
    }
    Some(Value::String(value.to_string()))
}

fn missing_fields(draft: &Map<String, Value>) -> Vec<&'static str> {
    REQUIRED_FIELDS.into_iter().filter(|field| !draft.contains_key(*field)).collect()
}

fn summarize(draft: &Map<String, Value>) -> String {
    REQUIRED_FIELDS
        .iter()
        .filter_map(|field| {
            draft.get(*field).map(|value| match value {
                Value::String(text) => format!("- {field}: {text}"),
                other => format!("- {field}: {other}"),
            })
        })
        .collect::<Vec<_>>()
        .join("\n")
}
