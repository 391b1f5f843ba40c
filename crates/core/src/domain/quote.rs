use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Trip details collected from the user, forwarded verbatim to the quotation
/// service. No structural validation happens on this side.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuotePayload(pub Value);

impl QuotePayload {
    /// `None` when the stored value cannot stand for a payload: null, an empty
    /// object, an empty string, or `false`.
    pub fn from_stored(value: &Value) -> Option<Self> {
        has_content(value).then(|| Self(value.clone()))
    }
}

/// False for null, `false`, zero, and empty strings, arrays or objects.
pub fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
        Value::Number(number) => number.as_f64().is_some_and(|amount| amount != 0.0),
    }
}

/// Premium record for `plan_key`, if the service returned one with content.
pub fn quoted_premium<'a>(premiums: &'a PremiumTable, plan_key: &str) -> Option<&'a Value> {
    premiums.get(plan_key).filter(|record| has_content(record))
}

/// Plan key to premium record, as returned by the quotation service.
pub type PremiumTable = Map<String, Value>;

pub const UNKNOWN_API_ERROR: &str = "Unknown API error";

/// Uniform outcome of one quotation call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuoteApiResult {
    pub success: bool,
    pub errors: Vec<String>,
    pub premiums: PremiumTable,
}

impl QuoteApiResult {
    pub fn succeeded(premiums: PremiumTable) -> Self {
        Self { success: true, errors: Vec::new(), premiums }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, errors: vec![error.into()], premiums: PremiumTable::new() }
    }

    pub fn first_error(&self) -> &str {
        self.errors.first().map(String::as_str).unwrap_or(UNKNOWN_API_ERROR)
    }

    /// Normalizes a decoded response body.
    pub fn from_response(response: QuoteApiResponse) -> Self {
        let premiums = response.data.map(|data| data.premiums).unwrap_or_default();
        Self { success: is_success_flag(&response.success), errors: response.errors, premiums }
    }
}

/// Wire shape of the quotation service response.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteApiResponse {
    #[serde(default)]
    pub success: Value,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<QuoteApiData>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteApiData {
    #[serde(default)]
    pub premiums: PremiumTable,
}

/// Only the exact strings "true" and "ok" count as success.
pub fn is_success_flag(value: &Value) -> bool {
    matches!(value.as_str(), Some("true" | "ok"))
}

/// Reads `discounted_premium` from a premium record. A missing or unreadable
/// amount counts as zero.
pub fn discounted_premium(record: &Value) -> Decimal {
    let Some(amount) = record.get("discounted_premium") else {
        return Decimal::ZERO;
    };
    match amount {
        Value::Number(number) => {
            if let Some(integer) = number.as_i64() {
                Decimal::from(integer)
            } else {
                number.as_f64().and_then(|float| Decimal::try_from(float).ok()).unwrap_or_default()
            }
        }
        Value::String(text) => text.trim().parse().unwrap_or_default(),
        _ => Decimal::ZERO,
    }
}
