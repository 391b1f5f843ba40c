use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use tripcover_core::config::AppConfig;
use tripcover_core::domain::quote::QuoteApiResponse;
use tripcover_core::{ApplicationError, PremiumTable, QuoteApiResult, QuotePayload};

pub const QUOTE_SERVICE_UNREACHABLE: &str =
    "Unknown error: the quotation service could not be reached";
pub const QUOTE_RESPONSE_UNREADABLE: &str =
    "Unknown error: the quotation service returned an unreadable response";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuoteApiMode {
    Mock,
    Live,
}

impl QuoteApiMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mock => "mock",
            Self::Live => "live",
        }
    }
}

/// Source of plan premiums for a trip payload.
///
/// `fetch_quotes` never fails: every transport or HTTP problem comes back as an
/// unsuccessful result with at least one error message.
#[async_trait]
pub trait QuoteApi: Send + Sync {
    fn mode(&self) -> QuoteApiMode;
    async fn fetch_quotes(&self, payload: &QuotePayload) -> QuoteApiResult;
}

/// Fixed premiums for offline operation and tests. Never touches the network.
#[derive(Clone, Debug, Default)]
pub struct MockQuoteApi;

pub fn mock_premiums() -> PremiumTable {
    let table = json!({
        "basic": { "discounted_premium": 21.00 },
        "silver": { "discounted_premium": 28.00 },
        "gold": { "discounted_premium": 36.50 },
        "platinum": { "discounted_premium": 47.00 }
    });
    match table {
        Value::Object(premiums) => premiums,
        _ => PremiumTable::new(),
    }
}

#[async_trait]
impl QuoteApi for MockQuoteApi {
    fn mode(&self) -> QuoteApiMode {
        QuoteApiMode::Mock
    }

    async fn fetch_quotes(&self, _payload: &QuotePayload) -> QuoteApiResult {
        warn!(event_name = "quote_api.mock_call", "mock quotation call, no request sent");
        QuoteApiResult::succeeded(mock_premiums())
    }
}

/// Posts the payload to the quotation service once, with a bounded timeout.
#[derive(Clone, Debug)]
pub struct HttpQuoteApi {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpQuoteApi {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ApplicationError> {
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|error| {
            ApplicationError::Integration(format!("could not build quotation client: {error}"))
        })?;
        Ok(Self { client, endpoint: endpoint.into() })
    }
}

#[async_trait]
impl QuoteApi for HttpQuoteApi {
    fn mode(&self) -> QuoteApiMode {
        QuoteApiMode::Live
    }

    async fn fetch_quotes(&self, payload: &QuotePayload) -> QuoteApiResult {
        info!(
            event_name = "quote_api.request",
            endpoint = %self.endpoint,
            "calling quotation service"
        );

        let response = match self.client.post(&self.endpoint).json(payload).send().await {
            Ok(response) => response,
            Err(error) => {
                error!(
                    event_name = "quote_api.transport_error",
                    endpoint = %self.endpoint,
                    timeout = error.is_timeout(),
                    error = %error,
                    "quotation request failed before a response arrived"
                );
                return QuoteApiResult::failed(QUOTE_SERVICE_UNREACHABLE);
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                event_name = "quote_api.http_error",
                endpoint = %self.endpoint,
                status = status.as_u16(),
                body = %body,
                "quotation service returned an error status"
            );
            return QuoteApiResult::failed(format!("HTTP error: {}", status.as_u16()));
        }

        match response.json::<QuoteApiResponse>().await {
            Ok(body) => {
                let result = QuoteApiResult::from_response(body);
                info!(
                    event_name = "quote_api.response",
                    status = status.as_u16(),
                    success = result.success,
                    plans = result.premiums.len(),
                    "quotation service responded"
                );
                result
            }
            Err(error) => {
                error!(
                    event_name = "quote_api.decode_error",
                    endpoint = %self.endpoint,
                    error = %error,
                    "quotation response could not be decoded"
                );
                QuoteApiResult::failed(QUOTE_RESPONSE_UNREADABLE)
            }
        }
    }
}

/// Picks the client once from configuration: mock unless `mock_mode` is off.
pub fn quote_api_from_config(config: &AppConfig) -> Result<Arc<dyn QuoteApi>, ApplicationError> {
    if config.quote_api.mock_mode {
        info!(event_name = "quote_api.mode_selected", mode = "mock", "quotation client ready");
        return Ok(Arc::new(MockQuoteApi));
    }

    let endpoint = config.quote_endpoint();
    let client =
        HttpQuoteApi::new(endpoint.clone(), Duration::from_secs(config.quote_api.timeout_secs))?;
    info!(
        event_name = "quote_api.mode_selected",
        mode = "live",
        endpoint = %endpoint,
        timeout_secs = config.quote_api.timeout_secs,
        "quotation client ready"
    );
    Ok(Arc::new(client))
}
