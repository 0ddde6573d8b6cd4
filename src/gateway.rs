use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::config::{GatewayConfig, RecommendationSource};
use crate::data::{AnswerSet, Category, PlanOffer};
use crate::scoring;

/// Body of a recommendation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub insurance_type: String,
    #[serde(default)]
    pub answers: AnswerSet,
}

impl RecommendationRequest {
    pub fn new(category: Category, answers: &AnswerSet) -> Self {
        Self {
            insurance_type: category.as_str().to_string(),
            answers: answers.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub recommendations: Vec<PlanOffer>,
}

/// A `null` list reads as empty, the same as an absent one.
fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<PlanOffer>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<PlanOffer>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Network failure, non-success status, or an undecodable body.
    #[error("could not reach the recommendation service: {0}")]
    Transport(String),
    /// The service answered but reported a failure.
    #[error("recommendation service failed: {0}")]
    Service(String),
}

/// Source of plan offers for a completed questionnaire.
///
/// Calls are independent; retrying repeats the same request from scratch.
pub trait RecommendationGateway: Send + Sync {
    fn name(&self) -> &str;
    fn request_recommendations(
        &self,
        category: Category,
        answers: &AnswerSet,
    ) -> Result<Vec<PlanOffer>, GatewayError>;
}

/// Local deterministic scoring.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoringGateway;

impl RecommendationGateway for ScoringGateway {
    fn name(&self) -> &str {
        "scoring"
    }

    fn request_recommendations(
        &self,
        category: Category,
        answers: &AnswerSet,
    ) -> Result<Vec<PlanOffer>, GatewayError> {
        Ok(scoring::recommend(category, answers))
    }
}

/// Fixed catalogue of plans per category, independent of the answers.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureGateway;

impl FixtureGateway {
    #[allow(clippy::too_many_arguments)]
    fn plan(
        id: &str,
        name: &str,
        provider: &str,
        coverage: &str,
        premium: u64,
        highlights: [&str; 4],
        rating: f32,
        link: &str,
    ) -> PlanOffer {
        PlanOffer {
            id: id.into(),
            name: name.into(),
            provider: provider.into(),
            coverage: coverage.into(),
            premium,
            highlights: highlights.iter().map(|s| s.to_string()).collect(),
            rating,
            link: Some(link.into()),
        }
    }

    pub fn plans(category: Category) -> Vec<PlanOffer> {
        match category {
            Category::Health => vec![
                Self::plan(
                    "hdfc_health_1",
                    "HDFC ERGO Health Suraksha",
                    "HDFC ERGO",
                    "₹5,00,000",
                    12_000,
                    [
                        "Cashless treatment",
                        "Pre & post hospitalization",
                        "Day care procedures",
                        "No room rent limit",
                    ],
                    4.5,
                    "https://www.hdfcergo.com/health-insurance",
                ),
                Self::plan(
                    "icici_health_1",
                    "ICICI Lombard Complete Health",
                    "ICICI Lombard",
                    "₹3,00,000",
                    8_500,
                    [
                        "Worldwide coverage",
                        "Pre-existing diseases",
                        "Maternity benefits",
                        "Health check-up",
                    ],
                    4.3,
                    "https://www.icicilombard.com/health-insurance",
                ),
                Self::plan(
                    "bajaj_health_1",
                    "Bajaj Allianz Health Guard",
                    "Bajaj Allianz",
                    "₹4,00,000",
                    10_000,
                    [
                        "Family floater",
                        "No co-payment",
                        "Cumulative bonus",
                        "Emergency assistance",
                    ],
                    4.2,
                    "https://www.bajajallianz.com/health-insurance",
                ),
            ],
            Category::Term => vec![
                Self::plan(
                    "t1",
                    "iSecure Smart",
                    "ICICI Prudential",
                    "₹1 crore",
                    9_000,
                    [
                        "Life cover up to 85 years of age",
                        "Option to increase cover at key life stages",
                        "Terminal illness benefit",
                        "Tax benefits under Section 80C",
                    ],
                    4.7,
                    "https://www.iciciprulife.com/term-insurance-plans",
                ),
                Self::plan(
                    "t2",
                    "Click 2 Protect Life",
                    "HDFC Life",
                    "₹75 lakhs",
                    7_500,
                    [
                        "Choice of death benefit payout options",
                        "Special rates for women and non-smokers",
                        "Optional critical illness cover",
                        "Return of premium option",
                    ],
                    4.4,
                    "https://www.hdfclife.com/term-insurance-plans",
                ),
                Self::plan(
                    "t3",
                    "Smart Term Plan",
                    "Max Life",
                    "₹50 lakhs",
                    6_000,
                    [
                        "Special premium rates for non-smokers",
                        "Optional critical illness cover",
                        "Flexibility to increase cover",
                        "98.74% claim settlement ratio",
                    ],
                    4.3,
                    "https://www.maxlifeinsurance.com/term-insurance-plans",
                ),
            ],
            Category::Vehicle => vec![
                Self::plan(
                    "v1",
                    "Motor Secure Plus",
                    "Bajaj Allianz",
                    "Comprehensive",
                    5_000,
                    [
                        "24/7 roadside assistance",
                        "Zero depreciation cover",
                        "Personal accident cover",
                        "No claim bonus protection",
                    ],
                    4.6,
                    "https://www.bajajallianz.com/motor-insurance",
                ),
                Self::plan(
                    "v2",
                    "Drive Assured",
                    "ICICI Lombard",
                    "Comprehensive",
                    4_500,
                    [
                        "Cashless repairs at network garages",
                        "Engine protection cover",
                        "Return to invoice cover",
                        "No claim bonus upto 50%",
                    ],
                    4.3,
                    "https://www.icicilombard.com/motor-insurance",
                ),
                Self::plan(
                    "v3",
                    "Two Wheeler Insurance",
                    "HDFC ERGO",
                    "Third Party",
                    2_000,
                    [
                        "Mandatory third party cover",
                        "Personal accident cover of ₹15 lakhs",
                        "Easy claim settlement process",
                        "Quick policy issuance",
                    ],
                    4.1,
                    "https://www.hdfcergo.com/motor-insurance",
                ),
            ],
        }
    }
}

impl RecommendationGateway for FixtureGateway {
    fn name(&self) -> &str {
        "fixture"
    }

    fn request_recommendations(
        &self,
        category: Category,
        _answers: &AnswerSet,
    ) -> Result<Vec<PlanOffer>, GatewayError> {
        Ok(Self::plans(category))
    }
}

/// Remote recommendation service reached over authenticated JSON POST.
pub struct HttpGateway {
    client: reqwest::blocking::Client,
    url: String,
    api_key: Option<String>,
}

impl HttpGateway {
    pub fn new(
        url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            api_key,
        })
    }
}

impl RecommendationGateway for HttpGateway {
    fn name(&self) -> &str {
        "remote"
    }

    fn request_recommendations(
        &self,
        category: Category,
        answers: &AnswerSet,
    ) -> Result<Vec<PlanOffer>, GatewayError> {
        let body = RecommendationRequest::new(category, answers);
        tracing::info!(
            url = %self.url,
            %category,
            answers = answers.len(),
            "Requesting recommendations"
        );

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| error_message(&v))
                .unwrap_or(text);
            tracing::warn!(%status, %detail, "Recommendation service returned an error status");
            return Err(GatewayError::Transport(format!("HTTP {status}: {detail}")));
        }

        let offers = parse_response(&text)?;
        tracing::info!(count = offers.len(), "Received recommendations");
        Ok(offers)
    }
}

fn error_message(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::Null => None,
        Value::String(message) => Some(message.clone()),
        other => Some(other.to_string()),
    }
}

/// Decode a success body: an `error` field is a service failure and a
/// missing or null `recommendations` field is an empty result.
pub fn parse_response(text: &str) -> Result<Vec<PlanOffer>, GatewayError> {
    let body: Value = serde_json::from_str(text)
        .map_err(|e| GatewayError::Transport(format!("malformed response body: {e}")))?;

    if let Some(message) = error_message(&body) {
        return Err(GatewayError::Service(message));
    }

    let response: RecommendationResponse = serde_json::from_value(body)
        .map_err(|e| GatewayError::Transport(format!("malformed recommendations: {e}")))?;
    Ok(response.recommendations)
}

/// Build the gateway selected by configuration.
pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Box<dyn RecommendationGateway>> {
    let gateway: Box<dyn RecommendationGateway> = match config.source {
        RecommendationSource::Scoring => Box::new(ScoringGateway),
        RecommendationSource::Fixture => Box::new(FixtureGateway),
        RecommendationSource::Remote => {
            let url = config
                .url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("remote source requires a gateway URL"))?;
            Box::new(HttpGateway::new(
                url,
                config.api_key.clone(),
                config.timeout,
            )?)
        }
    };
    tracing::debug!(source = gateway.name(), "Recommendation source ready");
    Ok(gateway)
}
