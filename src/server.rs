//! HTTP recommendation service: the remote end `HttpGateway` talks to.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::data::Category;
use crate::gateway::{
    GatewayError, RecommendationGateway, RecommendationRequest, RecommendationResponse,
};
use crate::scoring;

#[derive(Clone)]
pub struct AppState {
    gateway: Arc<dyn RecommendationGateway>,
    api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn RecommendationGateway>, api_key: Option<String>) -> Self {
        Self {
            gateway,
            api_key: api_key.map(Arc::from),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing or invalid bearer token")]
    Unauthorized,
    #[error("invalid request body: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error("recommendation task failed: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Gateway(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/recommendations", post(recommendations_endpoint))
        .with_state(state)
}

pub async fn run(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let source = state.gateway.name().to_string();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %source, "Recommendation service ready");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn recommendations_endpoint(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> Result<Json<RecommendationResponse>, ApiError> {
    authorize(state.api_key.as_deref(), &headers)?;
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let category = match request.insurance_type.parse::<Category>() {
        Ok(category) => category,
        Err(err) => {
            tracing::warn!(error = %err, "Unknown insurance type, returning generic plan");
            return Ok(Json(RecommendationResponse {
                recommendations: vec![scoring::fallback_offer()],
            }));
        }
    };

    tracing::info!(%category, answers = request.answers.len(), "Recommendation request");
    let gateway = state.gateway.clone();
    let answers = request.answers;
    let recommendations = tokio::task::spawn_blocking(move || {
        gateway.request_recommendations(category, &answers)
    })
    .await
    .map_err(|err| ApiError::Internal(err.to_string()))??;

    Ok(Json(RecommendationResponse { recommendations }))
}

fn authorize(expected: Option<&str>, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    let matches = presented
        .is_some_and(|token| bool::from(token.as_bytes().ct_eq(expected.as_bytes())));
    if matches {
        Ok(())
    } else {
        tracing::warn!("Rejected request without a valid bearer token");
        Err(ApiError::Unauthorized)
    }
}
