use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use reach_service::{CorpusStats, Error, HealthReport, QueryRequest, QueryResponse};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/assistant/query", post(query))
		.route("/v1/assistant/stats", get(stats))
		.route("/v1/assistant/health", get(service_health))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn query(
	State(state): State<AppState>,
	Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
	let response = state.service.process_query(payload).await?;

	Ok(Json(response))
}

async fn stats(State(state): State<AppState>) -> Json<CorpusStats> {
	Json(state.service.corpus_stats().await)
}

async fn service_health(State(state): State<AppState>) -> Json<HealthReport> {
	Json(state.service.health().await)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::EmptyQuery => ApiError::new(
				StatusCode::BAD_REQUEST,
				"empty_query",
				err.to_string(),
				Some(vec!["query".to_string()]),
			),
			Error::InvalidRequest { message } =>
				ApiError::new(StatusCode::BAD_REQUEST, "invalid_request", message, None),
			Error::InvalidConfig { message } =>
				ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "invalid_config", message, None),
			Error::StoreUnavailable { message } =>
				ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", message, None),
			Error::Provider { message } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "provider_error", message, None),
			Error::Timeout { .. } =>
				ApiError::new(StatusCode::GATEWAY_TIMEOUT, "timeout", err.to_string(), None),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}
