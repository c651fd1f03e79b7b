use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use marquee_domain::{CatalogItem, ResultPage, Suggestion, query::is_blank};
use marquee_service::{BrowsePage, Error as ServiceError, FeedStatus, SearchStatus, SectionIssue};

use crate::{
	state::AppState,
	views::{SharedView, View},
};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/catalog/browse", get(browse))
		.route("/catalog/autocomplete", get(autocomplete))
		.route("/catalog/fuzzy", post(fuzzy))
		.route("/catalog/semantic", get(semantic))
		.route("/catalog/category", get(category))
		.route("/catalog/search", get(text_search))
		.route("/catalog/{id}", get(get_item))
		.route("/views/browse", post(open_browse))
		.route("/views/search", post(open_search))
		.route("/views/{view_id}/more", post(more))
		.route("/views/{view_id}", delete(close_view))
		.with_state(state)
}

/// Query text accepted as `text` or its short alias `t`.
#[derive(Debug, Deserialize)]
pub struct TextParams {
	#[serde(default, alias = "t")]
	pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseParams {
	pub page: Option<u32>,
	pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SemanticParams {
	#[serde(default)]
	pub query: String,
	pub page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct SemanticResponse {
	pub results: Vec<CatalogItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenBrowseRequest {
	pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct OpenSearchRequest {
	#[serde(alias = "t")]
	pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseViewResponse {
	pub view_id: Uuid,
	pub feed: ResultPage,
	pub status: FeedStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchViewResponse {
	pub view_id: Uuid,
	pub matches: Vec<CatalogItem>,
	pub similar: ResultPage,
	pub issues: Vec<SectionIssue>,
	pub status: SearchStatus,
}

/// Next page of one view: `feed` for browse views, `similar` for search views.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoreResponse {
	pub view_id: Uuid,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub feed: Option<ResultPage>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub similar: Option<ResultPage>,
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn browse(
	State(state): State<AppState>,
	Query(params): Query<BrowseParams>,
) -> Result<Json<BrowsePage>, ApiError> {
	let response = state.service.browse(params.page.unwrap_or(1), params.page_size).await?;
	Ok(Json(response))
}

async fn autocomplete(
	State(state): State<AppState>,
	Query(params): Query<TextParams>,
) -> Result<Json<Vec<Suggestion>>, ApiError> {
	if is_blank(&params.text) {
		return Ok(Json(Vec::new()));
	}
	let response = state.service.autocomplete(&params.text).await?;
	Ok(Json(response))
}

async fn fuzzy(
	State(state): State<AppState>,
	Query(params): Query<TextParams>,
) -> Result<Json<Vec<CatalogItem>>, ApiError> {
	if is_blank(&params.text) {
		return Ok(Json(Vec::new()));
	}
	let response = state.service.fuzzy(&params.text).await?;
	Ok(Json(response))
}

async fn semantic(
	State(state): State<AppState>,
	Query(params): Query<SemanticParams>,
) -> Result<Json<SemanticResponse>, ApiError> {
	let results = state.service.semantic(&params.query, params.page.unwrap_or(1)).await?;
	Ok(Json(SemanticResponse { results }))
}

async fn category(
	State(state): State<AppState>,
	Query(params): Query<TextParams>,
) -> Result<Json<Vec<CatalogItem>>, ApiError> {
	if is_blank(&params.text) {
		return Ok(Json(Vec::new()));
	}
	let response = state.service.category(&params.text).await?;
	Ok(Json(response))
}

async fn text_search(
	State(state): State<AppState>,
	Query(params): Query<TextParams>,
) -> Result<Json<Vec<CatalogItem>>, ApiError> {
	if is_blank(&params.text) {
		return Ok(Json(Vec::new()));
	}
	let response = state.service.text_search(&params.text).await?;
	Ok(Json(response))
}

async fn get_item(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<CatalogItem>, ApiError> {
	let response = state.service.get_item(&id).await?;
	Ok(Json(response))
}

async fn open_browse(
	State(state): State<AppState>,
	payload: Option<Json<OpenBrowseRequest>>,
) -> Result<Json<BrowseViewResponse>, ApiError> {
	let payload = payload.map(|Json(payload)| payload).unwrap_or_default();
	let (feed, page) = state.service.open_browse(payload.page_size).await?;
	let status = feed.status();
	let view_id = state.views.insert(View::Browse(feed));
	Ok(Json(BrowseViewResponse { view_id, feed: page, status }))
}

async fn open_search(
	State(state): State<AppState>,
	Json(payload): Json<OpenSearchRequest>,
) -> Result<Json<SearchViewResponse>, ApiError> {
	let (view, page) = state.service.open_search(&payload.text).await?;
	let view_id = state.views.insert(View::Search(view));
	Ok(Json(SearchViewResponse {
		view_id,
		matches: page.matches,
		similar: page.similar,
		issues: page.issues,
		status: page.status,
	}))
}

async fn more(
	State(state): State<AppState>,
	Path(view_id): Path<String>,
) -> Result<Json<MoreResponse>, ApiError> {
	let (view_id, view) = find_view(&state, &view_id)?;
	let mut view = view.lock().await;
	let response = match &mut *view {
		View::Browse(feed) => MoreResponse {
			view_id,
			feed: Some(state.service.more_browse(feed).await?),
			similar: None,
		},
		View::Search(search) => MoreResponse {
			view_id,
			feed: None,
			similar: Some(state.service.more_similar(search).await?),
		},
	};
	Ok(Json(response))
}

async fn close_view(
	State(state): State<AppState>,
	Path(view_id): Path<String>,
) -> Result<StatusCode, ApiError> {
	let id = parse_view_id(&view_id)?;
	if !state.views.remove(&id) {
		return Err(unknown_view(&view_id));
	}
	Ok(StatusCode::NO_CONTENT)
}

fn find_view(state: &AppState, raw: &str) -> Result<(Uuid, SharedView), ApiError> {
	let id = parse_view_id(raw)?;
	let view = state.views.get(&id).ok_or_else(|| unknown_view(raw))?;
	Ok((id, view))
}

fn parse_view_id(raw: &str) -> Result<Uuid, ApiError> {
	Uuid::parse_str(raw).map_err(|_| unknown_view(raw))
}

fn unknown_view(raw: &str) -> ApiError {
	json_error(StatusCode::NOT_FOUND, "NOT_FOUND", format!("No open view with id {raw:?}."), None)
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

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		let message = err.to_string();

		match err {
			ServiceError::InvalidQuery { .. } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_QUERY", message, None),
			ServiceError::NotFound { .. } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			ServiceError::EmbeddingUnavailable { .. } => json_error(
				StatusCode::SERVICE_UNAVAILABLE,
				"EMBEDDING_UNAVAILABLE",
				message,
				None,
			),
			ServiceError::RetrievalFailed { strategy, .. } => json_error(
				StatusCode::BAD_GATEWAY,
				"RETRIEVAL_FAILED",
				message,
				Some(vec![strategy.as_str().to_string()]),
			),
			ServiceError::AccumulatorConflict { .. } => {
				tracing::error!(error = %message, "Feed accumulator invariant violated.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "ACCUMULATOR_CONFLICT", message, None)
			},
			ServiceError::Storage { .. } =>
				json_error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", message, None),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };
		(self.status, Json(body)).into_response()
	}
}
