//! HTTP handlers and their request/response schemas.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::ad_library;
use crate::analysis::{self, AnalysisReport};
use crate::hooks;
use crate::llm::GeminiClient;
use crate::models::{AdRecord, AdSource, Hook, ProjectContext};
use crate::website;

pub struct AppState {
    pub llm: GeminiClient,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UrlRequest {
    pub url: String,
    #[serde(default = "crate::models::default_country")]
    pub country: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ContextResponse {
    pub context: ProjectContext,
    /// Primary plus secondary cluster keywords, flattened for convenience.
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefinementRequest {
    pub context: ProjectContext,
    pub refinement_message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    pub keywords: Vec<String>,
    #[serde(default = "crate::models::default_country")]
    pub country: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub ads: Vec<AdRecord>,
    pub source: AdSource,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalysisRequest {
    pub items: Vec<AdRecord>,
    pub context: ProjectContext,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct HooksRequest {
    pub context: ProjectContext,
    pub triggers: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HooksResponse {
    pub hooks: Vec<Hook>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

fn flat_keywords(context: &ProjectContext) -> Vec<String> {
    let mut keywords = context.cluster("primary").to_vec();
    keywords.extend_from_slice(context.cluster("secondary"));
    keywords
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, body = StatusResponse)),
    tag = "status"
)]
pub async fn read_root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "ok".to_string(),
        message: "Ad Agent API is running".to_string(),
    })
}

#[utoipa::path(
    post,
    path = "/api/extract-context",
    request_body = UrlRequest,
    responses(
        (status = 200, body = ContextResponse),
        (status = 500, description = "Page fetch or text extraction failed")
    ),
    tag = "context"
)]
pub async fn extract_context(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UrlRequest>,
) -> Result<Json<ContextResponse>, (StatusCode, String)> {
    let context = website::analyze_url(&state.llm, &req.url, &req.country)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let keywords = flat_keywords(&context);
    Ok(Json(ContextResponse { context, keywords }))
}

#[utoipa::path(
    post,
    path = "/api/refine-context",
    request_body = RefinementRequest,
    responses((status = 200, body = ContextResponse)),
    tag = "context"
)]
pub async fn refine_context(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefinementRequest>,
) -> Json<ContextResponse> {
    let context = website::refine_context(&state.llm, req.context, &req.refinement_message).await;
    let keywords = flat_keywords(&context);
    Json(ContextResponse { context, keywords })
}

/// Never fails: a failed or empty scrape degrades to synthetic records,
/// flagged by `source`.
#[utoipa::path(
    post,
    path = "/api/search-ads",
    request_body = SearchRequest,
    responses((status = 200, body = SearchResponse)),
    tag = "ads"
)]
pub async fn search_ads(Json(req): Json<SearchRequest>) -> Json<SearchResponse> {
    let outcome = ad_library::search_ads(&req.keywords, &req.country).await;
    Json(SearchResponse {
        ads: outcome.ads,
        source: outcome.source,
    })
}

#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body = AnalysisRequest,
    responses((status = 200, body = AnalysisReport)),
    tag = "creative"
)]
pub async fn analyze_ads(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AnalysisRequest>,
) -> Json<AnalysisReport> {
    Json(analysis::synthesize_and_generate(&state.llm, &req.items, &req.context).await)
}

#[utoipa::path(
    post,
    path = "/api/generate-hooks",
    request_body = HooksRequest,
    responses((status = 200, body = HooksResponse)),
    tag = "creative"
)]
pub async fn generate_hooks(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HooksRequest>,
) -> Json<HooksResponse> {
    let hooks = hooks::generate_hooks(&state.llm, &req.context, &req.triggers).await;
    Json(HooksResponse { hooks })
}
