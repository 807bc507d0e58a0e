mod ad_library;
mod analysis;
mod api;
mod extract;
mod hooks;
mod llm;
mod mock;
mod models;
mod stealth;
mod website;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use dotenv::dotenv;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::llm::{GeminiClient, GeminiConfig};

#[derive(OpenApi)]
#[openapi(
    paths(
        api::read_root,
        api::extract_context,
        api::refine_context,
        api::search_ads,
        api::analyze_ads,
        api::generate_hooks
    ),
    components(
        schemas(
            api::UrlRequest,
            api::ContextResponse,
            api::RefinementRequest,
            api::SearchRequest,
            api::SearchResponse,
            api::AnalysisRequest,
            api::HooksRequest,
            api::HooksResponse,
            api::StatusResponse,
            crate::models::ProjectContext,
            crate::models::AdRecord,
            crate::models::MediaType,
            crate::models::AdSource,
            crate::models::AdAnalysis,
            crate::models::PatternStat,
            crate::models::Synthesis,
            crate::models::GeneratedCreative,
            crate::models::GeneratedCreatives,
            crate::models::Hook,
            crate::analysis::AnalysisReport
        )
    ),
    tags(
        (name = "status", description = "Service health"),
        (name = "context", description = "Project context extraction and refinement"),
        (name = "ads", description = "Ad Library search"),
        (name = "creative", description = "Creative analysis and generation")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let llm = GeminiClient::new(GeminiConfig::from_env());
    if !llm.is_configured() {
        warn!("GEMINI_API_KEY missing or placeholder; LLM endpoints will serve mock output");
    }
    let state = Arc::new(api::AppState { llm });

    // The Next.js frontend runs on localhost:3000 in dev.
    let cors = CorsLayer::new()
        .allow_origin("http://localhost:3000".parse::<HeaderValue>()?)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(api::read_root))
        .route("/api/extract-context", post(api::extract_context))
        .route("/api/refine-context", post(api::refine_context))
        .route("/api/search-ads", post(api::search_ads))
        .route("/api/analyze", post(api::analyze_ads))
        .route("/api/generate-hooks", post(api::generate_hooks))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
    println!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
