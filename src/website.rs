//! Product-site analysis: fetch a page, pull its readable text, mine
//! keywords, and build a `ProjectContext` with LLM enrichment plus heuristic
//! fallbacks for every field.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::time::Duration;

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::warn;

use crate::ad_library::USER_AGENTS;
use crate::llm::GeminiClient;
use crate::models::ProjectContext;

const LLM_SNIPPET_CHARS: usize = 10_000;
const KEYWORD_TOP_N: usize = 15;
const PRIMARY_CLUSTER_SIZE: usize = 5;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    vec![
        "the", "and", "to", "of", "a", "in", "is", "it", "for", "with", "on", "that", "this",
        "are", "as", "be", "by", "at", "from", "or", "an", "not", "your", "we", "can", "you",
        "if", "will", "all", "has", "more", "about", "our", "us",
    ]
    .into_iter()
    .collect()
});

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

/// Fetch a URL and return its readable main text.
pub async fn fetch_page_text(url: &str) -> Result<String> {
    use rand::seq::SliceRandom;
    let user_agent = USER_AGENTS
        .choose(&mut rand::thread_rng())
        .unwrap_or(&"Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36");

    let client = reqwest::Client::builder()
        .user_agent(*user_agent)
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(Duration::from_secs(30))
        .build()?;

    let resp = client
        .get(url)
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await?;
    let final_url = resp.url().to_string();
    let html = resp.text().await?;
    if html.is_empty() {
        bail!("could not fetch URL: {url}");
    }

    let mut reader = Cursor::new(html.as_bytes());
    let text = match readability::extractor::extract(&mut reader, &reqwest::Url::parse(&final_url)?)
    {
        Ok(product) => product.text,
        Err(_) => String::new(),
    };
    if text.trim().is_empty() {
        bail!("could not extract text from URL: {url}");
    }
    Ok(text)
}

/// Frequency-ranked keywords; stop words and short tokens dropped. Kept as a
/// deterministic backstop next to the LLM clusters.
pub fn extract_keywords(text: &str, top_n: usize) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for m in WORD_RE.find_iter(&lowered) {
        let word = m.as_str();
        if word.chars().count() > 3 && !STOP_WORDS.contains(word) {
            *counts.entry(word).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(w, _)| w.to_string())
        .collect()
}

fn infer_category(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    if lowered.contains("software") {
        "SaaS"
    } else if lowered.contains("shop") {
        "E-commerce"
    } else {
        "General"
    }
}

fn str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

fn str_list_field(v: &Value, key: &str) -> Vec<String> {
    v.get(key)
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn clusters_field(v: &Value) -> Option<HashMap<String, Vec<String>>> {
    v.get("keyword_clusters")
        .and_then(|c| serde_json::from_value(c.clone()).ok())
        .filter(|m: &HashMap<String, Vec<String>>| !m.is_empty())
}

fn default_clusters(keywords: &[String]) -> HashMap<String, Vec<String>> {
    let split = keywords.len().min(PRIMARY_CLUSTER_SIZE);
    HashMap::from([
        ("primary".to_string(), keywords[..split].to_vec()),
        ("secondary".to_string(), keywords[split..].to_vec()),
    ])
}

async fn analyze_with_llm(llm: &GeminiClient, text: &str, url: &str) -> Value {
    if !llm.is_configured() {
        warn!("GEMINI_API_KEY not configured; using heuristics");
        return Value::Null;
    }

    let snippet: String = text.chars().take(LLM_SNIPPET_CHARS).collect();
    let prompt = format!(
        r#"Analyze the following website content and extract structured information for a marketing campaign.

URL: {url}
Content Snippet: {snippet}

Return a valid JSON object with the following keys and no markdown formatting:
- product_idea: A clear, 1-2 sentence summary of the company/product and its value prop.
- category: The specific industry or niche (e.g., "SaaS - Email Marketing", "E-commerce - Women's Fashion").
- icp: A concise description of the Ideal Customer Profile.
- keyword_clusters: A dictionary where keys are themes (e.g., "features", "pain_points") and values are lists of relevant keywords.
- offer_constraints: A list of noticed constraints (e.g., "US only", "requires demo", "subscription based").
"#
    );

    match llm.generate_json(&prompt).await {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Gemini context analysis failed; using heuristics");
            Value::Null
        }
    }
}

/// Build a `ProjectContext` from a product website. LLM output fills the
/// structured fields when available; every field has a heuristic fallback.
pub async fn analyze_url(llm: &GeminiClient, url: &str, country: &str) -> Result<ProjectContext> {
    let text = fetch_page_text(url).await?;
    let llm_data = analyze_with_llm(llm, &text, url).await;
    let keywords = extract_keywords(&text, KEYWORD_TOP_N);

    let product_idea = str_field(&llm_data, "product_idea")
        .unwrap_or_else(|| "Company/Product analysis pending.".to_string());
    let mut category = str_field(&llm_data, "category").unwrap_or_else(|| "General".to_string());
    if category == "General" {
        category = infer_category(&text).to_string();
    }
    let icp = str_field(&llm_data, "icp")
        .unwrap_or_else(|| "Unknown (Could not extract)".to_string());
    let keyword_clusters =
        clusters_field(&llm_data).unwrap_or_else(|| default_clusters(&keywords));
    let offer_constraints = str_list_field(&llm_data, "offer_constraints");

    Ok(ProjectContext {
        url: Some(url.to_string()),
        product_idea: Some(product_idea),
        country: country.to_string(),
        language: "en".to_string(),
        category,
        icp,
        offer_constraints,
        keyword_clusters,
    })
}

/// Patch an existing context from a free-form refinement message. Infallible;
/// without a working LLM the refinement is appended to the ICP verbatim.
pub async fn refine_context(
    llm: &GeminiClient,
    mut context: ProjectContext,
    message: &str,
) -> ProjectContext {
    if !llm.is_configured() {
        context.icp.push_str(&format!(" (Refined: {message})"));
        return context;
    }

    let prompt = format!(
        r#"Update the following project context based on the user's refinement message.

Current Context:
{}

Refinement Message:
"{message}"

Return a valid JSON object with the UPDATED keys only. Do not change keys that are not affected.
Keys: product_idea, category, icp, keyword_clusters, offer_constraints.
"#,
        serde_json::to_string(&context).unwrap_or_default(),
    );

    match llm.generate_json(&prompt).await {
        Ok(patch) => apply_patch(&mut context, &patch),
        Err(e) => {
            warn!(error = %e, "Gemini refinement failed");
            context.icp.push_str(&format!(" (Refined: {message})"));
        }
    }
    context
}

fn apply_patch(context: &mut ProjectContext, patch: &Value) {
    if let Some(v) = str_field(patch, "product_idea") {
        context.product_idea = Some(v);
    }
    if let Some(v) = str_field(patch, "category") {
        context.category = v;
    }
    if let Some(v) = str_field(patch, "icp") {
        context.icp = v;
    }
    if let Some(v) = clusters_field(patch) {
        context.keyword_clusters = v;
    }
    if patch.get("offer_constraints").is_some() {
        context.offer_constraints = str_list_field(patch, "offer_constraints");
    }
}
