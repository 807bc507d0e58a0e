//! Wire types shared across the API surface.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

pub(crate) fn default_country() -> String {
    "ALL".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

/// Context extracted from the user's website or brief.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct ProjectContext {
    pub url: Option<String>,
    /// Summary of the company/product and its core value proposition.
    pub product_idea: Option<String>,
    /// Target country code (e.g. US, IN) or ALL.
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_language")]
    pub language: String,
    pub category: String,
    /// Ideal Customer Profile.
    pub icp: String,
    #[serde(default)]
    pub offer_constraints: Vec<String>,
    /// Keyword clusters for search; the "primary" cluster drives URL generation.
    #[serde(default)]
    pub keyword_clusters: HashMap<String, Vec<String>>,
}

impl ProjectContext {
    pub fn cluster(&self, name: &str) -> &[String] {
        self.keyword_clusters
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Carousel,
    #[default]
    Unknown,
}

/// A single ad collected from the Meta Ad Library (or synthesized as fallback).
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct AdRecord {
    pub advertiser: String,
    /// Start date as displayed by the source; unverified.
    pub start_date: Option<String>,
    /// Canonical link to the ad's detail page. Always absolute.
    pub snapshot_url: String,
    pub primary_text: Option<String>,
    pub headline: Option<String>,
    pub cta: Option<String>,
    #[serde(default)]
    pub placements: Vec<String>,
    #[serde(default)]
    pub media_type: MediaType,
    pub impressions_lower: Option<i64>,
    pub impressions_upper: Option<i64>,
    pub media_url: Option<String>,
}

/// Provenance of a search result set: a genuine scrape or the synthetic fallback.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AdSource {
    Live,
    Fallback,
}

/// Detailed analysis of a single ad.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct AdAnalysis {
    #[serde(default)]
    pub ad_snapshot_url: String,
    #[serde(default)]
    pub hook_type: String,
    #[serde(default)]
    pub visual_hooks: Vec<String>,
    #[serde(default)]
    pub audio_hooks: Vec<String>,
    #[serde(default)]
    pub offer_structure: String,
    #[serde(default)]
    pub proof_elements: Vec<String>,
    pub pacing_notes: Option<String>,
    #[serde(default)]
    pub copy_patterns: Vec<String>,
    #[serde(default)]
    pub ctas_alignment: String,
    #[serde(default)]
    pub risks: Vec<String>,
    /// Modular creative building blocks identified in the ad.
    #[serde(default)]
    pub creative_atoms: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct PatternStat {
    #[serde(default)]
    pub pattern_name: String,
    #[serde(default)]
    pub frequency: f64,
    #[serde(default)]
    pub confidence: String,
}

/// Cross-ad synthesis: recurring patterns and the gaps between them.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct Synthesis {
    #[serde(default)]
    pub ad_count: usize,
    #[serde(default)]
    pub dominant_patterns: Vec<PatternStat>,
    #[serde(default)]
    pub creative_laws: Vec<String>,
    #[serde(default)]
    pub fatigue_signals: Vec<String>,
    #[serde(default)]
    pub untapped_angles: Vec<String>,
    pub competitor_contrast: Option<String>,
}

/// A net-new ad concept generated from the synthesis.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct GeneratedCreative {
    #[serde(default)]
    pub concept_name: String,
    #[serde(default)]
    pub hook_script: String,
    #[serde(default)]
    pub visual_description: String,
    #[serde(default)]
    pub why_it_works: String,
    #[serde(default)]
    pub script_body: String,
    #[serde(default)]
    pub cta_text: String,
    #[serde(default)]
    pub suggested_visuals: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct GeneratedCreatives {
    pub concepts: Vec<GeneratedCreative>,
}

/// An ad hook: the first one or two sentences of a piece of ad copy.
#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct Hook {
    pub text: String,
    pub trigger: String,
    pub angle: String,
}
