//! Creative analysis: per-ad insight extraction, cross-ad synthesis and
//! net-new concept generation. Every step is LLM-backed with a deterministic
//! mock fallback, so the pipeline works end to end without a key.

use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::llm::GeminiClient;
use crate::models::{
    AdAnalysis, AdRecord, GeneratedCreative, GeneratedCreatives, PatternStat, ProjectContext,
    Synthesis,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalysisReport {
    pub analyses: Vec<AdAnalysis>,
    pub synthesis: Synthesis,
    pub creatives: GeneratedCreatives,
}

/// The full /api/analyze pipeline: per-ad analyses, one synthesis across
/// them, and net-new creative concepts.
pub async fn synthesize_and_generate(
    llm: &GeminiClient,
    ads: &[AdRecord],
    context: &ProjectContext,
) -> AnalysisReport {
    let analyses = analyze_ads(llm, ads).await;
    let synthesis = synthesize(llm, &analyses, context).await;
    let creatives = generate_creatives(llm, &synthesis, context).await;
    AnalysisReport {
        analyses,
        synthesis,
        creatives,
    }
}

pub async fn analyze_ads(llm: &GeminiClient, ads: &[AdRecord]) -> Vec<AdAnalysis> {
    let mut analyses = Vec::with_capacity(ads.len());
    for ad in ads {
        analyses.push(analyze_ad(llm, ad).await);
    }
    analyses
}

async fn analyze_ad(llm: &GeminiClient, ad: &AdRecord) -> AdAnalysis {
    if !llm.is_configured() {
        return mock_analysis(ad);
    }

    let prompt = format!(
        r#"Analyze this Facebook ad and provide structured insights.

Ad Context:
Overview: {}
Primary Text: {}
Headline: {}
CTA: {}

Please return a JSON object with the following fields:
- hook_type: (e.g., Problem-Agitation-Solution, Benefit-Driven, Story-Based)
- visual_hooks: List of visual elements that grab attention (infer from text usage if video not available, or suggest what they imply)
- audio_hooks: List of likely audio elements (suggest based on copy tone)
- offer_structure: (e.g., Discount, Bundle, Guarantee)
- proof_elements: (e.g., Testimonials, Numbers, Badges)
- pacing_notes: (e.g., Fast, Slow, Building)
- copy_patterns: List of patterns used in the text
- ctas_alignment: Strong/Weak
- risks: Potential downsides or compliance issues
- creative_atoms: Modular elements that can be reused
"#,
        ad.snapshot_url,
        ad.primary_text.as_deref().unwrap_or(""),
        ad.headline.as_deref().unwrap_or(""),
        ad.cta.as_deref().unwrap_or(""),
    );

    let parsed = llm
        .generate_json(&prompt)
        .await
        .and_then(|v| serde_json::from_value::<AdAnalysis>(v).map_err(Into::into));
    match parsed {
        Ok(mut analysis) => {
            analysis.ad_snapshot_url = ad.snapshot_url.clone();
            analysis
        }
        Err(e) => {
            warn!(error = %e, "Gemini ad analysis failed; using mock");
            mock_analysis(ad)
        }
    }
}

fn mock_analysis(ad: &AdRecord) -> AdAnalysis {
    let copy = ad.primary_text.as_deref().unwrap_or("").to_lowercase();
    let hook_type = if copy.contains("tired") {
        "Problem-Agitation-Solution"
    } else {
        "Benefit-Driven"
    };

    AdAnalysis {
        ad_snapshot_url: ad.snapshot_url.clone(),
        hook_type: hook_type.to_string(),
        visual_hooks: vec![
            "High contrast text overlay".to_string(),
            "Face to camera".to_string(),
        ],
        audio_hooks: vec!["Trending audio".to_string(), "Voiceover start".to_string()],
        offer_structure: "Discount + Scarcity".to_string(),
        proof_elements: vec!["Testimonial".to_string(), "Trust badges".to_string()],
        pacing_notes: Some("Fast cuts in first 3 seconds".to_string()),
        copy_patterns: vec!["Short sentences".to_string(), "Emoji usage".to_string()],
        ctas_alignment: "Strong".to_string(),
        risks: vec!["Might feel too salesy".to_string()],
        creative_atoms: vec![
            "UGC style".to_string(),
            "Unboxing".to_string(),
            "Green screen".to_string(),
        ],
    }
}

pub async fn synthesize(
    llm: &GeminiClient,
    analyses: &[AdAnalysis],
    context: &ProjectContext,
) -> Synthesis {
    if !llm.is_configured() {
        return mock_synthesis(analyses, context);
    }

    let prompt = format!(
        r#"Synthesize trends from these ad analyses into a winning formula and contrast them with the project context.

Project Context:
{}

Analyses:
{}

Return JSON with:
- dominant_patterns: list of {{"pattern_name", "frequency" (float), "confidence"}}
- creative_laws: list of rules for success
- fatigue_signals: what is being overused
- untapped_angles: new ideas to try
- competitor_contrast: A 2-3 sentence analysis of how these competitors' strategies differ from the project's current positioning (e.g., "They focus on speed, while you focus on reliability").
"#,
        serde_json::to_string(context).unwrap_or_default(),
        serde_json::to_string(analyses).unwrap_or_default(),
    );

    let parsed = llm
        .generate_json(&prompt)
        .await
        .and_then(|v| serde_json::from_value::<Synthesis>(v).map_err(Into::into));
    match parsed {
        Ok(mut synthesis) => {
            synthesis.ad_count = analyses.len();
            synthesis
        }
        Err(e) => {
            warn!(error = %e, "Gemini synthesis failed; using mock");
            mock_synthesis(analyses, context)
        }
    }
}

fn mock_synthesis(analyses: &[AdAnalysis], context: &ProjectContext) -> Synthesis {
    Synthesis {
        ad_count: analyses.len(),
        dominant_patterns: vec![
            PatternStat {
                pattern_name: "UGC Testimonial".to_string(),
                frequency: 0.8,
                confidence: "High".to_string(),
            },
            PatternStat {
                pattern_name: "Problem First Hook".to_string(),
                frequency: 0.6,
                confidence: "Medium".to_string(),
            },
        ],
        creative_laws: vec![
            "Always start with a human face".to_string(),
            "Show the product result within 3 seconds".to_string(),
        ],
        fatigue_signals: vec![
            "Generic stock footage".to_string(),
            "Overused TikTok sounds".to_string(),
        ],
        untapped_angles: vec!["ASMR unboxing".to_string(), "Founder story".to_string()],
        competitor_contrast: Some(format!(
            "While your brand focuses on {}, competitors are leaning heavily into price-driven UGC hooks.",
            context.category
        )),
    }
}

pub async fn generate_creatives(
    llm: &GeminiClient,
    synthesis: &Synthesis,
    context: &ProjectContext,
) -> GeneratedCreatives {
    if !llm.is_configured() {
        return mock_creatives();
    }

    let prompt = format!(
        r#"Generate 3 net-new ad concepts based on this synthesis and project context.

Context: {}
Synthesis: {}

Return JSON object with 'concepts' array containing:
- concept_name
- hook_script
- visual_description
- why_it_works
- script_body
- cta_text
- suggested_visuals (list)
"#,
        serde_json::to_string(context).unwrap_or_default(),
        serde_json::to_string(synthesis).unwrap_or_default(),
    );

    let parsed = llm
        .generate_json(&prompt)
        .await
        .and_then(|v| serde_json::from_value::<GeneratedCreatives>(v).map_err(Into::into));
    match parsed {
        Ok(creatives) if !creatives.concepts.is_empty() => creatives,
        Ok(_) => mock_creatives(),
        Err(e) => {
            warn!(error = %e, "Gemini creative generation failed; using mock");
            mock_creatives()
        }
    }
}

fn mock_creatives() -> GeneratedCreatives {
    GeneratedCreatives {
        concepts: vec![
            GeneratedCreative {
                concept_name: "The 'Us vs Them' Split".to_string(),
                hook_script: "Stop using [Competitor Product]. Here is why...".to_string(),
                visual_description:
                    "Split screen showing the old way (struggling) vs new way (easy)".to_string(),
                why_it_works: "Visual contrast creates immediate desire".to_string(),
                script_body: "Most people struggle with X. Our Y solves it by...".to_string(),
                cta_text: "Get 50% Off Today".to_string(),
                suggested_visuals: vec![
                    "Split screen".to_string(),
                    "Red X overlay".to_string(),
                    "Green checkmark".to_string(),
                ],
            },
            GeneratedCreative {
                concept_name: "The Founder's Promise".to_string(),
                hook_script: "I built this because I was tired of...".to_string(),
                visual_description: "Founder talking directly to camera, selfie style".to_string(),
                why_it_works: "Builds trust and personal connection".to_string(),
                script_body:
                    "I spent 2 years perfecting the formula. If you don't love it, I'll refund you."
                        .to_string(),
                cta_text: "Try Risk Free".to_string(),
                suggested_visuals: vec![
                    "Selfie video".to_string(),
                    "Warehouse background".to_string(),
                ],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaType;
    use std::collections::HashMap;

    fn record(primary_text: &str) -> AdRecord {
        AdRecord {
            advertiser: "Acme".to_string(),
            start_date: None,
            snapshot_url: "https://www.facebook.com/ads/library/?id=1".to_string(),
            primary_text: Some(primary_text.to_string()),
            headline: None,
            cta: Some("Learn More".to_string()),
            placements: vec![],
            media_type: MediaType::Unknown,
            impressions_lower: None,
            impressions_upper: None,
            media_url: None,
        }
    }

    fn context() -> ProjectContext {
        ProjectContext {
            url: None,
            product_idea: None,
            country: "ALL".to_string(),
            language: "en".to_string(),
            category: "SaaS".to_string(),
            icp: "founders".to_string(),
            offer_constraints: vec![],
            keyword_clusters: HashMap::new(),
        }
    }

    #[test]
    fn mock_analysis_infers_hook_type_from_copy() {
        let pas = mock_analysis(&record("Tired of slow reporting?"));
        assert_eq!(pas.hook_type, "Problem-Agitation-Solution");

        let benefit = mock_analysis(&record("Double your output in a week"));
        assert_eq!(benefit.hook_type, "Benefit-Driven");
        assert_eq!(
            benefit.ad_snapshot_url,
            "https://www.facebook.com/ads/library/?id=1"
        );
    }

    #[test]
    fn mock_synthesis_counts_ads_and_references_category() {
        let analyses = vec![mock_analysis(&record("a")), mock_analysis(&record("b"))];
        let synthesis = mock_synthesis(&analyses, &context());
        assert_eq!(synthesis.ad_count, 2);
        assert!(synthesis
            .competitor_contrast
            .as_deref()
            .unwrap()
            .contains("SaaS"));
        assert!(!synthesis.dominant_patterns.is_empty());
    }

    #[test]
    fn mock_creatives_are_well_formed() {
        let creatives = mock_creatives();
        assert_eq!(creatives.concepts.len(), 2);
        for concept in &creatives.concepts {
            assert!(!concept.concept_name.is_empty());
            assert!(!concept.hook_script.is_empty());
            assert!(!concept.suggested_visuals.is_empty());
        }
    }
}
