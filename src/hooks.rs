//! Strategic hook copywriting from a project context and a set of emotional
//! triggers.

use chrono::{Datelike, Utc};
use tracing::warn;

use crate::llm::GeminiClient;
use crate::models::{Hook, ProjectContext};

/// Generate ad hooks for the requested triggers. Never fails: without a
/// working LLM a fixed trio keyed to the context is returned, and an LLM
/// error falls back to a two-hook emergency set.
pub async fn generate_hooks(
    llm: &GeminiClient,
    context: &ProjectContext,
    triggers: &[String],
) -> Vec<Hook> {
    if !llm.is_configured() {
        return vec![
            Hook {
                text: format!(
                    "Is your {} approach costing you clients?",
                    context.category
                ),
                trigger: "Fear".to_string(),
                angle: "Opportunity Cost".to_string(),
            },
            Hook {
                text: format!(
                    "The secret to scaling {} in {}.",
                    context.category,
                    Utc::now().year() + 1
                ),
                trigger: "Curiosity".to_string(),
                angle: "Future-Proofing".to_string(),
            },
            Hook {
                text: format!("How we helped {} double their ROI.", context.icp),
                trigger: "Social Proof".to_string(),
                angle: "Results-Based".to_string(),
            },
        ];
    }

    let prompt = format!(
        r#"You are an expert Performance Marketer and Copywriter specializing in Meta Ads.
Your goal is to generate high-converting "Hooks" (the first 1-2 sentences of an ad) for the following business:

URL: {}
Category: {}
Ideal Customer (ICP): {}

Requested Emotional Triggers: {}

Instructions:
1. Generate 3 distinct hooks for EACH trigger.
2. Each hook should be punchy, curiosity-driven, or direct, depending on the trigger.
3. Use the "Creative Laws" of modern social advertising: punchy, short, and benefit-led.
4. Provide the result as a JSON array of objects with keys: "text", "trigger", and "angle".

Example Output:
[
    {{"text": "Is your current solution costing you $10k/month?", "trigger": "Fear", "angle": "Sunk Cost"}},
    ...
]
"#,
        context.url.as_deref().unwrap_or(""),
        context.category,
        context.icp,
        triggers.join(", "),
    );

    let parsed = llm
        .generate_json(&prompt)
        .await
        .and_then(|v| serde_json::from_value::<Vec<Hook>>(v).map_err(Into::into));
    match parsed {
        Ok(hooks) if !hooks.is_empty() => hooks,
        Ok(_) | Err(_) => {
            warn!("Gemini hook generation failed; using emergency fallback");
            vec![
                Hook {
                    text: format!("Tired of struggling with {}?", context.category),
                    trigger: "Pain".to_string(),
                    angle: "Empathy".to_string(),
                },
                Hook {
                    text: format!(
                        "What if you could automate your entire {} workflow?",
                        context.category
                    ),
                    trigger: "Greed".to_string(),
                    angle: "Efficiency".to_string(),
                },
            ]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::GeminiConfig;
    use std::collections::HashMap;

    fn context() -> ProjectContext {
        ProjectContext {
            url: Some("https://example.com".to_string()),
            product_idea: None,
            country: "ALL".to_string(),
            language: "en".to_string(),
            category: "Email Marketing".to_string(),
            icp: "solo founders".to_string(),
            offer_constraints: vec![],
            keyword_clusters: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn unconfigured_client_serves_the_fixed_trio() {
        let llm = GeminiClient::new(GeminiConfig {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
        });
        let hooks = generate_hooks(&llm, &context(), &["Fear".to_string()]).await;
        assert_eq!(hooks.len(), 3);
        assert!(hooks[0].text.contains("Email Marketing"));
        assert_eq!(hooks[2].trigger, "Social Proof");
        assert!(hooks[2].text.contains("solo founders"));
    }
}
