//! Synthetic fallback records, served whenever the live scrape is unavailable.
//!
//! Pure generator: no I/O, never empty, never panics. Each record embeds one
//! creative label in both primary text and headline so downstream analysis
//! stays traceable, and snapshot URLs use a synthetic 7-digit id that is
//! recognizably not a real detail link.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::ad_library::RESULT_CAP;
use crate::models::{AdRecord, MediaType};

pub(crate) const ADVERTISER_POOL: [&str; 6] = [
    "MarketFlow AI",
    "CreativePulse",
    "AdVantage Pro",
    "GrowthScale",
    "VibeCheck",
    "BrandPulse",
];

const CTA_POOL: [&str; 5] = ["Learn More", "Shop Now", "Sign Up", "Get Offer", "Book Now"];

const LABEL_POOL: [&str; 8] = [
    "UGC",
    "Direct Response",
    "Educational",
    "High Urgency",
    "Social Proof",
    "Benefit-Led",
    "Storytelling",
    "Aesthetic",
];

const MEDIA_POOL: [MediaType; 3] = [MediaType::Image, MediaType::Video, MediaType::Carousel];

/// Generate exactly `RESULT_CAP` synthetic records referencing the given
/// keywords ("Marketing" when none are provided).
pub fn mock_ads(keywords: &[String]) -> Vec<AdRecord> {
    let mut rng = rand::thread_rng();

    (0..RESULT_CAP)
        .map(|_| {
            let kw = keywords
                .choose(&mut rng)
                .map(String::as_str)
                .unwrap_or("Marketing");
            let advertiser = *ADVERTISER_POOL.choose(&mut rng).unwrap_or(&ADVERTISER_POOL[0]);
            let label = *LABEL_POOL.choose(&mut rng).unwrap_or(&LABEL_POOL[0]);
            let cta = *CTA_POOL.choose(&mut rng).unwrap_or(&CTA_POOL[0]);
            let media_type = *MEDIA_POOL.choose(&mut rng).unwrap_or(&MEDIA_POOL[0]);

            AdRecord {
                advertiser: advertiser.to_string(),
                start_date: None,
                snapshot_url: format!(
                    "https://www.facebook.com/ads/library/?id={}",
                    rng.gen_range(1_000_000..10_000_000)
                ),
                primary_text: Some(format!(
                    "[{label}] Unlock the power of {kw} with {advertiser}. Our proven strategies help you scale faster and reach more customers."
                )),
                headline: Some(format!("{label}: Transform your {kw} strategy!")),
                cta: Some(cta.to_string()),
                placements: vec![
                    "Facebook".to_string(),
                    "Instagram".to_string(),
                    "Messenger".to_string(),
                ],
                media_type,
                impressions_lower: None,
                impressions_upper: None,
                media_url: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn always_yields_a_full_batch() {
        assert_eq!(mock_ads(&[]).len(), RESULT_CAP);
        assert_eq!(mock_ads(&["crm".to_string()]).len(), RESULT_CAP);
    }

    #[test]
    fn snapshot_urls_match_the_synthetic_id_pattern() {
        let pattern = Regex::new(r"^https://www\.facebook\.com/ads/library/\?id=\d{7}$").unwrap();
        for ad in mock_ads(&["crm".to_string()]) {
            assert!(pattern.is_match(&ad.snapshot_url), "bad url: {}", ad.snapshot_url);
        }
    }

    #[test]
    fn records_draw_from_the_fixed_pools() {
        for ad in mock_ads(&["crm".to_string()]) {
            assert!(ADVERTISER_POOL.contains(&ad.advertiser.as_str()));
            assert!(CTA_POOL.contains(&ad.cta.as_deref().unwrap()));
            assert!(MEDIA_POOL.contains(&ad.media_type));
        }
    }

    #[test]
    fn keyword_is_embedded_in_copy_and_headline() {
        for ad in mock_ads(&["yoga mats".to_string()]) {
            assert!(ad.primary_text.as_deref().unwrap().contains("yoga mats"));
            assert!(ad.headline.as_deref().unwrap().contains("yoga mats"));
        }
    }

    #[test]
    fn label_is_embedded_in_both_copy_fields() {
        for ad in mock_ads(&[]) {
            let text = ad.primary_text.unwrap();
            let label = text
                .strip_prefix('[')
                .and_then(|t| t.split(']').next())
                .expect("primary text starts with a [label]");
            assert!(LABEL_POOL.contains(&label));
            assert!(ad.headline.unwrap().starts_with(&format!("{label}:")));
        }
    }

    #[test]
    fn empty_keyword_set_uses_the_placeholder_term() {
        for ad in mock_ads(&[]) {
            assert!(ad.primary_text.as_deref().unwrap().contains("Marketing"));
        }
    }
}
