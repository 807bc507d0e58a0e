//! Heuristic card extraction from rendered Ad Library markup.
//!
//! The source page exposes no stable classes or labels, so every field is
//! probed by an ordered chain of best-effort rules; the first rule yielding a
//! non-empty value wins. A card that yields nothing extractable is skipped
//! without aborting the remaining cards.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::trace;

use crate::ad_library::{AD_LIBRARY_BASE, RESULT_CAP};
use crate::models::{AdRecord, MediaType};

const SOURCE_ORIGIN: &str = "https://www.facebook.com";

/// Body copy is distinguished from labels and buttons purely by length.
const PRIMARY_TEXT_MIN_CHARS: usize = 40;

static CARD_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"div[role="article"]"#).unwrap());
static LINK_SPAN_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a span").unwrap());
static DIR_AUTO_SPAN_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"span[dir="auto"]"#).unwrap());
static TEXT_BLOCK_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("div").unwrap());
static HEADLINE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("strong").unwrap());
static IMG_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("img").unwrap());
static SNAPSHOT_LINK_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="/ads/library/?id="]"#).unwrap());

type Probe = fn(&ElementRef) -> Option<String>;

struct FieldRule {
    name: &'static str,
    probe: Probe,
}

static ADVERTISER_RULES: [FieldRule; 2] = [
    FieldRule {
        name: "link-span",
        probe: advertiser_from_link,
    },
    FieldRule {
        name: "dir-auto-span",
        probe: advertiser_from_dir_auto,
    },
];

fn first_match(card: &ElementRef, rules: &[FieldRule]) -> Option<String> {
    rules.iter().find_map(|rule| {
        let value = (rule.probe)(card).filter(|v| !v.is_empty());
        if value.is_some() {
            trace!(rule = rule.name, "extraction rule matched");
        }
        value
    })
}

fn inner_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn advertiser_from_link(card: &ElementRef) -> Option<String> {
    card.select(&LINK_SPAN_SEL).next().map(|el| inner_text(&el))
}

fn advertiser_from_dir_auto(card: &ElementRef) -> Option<String> {
    card.select(&DIR_AUTO_SPAN_SEL)
        .next()
        .map(|el| inner_text(&el))
}

fn probe_primary_text(card: &ElementRef) -> Option<String> {
    card.select(&TEXT_BLOCK_SEL)
        .map(|el| inner_text(&el))
        .find(|t| t.chars().count() > PRIMARY_TEXT_MIN_CHARS)
}

fn probe_headline(card: &ElementRef) -> Option<String> {
    card.select(&HEADLINE_SEL)
        .next()
        .map(|el| inner_text(&el))
        .filter(|t| !t.is_empty())
}

fn probe_media_url(card: &ElementRef) -> Option<String> {
    card.select(&IMG_SEL)
        .find_map(|el| el.value().attr("src").map(str::to_string))
}

fn probe_snapshot_href(card: &ElementRef) -> Option<String> {
    card.select(&SNAPSHOT_LINK_SEL)
        .find_map(|el| el.value().attr("href").map(str::to_string))
}

/// Site-relative hrefs are rewritten against the source origin; absolute ones
/// pass through unchanged. Records must never leave here with a relative URL.
fn absolutize(href: &str) -> String {
    if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{}{}", SOURCE_ORIGIN, href)
    }
}

/// When a card exposes no detail link, point the snapshot at the search
/// itself so the record stays dereferenceable.
fn synthetic_snapshot_url(search_query: &str) -> String {
    format!("{}?q={}", AD_LIBRARY_BASE, urlencoding::encode(search_query))
}

#[derive(Debug)]
enum CardSkip {
    /// Rendered as an empty husk: no text, no links, no media.
    Nothing,
}

fn extract_card(card: &ElementRef, search_query: &str) -> Result<AdRecord, CardSkip> {
    let has_any_content = !inner_text(card).is_empty()
        || card.select(&SNAPSHOT_LINK_SEL).next().is_some()
        || card.select(&IMG_SEL).next().is_some();
    if !has_any_content {
        return Err(CardSkip::Nothing);
    }

    let advertiser = first_match(card, &ADVERTISER_RULES)
        .unwrap_or_else(|| "Unknown Advertiser".to_string());
    let primary_text = probe_primary_text(card);
    let headline = probe_headline(card);
    let media_url = probe_media_url(card);
    let media_type = if media_url.is_some() {
        MediaType::Image
    } else {
        MediaType::Unknown
    };
    let snapshot_url = probe_snapshot_href(card)
        .map(|href| absolutize(&href))
        .unwrap_or_else(|| synthetic_snapshot_url(search_query));

    Ok(AdRecord {
        advertiser,
        start_date: None,
        snapshot_url,
        primary_text,
        headline,
        // The DOM does not reliably expose CTA or placements; fixed values.
        cta: Some("Learn More".to_string()),
        placements: vec!["Facebook".to_string(), "Instagram".to_string()],
        media_type,
        impressions_lower: None,
        impressions_upper: None,
        media_url,
    })
}

/// Extract records from the first `RESULT_CAP` cards in DOM order. Returns
/// the records plus the number of cards skipped.
pub fn extract_ads(html: &str, search_query: &str) -> (Vec<AdRecord>, usize) {
    let document = Html::parse_document(html);
    let mut ads = Vec::new();
    let mut skipped = 0usize;

    for card in document.select(&CARD_SEL).take(RESULT_CAP) {
        match extract_card(&card, search_query) {
            Ok(ad) => ads.push(ad),
            Err(reason) => {
                trace!(?reason, "skipping unparseable card");
                skipped += 1;
            }
        }
    }

    (ads, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LONG_COPY: &str =
        "Discover the radiant skin you deserve with our dermatologist approved serum.";

    fn page(cards: &[String]) -> String {
        format!("<html><body>{}</body></html>", cards.join("\n"))
    }

    fn full_card(advertiser: &str, id: u32) -> String {
        format!(
            r#"<div role="article">
                <a href="/ads/library/?id={id}"><span>{advertiser}</span></a>
                <div>Sponsored</div>
                <div>{LONG_COPY}</div>
                <strong>Glow up in 30 days</strong>
                <img src="https://scontent.example.net/creative{id}.jpg">
            </div>"#
        )
    }

    #[test]
    fn extracts_all_fields_from_a_complete_card() {
        let html = page(&[full_card("Glow Skincare", 1234567)]);
        let (ads, skipped) = extract_ads(&html, "skincare");
        assert_eq!(skipped, 0);
        assert_eq!(ads.len(), 1);

        let ad = &ads[0];
        assert_eq!(ad.advertiser, "Glow Skincare");
        assert_eq!(ad.primary_text.as_deref(), Some(LONG_COPY));
        assert_eq!(ad.headline.as_deref(), Some("Glow up in 30 days"));
        assert_eq!(
            ad.snapshot_url,
            "https://www.facebook.com/ads/library/?id=1234567"
        );
        assert_eq!(ad.media_type, MediaType::Image);
        assert_eq!(
            ad.media_url.as_deref(),
            Some("https://scontent.example.net/creative1234567.jpg")
        );
        assert_eq!(ad.cta.as_deref(), Some("Learn More"));
        assert_eq!(ad.placements, vec!["Facebook", "Instagram"]);
    }

    #[test]
    fn short_text_blocks_are_not_body_copy() {
        let card = r#"<div role="article">
                <a href="/ads/library/?id=1"><span>Acme</span></a>
                <div>Sponsored</div>
                <div>Shop now</div>
            </div>"#
            .to_string();
        let (ads, _) = extract_ads(&page(&[card]), "acme");
        assert_eq!(ads[0].primary_text, None);
    }

    #[test]
    fn advertiser_falls_back_to_dir_auto_span() {
        let card = format!(
            r#"<div role="article">
                <span dir="auto">Acme Collective</span>
                <div>{LONG_COPY}</div>
            </div>"#
        );
        let (ads, _) = extract_ads(&page(&[card]), "acme");
        assert_eq!(ads[0].advertiser, "Acme Collective");
    }

    #[test]
    fn advertiser_placeholder_when_no_rule_matches() {
        let card = format!(r#"<div role="article"><div>{LONG_COPY}</div></div>"#);
        let (ads, _) = extract_ads(&page(&[card]), "acme");
        assert_eq!(ads[0].advertiser, "Unknown Advertiser");
    }

    #[test]
    fn relative_snapshot_href_is_absolutized() {
        assert_eq!(
            absolutize("/ads/library/?id=123"),
            "https://www.facebook.com/ads/library/?id=123"
        );
    }

    #[test]
    fn absolute_snapshot_href_passes_through() {
        let href = "https://www.facebook.com/ads/library/?id=99";
        assert_eq!(absolutize(href), href);
    }

    #[test]
    fn missing_snapshot_link_synthesizes_from_query() {
        let card = format!(r#"<div role="article"><div>{LONG_COPY}</div></div>"#);
        let (ads, _) = extract_ads(&page(&[card]), "yoga mats");
        assert_eq!(
            ads[0].snapshot_url,
            "https://www.facebook.com/ads/library/?q=yoga%20mats"
        );
    }

    #[test]
    fn media_type_unknown_without_an_image() {
        let card = r#"<div role="article">
                <a href="/ads/library/?id=5"><span>NoMedia Co</span></a>
            </div>"#
            .to_string();
        let (ads, _) = extract_ads(&page(&[card]), "x");
        assert_eq!(ads[0].media_type, MediaType::Unknown);
        assert_eq!(ads[0].media_url, None);
    }

    #[test]
    fn caps_at_twelve_cards_in_dom_order() {
        let cards: Vec<String> = (0..15).map(|i| full_card(&format!("Adv {i}"), i)).collect();
        let (ads, skipped) = extract_ads(&page(&cards), "x");
        assert_eq!(skipped, 0);
        assert_eq!(ads.len(), RESULT_CAP);
        for (i, ad) in ads.iter().enumerate() {
            assert_eq!(ad.advertiser, format!("Adv {i}"));
        }
    }

    #[test]
    fn broken_cards_are_skipped_without_aborting_the_rest() {
        let cards = vec![
            full_card("First", 1),
            r#"<div role="article"></div>"#.to_string(),
            r#"<div role="article">   </div>"#.to_string(),
            full_card("Last", 2),
        ];
        let (ads, skipped) = extract_ads(&page(&cards), "x");
        assert_eq!(skipped, 2);
        assert_eq!(ads.len(), 2);
        assert_eq!(ads[0].advertiser, "First");
        assert_eq!(ads[1].advertiser, "Last");
    }

    #[test]
    fn page_without_cards_extracts_nothing() {
        let (ads, skipped) = extract_ads("<html><body><p>nope</p></body></html>", "x");
        assert!(ads.is_empty());
        assert_eq!(skipped, 0);
    }
}
