//! Meta Ad Library search: URL construction, the stealth crawl session, and
//! result assembly.
//!
//! The crawl path reports failures as typed `ScrapeFailure` values instead of
//! bubbling errors; `assemble` is the single place that converts a failed or
//! empty live scrape into synthetic fallback records. Callers of `search_ads`
//! always receive a non-empty list of at most `RESULT_CAP` records.

use std::sync::Arc;
use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions, Tab};
use once_cell::sync::Lazy;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{info, warn};
use uuid::Uuid;

use crate::extract;
use crate::mock;
use crate::models::{AdRecord, AdSource, ProjectContext};
use crate::stealth;

pub const AD_LIBRARY_BASE: &str = "https://www.facebook.com/ads/library/";

/// Hard cap on the number of records returned per request.
pub const RESULT_CAP: usize = 12;

const NAV_TIMEOUT: Duration = Duration::from_secs(60);
const CARD_WAIT_TIMEOUT: Duration = Duration::from_secs(15);

/// One rendered ad entry in the results list.
const CARD_SELECTOR: &str = r#"div[role="article"]"#;

pub(crate) static USER_AGENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/123.0.0.0 Safari/537.36",
    ]
});

#[derive(Debug, Error)]
pub enum ScrapeFailure {
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[error("navigation timed out")]
    NavigationTimeout,
    #[error("no ad cards appeared before the wait deadline")]
    ContentWaitTimeout,
    #[error("page rendered but no cards could be parsed")]
    EmptyResultSet,
}

/// Immutable search input: ordered keywords plus an ISO-2 country code (or "ALL").
#[derive(Debug, Clone)]
pub struct SearchQuery {
    keywords: Vec<String>,
    country: String,
}

impl SearchQuery {
    pub fn new(keywords: &[String], country: &str) -> Self {
        Self {
            keywords: keywords.to_vec(),
            country: country.to_string(),
        }
    }

    pub fn joined_keywords(&self) -> String {
        self.keywords.join(" ")
    }

    /// The combined-keyword URL the live scrape navigates to. Restricted to
    /// currently active ads.
    pub fn live_url(&self) -> String {
        format!(
            "{}?active_status=active&ad_type=all&country={}&q={}&search_type=keyword_unordered&media_type=all",
            AD_LIBRARY_BASE,
            self.country,
            urlencoding::encode(&self.joined_keywords()),
        )
    }
}

#[derive(Debug, Clone)]
pub struct SearchUrl {
    pub label: String,
    pub url: String,
}

fn query_string(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// One labeled search URL per primary-cluster keyword plus one for the
/// category term. Pure; no network or browser interaction.
pub fn generate_search_urls(context: &ProjectContext) -> Vec<SearchUrl> {
    let mut keywords: Vec<String> = context.cluster("primary").to_vec();
    if !context.category.is_empty() {
        keywords.push(context.category.clone());
    }

    keywords
        .iter()
        .map(|kw| {
            let qs = query_string(&[
                ("active_status", "all"),
                ("ad_type", "all"),
                ("country", &context.country),
                ("media_type", "all"),
                ("sort_data[direction]", "desc"),
                ("sort_data[mode]", "relevance_monthly_grouped"),
                ("search_type", "keyword_unordered"),
                ("q", kw),
            ]);
            SearchUrl {
                label: format!("Search: {}", kw),
                url: format!("{}?{}", AD_LIBRARY_BASE, qs),
            }
        })
        .collect()
}

/// Exclusive owner of one headless browser and one tab for the duration of a
/// single search request. The Chrome child process is killed when the session
/// drops, on every exit path.
pub struct CrawlSession {
    id: Uuid,
    _browser: Browser,
    tab: Arc<Tab>,
}

impl CrawlSession {
    pub fn launch() -> Result<Self, ScrapeFailure> {
        use rand::seq::SliceRandom;
        let user_agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .unwrap_or(&"Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36");
        let ua_arg = format!("--user-agent={}", user_agent);

        let mut args = vec![
            std::ffi::OsStr::new("--disable-blink-features=AutomationControlled"),
            std::ffi::OsStr::new("--no-sandbox"),
            std::ffi::OsStr::new("--disable-dev-shm-usage"),
            std::ffi::OsStr::new("--disable-infobars"),
            std::ffi::OsStr::new("--window-position=0,0"),
            std::ffi::OsStr::new("--ignore-certificate-errors"),
            std::ffi::OsStr::new("--incognito"),
            std::ffi::OsStr::new("--headless=new"),
        ];
        args.push(std::ffi::OsStr::new(&ua_arg));

        let browser = Browser::new(LaunchOptions {
            headless: false, // modern headless via --headless=new above
            window_size: Some((1920, 1080)),
            args,
            ..Default::default()
        })
        .map_err(|e| ScrapeFailure::Launch(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| ScrapeFailure::Launch(e.to_string()))?;

        // Stealth must be registered before the first navigation.
        tab.enable_debugger()
            .map_err(|e| ScrapeFailure::Launch(e.to_string()))?;
        tab.call_method(
            headless_chrome::protocol::cdp::Page::AddScriptToEvaluateOnNewDocument {
                source: stealth::stealth_script(),
                world_name: None,
                include_command_line_api: None,
                run_immediately: None,
            },
        )
        .map_err(|e| ScrapeFailure::Launch(e.to_string()))?;

        let id = Uuid::new_v4();
        info!(session = %id, "stealth browser session launched");
        Ok(Self {
            id,
            _browser: browser,
            tab,
        })
    }

    /// Navigate to the search URL and return the rendered HTML once at least
    /// one ad card is present. Both waits are bounded; a miss on either is a
    /// typed failure, not an error escalation.
    pub async fn fetch_rendered_results(&self, url: &str) -> Result<String, ScrapeFailure> {
        self.tab.set_default_timeout(NAV_TIMEOUT);

        info!(session = %self.id, url, "navigating to ad library search");
        self.tab
            .navigate_to(url)
            .map_err(|_| ScrapeFailure::NavigationTimeout)?;
        self.tab
            .wait_until_navigated()
            .map_err(|_| ScrapeFailure::NavigationTimeout)?;

        if self
            .tab
            .wait_for_element_with_custom_timeout(CARD_SELECTOR, CARD_WAIT_TIMEOUT)
            .is_err()
        {
            warn!(session = %self.id, "timed out waiting for ad cards; the page may be blocking or empty");
            return Err(ScrapeFailure::ContentWaitTimeout);
        }

        // Half-page scroll nudges the lazy loader, then let rendering settle.
        let _ = self
            .tab
            .evaluate("window.scrollTo(0, document.body.scrollHeight / 2);", false);
        sleep(Duration::from_millis(1000)).await;

        self.tab
            .get_content()
            .map_err(|_| ScrapeFailure::ContentWaitTimeout)
    }
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub ads: Vec<AdRecord>,
    pub source: AdSource,
}

/// Search the Ad Library for the given keywords. Always resolves with 1 to
/// `RESULT_CAP` records; a failed or empty live scrape degrades to synthetic
/// fallback records, flagged by `source`.
pub async fn search_ads(keywords: &[String], country: &str) -> SearchOutcome {
    if keywords.is_empty() {
        return assemble(Err(ScrapeFailure::EmptyResultSet), keywords);
    }
    let query = SearchQuery::new(keywords, country);
    assemble(crawl_once(&query).await, keywords)
}

async fn crawl_once(query: &SearchQuery) -> Result<Vec<AdRecord>, ScrapeFailure> {
    let session = CrawlSession::launch()?;
    let html = session.fetch_rendered_results(&query.live_url()).await?;

    let (ads, skipped) = extract::extract_ads(&html, &query.joined_keywords());
    if skipped > 0 {
        warn!(skipped, "ad cards skipped during extraction");
    }
    info!(extracted = ads.len(), "ad card extraction finished");

    if ads.is_empty() {
        return Err(ScrapeFailure::EmptyResultSet);
    }
    Ok(ads)
    // session drops here on every path, killing the Chrome child
}

/// The only place a scrape failure turns into fallback output.
pub(crate) fn assemble(
    live: Result<Vec<AdRecord>, ScrapeFailure>,
    keywords: &[String],
) -> SearchOutcome {
    match live {
        Ok(mut ads) if !ads.is_empty() => {
            ads.truncate(RESULT_CAP);
            SearchOutcome {
                ads,
                source: AdSource::Live,
            }
        }
        Ok(_) => degrade(ScrapeFailure::EmptyResultSet, keywords),
        Err(failure) => degrade(failure, keywords),
    }
}

fn degrade(failure: ScrapeFailure, keywords: &[String]) -> SearchOutcome {
    warn!(%failure, "live scrape unavailable; serving synthetic records");
    SearchOutcome {
        ads: mock::mock_ads(keywords),
        source: AdSource::Fallback,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MediaType;
    use std::collections::HashMap;

    fn context(primary: &[&str], category: &str, country: &str) -> ProjectContext {
        let mut clusters = HashMap::new();
        clusters.insert(
            "primary".to_string(),
            primary.iter().map(|s| s.to_string()).collect(),
        );
        ProjectContext {
            url: Some("https://example.com".to_string()),
            product_idea: None,
            country: country.to_string(),
            language: "en".to_string(),
            category: category.to_string(),
            icp: "DTC founders".to_string(),
            offer_constraints: vec![],
            keyword_clusters: clusters,
        }
    }

    fn q_param(url: &str) -> String {
        let raw = url
            .split('&')
            .find_map(|p| p.strip_prefix("q="))
            .expect("url has a q parameter");
        urlencoding::decode(raw).expect("valid percent encoding").into_owned()
    }

    #[test]
    fn one_url_per_primary_keyword_plus_category() {
        let ctx = context(&["yoga mats", "fitness gear"], "Wellness", "US");
        let urls = generate_search_urls(&ctx);
        assert_eq!(urls.len(), 3);
        assert_eq!(urls[0].label, "Search: yoga mats");
        assert_eq!(urls[2].label, "Search: Wellness");
    }

    #[test]
    fn q_parameter_round_trips() {
        let ctx = context(&["yoga mats & more"], "Wellness", "US");
        for url in generate_search_urls(&ctx) {
            let kw = url.label.strip_prefix("Search: ").unwrap();
            assert_eq!(q_param(&url.url), kw);
        }
    }

    #[test]
    fn search_urls_carry_fixed_params() {
        let ctx = context(&["crm"], "SaaS", "DE");
        let url = &generate_search_urls(&ctx)[0].url;
        assert!(url.starts_with(AD_LIBRARY_BASE));
        assert!(url.contains("active_status=all"));
        assert!(url.contains("ad_type=all"));
        assert!(url.contains("country=DE"));
        assert!(url.contains("media_type=all"));
        assert!(url.contains("sort_data%5Bdirection%5D=desc"));
        assert!(url.contains("sort_data%5Bmode%5D=relevance_monthly_grouped"));
        assert!(url.contains("search_type=keyword_unordered"));
    }

    #[test]
    fn empty_primary_cluster_yields_category_only() {
        let ctx = context(&[], "Wellness", "ALL");
        let urls = generate_search_urls(&ctx);
        assert_eq!(urls.len(), 1);
        assert!(urls[0].url.contains("country=ALL"));
    }

    #[test]
    fn live_url_is_active_only_and_escaped() {
        let query = SearchQuery::new(&["yoga mats".to_string()], "US");
        let url = query.live_url();
        assert!(url.contains("active_status=active"));
        assert!(url.contains("country=US"));
        assert!(url.contains("q=yoga%20mats"));
        assert!(url.contains("search_type=keyword_unordered"));
    }

    fn record(advertiser: &str) -> AdRecord {
        AdRecord {
            advertiser: advertiser.to_string(),
            start_date: None,
            snapshot_url: "https://www.facebook.com/ads/library/?id=42".to_string(),
            primary_text: None,
            headline: None,
            cta: None,
            placements: vec![],
            media_type: MediaType::Unknown,
            impressions_lower: None,
            impressions_upper: None,
            media_url: None,
        }
    }

    #[test]
    fn assemble_passes_live_results_through_in_order() {
        let live = vec![record("A"), record("B")];
        let outcome = assemble(Ok(live), &["kw".to_string()]);
        assert_eq!(outcome.source, AdSource::Live);
        assert_eq!(outcome.ads.len(), 2);
        assert_eq!(outcome.ads[0].advertiser, "A");
        assert_eq!(outcome.ads[1].advertiser, "B");
    }

    #[test]
    fn assemble_caps_live_results() {
        let live: Vec<AdRecord> = (0..15).map(|i| record(&format!("adv{}", i))).collect();
        let outcome = assemble(Ok(live), &[]);
        assert_eq!(outcome.ads.len(), RESULT_CAP);
        assert_eq!(outcome.ads[0].advertiser, "adv0");
    }

    #[test]
    fn assemble_degrades_on_failure() {
        let keywords = vec!["yoga mats".to_string()];
        let outcome = assemble(Err(ScrapeFailure::ContentWaitTimeout), &keywords);
        assert_eq!(outcome.source, AdSource::Fallback);
        assert_eq!(outcome.ads.len(), RESULT_CAP);
        for ad in &outcome.ads {
            assert!(ad.primary_text.as_deref().unwrap().contains("yoga mats"));
        }
    }

    #[test]
    fn assemble_degrades_on_empty_live_set() {
        let outcome = assemble(Ok(vec![]), &[]);
        assert_eq!(outcome.source, AdSource::Fallback);
        assert_eq!(outcome.ads.len(), RESULT_CAP);
    }
}
