//! Bounded page fetching with caching and HTML text extraction.
//!
//! Every fetch passes the circuit breaker and the TTL cache before
//! touching the network. Extraction strips non-content elements and
//! collapses whitespace; failures degrade to `None` so one bad page
//! never aborts a run.

use std::sync::OnceLock;

use futures::future::join_all;
use regex::Regex;

use crate::traits::fetcher::UrlFetcher;
use crate::types::config::FetchConfig;
use crate::types::page::{CachedPage, PageDocument};
use crate::util::{CircuitBreaker, TtlCache};

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"))
}

const BOILERPLATE_TAGS: [&str; 8] = [
    "script", "noscript", "style", "svg", "footer", "nav", "form", "iframe",
];

fn boilerplate_res() -> &'static Vec<Regex> {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        BOILERPLATE_TAGS
            .iter()
            .map(|tag| {
                Regex::new(&format!(r"(?is)<{tag}[^>]*>.*?</{tag}\s*>")).expect("valid regex")
            })
            .collect()
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"))
}

/// Extract the page title, defaulting to "Untitled".
pub fn extract_title(html: &str) -> String {
    title_re()
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Strip boilerplate elements and tags, collapse whitespace, and cap
/// the result at `max_chars` characters.
pub fn extract_text(html: &str, max_chars: usize) -> String {
    let mut without_boilerplate = html.to_string();
    for re in boilerplate_res() {
        without_boilerplate = re.replace_all(&without_boilerplate, " ").into_owned();
    }
    let without_tags = tag_re().replace_all(&without_boilerplate, " ");
    let collapsed = without_tags
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    collapsed.chars().take(max_chars).collect()
}

/// Fetch one page through the breaker and cache.
///
/// Returns `None` on any failure: open breaker, transport error, or a
/// non-success status.
pub async fn fetch_page<F: UrlFetcher>(
    fetcher: &F,
    cache: &TtlCache<String, CachedPage>,
    breaker: &CircuitBreaker,
    config: &FetchConfig,
    url: &str,
) -> Option<PageDocument> {
    if !breaker.can_request() {
        tracing::debug!(url, "fetch breaker open, skipping");
        return None;
    }

    if let Some(cached) = cache.get(&url.to_string()) {
        tracing::debug!(url, "page cache hit");
        return Some(PageDocument::new(url, cached.title, cached.text));
    }

    let body = match fetcher
        .fetch_url(url, &config.user_agent, config.timeout_ms, config.max_bytes)
        .await
    {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(url, error = %e, "page fetch failed");
            breaker.failure();
            return None;
        }
    };

    if !(200..300).contains(&body.status) {
        tracing::warn!(url, status = body.status, "page fetch returned non-success status");
        breaker.failure();
        return None;
    }

    let html = String::from_utf8_lossy(&body.bytes);
    let title = extract_title(&html);
    let text = extract_text(&html, config.max_chars);

    cache.set(
        url.to_string(),
        CachedPage {
            title: title.clone(),
            text: text.clone(),
        },
    );
    breaker.success();

    Some(PageDocument::new(url, title, text))
}

/// Fetch many pages concurrently, keeping input order.
///
/// Failed fetches are simply absent from the output.
pub async fn fetch_pages<F: UrlFetcher>(
    fetcher: &F,
    cache: &TtlCache<String, CachedPage>,
    breaker: &CircuitBreaker,
    config: &FetchConfig,
    urls: &[String],
) -> Vec<PageDocument> {
    let fetches = urls
        .iter()
        .map(|url| fetch_page(fetcher, cache, breaker, config, url));
    join_all(fetches).await.into_iter().flatten().collect()
}
