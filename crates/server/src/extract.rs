//! Website text extraction: fetch a page and strip it down to readable
//! text. Thin glue -- chrome elements are dropped, tags removed, and
//! whitespace normalized the same way the pipeline cleans source text.

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tracing::{info, warn};

use copysmith_engine::clean::clean_text;

use crate::error::ServerError;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/120.0 Safari/537.36";

/// Whole blocks that carry no readable content: scripts, styles, and
/// page chrome.
static CHROME_BLOCKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)<script\b.*?</script>|<style\b.*?</style>|<noscript\b.*?</noscript>",
        r"|<header\b.*?</header>|<footer\b.*?</footer>|<nav\b.*?</nav>|<aside\b.*?</aside>"
    ))
    .expect("hardcoded regex")
});

static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("hardcoded regex"));

/// Fetches a web page and reduces it to plain text.
pub struct WebsiteExtractor {
    client: reqwest::Client,
    timeout: Duration,
}

impl WebsiteExtractor {
    /// Build an extractor with a 30s default fetch timeout.
    pub fn new() -> Result<Self, ServerError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;
        Ok(Self {
            client,
            timeout: Duration::from_secs(30),
        })
    }

    /// Set the fetch timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the URL, fetch the page, and return its readable text.
    ///
    /// An invalid URL is a [`ServerError::BadRequest`]; fetch errors
    /// surface as an empty result at the call site (a page that cannot
    /// be read contributes no source text, matching how a text-free page
    /// is handled).
    pub async fn extract(&self, url: &str) -> Result<String, ServerError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|_| ServerError::BadRequest("invalid website URL".to_owned()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ServerError::BadRequest("invalid website URL".to_owned()));
        }

        let response = match self
            .client
            .get(parsed)
            .timeout(self.timeout)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
        {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %url, error = %e, "website fetch failed");
                return Ok(String::new());
            }
        };

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => {
                warn!(url = %url, error = %e, "website body read failed");
                return Ok(String::new());
            }
        };

        let text = strip_html(&html);
        info!(url = %url, chars = text.len(), "extracted website text");
        Ok(text)
    }
}

/// Strip chrome blocks and tags, decode common entities, and normalize
/// whitespace.
pub fn strip_html(html: &str) -> String {
    let without_chrome = CHROME_BLOCKS.replace_all(html, " ");
    let without_tags = TAGS.replace_all(&without_chrome, "\n");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    clean_text(&decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_and_chrome() {
        let html = r"<html><head><style>body { color: red }</style>
            <script>alert('x')</script></head>
            <body><nav>Menu</nav><h1>Product</h1><p>Ships fast.</p>
            <footer>contact us</footer></body></html>";
        let text = strip_html(html);
        assert!(text.contains("Product"));
        assert!(text.contains("Ships fast."));
        assert!(!text.contains("alert"));
        assert!(!text.contains("Menu"));
        assert!(!text.contains("contact us"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn decodes_common_entities() {
        let text = strip_html("<p>Fish &amp; chips &gt; salad</p>");
        assert_eq!(text, "Fish & chips > salad");
    }

    #[test]
    fn collapses_whitespace() {
        let text = strip_html("<div>one</div>\n\n\n<div>two</div>");
        assert!(!text.contains("\n\n\n"));
    }

    #[tokio::test]
    async fn rejects_non_http_urls() {
        let extractor = WebsiteExtractor::new().unwrap();
        let result = extractor.extract("ftp://example.com").await;
        assert!(matches!(result, Err(ServerError::BadRequest(_))));
        let result = extractor.extract("not a url").await;
        assert!(matches!(result, Err(ServerError::BadRequest(_))));
    }
}
