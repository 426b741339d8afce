//! Fetch-and-convert pipeline: rate limit, HTTP GET with streaming size
//! enforcement, DOM clean-up and main-content selection, metadata/link
//! extraction, and Markdown (or plain-text) conversion. This is the
//! `HtmlScraper` capability the crawler calls once per queued URL.

use async_trait::async_trait;
use quaero_core::{AuthSnapshot, Cookie, DetailLevel};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::error::{Result, ScrapeError};
use crate::markdown;
use crate::metadata::{self, PageMetadata};
use crate::rate_limiter::RateLimiter;

/// Output format the scraper's Markdown conversion targets. `PlainText`
/// skips DOM-aware rendering entirely and returns stripped text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Markdown,
    PlainText,
}

impl From<quaero_core::OutputFormat> for OutputFormat {
    fn from(value: quaero_core::OutputFormat) -> Self {
        match value {
            quaero_core::OutputFormat::Markdown => OutputFormat::Markdown,
            quaero_core::OutputFormat::PlainText => OutputFormat::PlainText,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub detail_level: DetailLevel,
    pub cookies: Vec<Cookie>,
    pub tokens: std::collections::HashMap<String, String>,
    pub user_agent: String,
    pub timeout: Duration,
    pub max_body_size: u64,
    pub max_redirects: u32,
    pub only_main_content: bool,
    pub include_metadata: bool,
    pub include_links: bool,
    pub output_format: OutputFormat,
    pub extension_blacklist: Vec<String>,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            detail_level: DetailLevel::Basic,
            cookies: Vec::new(),
            tokens: std::collections::HashMap::new(),
            user_agent: "quaero/0.1 (+https://example.invalid/bot)".to_string(),
            timeout: Duration::from_secs(30),
            max_body_size: 10 * 1024 * 1024,
            max_redirects: 5,
            only_main_content: true,
            include_metadata: true,
            include_links: true,
            output_format: OutputFormat::Markdown,
            extension_blacklist: metadata::DEFAULT_EXTENSION_BLACKLIST
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl ScrapeOptions {
    /// Apply a source's saved credentials: cookies scoped by domain and
    /// free-form bearer tokens forwarded as `X-<Name>` headers.
    pub fn with_auth(mut self, auth: &AuthSnapshot) -> Self {
        self.cookies = auth.cookies.clone();
        self.tokens = auth.tokens.clone();
        if !auth.user_agent.trim().is_empty() {
            self.user_agent = auth.user_agent.clone();
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeResult {
    pub url: String,
    pub status_code: u16,
    pub markdown: String,
    pub raw_html: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub language: Option<String>,
    pub links: Vec<String>,
    pub metadata: PageMetadata,
    pub duration: Duration,
}

#[async_trait]
pub trait HtmlScraper: Send + Sync {
    async fn scrape(&self, url: &str, options: &ScrapeOptions) -> Result<ScrapeResult>;
}

/// Mirrors `AuthSnapshot::cookie_header` but works off a bare cookie
/// list, since `ScrapeOptions` carries cookies detached from their
/// snapshot once a job has resolved its auth at dispatch time.
fn cookies_for_host(cookies: &[Cookie], host: &str) -> String {
    cookies
        .iter()
        .filter(|c| host.ends_with(c.domain.trim_start_matches('.')))
        .map(|c| format!("{}={}", c.name, c.value))
        .collect::<Vec<_>>()
        .join("; ")
}

const MAIN_CONTENT_SELECTORS: &[&str] = &["main", "article", "#content", "#main", ".main-content"];

/// Selectors dropped before picking main content and before conversion —
/// chrome that's never part of the document body.
const NOISE_SELECTORS: &[&str] = &["nav", "header", "footer", "aside", "script", "style", "noscript"];

pub struct ReqwestScraper {
    rate_limiter: Arc<dyn RateLimiter>,
}

impl ReqwestScraper {
    pub fn new(rate_limiter: Arc<dyn RateLimiter>) -> Self {
        Self { rate_limiter }
    }

    fn build_client(&self, options: &ScrapeOptions) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(options.user_agent.clone())
            .timeout(options.timeout)
            .redirect(reqwest::redirect::Policy::limited(options.max_redirects as usize))
            .build()
            .map_err(|source| ScrapeError::Network {
                url: String::new(),
                source,
            })
    }

    fn build_headers(url: &Url, options: &ScrapeOptions) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let host = url.host_str().unwrap_or_default();

        let cookie_header = cookies_for_host(&options.cookies, host);
        if !cookie_header.is_empty() {
            if let Ok(value) = HeaderValue::from_str(&cookie_header) {
                headers.insert(reqwest::header::COOKIE, value);
            }
        }

        for (name, value) in &options.tokens {
            let header_name = format!("X-{name}");
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(header_name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }

        headers
    }

    async fn fetch_body(
        response: reqwest::Response,
        url: &str,
        max_body_size: u64,
    ) -> Result<(u16, String)> {
        let status = response.status().as_u16();
        let mut response = response;
        let mut body = Vec::new();

        while let Some(chunk) = response.chunk().await.map_err(|source| ScrapeError::Network {
            url: url.to_string(),
            source,
        })? {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > max_body_size {
                return Err(ScrapeError::BodyTooLarge {
                    url: url.to_string(),
                    limit: max_body_size,
                });
            }
        }

        Ok((status, String::from_utf8_lossy(&body).into_owned()))
    }

    fn select_main_content(document: &Html) -> Option<scraper::ElementRef<'_>> {
        for raw in MAIN_CONTENT_SELECTORS {
            if let Ok(selector) = Selector::parse(raw) {
                if let Some(el) = document.select(&selector).next() {
                    return Some(el);
                }
            }
        }
        None
    }

    fn strip_noise(html: &str) -> String {
        let document = Html::parse_document(html);
        let mut keep = html.to_string();
        for raw in NOISE_SELECTORS {
            if let Ok(selector) = Selector::parse(raw) {
                for el in document.select(&selector) {
                    keep = keep.replace(&el.html(), "");
                }
            }
        }
        keep
    }
}

#[async_trait]
impl HtmlScraper for ReqwestScraper {
    async fn scrape(&self, url: &str, options: &ScrapeOptions) -> Result<ScrapeResult> {
        self.scrape_with_cancel(url, options, &quaero_core::CancelToken::new()).await
    }
}

impl ReqwestScraper {
    pub async fn scrape_with_cancel(
        &self,
        url: &str,
        options: &ScrapeOptions,
        cancel: &quaero_core::CancelToken,
    ) -> Result<ScrapeResult> {
        let parsed = Url::parse(url).map_err(|_| ScrapeError::InvalidUrl(url.to_string()))?;
        let host = parsed.host_str().unwrap_or_default().to_string();

        self.rate_limiter.acquire(&host, cancel).await?;

        let client = self.build_client(options)?;
        let headers = Self::build_headers(&parsed, options);
        let started = Instant::now();

        let response = client
            .get(parsed.clone())
            .headers(headers)
            .send()
            .await
            .map_err(|source| {
                if source.is_timeout() {
                    ScrapeError::Timeout {
                        url: url.to_string(),
                        timeout_secs: options.timeout.as_secs(),
                    }
                } else if source.is_redirect() {
                    ScrapeError::TooManyRedirects { url: url.to_string() }
                } else {
                    ScrapeError::Network {
                        url: url.to_string(),
                        source,
                    }
                }
            })?;

        let (status, body) = Self::fetch_body(response, url, options.max_body_size).await?;
        let duration = started.elapsed();

        if !(200..300).contains(&status) {
            return Ok(ScrapeResult {
                url: url.to_string(),
                status_code: status,
                markdown: String::new(),
                raw_html: None,
                title: String::new(),
                description: None,
                language: None,
                links: Vec::new(),
                metadata: PageMetadata::default(),
                duration,
            });
        }

        let cleaned = Self::strip_noise(&body);
        let document = Html::parse_document(&cleaned);

        let title = metadata::extract_title(&document);
        let description = metadata::extract_description(&document);
        let language = metadata::extract_language(&document);
        let page_metadata = if options.include_metadata {
            metadata::extract_page_metadata(&document)
        } else {
            PageMetadata::default()
        };
        let links = if options.include_links {
            metadata::extract_links(&document, &parsed, &options.extension_blacklist)
        } else {
            Vec::new()
        };

        let content_root = if options.only_main_content {
            Self::select_main_content(&document).unwrap_or_else(|| document.root_element())
        } else {
            document.root_element()
        };

        let markdown = match options.output_format {
            OutputFormat::Markdown => {
                let rendered = markdown::to_markdown(content_root);
                if rendered.trim().is_empty() {
                    markdown::strip_to_text(&cleaned)
                } else {
                    rendered
                }
            }
            OutputFormat::PlainText => markdown::strip_to_text(&cleaned),
        };

        let raw_html = matches!(options.detail_level, DetailLevel::Full).then(|| body.clone());

        Ok(ScrapeResult {
            url: url.to_string(),
            status_code: status,
            markdown,
            raw_html,
            title,
            description,
            language,
            links,
            metadata: page_metadata,
            duration,
        })
    }
}

/// Canned responses for tests that don't want to spin up a mock server.
#[cfg(any(test, feature = "test-support"))]
pub struct FakeScraper {
    pub result: ScrapeResult,
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl HtmlScraper for FakeScraper {
    async fn scrape(&self, _url: &str, _options: &ScrapeOptions) -> Result<ScrapeResult> {
        Ok(self.result.clone())
    }
}

#[cfg(test)]
#[path = "scraper_tests.rs"]
mod tests;
