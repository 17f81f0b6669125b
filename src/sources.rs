use crate::config::Config;
use crate::errors::AppError;
use crate::random::{choose, RandomSource};
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use url::Url;
use std::sync::Arc;

const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// External pages the report is built from.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Whether `handle` is registered on the directory site.
    ///
    /// Implementations return `false` on any transport or parse error.
    async fn existence_check(&self, handle: &str) -> bool;

    /// Raw HTML of the public profile page.
    async fn fetch_profile_page(&self, handle: &str) -> Result<String, AppError>;

    /// Raw HTML of the achievements page.
    async fn fetch_achievements_page(&self, handle: &str) -> Result<String, AppError>;
}

/// Scrapes the public gamertag directory and achievement tracker.
#[derive(Clone)]
pub struct XboxPublicClient {
    client: Client,
    profile_base_url: String,
    achievements_base_url: String,
    rng: Arc<dyn RandomSource>,
}

impl XboxPublicClient {
    /// Creates a new `XboxPublicClient`.
    ///
    /// # Arguments
    ///
    /// * `client` - Shared HTTP client, built once at startup.
    /// * `config` - Source base URLs.
    /// * `rng` - Used to rotate the `User-Agent` header.
    pub fn new(client: Client, config: &Config, rng: Arc<dyn RandomSource>) -> Self {
        Self {
            client,
            profile_base_url: config.profile_base_url.clone(),
            achievements_base_url: config.achievements_base_url.clone(),
            rng,
        }
    }

    /// Builds `{base}/{section}/{handle}` with the handle encoded as one path segment.
    fn page_url(base: &str, section: &str, handle: &str) -> Result<Url, AppError> {
        let mut url = Url::parse(base)
            .map_err(|e| AppError::LookupFailure(format!("Invalid base URL {}: {}", base, e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::LookupFailure(format!("Base URL cannot be a base: {}", base)))?
            .pop_if_empty()
            .push(section)
            .push(handle);
        Ok(url)
    }

    fn profile_url(&self, handle: &str) -> Result<Url, AppError> {
        Self::page_url(&self.profile_base_url, "search", handle)
    }

    fn achievements_url(&self, handle: &str) -> Result<Url, AppError> {
        Self::page_url(&self.achievements_base_url, "gamer", handle)
    }

    async fn get_html(&self, url: Url) -> Result<String, AppError> {
        let user_agent = choose(self.rng.as_ref(), &USER_AGENTS[..]).copied().unwrap_or(USER_AGENTS[0]);

        let response = self
            .client
            .get(url.clone())
            .header("User-Agent", user_agent)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.5")
            .header("DNT", "1")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .map_err(|e| AppError::LookupFailure(format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(AppError::LookupFailure(format!(
                "{} returned status {}",
                url,
                response.status()
            )));
        }

        response.text().await.map_err(|e| {
            AppError::LookupFailure(format!("Failed to read body from {}: {}", url, e))
        })
    }
}

#[async_trait]
impl PageSource for XboxPublicClient {
    async fn existence_check(&self, handle: &str) -> bool {
        let url = match self.profile_url(handle) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Existence check for {} skipped: {}", handle, e);
                return false;
            }
        };

        match self.get_html(url).await {
            Ok(html) => page_shows_profile(&html, handle),
            Err(e) => {
                tracing::warn!("Existence check for {} failed: {}", handle, e);
                false
            }
        }
    }

    async fn fetch_profile_page(&self, handle: &str) -> Result<String, AppError> {
        let url = self.profile_url(handle)?;
        tracing::debug!("Fetching profile page for {}: {}", handle, url);
        self.get_html(url).await
    }

    async fn fetch_achievements_page(&self, handle: &str) -> Result<String, AppError> {
        let url = self.achievements_url(handle)?;
        tracing::debug!("Fetching achievements page for {}: {}", handle, url);
        self.get_html(url).await
    }
}

/// Presence/absence markers of the directory's search page.
///
/// A page counts as a hit when it has no "not found" wording and carries a
/// profile header, a gamertag-info block, or an `<h1>` naming the handle.
pub fn page_shows_profile(html: &str, handle: &str) -> bool {
    let lower = html.to_lowercase();
    if lower.contains("not found") || lower.contains("doesn't exist") {
        return false;
    }

    let marker = Regex::new(
        r#"(?is)<div[^>]*class\s*=\s*["'][^"']*\b(?:profile-header|gamertag-info)\b[^"']*["']"#,
    );
    if matches!(marker, Ok(ref re) if re.is_match(html)) {
        return true;
    }

    let heading = Regex::new(&format!(
        r"(?is)<h1[^>]*>[^<]*{}[^<]*</h1>",
        regex::escape(handle)
    ));
    matches!(heading, Ok(re) if re.is_match(html))
}
