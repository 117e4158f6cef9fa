use crate::config::Config;
use crate::models::{Listing, Source};
use crate::scrapers::extractor::extract_listings;
use crate::scrapers::traits::ListingSource;
use crate::scrapers::types::{SiteProfile, SiteSpec};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use tracing::{debug, info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Build the HTTP client shared by all site scrapers.
///
/// Sends browser-like headers and ignores proxy environment variables.
pub fn build_http_client(config: &Config) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ru-RU,ru;q=0.5"));

    Client::builder()
        .timeout(config.scrape_timeout)
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .no_proxy()
        .build()
        .context("Failed to create HTTP client")
}

/// Scraper for one car market page, driven by its [`SiteProfile`]
pub struct SiteScraper {
    client: Client,
    profile: SiteProfile,
}

impl SiteScraper {
    pub fn new(client: Client, spec: &SiteSpec) -> Result<Self> {
        let profile = SiteProfile::compile(spec)?;
        Ok(Self { client, profile })
    }

    async fn fetch_html(&self) -> Result<String> {
        let url = self.profile.url.as_str();
        debug!("Fetching URL: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {} page", self.profile.source))?;

        if !response.status().is_success() {
            warn!("{} returned status: {}", self.profile.source, response.status());
            anyhow::bail!("Failed to fetch {} page: {}", self.profile.source, response.status());
        }

        // Both sites serve UTF-8 regardless of what the headers claim
        let body = response.bytes().await.context("Failed to read response body")?;
        debug!("Downloaded {} bytes of HTML", body.len());

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[async_trait]
impl ListingSource for SiteScraper {
    async fn fetch_listings(&self) -> Result<Vec<Listing>> {
        info!("Starting {} scrape", self.profile.source);

        let html = self.fetch_html().await?;
        let listings = extract_listings(&html, &self.profile.url, &self.profile);

        info!("Scraped {} listings from {}", listings.len(), self.profile.source);
        Ok(listings)
    }

    fn source(&self) -> Source {
        self.profile.source
    }
}
