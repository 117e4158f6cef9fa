use crate::models::{Category, Listing};
use crate::scrapers::site::SiteScraper;
use crate::scrapers::traits::ListingSource;
use crate::scrapers::types::SITES;
use anyhow::Result;
use futures::future::join_all;
use reqwest::Client;
use std::sync::Arc;
use tracing::{error, info};

/// Scrapes every registered source and concatenates the results.
///
/// A failing source contributes nothing; the others are still returned, in
/// registration order.
#[derive(Clone)]
pub struct Aggregator {
    sources: Vec<Arc<dyn ListingSource>>,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn ListingSource>>) -> Self {
        Self { sources }
    }

    /// Aggregator over the built-in car market sites
    pub fn for_sites(client: Client) -> Result<Self> {
        let mut sources: Vec<Arc<dyn ListingSource>> = Vec::with_capacity(SITES.len());
        for spec in &SITES {
            sources.push(Arc::new(SiteScraper::new(client.clone(), spec)?));
        }
        Ok(Self::new(sources))
    }

    pub async fn fetch_all(&self) -> Vec<Listing> {
        let results = join_all(self.sources.iter().map(|source| source.fetch_listings())).await;

        let mut listings = Vec::new();
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(found) => listings.extend(found),
                Err(e) => error!(source = %source.source(), error = %format!("{e:#}"), "Scrape failed"),
            }
        }

        info!(count = listings.len(), "Aggregated listings");
        listings
    }

    pub async fn fetch_by_category(&self, category: Category) -> Vec<Listing> {
        self.fetch_all()
            .await
            .into_iter()
            .filter(|listing| listing.category == category)
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::{Source, YEAR_NOT_SPECIFIED};
    use async_trait::async_trait;
    use chrono::Utc;

    pub fn listing(brand: &str, name: &str, source: Source, category: Category) -> Listing {
        Listing {
            name: name.to_string(),
            brand: brand.to_string(),
            price: "1 000 000 ₽".to_string(),
            photo: None,
            link: String::new(),
            location: "В наличии в Москве".to_string(),
            year: YEAR_NOT_SPECIFIED.to_string(),
            source,
            category,
            scraped_at: Utc::now(),
        }
    }

    /// Source returning a fixed list, or failing when built with `failing`
    pub struct FixedSource {
        pub source: Source,
        pub listings: Option<Vec<Listing>>,
    }

    impl FixedSource {
        pub fn new(source: Source, listings: Vec<Listing>) -> Arc<dyn ListingSource> {
            Arc::new(Self { source, listings: Some(listings) })
        }

        pub fn failing(source: Source) -> Arc<dyn ListingSource> {
            Arc::new(Self { source, listings: None })
        }
    }

    #[async_trait]
    impl ListingSource for FixedSource {
        async fn fetch_listings(&self) -> Result<Vec<Listing>> {
            match &self.listings {
                Some(listings) => Ok(listings.clone()),
                None => anyhow::bail!("connection timed out"),
            }
        }

        fn source(&self) -> Source {
            self.source
        }
    }
}
