use crate::models::{Listing, Source};
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for all listing sources
/// The aggregator only sees this, so tests can swap in fixed sources
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch and extract the current listings of the source
    async fn fetch_listings(&self) -> Result<Vec<Listing>>;

    /// Which site the listings come from
    fn source(&self) -> Source;
}
