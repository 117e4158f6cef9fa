use crate::models::{Category, Listing};
use std::collections::HashMap;

pub const BRANDS_PER_PAGE: usize = 15;

/// Listings sharing one normalized brand
#[derive(Debug, Clone, PartialEq)]
pub struct BrandGroup {
    pub key: String,
    pub display_name: String,
    pub listings: Vec<Listing>,
}

/// One page of the brand menu
#[derive(Debug, Clone, PartialEq)]
pub struct BrandPage {
    /// 1-based page number as requested
    pub page: usize,
    pub total_pages: usize,
    /// Number of groups on the pages before this one
    pub offset: usize,
    pub groups: Vec<BrandGroup>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogOutcome {
    Page(BrandPage),
    /// Children's section is empty, which is an expected state
    NoChildrenListings,
    /// Nothing matched, most likely because scraping failed
    NothingLoaded,
}

/// Filter, group and slice listings for the brand menu.
///
/// Pages past the end come back empty; callers validate the range.
pub fn browse(listings: Vec<Listing>, category: Option<Category>, page: usize) -> CatalogOutcome {
    match grouped(listings, category) {
        Ok(groups) => CatalogOutcome::Page(paginate(groups, page)),
        Err(outcome) => outcome,
    }
}

/// Like [`browse`], but moves the page into `1..=total_pages` first
pub fn browse_clamped(listings: Vec<Listing>, category: Option<Category>, page: usize) -> CatalogOutcome {
    match grouped(listings, category) {
        Ok(groups) => {
            let page = page.clamp(1, total_pages(groups.len()));
            CatalogOutcome::Page(paginate(groups, page))
        }
        Err(outcome) => outcome,
    }
}

fn grouped(listings: Vec<Listing>, category: Option<Category>) -> Result<Vec<BrandGroup>, CatalogOutcome> {
    let listings = filter_by_category(listings, category);

    if listings.is_empty() {
        return Err(match category {
            Some(Category::Children) => CatalogOutcome::NoChildrenListings,
            _ => CatalogOutcome::NothingLoaded,
        });
    }

    Ok(group_by_brand(listings))
}

pub fn filter_by_category(listings: Vec<Listing>, category: Option<Category>) -> Vec<Listing> {
    match category {
        Some(category) => listings
            .into_iter()
            .filter(|listing| listing.category == category)
            .collect(),
        None => listings,
    }
}

/// Group listings by normalized brand, sorted by display name.
///
/// The first listing seen for a key decides how the brand is displayed, so
/// display casing follows the order in which sources returned their listings.
pub fn group_by_brand(listings: Vec<Listing>) -> Vec<BrandGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<BrandGroup> = Vec::new();

    for listing in listings {
        let key = listing.brand_key();
        match index.get(&key) {
            Some(&pos) => groups[pos].listings.push(listing),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(BrandGroup {
                    key,
                    display_name: listing.brand.clone(),
                    listings: vec![listing],
                });
            }
        }
    }

    groups.sort_by(|a, b| a.display_name.cmp(&b.display_name));
    groups
}

pub fn total_pages(group_count: usize) -> usize {
    group_count.div_ceil(BRANDS_PER_PAGE).max(1)
}

pub fn paginate(groups: Vec<BrandGroup>, page: usize) -> BrandPage {
    let total_pages = total_pages(groups.len());
    // Page numbers come from callback data, so they may be arbitrarily large
    let offset = page.saturating_sub(1).saturating_mul(BRANDS_PER_PAGE);

    BrandPage {
        page,
        total_pages,
        offset,
        groups: groups.into_iter().skip(offset).take(BRANDS_PER_PAGE).collect(),
    }
}

/// Listings of one brand, in scrape order.
///
/// Falls back to prefix matching when `key` was shortened to fit a callback
/// payload, as long as the prefix identifies a single brand.
pub fn listings_for_brand(listings: Vec<Listing>, key: &str, category: Option<Category>) -> Vec<Listing> {
    let listings = filter_by_category(listings, category);

    let exact: Vec<Listing> = listings
        .iter()
        .filter(|listing| listing.brand_key() == key)
        .cloned()
        .collect();
    if !exact.is_empty() || key.is_empty() {
        return exact;
    }

    let prefixed: Vec<Listing> = listings
        .into_iter()
        .filter(|listing| listing.brand_key().starts_with(key))
        .collect();
    let mut keys: Vec<String> = prefixed.iter().map(Listing::brand_key).collect();
    keys.sort();
    keys.dedup();

    if keys.len() == 1 {
        prefixed
    } else {
        Vec::new()
    }
}
