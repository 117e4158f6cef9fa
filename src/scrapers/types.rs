use crate::models::{Category, Source};
use anyhow::{anyhow, Context, Result};
use scraper::Selector;
use url::Url;

/// Markup description of one source site
#[derive(Debug, Clone, Copy)]
pub struct SiteSpec {
    pub source: Source,
    /// Listing page that is fetched and used as the base for relative URLs
    pub url: &'static str,
    pub default_category: Category,
    /// Repeating card element
    pub item: &'static str,
    pub title: &'static str,
    /// Element carrying the brand attribute
    pub brand: &'static str,
    pub brand_attr: &'static str,
    /// Presence flags the card as a children's car
    pub children_marker: &'static str,
    pub photo: &'static str,
    pub photo_attr: &'static str,
    pub price: &'static str,
    pub link: &'static str,
    pub location: &'static str,
    pub sold_class_marker: &'static str,
    pub on_sale_class_marker: &'static str,
    pub sold_text_marker: &'static str,
}

/// Card layout shared by both sites; only url, source and default category differ
const CARD_LAYOUT: SiteSpec = SiteSpec {
    source: Source::Antiqcar,
    url: "https://antiqcar.ru/market",
    default_category: Category::Retro,
    item: "div.flex-item.mix",
    title: "h2.left strong, h2.left b",
    brand: "span[data-brand]",
    brand_attr: "data-brand",
    children_marker: r#"span[data-brand="Авто для детей"]"#,
    photo: "img.lazyload[data-src]",
    photo_attr: "data-src",
    price: "div.right2 strong",
    link: "a[href]",
    location: r#"div.right2 span[style*="font-size:8pt"]"#,
    sold_class_marker: "sold",
    on_sale_class_marker: "onsale",
    sold_text_marker: "продано",
};

pub const ANTIQCAR: SiteSpec = SiteSpec {
    source: Source::Antiqcar,
    url: "https://antiqcar.ru/market",
    default_category: Category::Retro,
    ..CARD_LAYOUT
};

pub const ANTARMOTORS: SiteSpec = SiteSpec {
    source: Source::Antarmotors,
    url: "https://antarmotors.ru/market",
    default_category: Category::New,
    ..CARD_LAYOUT
};

/// Sites scraped by default, in display order
pub const SITES: [SiteSpec; 2] = [ANTIQCAR, ANTARMOTORS];

/// Compiled form of a [`SiteSpec`]
#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub source: Source,
    pub url: Url,
    pub default_category: Category,
    pub item: Selector,
    pub title: Selector,
    pub brand: Selector,
    pub brand_attr: &'static str,
    pub children_marker: Selector,
    pub photo: Selector,
    pub photo_attr: &'static str,
    pub price: Selector,
    pub link: Selector,
    pub location: Selector,
    pub sold_class_marker: &'static str,
    pub on_sale_class_marker: &'static str,
    pub sold_text_marker: &'static str,
}

impl SiteProfile {
    pub fn compile(spec: &SiteSpec) -> Result<Self> {
        Ok(Self {
            source: spec.source,
            url: Url::parse(spec.url)
                .with_context(|| format!("Invalid listing URL for {}", spec.source))?,
            default_category: spec.default_category,
            item: selector(spec.item)?,
            title: selector(spec.title)?,
            brand: selector(spec.brand)?,
            brand_attr: spec.brand_attr,
            children_marker: selector(spec.children_marker)?,
            photo: selector(spec.photo)?,
            photo_attr: spec.photo_attr,
            price: selector(spec.price)?,
            link: selector(spec.link)?,
            location: selector(spec.location)?,
            sold_class_marker: spec.sold_class_marker,
            on_sale_class_marker: spec.on_sale_class_marker,
            sold_text_marker: spec.sold_text_marker,
        })
    }
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {css:?}: {e}"))
}
