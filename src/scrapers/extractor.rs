use crate::models::{
    Category, Listing, CITY_NOT_SPECIFIED, PRICE_ON_REQUEST, UNKNOWN_BRAND, UNKNOWN_NAME,
    YEAR_NOT_SPECIFIED,
};
use crate::scrapers::types::SiteProfile;
use anyhow::{Context, Result};
use chrono::Utc;
use regex::Regex;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;
use tracing::{debug, warn};
use url::Url;

/// Leading run of latin/cyrillic words, optionally joined by spaces or hyphens
static BRAND_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-zА-Яа-я]+(?:[\s\-][A-Za-zА-Яа-я]+)*)").expect("brand pattern compiles")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Extract every listing card on a page.
///
/// Never fails: a card that cannot be processed is logged and skipped, and
/// cards that are sold or lack a name or brand are dropped silently.
pub fn extract_listings(html: &str, base_url: &Url, profile: &SiteProfile) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let cards: Vec<_> = document.select(&profile.item).collect();
    debug!(source = %profile.source, cards = cards.len(), "Found listing cards");

    let mut listings = Vec::new();

    for (idx, card) in cards.iter().enumerate() {
        match extract_item(card, base_url, profile) {
            Ok(Some(listing)) => listings.push(listing),
            Ok(None) => {}
            Err(e) => {
                warn!(source = %profile.source, card = idx, error = %e, "Failed to process listing card");
            }
        }
    }

    debug!(source = %profile.source, listings = listings.len(), "Extracted listings");
    listings
}

/// Turn one card into a listing, `Ok(None)` when the card is filtered out
fn extract_item(card: &ElementRef, base_url: &Url, profile: &SiteProfile) -> Result<Option<Listing>> {
    if is_sold(card, profile) {
        return Ok(None);
    }

    let is_children = card.select(&profile.children_marker).next().is_some();

    let title = card.select(&profile.title).next().map(|el| element_text(&el));

    let brand = match card.select(&profile.brand).next() {
        Some(el) => el
            .value()
            .attr(profile.brand_attr)
            .unwrap_or(UNKNOWN_BRAND)
            .to_string(),
        None => title
            .as_deref()
            .and_then(brand_from_title)
            .unwrap_or_else(|| UNKNOWN_BRAND.to_string()),
    };

    let name = title.unwrap_or_else(|| UNKNOWN_NAME.to_string());

    let photo = match card
        .select(&profile.photo)
        .next()
        .and_then(|el| el.value().attr(profile.photo_attr))
        .map(str::trim)
    {
        Some(raw) if !raw.is_empty() => Some(resolve_url(base_url, raw)?),
        _ => None,
    };

    let price = card
        .select(&profile.price)
        .next()
        .map(|el| collapse_whitespace(&element_text(&el)))
        .unwrap_or_else(|| PRICE_ON_REQUEST.to_string());

    let link = match card.select(&profile.link).next().and_then(|el| el.value().attr("href")) {
        Some(href) if !href.is_empty() => resolve_url(base_url, href)?,
        _ => String::new(),
    };

    let location = card
        .select(&profile.location)
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_else(|| CITY_NOT_SPECIFIED.to_string());

    let category = if is_children {
        Category::Children
    } else {
        profile.default_category
    };

    if name == UNKNOWN_NAME || brand == UNKNOWN_BRAND || brand.is_empty() {
        debug!(source = %profile.source, name = %name, brand = %brand, "Dropping card without name or brand");
        return Ok(None);
    }

    Ok(Some(Listing {
        name,
        brand,
        price,
        photo,
        link,
        location,
        year: YEAR_NOT_SPECIFIED.to_string(),
        source: profile.source,
        category,
        scraped_at: Utc::now(),
    }))
}

/// Any one of the three signals marks a card as sold
fn is_sold(card: &ElementRef, profile: &SiteProfile) -> bool {
    let classes = card.value().classes().collect::<Vec<_>>().join(" ").to_lowercase();

    classes.contains(profile.sold_class_marker)
        || !classes.contains(profile.on_sale_class_marker)
        || card.html().to_lowercase().contains(profile.sold_text_marker)
}

fn brand_from_title(title: &str) -> Option<String> {
    BRAND_PREFIX
        .captures(title.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|brand| !brand.is_empty())
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

fn resolve_url(base_url: &Url, raw: &str) -> Result<String> {
    if raw.starts_with("http") {
        return Ok(raw.to_string());
    }

    let resolved = base_url
        .join(raw)
        .with_context(|| format!("Failed to resolve {raw:?} against {base_url}"))?;

    Ok(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Source;
    use crate::scrapers::types::{ANTARMOTORS, ANTIQCAR};

    fn antiqcar() -> SiteProfile {
        SiteProfile::compile(&ANTIQCAR).unwrap()
    }

    fn base() -> Url {
        Url::parse("https://antiqcar.ru/market").unwrap()
    }

    fn page(cards: &str) -> String {
        format!("<html><body><div class=\"grid\">{cards}</div></body></html>")
    }

    const FORD_CARD: &str = r#"
        <div class="flex-item mix onsale">
            <a href="/market/ford-mustang-1967">
                <img class="lazyload" data-src=" /upload/ford.jpg ">
            </a>
            <span data-brand="Ford"></span>
            <h2 class="left"><strong>Ford Mustang 1967</strong></h2>
            <div class="right2">
                <strong>4 500
                    000 ₽</strong>
                <span style="font-size:8pt">В наличии в Москве</span>
            </div>
        </div>"#;

    #[test]
    fn test_extracts_complete_card() {
        let listings = extract_listings(&page(FORD_CARD), &base(), &antiqcar());

        assert_eq!(listings.len(), 1);
        let ford = &listings[0];
        assert_eq!(ford.name, "Ford Mustang 1967");
        assert_eq!(ford.brand, "Ford");
        assert_eq!(ford.price, "4 500 000 ₽");
        assert_eq!(ford.photo.as_deref(), Some("https://antiqcar.ru/upload/ford.jpg"));
        assert_eq!(ford.link, "https://antiqcar.ru/market/ford-mustang-1967");
        assert_eq!(ford.location, "В наличии в Москве");
        assert_eq!(ford.year, YEAR_NOT_SPECIFIED);
        assert_eq!(ford.source, Source::Antiqcar);
        assert_eq!(ford.category, Category::Retro);
    }

    #[test]
    fn test_sold_and_on_sale_cards() {
        let sold = r#"
            <div class="flex-item mix sold">
                <span data-brand="Jaguar"></span>
                <h2 class="left"><strong>Jaguar E-Type</strong></h2>
            </div>"#;
        let html = page(&format!("{sold}{FORD_CARD}"));

        let listings = extract_listings(&html, &base(), &antiqcar());

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].brand, "Ford");
    }

    #[test]
    fn test_sold_marker_wins_over_on_sale_marker() {
        let html = page(
            r#"<div class="flex-item mix onsale sold">
                <span data-brand="Ford"></span>
                <h2 class="left"><strong>Ford Mustang</strong></h2>
            </div>"#,
        );

        assert!(extract_listings(&html, &base(), &antiqcar()).is_empty());
    }

    #[test]
    fn test_card_without_on_sale_marker_is_skipped() {
        let html = page(
            r#"<div class="flex-item mix">
                <span data-brand="Ford"></span>
                <h2 class="left"><strong>Ford Mustang</strong></h2>
            </div>"#,
        );

        assert!(extract_listings(&html, &base(), &antiqcar()).is_empty());
    }

    #[test]
    fn test_sold_text_is_detected_case_insensitively() {
        let html = page(
            r#"<div class="flex-item mix onsale">
                <span data-brand="Ford"></span>
                <h2 class="left"><strong>Ford Mustang</strong></h2>
                <div class="badge">ПРОДАНО</div>
            </div>"#,
        );

        assert!(extract_listings(&html, &base(), &antiqcar()).is_empty());
    }

    #[test]
    fn test_missing_fields_fall_back_to_placeholders() {
        let html = page(
            r#"<div class="flex-item mix onsale">
                <h2 class="left"><b>Волга ГАЗ-21 1962</b></h2>
            </div>"#,
        );

        let listings = extract_listings(&html, &base(), &antiqcar());

        assert_eq!(listings.len(), 1);
        let volga = &listings[0];
        assert_eq!(volga.brand, "Волга ГАЗ");
        assert_eq!(volga.price, PRICE_ON_REQUEST);
        assert_eq!(volga.location, CITY_NOT_SPECIFIED);
        assert_eq!(volga.photo, None);
        assert_eq!(volga.link, "");
    }

    #[test]
    fn test_brand_attribute_takes_precedence_over_title() {
        let html = page(
            r#"<div class="flex-item mix onsale">
                <span data-brand="Ford"></span>
                <h2 class="left"><strong>Shelby Mustang GT500</strong></h2>
            </div>"#,
        );

        let listings = extract_listings(&html, &base(), &antiqcar());
        assert_eq!(listings[0].brand, "Ford");
    }

    #[test]
    fn test_brand_from_title_takes_leading_words() {
        assert_eq!(brand_from_title("Ford Mustang 1967"), Some("Ford Mustang".to_string()));
        assert_eq!(brand_from_title("Mercedes-Benz 300SL"), Some("Mercedes-Benz".to_string()));
        assert_eq!(brand_from_title("  ЗИЛ-111 "), Some("ЗИЛ".to_string()));
        assert_eq!(brand_from_title("1967 Ford"), None);
        assert_eq!(brand_from_title(""), None);
    }

    #[test]
    fn test_cards_without_name_or_brand_are_dropped() {
        let no_title = r#"
            <div class="flex-item mix onsale">
                <span data-brand="Ford"></span>
            </div>"#;
        let empty_brand = r#"
            <div class="flex-item mix onsale">
                <span data-brand=""></span>
                <h2 class="left"><strong>Ford Mustang</strong></h2>
            </div>"#;
        let numeric_title = r#"
            <div class="flex-item mix onsale">
                <h2 class="left"><strong>1967</strong></h2>
            </div>"#;
        let html = page(&format!("{no_title}{empty_brand}{numeric_title}"));

        assert!(extract_listings(&html, &base(), &antiqcar()).is_empty());
    }

    #[test]
    fn test_children_marker_overrides_site_category() {
        let html = page(
            r#"<div class="flex-item mix onsale">
                <span data-brand="Авто для детей"></span>
                <h2 class="left"><strong>Электромобиль Bentley</strong></h2>
            </div>"#,
        );
        let profile = SiteProfile::compile(&ANTARMOTORS).unwrap();

        let listings = extract_listings(&html, &base(), &profile);

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].category, Category::Children);
        assert_eq!(listings[0].brand, "Авто для детей");
        assert_eq!(listings[0].source, Source::Antarmotors);
    }

    #[test]
    fn test_absolute_urls_are_kept() {
        let html = page(
            r#"<div class="flex-item mix onsale">
                <a href="https://antarmotors.ru/car/1"></a>
                <img class="lazyload" data-src="https://cdn.example.com/1.jpg">
                <span data-brand="BMW"></span>
                <h2 class="left"><strong>BMW M5</strong></h2>
            </div>"#,
        );

        let listings = extract_listings(&html, &base(), &antiqcar());

        assert_eq!(listings[0].link, "https://antarmotors.ru/car/1");
        assert_eq!(listings[0].photo.as_deref(), Some("https://cdn.example.com/1.jpg"));
    }

    #[test]
    fn test_page_without_cards_yields_nothing() {
        let html = "<html><body><p>Технические работы</p></body></html>";
        assert!(extract_listings(html, &base(), &antiqcar()).is_empty());
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  1\u{a0}200\n\t000  ₽ "), "1 200 000 ₽");
    }
}
