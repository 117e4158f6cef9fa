use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const UNKNOWN_BRAND: &str = "Неизвестно";
pub const UNKNOWN_NAME: &str = "Неизвестный автомобиль";
pub const PRICE_ON_REQUEST: &str = "Цена по запросу";
pub const CITY_NOT_SPECIFIED: &str = "Город не указан";
pub const YEAR_NOT_SPECIFIED: &str = "Год не указан";

/// Site a listing was scraped from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Antiqcar,
    Antarmotors,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Antiqcar => "antiqcar",
            Source::Antarmotors => "antarmotors",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog section a listing belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Retro,
    New,
    Children,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Retro => "retro",
            Category::New => "new",
            Category::Children => "children",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "retro" => Ok(Category::Retro),
            "new" => Ok(Category::New),
            "children" => Ok(Category::Children),
            other => anyhow::bail!("unknown category: {other}"),
        }
    }
}

/// One vehicle offer extracted from a source site
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub name: String,
    pub brand: String,
    pub price: String,
    pub photo: Option<String>,
    pub link: String,
    pub location: String,
    pub year: String,
    pub source: Source,
    pub category: Category,
    pub scraped_at: DateTime<Utc>,
}

impl Listing {
    /// Grouping key: case-folded, trimmed brand
    pub fn brand_key(&self) -> String {
        normalize_brand(&self.brand)
    }

    pub fn has_year(&self) -> bool {
        self.year != YEAR_NOT_SPECIFIED
    }
}

pub fn normalize_brand(brand: &str) -> String {
    brand.to_lowercase().trim().to_string()
}
