use crate::models::Category;

/// Telegram caps callback payloads at 64 bytes
pub const MAX_CALLBACK_BYTES: usize = 64;

const ALL_CATEGORIES: &str = "all";

/// Action attached to an inline keyboard button.
///
/// Encoded as `brand:<category|all>:<key>` or `page:<n>:<category|all>`; the
/// brand key goes last so it may contain any character, including `:`.
#[derive(Debug, Clone, PartialEq)]
pub enum CallbackAction {
    Brand { key: String, category: Option<Category> },
    Page { page: usize, category: Option<Category> },
}

impl CallbackAction {
    /// Payload string, with the brand key cut to fit the size limit
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::Brand { key, category } => {
                let prefix = format!("brand:{}:", category_tag(*category));
                let room = MAX_CALLBACK_BYTES.saturating_sub(prefix.len());
                format!("{prefix}{}", truncate_to_bytes(key, room))
            }
            CallbackAction::Page { page, category } => {
                format!("page:{page}:{}", category_tag(*category))
            }
        }
    }

    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.splitn(3, ':');
        let kind = parts.next()?;
        let second = parts.next()?;
        let third = parts.next()?;

        match kind {
            "brand" => Some(CallbackAction::Brand {
                category: parse_category_tag(second)?,
                key: third.to_string(),
            }),
            "page" => Some(CallbackAction::Page {
                page: second.parse().ok()?,
                category: parse_category_tag(third)?,
            }),
            _ => None,
        }
    }
}

fn category_tag(category: Option<Category>) -> &'static str {
    category.map(|c| c.as_str()).unwrap_or(ALL_CATEGORIES)
}

/// `Some(None)` for "all", `None` for an unknown tag
fn parse_category_tag(tag: &str) -> Option<Option<Category>> {
    if tag == ALL_CATEGORIES {
        return Some(None);
    }
    tag.parse().ok().map(Some)
}

fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
