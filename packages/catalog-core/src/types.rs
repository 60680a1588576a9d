use serde::{Deserialize, Serialize};

/// A single catalog entry (interview problem, course chapter, playlist).
///
/// `order` is the keyset field the store paginates on. It must be unique
/// within a collection and strictly increasing in iteration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Stable identifier of the item.
    pub id: String,
    /// Monotonic sort key used as the cursor field.
    pub order: i64,
    /// Display title. Search text is matched against it.
    pub title: String,
    /// Optional category (e.g. "arrays", "graphs").
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category: Option<String>,
    /// Optional difficulty or course level.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub level: Option<String>,
    /// Free-form tags.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
}

impl Item {
    /// Creates an item with only the required fields set.
    #[must_use]
    pub fn new(id: impl Into<String>, order: i64, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            order,
            title: title.into(),
            category: None,
            level: None,
            tags: Vec::new(),
        }
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the level.
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }
}

/// Access tier of the caller, resolved once per listing session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    /// Non-privileged caller. Subject to page and row limits.
    #[default]
    Free,
    /// Privileged caller. Every page and row is accessible.
    Premium,
}

impl AccessTier {
    /// Whether this tier bypasses the free limits.
    #[must_use]
    pub fn is_privileged(self) -> bool {
        matches!(self, AccessTier::Premium)
    }
}

impl std::str::FromStr for AccessTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "free" => Ok(AccessTier::Free),
            "premium" => Ok(AccessTier::Premium),
            other => Err(format!("unknown access tier: {other}")),
        }
    }
}
