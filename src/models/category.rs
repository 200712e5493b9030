use serde::{Deserialize, Serialize};

use super::parse_id;
use super::validation::{validate_title, ValidationErrors};

/// Category record stored in redb, keyed by id
/// Uses Unix timestamps for compact storage with bincode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub title: String,
    /// Owner identifier of the session that created the category
    pub owner_id: String,
    /// Optimistic-concurrency token, bumped on every update
    pub version: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Category model used by handlers and views
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub id: u64,
    pub title: String,
    pub owner_id: String,
    pub version: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Category {
    pub fn from_record(id: u64, record: CategoryRecord) -> Self {
        Self {
            id,
            title: record.title,
            owner_id: record.owner_id,
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }
}

/// Fields supplied when inserting a category
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub title: String,
    pub owner_id: String,
}

/// Filter for category listings
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    pub owner_id: Option<String>,
}

impl CategoryFilter {
    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
        }
    }

    pub fn matches(&self, category: &Category) -> bool {
        self.owner_id
            .as_deref()
            .is_none_or(|owner| category.is_owned_by(owner))
    }
}

/// Submitted create/edit form for a category
///
/// The owner is deliberately absent: it is always bound from the session.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryForm {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "__RequestVerificationToken")]
    pub token: String,
}

impl CategoryForm {
    /// Pre-fill an edit form from a stored category
    pub fn from_category(category: &Category) -> Self {
        Self {
            id: Some(category.id.to_string()),
            title: category.title.clone(),
            version: Some(category.version.to_string()),
            token: String::new(),
        }
    }

    /// Id submitted in the form body, if it parses
    pub fn body_id(&self) -> Option<u64> {
        self.id.as_deref().and_then(parse_id)
    }

    /// Version the editor loaded, if the hidden field was submitted intact
    pub fn version(&self) -> Option<u64> {
        self.version.as_deref().and_then(parse_id)
    }

    /// Validate the form, returning the normalized title
    pub fn validate(&self) -> Result<String, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let title = validate_title(&self.title, &mut errors);
        if errors.is_empty() {
            Ok(title)
        } else {
            Err(errors)
        }
    }
}
