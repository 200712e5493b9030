use serde::{Deserialize, Serialize};

use super::category::Category;
use super::parse_id;
use super::validation::{validate_title, ValidationErrors};
use crate::constants::{ERR_CATEGORY_INVALID, ERR_CATEGORY_REQUIRED};

/// To-do item record stored in redb, keyed by id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub title: String,
    pub is_complete: bool,
    pub category_id: u64,
    /// Optimistic-concurrency token, bumped on every update
    pub version: u64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// To-do item model used by handlers and views
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: u64,
    pub title: String,
    pub is_complete: bool,
    pub category_id: u64,
    pub version: u64,
    pub created_at: i64,
    pub updated_at: i64,
    /// Owning category, loaded only when a join was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
}

impl Item {
    pub fn from_record(id: u64, record: ItemRecord) -> Self {
        Self {
            id,
            title: record.title,
            is_complete: record.is_complete,
            category_id: record.category_id,
            version: record.version,
            created_at: record.created_at,
            updated_at: record.updated_at,
            category: None,
        }
    }

    /// Title of the joined category, empty when not joined
    pub fn category_title(&self) -> &str {
        self.category.as_ref().map(|c| c.title.as_str()).unwrap_or("")
    }

    /// Items carry no owner of their own; ownership follows the joined category
    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.category
            .as_ref()
            .is_some_and(|c| c.is_owned_by(owner_id))
    }
}

/// Fields supplied when inserting an item
#[derive(Debug, Clone)]
pub struct NewItem {
    pub title: String,
    pub is_complete: bool,
    pub category_id: u64,
}

/// Filter for item listings
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Owner of the referenced category
    pub owner_id: Option<String>,
    pub category_id: Option<u64>,
}

impl ItemFilter {
    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            category_id: None,
        }
    }

    pub fn in_category(mut self, category_id: u64) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// Submitted create/edit form for an item
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemForm {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    /// Present (as "true" or "on") only when the checkbox is ticked
    #[serde(default)]
    pub is_complete: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, rename = "__RequestVerificationToken")]
    pub token: String,
}

/// Item form fields after validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidItem {
    pub title: String,
    pub is_complete: bool,
    pub category_id: u64,
}

impl From<ValidItem> for NewItem {
    fn from(valid: ValidItem) -> Self {
        Self {
            title: valid.title,
            is_complete: valid.is_complete,
            category_id: valid.category_id,
        }
    }
}

impl ItemForm {
    /// Pre-fill an edit form from a stored item
    pub fn from_item(item: &Item) -> Self {
        Self {
            id: Some(item.id.to_string()),
            title: item.title.clone(),
            is_complete: item.is_complete.then(|| "true".to_string()),
            category_id: Some(item.category_id.to_string()),
            version: Some(item.version.to_string()),
            token: String::new(),
        }
    }

    pub fn body_id(&self) -> Option<u64> {
        self.id.as_deref().and_then(parse_id)
    }

    pub fn version(&self) -> Option<u64> {
        self.version.as_deref().and_then(parse_id)
    }

    pub fn is_checked(&self) -> bool {
        matches!(self.is_complete.as_deref(), Some("true") | Some("on"))
    }

    /// Selected category id, if the submitted value parses
    pub fn selected_category(&self) -> Option<u64> {
        self.category_id.as_deref().and_then(parse_id)
    }

    /// Validate field shapes; whether the category exists is checked by the caller
    pub fn validate(&self) -> Result<ValidItem, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let title = validate_title(&self.title, &mut errors);

        let category_id = match self.category_id.as_deref().map(str::trim) {
            None | Some("") => {
                errors.add("category_id", ERR_CATEGORY_REQUIRED);
                None
            }
            Some(raw) => {
                let parsed = parse_id(raw);
                if parsed.is_none() {
                    errors.add("category_id", ERR_CATEGORY_INVALID);
                }
                parsed
            }
        };

        match category_id {
            Some(category_id) if errors.is_empty() => Ok(ValidItem {
                title,
                is_complete: self.is_checked(),
                category_id,
            }),
            _ => Err(errors),
        }
    }
}

/// One entry of the category drop-down on item forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: u64,
    pub text: String,
    pub selected: bool,
}

/// Build the category selection list, marking `selected` if present
pub fn category_select_list(categories: &[Category], selected: Option<u64>) -> Vec<SelectOption> {
    categories
        .iter()
        .map(|c| SelectOption {
            value: c.id,
            text: c.title.clone(),
            selected: Some(c.id) == selected,
        })
        .collect()
}
