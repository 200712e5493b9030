pub mod category;
pub mod item;
pub mod validation;

pub use category::{Category, CategoryFilter, CategoryForm, CategoryRecord, NewCategory};
pub use item::{
    category_select_list, Item, ItemFilter, ItemForm, ItemRecord, NewItem, SelectOption,
    ValidItem,
};
pub use validation::{FieldError, ValidationErrors};

/// Parse an identifier from a path segment or form field
///
/// Ids are non-negative 64-bit integers; anything else yields `None`,
/// which callers treat the same as an id that does not exist.
pub fn parse_id(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}
