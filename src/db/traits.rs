use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Category, CategoryFilter, Item, ItemFilter, NewCategory, NewItem};

/// Data-store contract the category and item workflows depend on
///
/// Writes are atomic. `update_*` fail with `AppError::NotFound` when the record
/// is gone and `AppError::Conflict` when the supplied version is stale;
/// `insert_item`/`update_item` fail with `AppError::CategoryNotFound` for a
/// dangling category reference.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Check database connectivity and health.
    async fn check_health(&self) -> Result<()>;

    async fn list_categories(&self, filter: CategoryFilter) -> Result<Vec<Category>>;

    async fn get_category(&self, id: u64) -> Result<Option<Category>>;

    async fn insert_category(&self, new: NewCategory) -> Result<Category>;

    async fn update_category(&self, category: Category) -> Result<Category>;

    /// Returns false when the category did not exist.
    async fn delete_category(&self, id: u64) -> Result<bool>;

    async fn list_items(&self, join: bool, filter: ItemFilter) -> Result<Vec<Item>>;

    async fn get_item(&self, id: u64, join: bool) -> Result<Option<Item>>;

    async fn insert_item(&self, new: NewItem) -> Result<Item>;

    async fn update_item(&self, item: Item) -> Result<Item>;

    /// Returns false when the item did not exist.
    async fn delete_item(&self, id: u64) -> Result<bool>;

    async fn category_exists(&self, id: u64) -> Result<bool> {
        Ok(self.get_category(id).await?.is_some())
    }

    async fn item_exists(&self, id: u64) -> Result<bool> {
        Ok(self.get_item(id, false).await?.is_some())
    }
}
