use async_trait::async_trait;
use chrono::Utc;
use redb::{ReadableDatabase, ReadableTable, Table, WriteTransaction};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;

use super::{tables, Db, TodoStore};
use crate::error::{AppError, Result};
use crate::models::{
    Category, CategoryFilter, CategoryRecord, Item, ItemFilter, ItemRecord, NewCategory, NewItem,
};

const BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

/// redb-backed [`TodoStore`]
///
/// Every operation runs one redb transaction on the blocking pool. Writes
/// commit as a unit; an early return drops the transaction, which aborts it.
/// Updates compare the caller's `version` against the stored one and fail
/// with [`AppError::Conflict`] when they differ.
#[derive(Clone)]
pub struct Store {
    db: Db,
}

impl Store {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TodoStore for Store {
    /// Verify the database can open a read transaction
    async fn check_health(&self) -> Result<()> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<()> {
            db.begin_read()?;
            Ok(())
        })
        .await?
    }

    // =========================================================================
    // Categories
    // =========================================================================

    /// List categories in id order
    async fn list_categories(&self, filter: CategoryFilter) -> Result<Vec<Category>> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<Category>> {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(tables::CATEGORIES)?;

            let mut categories = Vec::new();
            for entry in table.iter()? {
                let (id, bytes) = entry?;
                let category = Category::from_record(id.value(), decode(bytes.value())?);
                if filter.matches(&category) {
                    categories.push(category);
                }
            }
            Ok(categories)
        })
        .await?
    }

    async fn get_category(&self, id: u64) -> Result<Option<Category>> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<Category>> {
            let read_txn = db.begin_read()?;
            let table = read_txn.open_table(tables::CATEGORIES)?;
            load_category(&table, id)
        })
        .await?
    }

    async fn insert_category(&self, new: NewCategory) -> Result<Category> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<Category> {
            let write_txn = db.begin_write()?;
            let category = {
                let id = next_id(&write_txn, tables::CATEGORY_SEQUENCE)?;
                let now = Utc::now().timestamp();
                let record = CategoryRecord {
                    title: new.title,
                    owner_id: new.owner_id,
                    version: 1,
                    created_at: now,
                    updated_at: now,
                };

                let mut table = write_txn.open_table(tables::CATEGORIES)?;
                table.insert(id, encode(&record)?.as_slice())?;
                Category::from_record(id, record)
            };
            write_txn.commit()?;

            tracing::debug!("Inserted category {}", category.id);
            Ok(category)
        })
        .await?
    }

    /// Update title; the owner and creation time are kept from the stored record
    async fn update_category(&self, category: Category) -> Result<Category> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<Category> {
            let write_txn = db.begin_write()?;
            let updated = {
                let mut table = write_txn.open_table(tables::CATEGORIES)?;
                let stored: CategoryRecord =
                    load(&table, category.id)?.ok_or(AppError::NotFound)?;

                if stored.version != category.version {
                    return Err(AppError::Conflict);
                }

                let record = CategoryRecord {
                    title: category.title,
                    owner_id: stored.owner_id,
                    version: stored.version + 1,
                    created_at: stored.created_at,
                    updated_at: Utc::now().timestamp(),
                };
                table.insert(category.id, encode(&record)?.as_slice())?;
                Category::from_record(category.id, record)
            };
            write_txn.commit()?;

            Ok(updated)
        })
        .await?
    }

    /// Delete a category and every item filed under it
    ///
    /// Returns false when the category did not exist.
    async fn delete_category(&self, id: u64) -> Result<bool> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            let write_txn = db.begin_write()?;
            {
                let mut categories = write_txn.open_table(tables::CATEGORIES)?;
                if categories.remove(id)?.is_none() {
                    return Ok(false);
                }

                let mut index = write_txn.open_table(tables::CATEGORY_ITEMS)?;
                let item_ids: Vec<u64> = match index.remove(id)? {
                    Some(bytes) => decode(bytes.value())?,
                    None => Vec::new(),
                };

                let mut items = write_txn.open_table(tables::ITEMS)?;
                for item_id in &item_ids {
                    items.remove(*item_id)?;
                }

                tracing::debug!(
                    "Deleted category {} with {} item(s)",
                    id,
                    item_ids.len()
                );
            }
            write_txn.commit()?;

            Ok(true)
        })
        .await?
    }

    // =========================================================================
    // Items
    // =========================================================================

    /// List items in id order
    ///
    /// `join` attaches the owning category. An owner filter matches the owner
    /// of the referenced category, so it loads categories even without a join.
    async fn list_items(&self, join: bool, filter: ItemFilter) -> Result<Vec<Item>> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<Item>> {
            let read_txn = db.begin_read()?;
            let items_table = read_txn.open_table(tables::ITEMS)?;
            let categories = read_txn.open_table(tables::CATEGORIES)?;

            let needs_category = join || filter.owner_id.is_some();
            let mut joined: HashMap<u64, Option<Category>> = HashMap::new();
            let mut items = Vec::new();

            for entry in items_table.iter()? {
                let (id, bytes) = entry?;
                let mut item = Item::from_record(id.value(), decode(bytes.value())?);

                if filter.category_id.is_some_and(|c| c != item.category_id) {
                    continue;
                }

                if needs_category {
                    let category = match joined.get(&item.category_id) {
                        Some(category) => category.clone(),
                        None => {
                            let category = load_category(&categories, item.category_id)?;
                            joined.insert(item.category_id, category.clone());
                            category
                        }
                    };

                    if let Some(owner) = filter.owner_id.as_deref() {
                        if !category.as_ref().is_some_and(|c| c.is_owned_by(owner)) {
                            continue;
                        }
                    }

                    if join {
                        item.category = category;
                    }
                }

                items.push(item);
            }
            Ok(items)
        })
        .await?
    }

    async fn get_item(&self, id: u64, join: bool) -> Result<Option<Item>> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<Option<Item>> {
            let read_txn = db.begin_read()?;
            let items = read_txn.open_table(tables::ITEMS)?;

            let mut item = match load::<ItemRecord>(&items, id)? {
                Some(record) => Item::from_record(id, record),
                None => return Ok(None),
            };

            if join {
                let categories = read_txn.open_table(tables::CATEGORIES)?;
                item.category = load_category(&categories, item.category_id)?;
            }
            Ok(Some(item))
        })
        .await?
    }

    /// Insert an item; fails with `CategoryNotFound` for a dangling reference
    async fn insert_item(&self, new: NewItem) -> Result<Item> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<Item> {
            let write_txn = db.begin_write()?;
            let item = {
                ensure_category(&write_txn, new.category_id)?;

                let id = next_id(&write_txn, tables::ITEM_SEQUENCE)?;
                let now = Utc::now().timestamp();
                let record = ItemRecord {
                    title: new.title,
                    is_complete: new.is_complete,
                    category_id: new.category_id,
                    version: 1,
                    created_at: now,
                    updated_at: now,
                };

                let mut items = write_txn.open_table(tables::ITEMS)?;
                items.insert(id, encode(&record)?.as_slice())?;

                let mut index = write_txn.open_table(tables::CATEGORY_ITEMS)?;
                index_add(&mut index, record.category_id, id)?;

                Item::from_record(id, record)
            };
            write_txn.commit()?;

            tracing::debug!("Inserted item {}", item.id);
            Ok(item)
        })
        .await?
    }

    /// Update an item, moving it between categories if `category_id` changed
    async fn update_item(&self, item: Item) -> Result<Item> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<Item> {
            let write_txn = db.begin_write()?;
            let updated = {
                let mut items = write_txn.open_table(tables::ITEMS)?;
                let stored: ItemRecord = load(&items, item.id)?.ok_or(AppError::NotFound)?;

                if stored.version != item.version {
                    return Err(AppError::Conflict);
                }

                if stored.category_id != item.category_id {
                    ensure_category(&write_txn, item.category_id)?;

                    let mut index = write_txn.open_table(tables::CATEGORY_ITEMS)?;
                    index_remove(&mut index, stored.category_id, item.id)?;
                    index_add(&mut index, item.category_id, item.id)?;
                }

                let record = ItemRecord {
                    title: item.title,
                    is_complete: item.is_complete,
                    category_id: item.category_id,
                    version: stored.version + 1,
                    created_at: stored.created_at,
                    updated_at: Utc::now().timestamp(),
                };
                items.insert(item.id, encode(&record)?.as_slice())?;
                Item::from_record(item.id, record)
            };
            write_txn.commit()?;

            Ok(updated)
        })
        .await?
    }

    /// Delete an item; returns false when it did not exist
    async fn delete_item(&self, id: u64) -> Result<bool> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || -> Result<bool> {
            let write_txn = db.begin_write()?;
            {
                let mut items = write_txn.open_table(tables::ITEMS)?;
                let removed: ItemRecord = match items.remove(id)? {
                    Some(bytes) => decode(bytes.value())?,
                    None => return Ok(false),
                };

                let mut index = write_txn.open_table(tables::CATEGORY_ITEMS)?;
                index_remove(&mut index, removed.category_id, id)?;
            }
            write_txn.commit()?;

            Ok(true)
        })
        .await?
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(bincode::serde::encode_to_vec(value, BINCODE_CONFIG)?)
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, BINCODE_CONFIG)?;
    Ok(value)
}

fn load<T: DeserializeOwned>(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> Result<Option<T>> {
    table
        .get(id)?
        .map(|bytes| decode(bytes.value()))
        .transpose()
}

fn load_category(
    table: &impl ReadableTable<u64, &'static [u8]>,
    id: u64,
) -> Result<Option<Category>> {
    Ok(load(table, id)?.map(|record| Category::from_record(id, record)))
}

/// Fail with `CategoryNotFound` unless the category exists in this transaction
fn ensure_category(write_txn: &WriteTransaction, category_id: u64) -> Result<()> {
    let categories = write_txn.open_table(tables::CATEGORIES)?;
    if categories.get(category_id)?.is_none() {
        return Err(AppError::CategoryNotFound(category_id));
    }
    Ok(())
}

/// Advance a sequence and return the new id (ids start at 1)
fn next_id(write_txn: &WriteTransaction, sequence: &str) -> Result<u64> {
    let mut table = write_txn.open_table(tables::SEQUENCES)?;
    let next = table.get(sequence)?.map(|last| last.value()).unwrap_or(0) + 1;
    table.insert(sequence, next)?;
    Ok(next)
}

fn index_add(index: &mut Table<u64, &'static [u8]>, category_id: u64, item_id: u64) -> Result<()> {
    let mut ids: Vec<u64> = load(&*index, category_id)?.unwrap_or_default();
    if !ids.contains(&item_id) {
        ids.push(item_id);
        index.insert(category_id, encode(&ids)?.as_slice())?;
    }
    Ok(())
}

fn index_remove(
    index: &mut Table<u64, &'static [u8]>,
    category_id: u64,
    item_id: u64,
) -> Result<()> {
    let mut ids: Vec<u64> = load(&*index, category_id)?.unwrap_or_default();
    ids.retain(|id| *id != item_id);
    if ids.is_empty() {
        index.remove(category_id)?;
    } else {
        index.insert(category_id, encode(&ids)?.as_slice())?;
    }
    Ok(())
}
