use redb::TableDefinition;

/// Categories table: category id -> CategoryRecord (serialized)
pub const CATEGORIES: TableDefinition<u64, &[u8]> = TableDefinition::new("categories");

/// Items table: item id -> ItemRecord (serialized)
pub const ITEMS: TableDefinition<u64, &[u8]> = TableDefinition::new("items");

/// Category items index: category id -> Vec<item id>
/// Used for cascade delete when a category is removed
pub const CATEGORY_ITEMS: TableDefinition<u64, &[u8]> = TableDefinition::new("category_items");

/// Id sequences: sequence name -> last assigned id
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");

pub const CATEGORY_SEQUENCE: &str = "categories";
pub const ITEM_SEQUENCE: &str = "items";
