use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

pub const DEFAULT_MAX_SLOTS: usize = 99;

static NEXT_UID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("inventory is full ({0} slots)")]
    Full(usize),
    #[error("quantity {qty} of '{item}' exceeds its maximum of {max}")]
    TooMany { item: String, qty: u32, max: u32 },
}

#[derive(Debug, Error)]
pub enum ItemLoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("duplicate item definition '{0}'")]
    Duplicate(String),
}

fn default_max_qty() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ItemDefinition {
    pub id: String,
    pub name: String,
    #[serde(default = "default_max_qty")]
    pub max_qty: u32,
    /// Frame drawn for the item in the world and in inventory slots.
    #[serde(default)]
    pub sprite: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemInstance {
    pub definition: ItemDefinition,
    pub qty: u32,
    pub uid: u64,
}

impl ItemInstance {
    pub fn from_definition(definition: &ItemDefinition, qty: u32) -> Self {
        Self {
            definition: definition.clone(),
            qty,
            uid: NEXT_UID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub fn name(&self) -> &str {
        &self.definition.name
    }
}

#[derive(Clone, Debug)]
pub struct Inventory {
    items: Vec<ItemInstance>,
    max_slots: usize,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::with_slots(DEFAULT_MAX_SLOTS)
    }
}

impl Inventory {
    pub fn with_slots(max_slots: usize) -> Self {
        Self {
            items: Vec::new(),
            max_slots,
        }
    }

    /// Whether `item` would be accepted by [`Inventory::add_item`].
    pub fn can_add(&self, item: &ItemInstance) -> Result<(), InventoryError> {
        if item.qty > item.definition.max_qty {
            return Err(InventoryError::TooMany {
                item: item.definition.id.clone(),
                qty: item.qty,
                max: item.definition.max_qty,
            });
        }
        if self.items.len() >= self.max_slots {
            return Err(InventoryError::Full(self.max_slots));
        }
        Ok(())
    }

    pub fn add_item(&mut self, item: ItemInstance) -> Result<(), InventoryError> {
        self.can_add(&item)?;
        self.items.push(item);
        Ok(())
    }

    pub fn remove_item(&mut self, uid: u64) -> Option<ItemInstance> {
        let pos = self.items.iter().position(|item| item.uid == uid)?;
        Some(self.items.remove(pos))
    }

    /// Slots are filled in pickup order.
    pub fn item_in_slot(&self, slot: usize) -> Option<&ItemInstance> {
        self.items.get(slot)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemInstance> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn max_slots(&self) -> usize {
        self.max_slots
    }
}

#[derive(Clone, Debug, Default)]
pub struct ItemDatabase {
    items: HashMap<String, ItemDefinition>,
}

impl ItemDatabase {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self, ItemLoadError> {
        let dir = dir.as_ref();
        let mut db = Self::empty();
        if !dir.exists() {
            log::warn!("item directory {} does not exist", dir.display());
            return Ok(db);
        }

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !is_yaml(&path) {
                continue;
            }
            let def: ItemDefinition = serde_yaml::from_str(&std::fs::read_to_string(&path)?)?;
            db.insert(def)?;
        }
        log::info!("loaded {} item definitions from {}", db.items.len(), dir.display());
        Ok(db)
    }

    pub fn insert(&mut self, def: ItemDefinition) -> Result<(), ItemLoadError> {
        if self.items.contains_key(&def.id) {
            return Err(ItemLoadError::Duplicate(def.id));
        }
        self.items.insert(def.id.clone(), def);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&ItemDefinition> {
        self.items.get(id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> ItemDefinition {
        ItemDefinition {
            id: "key".into(),
            name: "Rusty Key".into(),
            max_qty: 1,
            sprite: Some("key".into()),
        }
    }

    #[test]
    fn instances_get_unique_ids() {
        let a = ItemInstance::from_definition(&key(), 1);
        let b = ItemInstance::from_definition(&key(), 1);
        assert_ne!(a.uid, b.uid);
        assert_eq!(a.name(), "Rusty Key");
    }

    #[test]
    fn slots_follow_pickup_order() {
        let mut inventory = Inventory::default();
        let first = ItemInstance::from_definition(&key(), 1);
        let second = ItemInstance::from_definition(&key(), 1);
        let first_uid = first.uid;
        inventory.add_item(first).unwrap();
        inventory.add_item(second.clone()).unwrap();

        assert_eq!(inventory.item_in_slot(1), Some(&second));
        assert!(inventory.item_in_slot(2).is_none());

        assert!(inventory.remove_item(first_uid).is_some());
        assert!(inventory.remove_item(first_uid).is_none());
        assert_eq!(inventory.item_in_slot(0), Some(&second));
    }

    #[test]
    fn add_respects_limits() {
        let mut inventory = Inventory::with_slots(1);
        let err = inventory.add_item(ItemInstance::from_definition(&key(), 3)).unwrap_err();
        assert!(matches!(err, InventoryError::TooMany { qty: 3, max: 1, .. }));

        inventory.add_item(ItemInstance::from_definition(&key(), 1)).unwrap();
        let err = inventory.add_item(ItemInstance::from_definition(&key(), 1)).unwrap_err();
        assert!(matches!(err, InventoryError::Full(1)));
        assert_eq!(inventory.len(), 1);
        assert!(inventory.can_add(&ItemInstance::from_definition(&key(), 1)).is_err());
        assert!(Inventory::default().can_add(&ItemInstance::from_definition(&key(), 1)).is_ok());
    }

    #[test]
    fn definition_defaults() {
        let def: ItemDefinition = serde_yaml::from_str("id: coin\nname: Coin\n").unwrap();
        assert_eq!(def.max_qty, 1);
        assert_eq!(def.sprite, None);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut db = ItemDatabase::empty();
        db.insert(key()).unwrap();
        assert!(matches!(db.insert(key()), Err(ItemLoadError::Duplicate(id)) if id == "key"));
        assert_eq!(db.get("key").map(|d| d.max_qty), Some(1));
    }

    #[test]
    fn missing_directory_loads_empty() {
        let db = ItemDatabase::load_from("does/not/exist").unwrap();
        assert!(db.is_empty());
    }
}
