use crate::interactable::InteractableEntity;
use crate::inventory::{Inventory, InventoryError, ItemInstance};

pub const PLAYER_IDENT: &str = "player";

/// An interactable body that can carry items.
#[derive(Debug, Default)]
pub struct CharacterEntity {
    body: InteractableEntity,
    inventory: Inventory,
}

impl CharacterEntity {
    pub fn new(body: InteractableEntity) -> Self {
        Self {
            body,
            inventory: Inventory::default(),
        }
    }

    pub fn body(&self) -> &InteractableEntity {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut InteractableEntity {
        &mut self.body
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn give(&mut self, item: ItemInstance) -> Result<(), InventoryError> {
        let (item_name, qty) = (item.name().to_string(), item.qty);
        self.inventory.add_item(item)?;
        log::info!("{} picked up {item_name} x{qty}", self.body.base().name());
        Ok(())
    }

    pub fn take(&mut self, uid: u64) -> Option<ItemInstance> {
        self.inventory.remove_item(uid)
    }
}
