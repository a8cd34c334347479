//! Items carried by the agent or held by stations.

use serde::{Deserialize, Serialize};

use crate::id::{ItemTypeId, ItemUid};

/// A single physical ingredient or dish.
///
/// An item is owned by exactly one container at a time: the agent's
/// inventory or one station's `held_item` slot. Its `type_id` changes
/// only when a process station finishes transforming it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    /// Ingredient or dish identity.
    pub type_id: ItemTypeId,
    /// Unique per-episode identity.
    pub uid: ItemUid,
    /// Global tick at which the item was created.
    #[serde(default)]
    pub created_at: u64,
}

impl Item {
    /// Create an item.
    pub fn new(type_id: ItemTypeId, uid: ItemUid, created_at: u64) -> Self {
        Self {
            type_id,
            uid,
            created_at,
        }
    }
}
