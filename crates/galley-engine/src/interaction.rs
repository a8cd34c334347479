//! Interaction rules, dispatched by station kind.
//!
//! Each [`StationKind`] maps to exactly one pure rule function through
//! [`InteractionManager::rule_for`]. Rules inspect an
//! [`InteractionContext`] and report what *would* happen; they never
//! mutate. The world applies a successful outcome afterwards, and the
//! same manager answers legality-only queries for action masking.

use galley_core::{InteractionOutcome, Item, ItemTypeId, Order, Station, StationKind, StationPhase};
use indexmap::IndexMap;

use crate::config::RecipeDef;

/// Recipes keyed by station name, then input item type.
#[derive(Clone, Debug, Default)]
pub struct RecipeBook {
    by_station: IndexMap<String, IndexMap<ItemTypeId, (ItemTypeId, u32)>>,
}

impl RecipeBook {
    /// Index a recipe list. Later duplicates are ignored; config
    /// validation rejects them before this point.
    pub fn new<'a>(recipes: impl IntoIterator<Item = &'a RecipeDef>) -> Self {
        let mut by_station: IndexMap<String, IndexMap<_, _>> = IndexMap::new();
        for r in recipes {
            by_station
                .entry(r.station.clone())
                .or_default()
                .entry(r.input)
                .or_insert((r.output, r.duration));
        }
        Self { by_station }
    }

    /// Output type and duration for `input` at the station called `station`.
    pub fn lookup(&self, input: ItemTypeId, station: &str) -> Option<(ItemTypeId, u32)> {
        self.by_station.get(station)?.get(&input).copied()
    }

    /// Number of recipes.
    pub fn len(&self) -> usize {
        self.by_station.values().map(IndexMap::len).sum()
    }

    /// Whether the book is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-only view handed to a rule.
#[derive(Clone, Copy, Debug)]
pub struct InteractionContext<'a> {
    /// Station the agent is standing on.
    pub station: &'a Station,
    /// Agent inventory in pickup order.
    pub inventory: &'a [Item],
    /// Active orders in insertion order.
    pub orders: &'a [Order],
    /// Recipe book.
    pub recipes: &'a RecipeBook,
    /// Inventory capacity.
    pub max_inventory: usize,
}

impl InteractionContext<'_> {
    fn has_room(&self) -> bool {
        self.inventory.len() < self.max_inventory
    }
}

/// What a rule decided.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionResult {
    /// Whether applying the outcome changes the world.
    pub success: bool,
    /// Structured outcome; renders as the stable code string.
    pub outcome: InteractionOutcome,
}

impl From<InteractionOutcome> for InteractionResult {
    fn from(outcome: InteractionOutcome) -> Self {
        Self {
            success: outcome.is_success(),
            outcome,
        }
    }
}

/// A pure interaction rule.
pub type Rule = fn(&InteractionContext<'_>) -> InteractionResult;

fn source_rule(ctx: &InteractionContext<'_>) -> InteractionResult {
    if !ctx.has_room() {
        return InteractionOutcome::InventoryFull.into();
    }
    match ctx.station.source_item {
        Some(item_type) => InteractionOutcome::Pickup { item_type }.into(),
        // Validated away at config load; treat as an inert station.
        None => InteractionOutcome::NothingToInteract.into(),
    }
}

fn process_rule(ctx: &InteractionContext<'_>) -> InteractionResult {
    match ctx.station.phase() {
        StationPhase::IdleHolding if ctx.has_room() => InteractionOutcome::Retrieve.into(),
        StationPhase::IdleHolding => InteractionOutcome::InventoryFull.into(),
        StationPhase::Busy => InteractionOutcome::StationBusy.into(),
        StationPhase::IdleEmpty => ctx
            .inventory
            .iter()
            .enumerate()
            .find_map(|(inventory_index, item)| {
                ctx.recipes
                    .lookup(item.type_id, &ctx.station.name)
                    .map(|(output, duration)| InteractionOutcome::Place {
                        inventory_index,
                        output,
                        duration,
                    })
            })
            .unwrap_or(InteractionOutcome::NoValidRecipeItem)
            .into(),
    }
}

fn delivery_rule(ctx: &InteractionContext<'_>) -> InteractionResult {
    ctx.inventory
        .iter()
        .enumerate()
        .find_map(|(inventory_index, item)| {
            ctx.orders
                .iter()
                .find(|o| o.item_type == item.type_id)
                .map(|o| InteractionOutcome::Deliver {
                    inventory_index,
                    order_id: o.order_id,
                })
        })
        .unwrap_or(InteractionOutcome::WrongItem)
        .into()
}

fn floor_rule(_: &InteractionContext<'_>) -> InteractionResult {
    InteractionOutcome::NothingToInteract.into()
}

/// Evaluates interactions against the recipe book.
#[derive(Clone, Debug)]
pub struct InteractionManager {
    recipes: RecipeBook,
    max_inventory: usize,
}

impl InteractionManager {
    /// Create a manager for the given recipes and inventory capacity.
    pub fn new(recipes: RecipeBook, max_inventory: usize) -> Self {
        Self {
            recipes,
            max_inventory,
        }
    }

    /// The rule for a station kind. The table is closed: every kind has
    /// exactly one rule and there is no fallthrough.
    pub fn rule_for(kind: StationKind) -> Rule {
        match kind {
            StationKind::Floor => floor_rule,
            StationKind::Source => source_rule,
            StationKind::Process => process_rule,
            StationKind::Delivery => delivery_rule,
        }
    }

    /// Decide what interacting with `station` would do.
    pub fn attempt(
        &self,
        station: &Station,
        inventory: &[Item],
        orders: &[Order],
    ) -> InteractionResult {
        let ctx = InteractionContext {
            station,
            inventory,
            orders,
            recipes: &self.recipes,
            max_inventory: self.max_inventory,
        };
        (Self::rule_for(station.kind))(&ctx)
    }

    /// The recipe book.
    pub fn recipes(&self) -> &RecipeBook {
        &self.recipes
    }

    /// Inventory capacity.
    pub fn max_inventory(&self) -> usize {
        self.max_inventory
    }
}
