//! Kitchen configuration, loading, validation, and error types.
//!
//! [`KitchenConfig`] describes the station graph, the recipe book and the
//! simulation constants. It is read from TOML or JSON (detected from the
//! file extension) and checked by [`validate()`](KitchenConfig::validate)
//! once at startup. Every configuration error is fatal: no world is ever
//! built from a config that fails validation.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use galley_core::{ItemTypeId, NodeId, StationKind};
use galley_nav::{Edge, NavError, NavigationGraph};
use serde::{Deserialize, Serialize};

// ── Errors ────────────────────────────────────────────────────────

/// Errors detected while loading or validating a [`KitchenConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file extension is not `.toml` or `.json`.
    #[error("unsupported config format: {path}")]
    UnsupportedFormat {
        /// The offending path.
        path: PathBuf,
    },
    /// The file content did not deserialize.
    #[error("parse error in {path}: {detail}")]
    Parse {
        /// File that failed, or `<inline>` for string input.
        path: PathBuf,
        /// Deserializer message.
        detail: String,
    },
    /// The station graph is malformed.
    #[error("invalid graph: {0}")]
    Graph(#[from] NavError),
    /// `start_node` is not one of the configured nodes.
    #[error("start node {node} is not in the graph")]
    UnknownStartNode {
        /// The configured start node.
        node: NodeId,
    },
    /// A Source station has no `item_id`.
    #[error("source station {node} has no item_id")]
    SourceWithoutItem {
        /// The offending node.
        node: NodeId,
    },
    /// A recipe names a station that does not exist.
    #[error("recipe for item {input} names unknown station '{station}'")]
    UnknownRecipeStation {
        /// Recipe input type.
        input: ItemTypeId,
        /// The unknown station name.
        station: String,
    },
    /// A recipe names a station that is not a Process station.
    #[error("recipe for item {input} names '{station}', which is not a process station")]
    RecipeStationNotProcess {
        /// Recipe input type.
        input: ItemTypeId,
        /// The station name.
        station: String,
    },
    /// Two recipes share the same (input, station) key.
    #[error("duplicate recipe for item {input} at '{station}'")]
    DuplicateRecipe {
        /// Recipe input type.
        input: ItemTypeId,
        /// The station name.
        station: String,
    },
    /// A recipe takes zero ticks.
    #[error("recipe for item {input} at '{station}' has zero duration")]
    ZeroRecipeDuration {
        /// Recipe input type.
        input: ItemTypeId,
        /// The station name.
        station: String,
    },
    /// A simulation constant that must be positive is zero.
    #[error("simulation.{name} must be greater than zero")]
    ZeroConstant {
        /// Name of the constant.
        name: &'static str,
    },
    /// The order spawn probability is not in `[0, 1]`.
    #[error("order_spawn_probability {value} is outside [0, 1]")]
    SpawnProbability {
        /// The configured value.
        value: f64,
    },
    /// Neither `order_menu` nor the recipe book yields anything to order.
    #[error("order menu is empty and no recipe produces an orderable item")]
    EmptyOrderMenu,
    /// A station cannot be reached from the start node.
    #[error("station {node} is unreachable from start node {start}")]
    UnreachableStation {
        /// The stranded station.
        node: NodeId,
        /// The configured start node.
        start: NodeId,
    },
}

// ── Schema ────────────────────────────────────────────────────────

/// One station node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDef {
    /// Node id. Ids must be dense from zero.
    pub id: NodeId,
    /// Station kind.
    #[serde(alias = "type")]
    pub kind: StationKind,
    /// Display name; process recipes are keyed by it.
    pub name: String,
    /// Item dispensed by a Source station.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<ItemTypeId>,
}

/// An undirected edge, written `[u, v, weight]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDef(pub NodeId, pub NodeId, pub u32);

impl From<EdgeDef> for Edge {
    fn from(EdgeDef(a, b, weight): EdgeDef) -> Self {
        Edge { a, b, weight }
    }
}

/// The station graph section.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDef {
    /// Stations, one per node.
    pub nodes: Vec<NodeDef>,
    /// Undirected weighted edges.
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
}

/// A process-station transform.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDef {
    /// Item type consumed.
    pub input: ItemTypeId,
    /// Name of the process station that performs it.
    pub station: String,
    /// Item type produced.
    pub output: ItemTypeId,
    /// Processing time in ticks.
    #[serde(alias = "time")]
    pub duration: u32,
}

/// Simulation constants. Every field has a default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConstants {
    /// Inventory capacity. Default: 2.
    pub max_inventory: usize,
    /// Maximum concurrent orders. Default: 3.
    pub max_orders: usize,
    /// Order time-to-live in ticks. Default: 60.
    pub order_ttl: u32,
    /// Clock value at which an episode is truncated. Default: 1000.
    pub max_steps: u64,
    /// Per-tick probability of a new order while below capacity. Default: 0.02.
    pub order_spawn_probability: f64,
    /// Time charged for moving to a non-adjacent node. Default: 100.
    pub non_adjacent_move_cost: u32,
    /// Where the agent starts each episode. Default: node 0.
    pub start_node: NodeId,
    /// Seed for the default order RNG. Default: 0.
    pub seed: u64,
    /// Item types orders are drawn from. Empty means every recipe output.
    pub order_menu: Vec<ItemTypeId>,
    /// Deliveries after which an episode terminates. `None` never terminates.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_deliveries: Option<u32>,
}

impl Default for SimConstants {
    fn default() -> Self {
        Self {
            max_inventory: 2,
            max_orders: 3,
            order_ttl: 60,
            max_steps: 1000,
            order_spawn_probability: 0.02,
            non_adjacent_move_cost: galley_nav::DEFAULT_NON_ADJACENT_COST,
            start_node: NodeId(0),
            seed: 0,
            order_menu: Vec::new(),
            target_deliveries: None,
        }
    }
}

/// Complete kitchen description.
///
/// # Examples
///
/// ```
/// use galley_core::ItemTypeId;
/// use galley_engine::KitchenConfig;
///
/// let cfg = KitchenConfig::from_toml_str(r#"
///     [graph]
///     nodes = [
///         { id = 0, kind = "floor", name = "Floor" },
///         { id = 1, kind = "source", name = "Bin", item_id = 1 },
///         { id = 2, kind = "process", name = "Stove" },
///         { id = 3, kind = "delivery", name = "Window" },
///     ]
///     edges = [[0, 1, 2], [0, 2, 3], [2, 3, 1]]
///
///     [[recipes]]
///     input = 1
///     station = "Stove"
///     output = 2
///     duration = 5
/// "#).unwrap();
///
/// assert_eq!(cfg.simulation.max_inventory, 2);
/// assert_eq!(cfg.order_menu(), vec![ItemTypeId(2)]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KitchenConfig {
    /// Station graph.
    pub graph: GraphDef,
    /// Recipe book.
    #[serde(default)]
    pub recipes: Vec<RecipeDef>,
    /// Simulation constants.
    #[serde(default)]
    pub simulation: SimConstants,
}

// ── Loading ───────────────────────────────────────────────────────

/// Supported config file formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// `.toml`
    Toml,
    /// `.json`
    Json,
}

/// Detect the config format from a file extension.
pub fn detect_format(path: &Path) -> Result<Format, ConfigError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

impl KitchenConfig {
    /// Read, parse and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, has an
    /// unsupported extension, does not parse, or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = detect_format(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = match format {
            Format::Toml => toml::from_str::<Self>(&content).map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str::<Self>(&content).map_err(|e| e.to_string()),
        };
        let config = parsed.map_err(|detail| ConfigError::Parse {
            path: path.to_path_buf(),
            detail,
        })?;
        config.validate()?;
        tracing::debug!(
            path = %path.display(),
            nodes = config.graph.nodes.len(),
            recipes = config.recipes.len(),
            "loaded kitchen config"
        );
        Ok(config)
    }

    /// Parse a TOML document without validating it.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            detail: e.to_string(),
        })
    }

    /// Parse a JSON document without validating it.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(|e| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            detail: e.to_string(),
        })
    }

    // ── Validation ────────────────────────────────────────────────

    /// Check every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_and_build().map(|_| ())
    }

    /// Validate and return the navigation graph built along the way, so
    /// shortest paths are only computed once per world.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate_and_build(&self) -> Result<NavigationGraph, ConfigError> {
        self.check_constants()?;
        // 3. Graph structure: ids, edges, weights, path lengths.
        let graph = self.build_graph()?;
        self.check_against(&graph)?;
        Ok(graph)
    }

    /// Validate against a graph that was built elsewhere.
    pub(crate) fn validate_with_graph(&self, graph: &NavigationGraph) -> Result<(), ConfigError> {
        self.check_constants()?;
        self.check_against(graph)
    }

    /// Steps 1-2: scalar settings.
    fn check_constants(&self) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        // 1. Positive constants.
        for (name, value) in [
            ("max_inventory", sim.max_inventory as u64),
            ("max_orders", sim.max_orders as u64),
            ("order_ttl", u64::from(sim.order_ttl)),
            ("max_steps", sim.max_steps),
            ("non_adjacent_move_cost", u64::from(sim.non_adjacent_move_cost)),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroConstant { name });
            }
        }
        // 2. Spawn probability is a probability.
        if !(0.0..=1.0).contains(&sim.order_spawn_probability) {
            return Err(ConfigError::SpawnProbability {
                value: sim.order_spawn_probability,
            });
        }
        Ok(())
    }

    /// Steps 4-8: everything that depends on a built graph.
    fn check_against(&self, graph: &NavigationGraph) -> Result<(), ConfigError> {
        let sim = &self.simulation;
        // 4. Start node exists.
        if sim.start_node.index() >= graph.node_count() {
            return Err(ConfigError::UnknownStartNode {
                node: sim.start_node,
            });
        }
        // 5. Sources carry an item.
        for node in &self.graph.nodes {
            if node.kind == StationKind::Source && node.item_id.is_none() {
                return Err(ConfigError::SourceWithoutItem { node: node.id });
            }
        }
        // 6. Recipes point at process stations, once per key, with positive time.
        let mut keys = BTreeSet::new();
        for recipe in &self.recipes {
            let mut named = self
                .graph
                .nodes
                .iter()
                .filter(|n| n.name == recipe.station)
                .peekable();
            if named.peek().is_none() {
                return Err(ConfigError::UnknownRecipeStation {
                    input: recipe.input,
                    station: recipe.station.clone(),
                });
            }
            if !named.any(|n| n.kind == StationKind::Process) {
                return Err(ConfigError::RecipeStationNotProcess {
                    input: recipe.input,
                    station: recipe.station.clone(),
                });
            }
            if !keys.insert((recipe.input, recipe.station.as_str())) {
                return Err(ConfigError::DuplicateRecipe {
                    input: recipe.input,
                    station: recipe.station.clone(),
                });
            }
            if recipe.duration == 0 {
                return Err(ConfigError::ZeroRecipeDuration {
                    input: recipe.input,
                    station: recipe.station.clone(),
                });
            }
        }
        // 7. Something to order.
        if self.order_menu().is_empty() {
            return Err(ConfigError::EmptyOrderMenu);
        }
        // 8. Every working station reachable from the start.
        let reachable = graph.reachable_from(sim.start_node);
        for node in &self.graph.nodes {
            if node.kind != StationKind::Floor && reachable.binary_search(&node.id).is_err() {
                return Err(ConfigError::UnreachableStation {
                    node: node.id,
                    start: sim.start_node,
                });
            }
        }
        Ok(())
    }

    /// Build the navigation graph described by this config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Graph`] if the node set or edge list is
    /// malformed.
    pub fn build_graph(&self) -> Result<NavigationGraph, ConfigError> {
        let graph = NavigationGraph::new(
            self.graph.nodes.iter().map(|n| n.id),
            self.graph.edges.iter().copied().map(Edge::from),
        )?;
        Ok(graph.with_non_adjacent_cost(self.simulation.non_adjacent_move_cost))
    }

    /// Item types orders are drawn from, in a stable order.
    ///
    /// The configured `order_menu` if non-empty; otherwise every distinct
    /// recipe output in ascending order.
    pub fn order_menu(&self) -> Vec<ItemTypeId> {
        if !self.simulation.order_menu.is_empty() {
            return self.simulation.order_menu.clone();
        }
        self.recipes
            .iter()
            .map(|r| r.output)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Number of station nodes, which is also the number of move actions.
    pub fn node_count(&self) -> usize {
        self.graph.nodes.len()
    }
}
