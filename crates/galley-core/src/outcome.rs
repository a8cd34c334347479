//! Stable outcome codes for agent actions.
//!
//! Outcome codes are a first-class contract: reward shaping, the episode
//! recorder and offline analysis all key off the rendered string, so the
//! text of each code must not change. Every code round-trips through
//! [`Display`](std::fmt::Display) and [`FromStr`].
//!
//! | Outcome | Code |
//! |---------|------|
//! | `Pickup` | `Pickup_<item_type>` |
//! | `Retrieve` | `Retrieve_Processed` |
//! | `Place` | `Place_<inventory_index>_<output>_<duration>` |
//! | `Deliver` | `Deliver_<inventory_index>_<order_id>` |
//! | `InventoryFull` | `Inventory Full` |
//! | `NoValidRecipeItem` | `No Valid Recipe Item` |
//! | `StationBusy` | `Station Busy` |
//! | `WrongItem` | `Wrong Item` |
//! | `NothingToInteract` | `Nothing to interact with` |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseOutcomeError;
use crate::id::{ItemTypeId, NodeId, OrderId};

/// What an interaction attempt did, or why it failed.
///
/// Success variants carry every field the engine needs to apply the
/// mutation, so the legality check and the mutation can never disagree.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum InteractionOutcome {
    /// Take a fresh item of `item_type` from a Source station.
    Pickup {
        /// Type dispensed by the source.
        item_type: ItemTypeId,
    },
    /// Take the finished item off a Process station.
    Retrieve,
    /// Put an inventory item onto an empty Process station.
    Place {
        /// Position of the item in the inventory.
        inventory_index: usize,
        /// Type the item becomes when processing finishes.
        output: ItemTypeId,
        /// Processing time in ticks.
        duration: u32,
    },
    /// Hand an inventory item in against an active order.
    Deliver {
        /// Position of the item in the inventory.
        inventory_index: usize,
        /// Order satisfied by the item.
        order_id: OrderId,
    },
    /// No room in the inventory.
    InventoryFull,
    /// Nothing in the inventory matches a recipe at this station.
    NoValidRecipeItem,
    /// The station is still processing.
    StationBusy,
    /// Nothing in the inventory matches an active order.
    WrongItem,
    /// The station has no interaction (floor).
    NothingToInteract,
}

impl InteractionOutcome {
    /// Whether the interaction changed world state.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Pickup { .. } | Self::Retrieve | Self::Place { .. } | Self::Deliver { .. }
        )
    }

    /// Render the stable code string.
    pub fn code(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for InteractionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pickup { item_type } => write!(f, "Pickup_{item_type}"),
            Self::Retrieve => f.write_str("Retrieve_Processed"),
            Self::Place {
                inventory_index,
                output,
                duration,
            } => write!(f, "Place_{inventory_index}_{output}_{duration}"),
            Self::Deliver {
                inventory_index,
                order_id,
            } => write!(f, "Deliver_{inventory_index}_{order_id}"),
            Self::InventoryFull => f.write_str("Inventory Full"),
            Self::NoValidRecipeItem => f.write_str("No Valid Recipe Item"),
            Self::StationBusy => f.write_str("Station Busy"),
            Self::WrongItem => f.write_str("Wrong Item"),
            Self::NothingToInteract => f.write_str("Nothing to interact with"),
        }
    }
}

fn parse_field<T: FromStr>(code: &str, part: Option<&str>) -> Result<T, ParseOutcomeError> {
    part.and_then(|p| p.parse().ok())
        .ok_or_else(|| ParseOutcomeError::Malformed {
            code: code.to_string(),
        })
}

impl FromStr for InteractionOutcome {
    type Err = ParseOutcomeError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code {
            "Retrieve_Processed" => return Ok(Self::Retrieve),
            "Inventory Full" => return Ok(Self::InventoryFull),
            "No Valid Recipe Item" => return Ok(Self::NoValidRecipeItem),
            "Station Busy" => return Ok(Self::StationBusy),
            "Wrong Item" => return Ok(Self::WrongItem),
            "Nothing to interact with" => return Ok(Self::NothingToInteract),
            _ => {}
        }

        let mut parts = code.split('_');
        let head = parts.next().unwrap_or_default();
        let outcome = match head {
            "Pickup" => Self::Pickup {
                item_type: ItemTypeId(parse_field(code, parts.next())?),
            },
            "Place" => Self::Place {
                inventory_index: parse_field(code, parts.next())?,
                output: ItemTypeId(parse_field(code, parts.next())?),
                duration: parse_field(code, parts.next())?,
            },
            "Deliver" => Self::Deliver {
                inventory_index: parse_field(code, parts.next())?,
                order_id: OrderId(parse_field(code, parts.next())?),
            },
            _ => {
                return Err(ParseOutcomeError::Unrecognised {
                    code: code.to_string(),
                })
            }
        };
        if parts.next().is_some() {
            return Err(ParseOutcomeError::Malformed {
                code: code.to_string(),
            });
        }
        Ok(outcome)
    }
}

impl From<InteractionOutcome> for String {
    fn from(outcome: InteractionOutcome) -> Self {
        outcome.to_string()
    }
}

impl TryFrom<String> for InteractionOutcome {
    type Error = ParseOutcomeError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        code.parse()
    }
}

/// Result of a move action. Moves never fail; illegality shows up only
/// in the time cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MoveOutcome {
    /// Node the agent left.
    pub from: NodeId,
    /// Node the agent arrived at.
    pub to: NodeId,
}

impl fmt::Display for MoveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move_{}_to_{}", self.from, self.to)
    }
}

impl FromStr for MoveOutcome {
    type Err = ParseOutcomeError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let malformed = || ParseOutcomeError::Malformed {
            code: code.to_string(),
        };
        let rest = code
            .strip_prefix("Move_")
            .ok_or_else(|| ParseOutcomeError::Unrecognised {
                code: code.to_string(),
            })?;
        let (from, to) = rest.split_once("_to_").ok_or_else(malformed)?;
        Ok(Self {
            from: NodeId(from.parse().map_err(|_| malformed())?),
            to: NodeId(to.parse().map_err(|_| malformed())?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_contract() {
        assert_eq!(
            InteractionOutcome::Pickup {
                item_type: ItemTypeId(1)
            }
            .code(),
            "Pickup_1"
        );
        assert_eq!(InteractionOutcome::Retrieve.code(), "Retrieve_Processed");
        assert_eq!(
            InteractionOutcome::Place {
                inventory_index: 0,
                output: ItemTypeId(2),
                duration: 15
            }
            .code(),
            "Place_0_2_15"
        );
        assert_eq!(
            InteractionOutcome::Deliver {
                inventory_index: 1,
                order_id: OrderId(7)
            }
            .code(),
            "Deliver_1_7"
        );
        assert_eq!(InteractionOutcome::WrongItem.code(), "Wrong Item");
        assert_eq!(
            InteractionOutcome::NothingToInteract.code(),
            "Nothing to interact with"
        );
    }

    #[test]
    fn every_variant_parses_back() {
        let all = [
            InteractionOutcome::Pickup {
                item_type: ItemTypeId(3),
            },
            InteractionOutcome::Retrieve,
            InteractionOutcome::Place {
                inventory_index: 1,
                output: ItemTypeId(4),
                duration: 8,
            },
            InteractionOutcome::Deliver {
                inventory_index: 0,
                order_id: OrderId(12),
            },
            InteractionOutcome::InventoryFull,
            InteractionOutcome::NoValidRecipeItem,
            InteractionOutcome::StationBusy,
            InteractionOutcome::WrongItem,
            InteractionOutcome::NothingToInteract,
        ];
        for outcome in all {
            let parsed: InteractionOutcome = outcome.code().parse().unwrap();
            assert_eq!(parsed, outcome);
        }
    }

    #[test]
    fn success_classification() {
        assert!(InteractionOutcome::Retrieve.is_success());
        assert!(!InteractionOutcome::StationBusy.is_success());
        assert!(!InteractionOutcome::InventoryFull.is_success());
    }

    #[test]
    fn malformed_codes_are_rejected() {
        assert!(matches!(
            "Place_0_2".parse::<InteractionOutcome>(),
            Err(ParseOutcomeError::Malformed { .. })
        ));
        assert!(matches!(
            "Deliver_0_1_9".parse::<InteractionOutcome>(),
            Err(ParseOutcomeError::Malformed { .. })
        ));
        assert!(matches!(
            "Juggle_3".parse::<InteractionOutcome>(),
            Err(ParseOutcomeError::Unrecognised { .. })
        ));
    }

    #[test]
    fn outcome_serializes_as_code_string() {
        let json = serde_json::to_string(&InteractionOutcome::StationBusy).unwrap();
        assert_eq!(json, "\"Station Busy\"");
        let back: InteractionOutcome = serde_json::from_str("\"Pickup_3\"").unwrap();
        assert_eq!(
            back,
            InteractionOutcome::Pickup {
                item_type: ItemTypeId(3)
            }
        );
    }

    #[test]
    fn move_code_round_trips() {
        let mv = MoveOutcome {
            from: NodeId(0),
            to: NodeId(4),
        };
        assert_eq!(mv.to_string(), "Move_0_to_4");
        assert_eq!("Move_0_to_4".parse::<MoveOutcome>().unwrap(), mv);
        assert!("Move_x_to_4".parse::<MoveOutcome>().is_err());
        assert!("Pickup_1".parse::<MoveOutcome>().is_err());
    }
}
