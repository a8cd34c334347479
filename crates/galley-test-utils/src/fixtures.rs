//! Scripted action sequences for the reference kitchen.
//!
//! - [`tomato_delivery`]: picks, slices and delivers one tomato (19 ticks).
//! - [`pace`]: walks back and forth between the floor and the potato bin.
//! - [`idle_at_stove`]: fails to interact at an empty stove.

use galley_core::NodeId;
use galley_engine::Action;

/// Deliver one sliced tomato starting from the floor.
///
/// Pickup at the tomato bin, place on the cutting board, walk a loop
/// through the service window and stove while the 8-tick slice runs,
/// retrieve, then deliver. Ends at tick 19 with the agent at node 5.
pub fn tomato_delivery() -> Vec<Action> {
    let mut actions = vec![
        Action::Move(NodeId(2)),
        Action::Interact,
        Action::Move(NodeId(4)),
        Action::Interact,
    ];
    actions.extend([5, 3, 5, 4].map(|n| Action::Move(NodeId(n))));
    actions.extend([Action::Interact, Action::Move(NodeId(5)), Action::Interact]);
    actions
}

/// `steps` moves alternating between the potato bin and the floor,
/// starting with the bin. Each move costs 2 ticks.
pub fn pace(steps: usize) -> Vec<Action> {
    (0..steps)
        .map(|i| Action::Move(NodeId(if i % 2 == 0 { 1 } else { 0 })))
        .collect()
}

/// Walk to the stove and interact `times` times with nothing in hand.
pub fn idle_at_stove(times: usize) -> Vec<Action> {
    std::iter::once(Action::Move(NodeId(3)))
        .chain(std::iter::repeat_n(Action::Interact, times))
        .collect()
}
