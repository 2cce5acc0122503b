//! Trigger matching.
//!
//! Level-triggered: a trigger whose condition holds fires on every tick, with
//! no memory of earlier matches. Pure, no I/O.

use crate::model::Trigger;

/// Returns the triggers that fire at `consumer_price`, in input order.
pub fn match_triggers(consumer_price: f64, triggers: &[Trigger]) -> Vec<Trigger> {
    triggers
        .iter()
        .filter(|t| t.fires_at(consumer_price))
        .cloned()
        .collect()
}
