use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which side of the threshold a subscriber cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Fires once the price has fallen to the threshold or below.
    LessThan,
    /// Fires once the price has risen to the threshold or above.
    MoreThan,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::LessThan => "less_than",
            Direction::MoreThan => "more_than",
        }
    }

    /// Both comparisons are inclusive: a price equal to the threshold fires
    /// in either direction.
    pub fn is_satisfied(&self, threshold: f64, price: f64) -> bool {
        match self {
            Direction::LessThan => threshold >= price,
            Direction::MoreThan => threshold <= price,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDirection(pub String);

impl fmt::Display for UnknownDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown price direction: {:?}", self.0)
    }
}

impl std::error::Error for UnknownDirection {}

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "less_than" => Ok(Direction::LessThan),
            "more_than" => Ok(Direction::MoreThan),
            other => Err(UnknownDirection(other.to_string())),
        }
    }
}

/// A stored subscription. Never mutated after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub identity: String,
    pub direction: Direction,
    /// ct/kWh, compared against the consumer price.
    pub threshold: f64,
}

impl Trigger {
    pub fn new(identity: impl Into<String>, direction: Direction, threshold: f64) -> Self {
        Self {
            identity: identity.into(),
            direction,
            threshold,
        }
    }

    pub fn fires_at(&self, consumer_price: f64) -> bool {
        self.direction.is_satisfied(self.threshold, consumer_price)
    }
}

/// Append-only record that a trigger matched during a tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    /// Identity of the trigger that fired. The trigger may be gone by now.
    pub identity: String,
    pub triggered_at_ms: u64,
}

/// One tick's price, discarded once the tick completes.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceQuote {
    /// Feed units (EUR/MWh).
    pub raw_market_price: f64,
    /// ct/kWh including surcharges and tax.
    pub computed_price: f64,
    pub observed_at_ms: u64,
}
