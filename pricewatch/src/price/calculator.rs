//! Consumer price model.
//!
//! consumer = (raw / 10 + sum(surcharges)) * (1 + vat)
//!
//! The feed quotes EUR/MWh; dividing by 10 yields ct/kWh, the unit thresholds
//! are expressed in. No rounding happens here: matching compares against the
//! full-precision result.

use crate::model::PriceQuote;
use crate::price::types::MarketPoint;

/// Fixed additive surcharges (ct/kWh) and the proportional tax rate.
#[derive(Clone, Debug, PartialEq)]
pub struct Surcharges {
    pub energy_tax: f64,
    pub concession_levy: f64,
    pub offshore_grid_levy: f64,
    pub chp_levy: f64,
    pub grid_fee_levy: f64,
    pub network_charges: f64,
    /// 0.19 means 19 %.
    pub vat_rate: f64,
}

impl Surcharges {
    pub fn additive_total(&self) -> f64 {
        self.energy_tax
            + self.concession_levy
            + self.offshore_grid_levy
            + self.chp_levy
            + self.grid_fee_levy
            + self.network_charges
    }
}

impl Default for Surcharges {
    /// German household regime, 2021.
    fn default() -> Self {
        Self {
            energy_tax: 2.05,
            concession_levy: 1.99,
            offshore_grid_levy: 0.656,
            chp_levy: 0.275,
            grid_fee_levy: 0.403,
            network_charges: 5.12,
            vat_rate: 0.19,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PriceCalculator {
    surcharges: Surcharges,
}

impl PriceCalculator {
    pub fn new(surcharges: Surcharges) -> Self {
        Self { surcharges }
    }

    /// Converts a feed price (EUR/MWh) into the consumer price (ct/kWh).
    pub fn compute_consumer_price(&self, raw_price: f64) -> f64 {
        (raw_price / 10.0 + self.surcharges.additive_total()) * (1.0 + self.surcharges.vat_rate)
    }

    pub fn quote(&self, point: &MarketPoint) -> PriceQuote {
        PriceQuote {
            raw_market_price: point.marketprice,
            computed_price: self.compute_consumer_price(point.marketprice),
            observed_at_ms: point.start_timestamp,
        }
    }
}
