//! Model Pricing - Unit prices per model
//!
//! Prices are quoted in USD per 1M tokens. Lookups are total: a model
//! missing from the table is priced with the table's default row.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Constants
// ============================================================================

/// Average USD to EUR conversion rate
pub const USD_TO_EUR: f64 = 0.92;

/// Model whose price is used for unknown models
pub const DEFAULT_PRICE_MODEL: &str = "gemini-2.0-flash";

/// Gemini 2.0 Flash input cost per 1M tokens
pub const GEMINI_20_FLASH_INPUT_COST: f64 = 0.35;
/// Gemini 2.0 Flash output cost per 1M tokens
pub const GEMINI_20_FLASH_OUTPUT_COST: f64 = 1.50;
/// Gemini 1.5 Flash input cost per 1M tokens
pub const GEMINI_15_FLASH_INPUT_COST: f64 = 0.15;
/// Gemini 1.5 Flash output cost per 1M tokens
pub const GEMINI_15_FLASH_OUTPUT_COST: f64 = 0.60;
/// Gemini 1.5 Pro input cost per 1M tokens
pub const GEMINI_15_PRO_INPUT_COST: f64 = 1.25;
/// Gemini 1.5 Pro output cost per 1M tokens
pub const GEMINI_15_PRO_OUTPUT_COST: f64 = 5.00;

// ============================================================================
// Price Models
// ============================================================================

/// Price of one model (per 1M tokens, base currency)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitPrice {
    /// Cost per 1M input tokens
    #[serde(alias = "input")]
    pub input_price_per_million: f64,
    /// Cost per 1M output tokens
    #[serde(alias = "output")]
    pub output_price_per_million: f64,
}

impl UnitPrice {
    /// Create a price row
    #[must_use]
    pub const fn new(input_price_per_million: f64, output_price_per_million: f64) -> Self {
        Self {
            input_price_per_million,
            output_price_per_million,
        }
    }

    /// Calculate cost for given token counts
    #[must_use]
    pub fn calculate_cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        let input_cost = (input_tokens as f64 / 1_000_000.0) * self.input_price_per_million;
        let output_cost = (output_tokens as f64 / 1_000_000.0) * self.output_price_per_million;
        input_cost + output_cost
    }
}

/// Result of a price lookup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceLookup {
    /// Price used
    pub price: UnitPrice,
    /// The model was unknown and the default row was used
    pub fallback: bool,
}

/// Per-model price table with a default row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTable {
    /// Price for models not listed in `models`
    #[serde(default = "default_row")]
    pub default: UnitPrice,
    /// Known models
    #[serde(default)]
    pub models: HashMap<String, UnitPrice>,
}

impl Default for PriceTable {
    fn default() -> Self {
        default_pricing()
    }
}

fn default_row() -> UnitPrice {
    UnitPrice::new(GEMINI_20_FLASH_INPUT_COST, GEMINI_20_FLASH_OUTPUT_COST)
}

impl PriceTable {
    /// Empty table that prices everything with `default`
    #[must_use]
    pub fn new(default: UnitPrice) -> Self {
        Self {
            default,
            models: HashMap::new(),
        }
    }

    /// Add or replace the price of a model
    #[must_use]
    pub fn with_price(mut self, model: impl Into<String>, price: UnitPrice) -> Self {
        self.models.insert(model.into(), price);
        self
    }

    /// Price of a model, if listed
    #[must_use]
    pub fn get(&self, model: &str) -> Option<&UnitPrice> {
        self.models.get(model)
    }

    /// Price of a model, falling back to the default row
    #[must_use]
    pub fn lookup(&self, model: &str) -> PriceLookup {
        match self.models.get(model) {
            Some(price) => PriceLookup {
                price: *price,
                fallback: false,
            },
            None => PriceLookup {
                price: self.default,
                fallback: true,
            },
        }
    }
}

/// Default pricing for the Gemini models
#[must_use]
pub fn default_pricing() -> PriceTable {
    let flash_20 = UnitPrice::new(GEMINI_20_FLASH_INPUT_COST, GEMINI_20_FLASH_OUTPUT_COST);

    PriceTable::new(default_row())
        .with_price(DEFAULT_PRICE_MODEL, flash_20)
        .with_price("gemini-2.0-flash-exp", flash_20)
        .with_price(
            "gemini-1.5-flash",
            UnitPrice::new(GEMINI_15_FLASH_INPUT_COST, GEMINI_15_FLASH_OUTPUT_COST),
        )
        .with_price(
            "gemini-1.5-pro",
            UnitPrice::new(GEMINI_15_PRO_INPUT_COST, GEMINI_15_PRO_OUTPUT_COST),
        )
}
