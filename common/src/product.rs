use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::supply::{Grade, MilletType, SupplyId};

/// Unique product identifier (server-assigned, opaque).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProductId(pub String);

/// A market listing. Created once by the aggregator, from a completed supply
/// or from manual input, and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub millet_type: MilletType,
    pub quantity_kg: Decimal,
    pub price_per_kg: Decimal,
    pub grade: Grade,
    pub packaging_date: NaiveDate,
    #[serde(default)]
    pub description: String,
    /// Completed supply this listing was derived from, if any.
    #[serde(default)]
    pub source_supply: Option<SupplyId>,
    /// Public lookup code for the provenance journey (supply-derived
    /// listings only).
    #[serde(default)]
    pub traceability_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Generate a traceability code, e.g. "MND-2024-0001".
pub fn generate_traceability_code(year: i32, sequence: u64) -> String {
    format!("MND-{year}-{sequence:04}")
}
