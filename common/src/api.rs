//! Transport-agnostic API contract: the uniform response envelope and the
//! request/response shapes for every marketplace operation. All field names
//! are camelCase on the wire.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::identity::{AggregatorId, ConsumerId, FarmerId};
use crate::journey::JourneyPoint;
use crate::order::{OrderId, OrderStatus};
use crate::payment::{PaymentId, PaymentMethod};
use crate::product::ProductId;
use crate::supply::{MilletType, Supply, SupplyId};

/// Uniform response envelope. `success = false` is the authoritative
/// failure signal regardless of any transport-level status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: Option<T>,
    pub errors: Option<BTreeMap<String, String>>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            errors: None,
        }
    }

    pub fn fail(message: impl Into<String>, errors: Option<BTreeMap<String, String>>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            errors,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplyRequest {
    pub farmer_id: FarmerId,
    pub farmer_name: String,
    pub millet_type: MilletType,
    pub quantity_kg: Decimal,
    pub harvest_date: NaiveDate,
    pub packaging_date: NaiveDate,
    pub location: String,
    #[serde(default)]
    pub farm_location: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplyResponse {
    pub supply_id: SupplyId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptSupplyRequest {
    pub aggregator_id: AggregatorId,
    pub aggregator_name: String,
    /// Must parse to one of A/B/C.
    pub quality_grade: String,
    pub collection_by: String,
    /// May be future-dated.
    pub collection_date: NaiveDate,
    /// Optimistic concurrency precondition; mismatch fails with Conflict.
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyActionRequest {
    pub aggregator_id: AggregatorId,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplySnapshot {
    pub version: u64,
    /// Farmer-facing label (pending / accepted / collected / completed).
    pub display_status: String,
    #[serde(flatten)]
    pub supply: Supply,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub farmer_id: FarmerId,
    pub amount: Decimal,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub supply_id: Option<SupplyId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentResponse {
    pub payment_id: PaymentId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(default)]
    pub supply_id: Option<SupplyId>,
    pub millet_type: MilletType,
    pub quantity_kg: Decimal,
    pub price_per_kg: Decimal,
    pub quality_grade: String,
    pub packaging_date: NaiveDate,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductResponse {
    pub product_id: ProductId,
    #[serde(default)]
    pub traceability_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity_kg: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub consumer_id: ConsumerId,
    pub consumer_name: String,
    pub address: String,
    pub contact: String,
    pub dropoff_location: String,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub order_id: OrderId,
    pub order_number: String,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceOrderRequest {
    pub aggregator_id: AggregatorId,
    /// Optional assertion of the expected next status. The engine computes
    /// the next step itself; a stale assertion fails with Conflict rather
    /// than skipping stages.
    #[serde(default)]
    pub next_status: Option<OrderStatus>,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOrderRequest {
    #[serde(default)]
    pub expected_version: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceabilityResponse {
    pub record: Supply,
    pub journey: Vec<JourneyPoint>,
}
