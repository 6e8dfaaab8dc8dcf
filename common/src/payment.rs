use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MarketError;
use crate::identity::FarmerId;
use crate::supply::{SupplyId, SupplyStage};

/// Unique payment record identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub String);

/// Whether the farmer payout for a supply has been recorded. Orthogonal to
/// the lifecycle stage, but only actionable from acceptance onward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn name(self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }
}

/// How the payout was settled. The gateway path completes its external
/// verification before the core is invoked; both are uniform here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Online,
}

/// An immutable record of one farmer payout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: PaymentId,
    #[serde(default)]
    pub supply_id: Option<SupplyId>,
    pub farmer_id: FarmerId,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub recorded_at: DateTime<Utc>,
}

/// Gate check: a payout may only be recorded against a supply that has been
/// accepted or completed (before acceptance no grade, hence no price basis,
/// exists) and the amount must be positive.
pub fn ensure_payable(stage: &SupplyStage, amount: Decimal) -> Result<(), MarketError> {
    if amount <= Decimal::ZERO {
        return Err(MarketError::Validation(
            "payment amount must be positive".into(),
        ));
    }
    match stage {
        SupplyStage::Accepted(_) | SupplyStage::Completed(_) => Ok(()),
        SupplyStage::Pending => Err(MarketError::invalid_transition(
            stage.name(),
            "record a payment against",
        )),
    }
}
