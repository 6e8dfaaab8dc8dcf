use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::MarketError;
use crate::identity::{AggregatorRef, FarmerRef};
use crate::journey::JourneyPoint;
use crate::payment::PaymentStatus;

/// Unique supply identifier (server-assigned, opaque).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SupplyId(pub String);

/// Variety of millet in a harvested batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MilletType {
    Ragi,
    Jowar,
    Bajra,
    Foxtail,
    LittleMillet,
    Kodo,
    Barnyard,
    Proso,
    Other(String),
}

impl fmt::Display for MilletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MilletType::Ragi => write!(f, "Ragi"),
            MilletType::Jowar => write!(f, "Jowar"),
            MilletType::Bajra => write!(f, "Bajra"),
            MilletType::Foxtail => write!(f, "Foxtail"),
            MilletType::LittleMillet => write!(f, "Little Millet"),
            MilletType::Kodo => write!(f, "Kodo"),
            MilletType::Barnyard => write!(f, "Barnyard"),
            MilletType::Proso => write!(f, "Proso"),
            MilletType::Other(name) => write!(f, "{name}"),
        }
    }
}

/// Quality grade assigned at acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Grade::A => write!(f, "A"),
            Grade::B => write!(f, "B"),
            Grade::C => write!(f, "C"),
        }
    }
}

impl FromStr for Grade {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "A" | "a" => Ok(Grade::A),
            "B" | "b" => Ok(Grade::B),
            "C" | "c" => Ok(Grade::C),
            other => Err(MarketError::Validation(format!(
                "quality grade must be A, B or C, got '{other}'"
            ))),
        }
    }
}

/// Data fixed at acceptance and carried through to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acceptance {
    pub grade: Grade,
    pub collection_by: String,
    pub collection_date: NaiveDate,
    /// Set by the collect action; marks physical hand-off without a stage change.
    #[serde(default)]
    pub handed_off: bool,
}

/// Lifecycle stage of a supply. The grade and collection fields exist only
/// from acceptance onward, so a completed supply without a grade is
/// unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SupplyStage {
    Pending,
    Accepted(Acceptance),
    Completed(Acceptance),
}

impl SupplyStage {
    pub fn name(&self) -> &'static str {
        match self {
            SupplyStage::Pending => "pending",
            SupplyStage::Accepted(_) => "accepted",
            SupplyStage::Completed(_) => "completed",
        }
    }

    /// Ordinal for monotonicity checks: the stage never moves to a lower one.
    pub fn ordinal(&self) -> u8 {
        match self {
            SupplyStage::Pending => 0,
            SupplyStage::Accepted(_) => 1,
            SupplyStage::Completed(_) => 2,
        }
    }

    pub fn acceptance(&self) -> Option<&Acceptance> {
        match self {
            SupplyStage::Pending => None,
            SupplyStage::Accepted(a) | SupplyStage::Completed(a) => Some(a),
        }
    }
}

/// One farmer-submitted harvested batch, tracked from intake to hand-off
/// into the product catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supply {
    pub id: SupplyId,
    pub millet_type: MilletType,
    pub quantity_kg: Decimal,
    pub harvest_date: NaiveDate,
    pub packaging_date: NaiveDate,
    pub location: String,
    #[serde(default)]
    pub farm_location: Option<String>,
    pub farmer: FarmerRef,
    /// Assigned at acceptance; the only aggregator allowed to transition
    /// this record afterwards.
    #[serde(default)]
    pub aggregator: Option<AggregatorRef>,
    #[serde(flatten)]
    pub stage: SupplyStage,
    pub payment_status: PaymentStatus,
    /// Explicit provenance log. Usually empty; when present it takes
    /// precedence over reconstruction.
    #[serde(default)]
    pub journey_log: Vec<JourneyPoint>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Supply {
    /// Accept a pending supply: assigns grade, collection details and the
    /// acting aggregator. Fails from any other stage without touching the
    /// record (existing grade/collection data is never overwritten).
    pub fn accept(
        &mut self,
        acceptance: Acceptance,
        aggregator: AggregatorRef,
        now: DateTime<Utc>,
    ) -> Result<(), MarketError> {
        match self.stage {
            SupplyStage::Pending => {
                self.stage = SupplyStage::Accepted(acceptance);
                self.aggregator = Some(aggregator);
                self.updated_at = now;
                Ok(())
            }
            _ => Err(MarketError::invalid_transition(self.stage.name(), "accept")),
        }
    }

    /// Mark physical hand-off of an accepted supply. Not a stage change:
    /// the farmer-facing label becomes "collected" but the server state
    /// stays `accepted`.
    pub fn collect(&mut self, now: DateTime<Utc>) -> Result<(), MarketError> {
        match &mut self.stage {
            SupplyStage::Accepted(acceptance) => {
                acceptance.handed_off = true;
                self.updated_at = now;
                Ok(())
            }
            other => Err(MarketError::invalid_transition(other.name(), "collect")),
        }
    }

    /// Complete an accepted supply. The sole action that authorizes listing
    /// a product from it.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), MarketError> {
        match &self.stage {
            SupplyStage::Accepted(acceptance) => {
                self.stage = SupplyStage::Completed(acceptance.clone());
                self.updated_at = now;
                Ok(())
            }
            other => Err(MarketError::invalid_transition(other.name(), "complete")),
        }
    }

    /// Farmer-facing status label. "collected" is the accepted stage once
    /// hand-off has been recorded.
    pub fn display_status(&self) -> &'static str {
        match &self.stage {
            SupplyStage::Accepted(a) if a.handed_off => "collected",
            other => other.name(),
        }
    }
}
