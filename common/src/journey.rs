//! Provenance journey reconstruction.
//!
//! A supply rarely carries an explicit journey log, so the journey shown to
//! consumers is synthesized from the supply's stored fields. This is a
//! best-effort, presentation-oriented reconstruction — deterministic and
//! pure, but never authoritative provenance (no append-only guarantee).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::supply::{Supply, SupplyStage};

const FARMERS_PREMISES: &str = "farmer's premises";
const COLLECTION_CENTER: &str = "collection center";
const PROCESSING_UNIT: &str = "aggregator processing unit";
const QA_TEAM: &str = "quality assurance team";
const AGGREGATOR_PARTNER: &str = "aggregator partner";

/// Named stage of a provenance journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyStage {
    Harvested,
    Packaged,
    Collected,
    Verified,
}

impl JourneyStage {
    pub fn label(self) -> &'static str {
        match self {
            JourneyStage::Harvested => "Harvested",
            JourneyStage::Packaged => "Packaged",
            JourneyStage::Collected => "Collected",
            JourneyStage::Verified => "Verified",
        }
    }
}

/// One point of a supply's journey: where it was, when, and who acted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyPoint {
    pub stage: JourneyStage,
    pub location: String,
    pub date: NaiveDate,
    pub actor: String,
}

/// Derive the ordered journey for a supply.
///
/// A non-empty explicit log wins and is returned unmodified, in stored
/// order. Otherwise points are synthesized in a fixed order — Harvested and
/// Packaged always, Collected only once the supply has left `pending`,
/// Verified always last.
pub fn reconstruct(supply: &Supply) -> Vec<JourneyPoint> {
    if !supply.journey_log.is_empty() {
        return supply.journey_log.clone();
    }

    let created = supply.created_at.date_naive();
    let mut journey = Vec::with_capacity(4);

    journey.push(JourneyPoint {
        stage: JourneyStage::Harvested,
        location: supply
            .farm_location
            .clone()
            .unwrap_or_else(|| supply.location.clone()),
        date: supply.harvest_date,
        actor: supply.farmer.name.clone(),
    });

    journey.push(JourneyPoint {
        stage: JourneyStage::Packaged,
        location: supply
            .farm_location
            .clone()
            .unwrap_or_else(|| FARMERS_PREMISES.into()),
        date: supply.packaging_date,
        actor: supply.farmer.name.clone(),
    });

    if !matches!(supply.stage, SupplyStage::Pending) {
        let (date, actor) = match supply.stage.acceptance() {
            Some(a) if !a.collection_by.trim().is_empty() => {
                (a.collection_date, a.collection_by.clone())
            }
            Some(a) => (a.collection_date, AGGREGATOR_PARTNER.into()),
            None => (created, AGGREGATOR_PARTNER.into()),
        };
        let location = if supply.location.trim().is_empty() {
            COLLECTION_CENTER.into()
        } else {
            supply.location.clone()
        };
        journey.push(JourneyPoint {
            stage: JourneyStage::Collected,
            location,
            date,
            actor,
        });
    }

    journey.push(JourneyPoint {
        stage: JourneyStage::Verified,
        location: PROCESSING_UNIT.into(),
        date: created,
        actor: QA_TEAM.into(),
    });

    journey
}
