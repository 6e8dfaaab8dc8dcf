use serde::{Deserialize, Serialize};

/// A farmer's identity (server-assigned, opaque).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FarmerId(pub String);

/// An aggregator organization's identity (SHG/FPO).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AggregatorId(pub String);

/// A consumer's identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConsumerId(pub String);

/// Farmer identity plus display name, embedded in records they own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmerRef {
    pub id: FarmerId,
    pub name: String,
}

/// Aggregator identity plus display name, assigned to a supply at acceptance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatorRef {
    pub id: AggregatorId,
    pub name: String,
}

/// Consumer identity with the delivery details captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumerRef {
    pub id: ConsumerId,
    pub name: String,
    pub address: String,
    pub contact: String,
}

