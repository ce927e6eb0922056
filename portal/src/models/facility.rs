use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::HasId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub facility_type: FacilityType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_at: Option<DateTime<Utc>>,
}

impl Facility {
    pub fn formatted_address(&self) -> String {
        self.address
            .as_ref()
            .map(Address::formatted)
            .unwrap_or_else(|| NO_ADDRESS.to_string())
    }
}

impl HasId for Facility {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Facility category. Types the portal does not know keep their original
/// text so they are sent back unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacilityType {
    Hospital,
    Clinic,
    Other(String),
}

impl FacilityType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Hospital => "Hospital",
            Self::Clinic => "Clinic",
            Self::Other(raw) => raw,
        }
    }
}

impl Default for FacilityType {
    fn default() -> Self {
        Self::Other("Other".to_string())
    }
}

impl From<String> for FacilityType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "Hospital" => Self::Hospital,
            "Clinic" => Self::Clinic,
            _ => Self::Other(raw),
        }
    }
}

impl Serialize for FacilityType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FacilityType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?
            .map(Self::from)
            .unwrap_or_default())
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const NO_ADDRESS: &str = "No address provided";

/// Postal address, sent either structured or as one free-text line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Address {
    Text(String),
    Structured(PostalAddress),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostalAddress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pincode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(flatten, skip_serializing_if = "Map::is_empty", default)]
    pub extra: Map<String, Value>,
}

impl PostalAddress {
    pub fn formatted(&self) -> String {
        let parts: Vec<&str> = [
            &self.street,
            &self.city,
            &self.state,
            &self.pincode,
            &self.country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect();

        if parts.is_empty() {
            NO_ADDRESS.to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl Address {
    pub fn formatted(&self) -> String {
        match self {
            Self::Text(text) if text.trim().is_empty() => NO_ADDRESS.to_string(),
            Self::Text(text) => text.clone(),
            Self::Structured(address) => address.formatted(),
        }
    }
}
