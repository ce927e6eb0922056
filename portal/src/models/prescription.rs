use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::appointment::optional_flexible_datetime;
use super::{null_as_default, Doctor, HasId, Reference};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub status: PrescriptionStatus,
    #[serde(default)]
    pub prescription_type: PrescriptionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<Reference<Doctor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub medications: Vec<Medication>,
    #[serde(
        default,
        deserialize_with = "optional_flexible_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub follow_up_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_flexible_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub issued_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "optional_flexible_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Prescription {
    /// Issue date, falling back to the creation timestamp for drafts
    pub fn issued_on(&self) -> Option<DateTime<Utc>> {
        self.issued_at.or(self.created_at)
    }

    pub fn prescriber(&self) -> Option<&Doctor> {
        self.doctor_id.as_ref().and_then(Reference::record)
    }

    pub fn is_generated(&self) -> bool {
        self.prescription_type == PrescriptionType::Generated
    }
}

impl HasId for Prescription {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionStatus {
    Issued,
    #[default]
    Draft,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionType {
    /// A scanned or uploaded file, see `file_url`
    Uploaded,
    /// Structured record with diagnosis and medications
    #[default]
    Generated,
}

impl PrescriptionType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Uploaded => "Uploaded File",
            Self::Generated => "Generated Prescription",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dosage: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub frequency: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}
