use std::fmt;

use serde::{Deserialize, Serialize};

use super::{AppointmentType, HasId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub specialization: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultation_fees: Option<ConsultationFees>,
}

impl Doctor {
    /// Fee for a modality, zero when the doctor has no fee table or no entry for it
    pub fn fee_for(&self, modality: AppointmentType) -> f64 {
        self.consultation_fees
            .as_ref()
            .map(|fees| fees.for_type(modality))
            .unwrap_or(0.0)
    }
}

impl HasId for Doctor {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Per-modality consultation fees
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationFees {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onsite: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_call: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_call: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_visit: Option<f64>,
}

impl ConsultationFees {
    pub fn for_type(&self, modality: AppointmentType) -> f64 {
        let fee = match modality {
            AppointmentType::Onsite => self.onsite,
            AppointmentType::VoiceCall => self.voice_call,
            AppointmentType::VideoCall => self.video_call,
            AppointmentType::HomeVisit => self.home_visit,
        };
        fee.unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u32,
    pub minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }
}

impl fmt::Display for TimeOfDay {
    /// 12-hour clock, e.g. `9:05 AM`, `12:30 PM`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let period = if self.hour >= 12 { "PM" } else { "AM" };
        let hour = match self.hour % 12 {
            0 => 12,
            h => h,
        };
        write!(f, "{}:{:02} {}", hour, self.minute, period)
    }
}

/// A bookable window for one doctor on one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub day_of_week: String,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeSlot {
    pub fn label(&self) -> String {
        format!("{} - {}", self.start, self.end)
    }
}

/// Payload of the doctor slots endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorSlots {
    #[serde(default)]
    pub slots: Vec<TimeSlot>,
}
