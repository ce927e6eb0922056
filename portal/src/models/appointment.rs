use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::{Doctor, Facility, HasId, Reference};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    pub doctor_id: Reference<Doctor>,
    pub facility_id: Reference<Facility>,
    #[serde(deserialize_with = "flexible_datetime")]
    pub appointment_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slot: Option<SlotWindow>,
    #[serde(default)]
    pub appointment_type: AppointmentType,
    pub status: AppointmentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason_for_visit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prescription_id: Option<String>,
}

impl Appointment {
    pub fn doctor(&self) -> Option<&Doctor> {
        self.doctor_id.record()
    }

    pub fn facility(&self) -> Option<&Facility> {
        self.facility_id.record()
    }

    pub fn doctor_name(&self) -> &str {
        self.doctor().map(|d| d.name.as_str()).unwrap_or("Unknown Doctor")
    }

    pub fn facility_name(&self) -> &str {
        self.facility().map(|f| f.name.as_str()).unwrap_or("Facility")
    }
}

impl HasId for Appointment {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Absolute start and end of a booked slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl AppointmentStatus {
    /// Completed and Cancelled appointments never change again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Modality of an appointment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AppointmentType {
    #[default]
    Onsite,
    VoiceCall,
    VideoCall,
    HomeVisit,
}

impl AppointmentType {
    pub const ALL: [AppointmentType; 4] = [
        Self::Onsite,
        Self::VoiceCall,
        Self::VideoCall,
        Self::HomeVisit,
    ];

    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Onsite => "onsite",
            Self::VoiceCall => "voiceCall",
            Self::VideoCall => "videoCall",
            Self::HomeVisit => "homeVisit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Onsite => "On-site Visit",
            Self::VoiceCall => "Voice Call",
            Self::VideoCall => "Video Call",
            Self::HomeVisit => "Home Visit",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.wire_name().eq_ignore_ascii_case(value.trim()))
    }
}

impl fmt::Display for AppointmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Payload of the create-appointment request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub facility_id: String,
    pub facility_type: String,
    pub doctor_id: String,
    /// Calendar date as picked, `YYYY-MM-DD`
    pub appointment_date: NaiveDate,
    pub appointment_type: AppointmentType,
    pub reason_for_visit: String,
    pub slot: SlotWindow,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates (read as UTC midnight).
pub(crate) fn flexible_datetime<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_datetime(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw)))
}

/// Like `flexible_datetime`, but `null` and blank strings become `None`.
pub(crate) fn optional_flexible_datetime<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => parse_datetime(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw))),
        _ => Ok(None),
    }
}

pub(crate) fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_appointment_with_populated_references() {
        let appointment: Appointment = serde_json::from_value(json!({
            "_id": "A123",
            "patientId": "p1",
            "doctorId": {"_id": "d1", "name": "Dr. Iyer", "specialization": "ENT"},
            "facilityId": "f1",
            "appointmentDate": "2025-03-10T00:00:00.000Z",
            "slot": {"start": "2025-03-10T09:00:00.000Z", "end": "2025-03-10T09:30:00.000Z"},
            "appointmentType": "videoCall",
            "status": "Confirmed",
            "reasonForVisit": "Follow-up"
        }))
        .unwrap();

        assert_eq!(appointment.doctor_name(), "Dr. Iyer");
        assert_eq!(appointment.facility_id.id(), "f1");
        assert_eq!(appointment.facility_name(), "Facility");
        assert_eq!(appointment.appointment_type, AppointmentType::VideoCall);
        assert_eq!(appointment.status, AppointmentStatus::Confirmed);
        assert_eq!(
            appointment.appointment_date,
            Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_date_only_and_unknown_status() {
        let appointment: Appointment = serde_json::from_value(json!({
            "_id": "A1",
            "doctorId": "d1",
            "facilityId": "f1",
            "appointmentDate": "2025-03-10",
            "status": "Rescheduled"
        }))
        .unwrap();
        assert_eq!(appointment.status, AppointmentStatus::Unknown);
        assert_eq!(appointment.appointment_type, AppointmentType::Onsite);
        assert_eq!(
            appointment.appointment_date,
            Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::Cancelled.is_terminal());
        assert!(!AppointmentStatus::Pending.is_terminal());
        assert!(!AppointmentStatus::Confirmed.is_terminal());
    }

    #[test]
    fn test_appointment_type_names() {
        assert_eq!(AppointmentType::parse("homevisit"), Some(AppointmentType::HomeVisit));
        assert_eq!(AppointmentType::parse("teleport"), None);
        assert_eq!(
            serde_json::to_value(AppointmentType::VoiceCall).unwrap(),
            json!("voiceCall")
        );
    }

    #[test]
    fn test_cancellation_request_body() {
        let body = CancellationRequest {
            cancellation_reason: Some("schedule conflict".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"cancellationReason": "schedule conflict"})
        );
        assert_eq!(
            serde_json::to_value(CancellationRequest::default()).unwrap(),
            json!({})
        );
    }
}
