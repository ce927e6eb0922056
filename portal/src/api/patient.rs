use chrono::NaiveDate;

use super::ApiClient;
use crate::error::Result;
use crate::models::{
    Appointment, BookingRequest, CancellationRequest, DashboardStats, Doctor, DoctorSlots,
    Facility, Prescription, Profile, TimeSlot,
};

/// Patient app endpoints
impl ApiClient {
    pub async fn get_dashboard_stats(&self) -> Result<DashboardStats> {
        self.get("patient-app/stats").await
    }

    pub async fn get_appointments(&self) -> Result<Vec<Appointment>> {
        self.get("patient-app/appointments").await
    }

    pub async fn get_appointment_by_id(&self, id: &str) -> Result<Appointment> {
        self.get(&format!("patient-app/appointments/{}", id)).await
    }

    pub async fn cancel_appointment(&self, id: &str, reason: Option<&str>) -> Result<()> {
        let body = CancellationRequest {
            cancellation_reason: reason.map(str::to_string),
        };
        self.post_ack(&format!("patient-app/appointments/{}/cancel", id), &body)
            .await?;
        tracing::info!("appointment {} cancelled", id);
        Ok(())
    }

    pub async fn create_appointment(&self, request: &BookingRequest) -> Result<Appointment> {
        let created: Appointment = self.post("patient-app/appointments", request).await?;
        tracing::info!("appointment {} booked", created.id);
        Ok(created)
    }

    pub async fn get_doctors(&self) -> Result<Vec<Doctor>> {
        self.get("patient-app/doctors").await
    }

    pub async fn get_facilities(&self) -> Result<Vec<Facility>> {
        self.get("patient-app/facilities").await
    }

    pub async fn get_doctors_by_facility(&self, facility_id: &str) -> Result<Vec<Doctor>> {
        self.get(&format!("patient-app/facilities/{}/doctors", facility_id))
            .await
    }

    pub async fn get_doctor_slots(&self, doctor_id: &str, date: NaiveDate) -> Result<Vec<TimeSlot>> {
        let date = date.format("%Y-%m-%d").to_string();
        let payload: DoctorSlots = self
            .get_query(
                &format!("patient-app/doctors/{}/slots", doctor_id),
                &[("date", date.as_str())],
            )
            .await?;
        Ok(payload.slots)
    }

    pub async fn get_profile(&self) -> Result<Profile> {
        self.get("patient-app/profile").await
    }

    pub async fn update_profile(&self, profile: &Profile) -> Result<Profile> {
        let saved: Profile = self.put("patient-app/profile", profile).await?;
        tracing::info!("profile saved");
        Ok(saved)
    }

    pub async fn get_prescriptions(&self) -> Result<Vec<Prescription>> {
        self.get("prescriptions/patient/my-prescriptions").await
    }

    pub async fn get_prescription_by_id(&self, id: &str) -> Result<Prescription> {
        self.get(&format!("prescriptions/{}", id)).await
    }
}
