//! Three-step appointment booking.
//!
//! Step 1 picks a facility and one of its doctors, step 2 a date and one of the
//! doctor's slots on that date, step 3 reviews and submits. Slots belong to a
//! (doctor, date) pair, so changing either one drops the chosen slot.

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

use crate::api::ApiClient;
use crate::error::{PortalError, Result};
use crate::models::{
    Appointment, AppointmentType, BookingRequest, Doctor, Facility, SlotWindow, TimeOfDay,
    TimeSlot,
};

/// Backend calls the wizard depends on
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn facilities(&self) -> Result<Vec<Facility>>;
    async fn doctors_at(&self, facility_id: &str) -> Result<Vec<Doctor>>;
    async fn slots_for(&self, doctor_id: &str, date: NaiveDate) -> Result<Vec<TimeSlot>>;
    async fn book(&self, request: &BookingRequest) -> Result<Appointment>;
}

#[async_trait]
impl BookingBackend for ApiClient {
    async fn facilities(&self) -> Result<Vec<Facility>> {
        self.get_facilities().await
    }

    async fn doctors_at(&self, facility_id: &str) -> Result<Vec<Doctor>> {
        self.get_doctors_by_facility(facility_id).await
    }

    async fn slots_for(&self, doctor_id: &str, date: NaiveDate) -> Result<Vec<TimeSlot>> {
        self.get_doctor_slots(doctor_id, date).await
    }

    async fn book(&self, request: &BookingRequest) -> Result<Appointment> {
        self.create_appointment(request).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    SelectProvider = 1,
    SelectSchedule = 2,
    Review = 3,
}

impl Step {
    pub fn number(&self) -> u8 {
        *self as u8
    }
}

/// Read-only summary shown on the review step
#[derive(Debug, Clone, PartialEq)]
pub struct BookingReview {
    pub facility: String,
    pub doctor: String,
    pub specialization: String,
    pub date: NaiveDate,
    pub slot: String,
    pub modality: AppointmentType,
    pub reason: String,
    pub fee: f64,
}

#[derive(Debug, Clone)]
pub struct BookingWizard {
    step: Step,
    facilities: Vec<Facility>,
    doctors: Vec<Doctor>,
    slots: Vec<TimeSlot>,
    facility_id: Option<String>,
    facility_type: String,
    doctor_id: Option<String>,
    date: Option<NaiveDate>,
    slot: Option<TimeSlot>,
    modality: AppointmentType,
    reason: String,
    pending_link: Option<(Option<String>, Option<String>)>,
}

impl Default for BookingWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingWizard {
    pub fn new() -> Self {
        Self {
            step: Step::SelectProvider,
            facilities: Vec::new(),
            doctors: Vec::new(),
            slots: Vec::new(),
            facility_id: None,
            facility_type: String::new(),
            doctor_id: None,
            date: None,
            slot: None,
            modality: AppointmentType::Onsite,
            reason: String::new(),
            pending_link: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn slots(&self) -> &[TimeSlot] {
        &self.slots
    }

    pub fn selected_facility(&self) -> Option<&Facility> {
        let id = self.facility_id.as_deref()?;
        self.facilities.iter().find(|f| f.id == id)
    }

    pub fn selected_doctor(&self) -> Option<&Doctor> {
        let id = self.doctor_id.as_deref()?;
        self.doctors.iter().find(|d| d.id == id)
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn selected_slot(&self) -> Option<&TimeSlot> {
        self.slot.as_ref()
    }

    pub fn modality(&self) -> AppointmentType {
        self.modality
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Fetch the facility list. A deep link received earlier is applied afterwards.
    pub async fn load_facilities<B: BookingBackend + ?Sized>(&mut self, backend: &B) -> Result<()> {
        self.facilities = backend.facilities().await?;
        tracing::debug!("loaded {} facilities", self.facilities.len());

        if let Some((facility_id, doctor_id)) = self.pending_link.take() {
            self.apply_deep_link(backend, facility_id.as_deref(), doctor_id.as_deref())
                .await?;
        }
        Ok(())
    }

    /// Choose a facility and load its doctors. Any doctor, date-bound slots
    /// and chosen slot from a previous facility are dropped first.
    pub async fn select_facility<B: BookingBackend + ?Sized>(
        &mut self,
        backend: &B,
        facility_id: &str,
    ) -> Result<()> {
        self.facility_type = self
            .facilities
            .iter()
            .find(|f| f.id == facility_id)
            .map(|f| f.facility_type.to_string())
            .unwrap_or_default();
        self.facility_id = Some(facility_id.to_string());
        self.doctor_id = None;
        self.doctors.clear();
        self.clear_slot();

        self.doctors = backend.doctors_at(facility_id).await?;
        tracing::debug!(
            "facility {} has {} doctors",
            facility_id,
            self.doctors.len()
        );
        Ok(())
    }

    pub fn select_doctor(&mut self, doctor_id: &str) -> Result<()> {
        if !self.doctors.iter().any(|d| d.id == doctor_id) {
            return Err(PortalError::validation(
                "doctorId",
                "Please select a doctor from the list",
            ));
        }
        if self.doctor_id.as_deref() != Some(doctor_id) {
            self.clear_slot();
        }
        self.doctor_id = Some(doctor_id.to_string());
        Ok(())
    }

    /// Choose the appointment date and, if a doctor is chosen, load that day's slots
    pub async fn select_date<B: BookingBackend + ?Sized>(
        &mut self,
        backend: &B,
        date: NaiveDate,
        today: NaiveDate,
    ) -> Result<()> {
        if date < today {
            return Err(PortalError::validation(
                "appointmentDate",
                "Appointment date cannot be in the past",
            ));
        }
        self.date = Some(date);
        self.clear_slot();

        if let Some(doctor_id) = self.doctor_id.clone() {
            self.slots = backend.slots_for(&doctor_id, date).await?;
            tracing::debug!("{} slots available on {}", self.slots.len(), date);
        }
        Ok(())
    }

    pub fn select_slot(&mut self, slot_id: &str) -> Result<()> {
        let slot = self
            .slots
            .iter()
            .find(|s| s.id == slot_id)
            .cloned()
            .ok_or_else(|| PortalError::validation("slot", "Please select an available time slot"))?;
        self.slot = Some(slot);
        Ok(())
    }

    pub fn set_modality(&mut self, modality: AppointmentType) {
        self.modality = modality;
    }

    pub fn set_reason(&mut self, reason: impl Into<String>) {
        self.reason = reason.into();
    }

    /// Advance one step if the current step is complete
    pub fn next(&mut self) -> Result<Step> {
        self.step = match self.step {
            Step::SelectProvider => {
                self.require_provider()?;
                Step::SelectSchedule
            }
            Step::SelectSchedule => {
                self.require_schedule()?;
                Step::Review
            }
            Step::Review => Step::Review,
        };
        Ok(self.step)
    }

    pub fn back(&mut self) -> Step {
        self.step = match self.step {
            Step::SelectProvider | Step::SelectSchedule => Step::SelectProvider,
            Step::Review => Step::SelectSchedule,
        };
        self.step
    }

    /// Selected doctor's fee for the chosen modality, zero when unknown
    pub fn consultation_fee(&self) -> f64 {
        self.selected_doctor()
            .map(|d| d.fee_for(self.modality))
            .unwrap_or(0.0)
    }

    pub fn review(&self) -> Result<BookingReview> {
        self.require_provider()?;
        self.require_schedule()?;
        let (Some(doctor), Some(date), Some(slot)) =
            (self.selected_doctor(), self.date, self.slot.as_ref())
        else {
            return Err(missing_information());
        };

        Ok(BookingReview {
            facility: self
                .selected_facility()
                .map(|f| f.name.clone())
                .unwrap_or_default(),
            doctor: doctor.name.clone(),
            specialization: doctor.specialization.clone(),
            date,
            slot: slot.label(),
            modality: self.modality,
            reason: self.reason.clone(),
            fee: self.consultation_fee(),
        })
    }

    /// Build the create-appointment payload with slot times in the local time zone
    pub fn build_request(&self) -> Result<BookingRequest> {
        self.build_request_in(&Local)
    }

    /// Build the payload, reading the slot's hour and minute as wall-clock time in `tz`
    pub fn build_request_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<BookingRequest> {
        let (Some(facility_id), Some(doctor_id), Some(date), Some(slot)) = (
            self.facility_id.as_ref(),
            self.doctor_id.as_ref(),
            self.date,
            self.slot.as_ref(),
        ) else {
            return Err(missing_information());
        };

        Ok(BookingRequest {
            facility_id: facility_id.clone(),
            facility_type: self.facility_type.clone(),
            doctor_id: doctor_id.clone(),
            appointment_date: date,
            appointment_type: self.modality,
            reason_for_visit: self.reason.trim().to_string(),
            slot: SlotWindow {
                start: at_time(tz, date, slot.start)?,
                end: at_time(tz, date, slot.end)?,
            },
        })
    }

    /// Post the booking. On failure the wizard keeps its step and selections.
    pub async fn submit<B: BookingBackend + ?Sized>(&self, backend: &B) -> Result<Appointment> {
        let request = self.build_request()?;
        backend.book(&request).await
    }

    pub async fn submit_in<B, Tz>(&self, backend: &B, tz: &Tz) -> Result<Appointment>
    where
        B: BookingBackend + ?Sized,
        Tz: TimeZone,
    {
        let request = self.build_request_in(tz)?;
        backend.book(&request).await
    }

    /// Pre-populate step 1 from `facilityId` / `doctorId` link parameters.
    /// Stays on step 1 so the patient can confirm the choice.
    pub async fn apply_deep_link<B: BookingBackend + ?Sized>(
        &mut self,
        backend: &B,
        facility_id: Option<&str>,
        doctor_id: Option<&str>,
    ) -> Result<()> {
        if self.facilities.is_empty() {
            self.pending_link = Some((
                facility_id.map(str::to_string),
                doctor_id.map(str::to_string),
            ));
            return Ok(());
        }

        let Some(facility_id) = facility_id else {
            return Ok(());
        };
        if !self.facilities.iter().any(|f| f.id == facility_id) {
            tracing::warn!("deep link names unknown facility {}", facility_id);
            return Ok(());
        }

        self.select_facility(backend, facility_id).await?;
        if let Some(doctor_id) = doctor_id {
            if self.select_doctor(doctor_id).is_err() {
                tracing::warn!("deep link names unknown doctor {}", doctor_id);
            }
        }
        self.step = Step::SelectProvider;
        Ok(())
    }

    fn clear_slot(&mut self) {
        self.slot = None;
        self.slots.clear();
    }

    fn require_provider(&self) -> Result<()> {
        if self.facility_id.is_none() {
            return Err(PortalError::validation("facilityId", "Please select a facility"));
        }
        if self.selected_doctor().is_none() {
            return Err(PortalError::validation("doctorId", "Please select a doctor"));
        }
        Ok(())
    }

    fn require_schedule(&self) -> Result<()> {
        if self.date.is_none() {
            return Err(PortalError::validation("appointmentDate", "Please select a date"));
        }
        if self.slot.is_none() {
            return Err(PortalError::validation("slot", "Please select a time slot"));
        }
        Ok(())
    }
}

fn missing_information() -> PortalError {
    PortalError::validation("appointment", "Please fill in all required fields")
}

fn at_time<Tz: TimeZone>(tz: &Tz, date: NaiveDate, time: TimeOfDay) -> Result<DateTime<Utc>> {
    let naive = date
        .and_hms_opt(time.hour, time.minute, 0)
        .ok_or_else(|| PortalError::validation("slot", "Slot has an invalid time"))?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| PortalError::validation("slot", "Slot time does not exist on that date"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ConsultationFees, FacilityType};
    use chrono::{FixedOffset, NaiveDateTime};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeBackend {
        fail_slots: bool,
        booked: Mutex<Vec<BookingRequest>>,
        slot_calls: Mutex<Vec<(String, NaiveDate)>>,
    }

    fn facility(id: &str) -> Facility {
        Facility {
            id: id.to_string(),
            name: format!("Facility {}", id),
            facility_type: FacilityType::Hospital,
            address: None,
            phone: None,
            email: None,
            registered_at: None,
        }
    }

    fn doctor(id: &str, onsite: Option<f64>) -> Doctor {
        Doctor {
            id: id.to_string(),
            name: format!("Dr. {}", id),
            specialization: "General".to_string(),
            department: None,
            email: None,
            phone: None,
            consultation_fees: Some(ConsultationFees {
                onsite,
                ..Default::default()
            }),
        }
    }

    fn slot(id: &str, start: (u32, u32), end: (u32, u32)) -> TimeSlot {
        TimeSlot {
            id: id.to_string(),
            day_of_week: "Monday".to_string(),
            start: TimeOfDay::new(start.0, start.1),
            end: TimeOfDay::new(end.0, end.1),
        }
    }

    #[async_trait]
    impl BookingBackend for FakeBackend {
        async fn facilities(&self) -> Result<Vec<Facility>> {
            Ok(vec![facility("F"), facility("G")])
        }

        async fn doctors_at(&self, facility_id: &str) -> Result<Vec<Doctor>> {
            match facility_id {
                "F" => Ok(vec![doctor("D", Some(500.0)), doctor("E", None)]),
                _ => Ok(vec![doctor("H", Some(800.0))]),
            }
        }

        async fn slots_for(&self, doctor_id: &str, date: NaiveDate) -> Result<Vec<TimeSlot>> {
            self.slot_calls
                .lock()
                .unwrap()
                .push((doctor_id.to_string(), date));
            if self.fail_slots {
                return Err(PortalError::backend(None, Some("boom".to_string())));
            }
            Ok(vec![slot("s1", (9, 0), (9, 30)), slot("s2", (9, 30), (10, 0))])
        }

        async fn book(&self, request: &BookingRequest) -> Result<Appointment> {
            self.booked.lock().unwrap().push(request.clone());
            Err(PortalError::backend(None, Some("not stored in fake".to_string())))
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn wizard_at_slot(backend: &FakeBackend) -> BookingWizard {
        let mut wizard = BookingWizard::new();
        wizard.load_facilities(backend).await.unwrap();
        wizard.select_facility(backend, "F").await.unwrap();
        wizard.select_doctor("D").unwrap();
        wizard.next().unwrap();
        wizard
            .select_date(backend, date("2025-03-10"), date("2025-03-01"))
            .await
            .unwrap();
        wizard.select_slot("s1").unwrap();
        wizard
    }

    #[tokio::test]
    async fn test_booking_scenario_fee_and_slot_times() {
        let backend = FakeBackend::default();
        let mut wizard = wizard_at_slot(&backend).await;
        wizard.set_modality(AppointmentType::Onsite);
        assert_eq!(wizard.next().unwrap(), Step::Review);

        let review = wizard.review().unwrap();
        assert_eq!(review.fee, 500.0);
        assert_eq!(review.slot, "9:00 AM - 9:30 AM");

        let tz = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let request = wizard.build_request_in(&tz).unwrap();
        let local = |dt: DateTime<Utc>| dt.with_timezone(&tz).naive_local();
        assert_eq!(
            local(request.slot.start),
            NaiveDateTime::parse_from_str("2025-03-10 09:00", "%Y-%m-%d %H:%M").unwrap()
        );
        assert_eq!(
            local(request.slot.end),
            NaiveDateTime::parse_from_str("2025-03-10 09:30", "%Y-%m-%d %H:%M").unwrap()
        );
        assert_eq!(request.facility_id, "F");
        assert_eq!(request.facility_type, "Hospital");
        assert_eq!(request.doctor_id, "D");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["appointmentDate"], "2025-03-10");
        assert_eq!(json["appointmentType"], "onsite");
    }

    #[tokio::test]
    async fn test_local_request_keeps_wall_clock_time() {
        let backend = FakeBackend::default();
        let wizard = wizard_at_slot(&backend).await;
        let request = wizard.build_request().unwrap();
        let start = request.slot.start.with_timezone(&Local).naive_local();
        assert_eq!(start.date(), date("2025-03-10"));
        assert_eq!(start.format("%H:%M").to_string(), "09:00");
    }

    #[tokio::test]
    async fn test_fee_defaults_to_zero() {
        let backend = FakeBackend::default();
        let mut wizard = BookingWizard::new();
        wizard.load_facilities(&backend).await.unwrap();
        wizard.select_facility(&backend, "F").await.unwrap();
        wizard.select_doctor("E").unwrap();
        assert_eq!(wizard.consultation_fee(), 0.0);

        wizard.select_doctor("D").unwrap();
        wizard.set_modality(AppointmentType::VideoCall);
        assert_eq!(wizard.consultation_fee(), 0.0);
    }

    #[tokio::test]
    async fn test_changing_date_clears_slot() {
        let backend = FakeBackend::default();
        let mut wizard = wizard_at_slot(&backend).await;
        assert!(wizard.selected_slot().is_some());

        wizard
            .select_date(&backend, date("2025-03-11"), date("2025-03-01"))
            .await
            .unwrap();
        assert!(wizard.selected_slot().is_none());
        assert_eq!(wizard.slots().len(), 2);
    }

    #[tokio::test]
    async fn test_changing_doctor_clears_slot() {
        let backend = FakeBackend::default();
        let mut wizard = wizard_at_slot(&backend).await;
        wizard.select_doctor("E").unwrap();
        assert!(wizard.selected_slot().is_none());
        assert!(wizard.slots().is_empty());
    }

    #[tokio::test]
    async fn test_changing_facility_clears_doctor_and_slot() {
        let backend = FakeBackend::default();
        let mut wizard = wizard_at_slot(&backend).await;
        wizard.select_facility(&backend, "G").await.unwrap();
        assert!(wizard.selected_doctor().is_none());
        assert!(wizard.selected_slot().is_none());
        assert_eq!(wizard.doctors().len(), 1);
    }

    #[tokio::test]
    async fn test_slots_fetched_for_doctor_and_date() {
        let backend = FakeBackend::default();
        let _ = wizard_at_slot(&backend).await;
        let calls = backend.slot_calls.lock().unwrap().clone();
        assert_eq!(calls, vec![("D".to_string(), date("2025-03-10"))]);
    }

    #[tokio::test]
    async fn test_next_requires_selections() {
        let backend = FakeBackend::default();
        let mut wizard = BookingWizard::new();
        wizard.load_facilities(&backend).await.unwrap();
        assert!(wizard.next().unwrap_err().is_validation());
        assert_eq!(wizard.step(), Step::SelectProvider);

        wizard.select_facility(&backend, "F").await.unwrap();
        assert!(wizard.next().is_err());
        wizard.select_doctor("D").unwrap();
        assert_eq!(wizard.next().unwrap(), Step::SelectSchedule);

        assert!(wizard.next().is_err());
        assert_eq!(wizard.step(), Step::SelectSchedule);
        assert_eq!(wizard.back(), Step::SelectProvider);
    }

    #[tokio::test]
    async fn test_unknown_doctor_and_slot_rejected() {
        let backend = FakeBackend::default();
        let mut wizard = wizard_at_slot(&backend).await;
        assert!(wizard.select_doctor("Z").is_err());
        assert!(wizard.select_slot("nope").is_err());
        assert_eq!(wizard.selected_slot().map(|s| s.id.as_str()), Some("s1"));
    }

    #[tokio::test]
    async fn test_past_date_rejected() {
        let backend = FakeBackend::default();
        let mut wizard = wizard_at_slot(&backend).await;
        let err = wizard
            .select_date(&backend, date("2025-02-28"), date("2025-03-01"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(wizard.selected_date(), Some(date("2025-03-10")));
    }

    #[tokio::test]
    async fn test_slot_fetch_failure_keeps_step() {
        let backend = FakeBackend {
            fail_slots: true,
            ..Default::default()
        };
        let mut wizard = BookingWizard::new();
        wizard.load_facilities(&backend).await.unwrap();
        wizard.select_facility(&backend, "F").await.unwrap();
        wizard.select_doctor("D").unwrap();
        wizard.next().unwrap();

        let result = wizard
            .select_date(&backend, date("2025-03-10"), date("2025-03-01"))
            .await;
        assert!(result.is_err());
        assert_eq!(wizard.step(), Step::SelectSchedule);
        assert!(wizard.slots().is_empty());
    }

    #[tokio::test]
    async fn test_submit_failure_keeps_wizard_on_review() {
        let backend = FakeBackend::default();
        let mut wizard = wizard_at_slot(&backend).await;
        wizard.set_reason("  fever  ");
        wizard.next().unwrap();

        let tz = FixedOffset::east_opt(0).unwrap();
        assert!(wizard.submit_in(&backend, &tz).await.is_err());
        assert_eq!(wizard.step(), Step::Review);
        assert!(wizard.selected_slot().is_some());

        let booked = backend.booked.lock().unwrap();
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].reason_for_visit, "fever");
    }

    #[tokio::test]
    async fn test_submit_without_slot_sends_nothing() {
        let backend = FakeBackend::default();
        let mut wizard = BookingWizard::new();
        wizard.load_facilities(&backend).await.unwrap();
        wizard.select_facility(&backend, "F").await.unwrap();
        wizard.select_doctor("D").unwrap();

        assert!(wizard.submit(&backend).await.unwrap_err().is_validation());
        assert!(backend.booked.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deep_link_prefills_step_one() {
        let backend = FakeBackend::default();
        let mut wizard = BookingWizard::new();
        wizard
            .apply_deep_link(&backend, Some("F"), Some("D"))
            .await
            .unwrap();
        assert!(wizard.selected_doctor().is_none());

        wizard.load_facilities(&backend).await.unwrap();
        assert_eq!(wizard.selected_facility().map(|f| f.id.as_str()), Some("F"));
        assert_eq!(wizard.selected_doctor().map(|d| d.id.as_str()), Some("D"));
        assert_eq!(wizard.step(), Step::SelectProvider);
    }

    #[tokio::test]
    async fn test_deep_link_with_unknown_ids() {
        let backend = FakeBackend::default();
        let mut wizard = BookingWizard::new();
        wizard.load_facilities(&backend).await.unwrap();

        wizard
            .apply_deep_link(&backend, Some("nowhere"), Some("D"))
            .await
            .unwrap();
        assert!(wizard.selected_facility().is_none());

        wizard
            .apply_deep_link(&backend, Some("F"), Some("ghost"))
            .await
            .unwrap();
        assert_eq!(wizard.selected_facility().map(|f| f.id.as_str()), Some("F"));
        assert!(wizard.selected_doctor().is_none());
    }
}
