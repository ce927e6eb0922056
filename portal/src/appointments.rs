use chrono::{DateTime, Local, TimeZone};

use crate::api::ApiClient;
use crate::error::{PortalError, Result};
use crate::models::{Appointment, AppointmentStatus, Prescription};
use crate::navigation::Route;
use crate::notify::Confirm;

pub const QUICK_CANCEL_REASON: &str = "Cancelled by patient";

/// Upcoming vs past split of an appointment list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitioned {
    pub upcoming: Vec<Appointment>,
    pub past: Vec<Appointment>,
}

/// Scheduled on `now`'s calendar day or later, and not yet finished or cancelled.
/// Dates are compared at midnight in `now`'s time zone, not as exact instants.
pub fn is_upcoming<Tz: TimeZone>(appointment: &Appointment, now: &DateTime<Tz>) -> bool {
    let today = now.date_naive();
    let scheduled = appointment
        .appointment_date
        .with_timezone(&now.timezone())
        .date_naive();
    scheduled >= today && !appointment.status.is_terminal()
}

/// Every appointment lands in exactly one side; input order is kept.
pub fn partition<Tz: TimeZone>(appointments: Vec<Appointment>, now: &DateTime<Tz>) -> Partitioned {
    let (upcoming, past) = appointments
        .into_iter()
        .partition(|appointment| is_upcoming(appointment, now));
    Partitioned { upcoming, past }
}

pub fn partition_now(appointments: Vec<Appointment>) -> Partitioned {
    partition(appointments, &Local::now())
}

/// Strictly in the future and still Pending or Confirmed
pub fn is_cancellable<Tz: TimeZone>(appointment: &Appointment, now: &DateTime<Tz>) -> bool {
    appointment.appointment_date > *now
        && matches!(
            appointment.status,
            AppointmentStatus::Pending | AppointmentStatus::Confirmed
        )
}

/// Next few active appointments, for the dashboard
pub fn upcoming_preview<Tz: TimeZone>(
    appointments: &[Appointment],
    now: &DateTime<Tz>,
    limit: usize,
) -> Vec<Appointment> {
    appointments
        .iter()
        .filter(|a| a.appointment_date >= *now && !a.status.is_terminal())
        .take(limit)
        .cloned()
        .collect()
}

/// One appointment plus its linked prescription, if any
#[derive(Debug, Clone)]
pub struct AppointmentDetail {
    pub appointment: Appointment,
    prescription: Option<Prescription>,
}

impl AppointmentDetail {
    pub fn new(appointment: Appointment, prescription: Option<Prescription>) -> Self {
        Self {
            appointment,
            prescription,
        }
    }

    /// Fetch the appointment, then its prescription. A failed prescription
    /// fetch is logged and leaves the detail without one.
    pub async fn load(api: &ApiClient, id: &str) -> Result<Self> {
        let appointment = api.get_appointment_by_id(id).await?;

        let prescription = match appointment.prescription_id.as_deref() {
            Some(prescription_id) => match api.get_prescription_by_id(prescription_id).await {
                Ok(prescription) => Some(prescription),
                Err(e) => {
                    tracing::warn!("failed to load prescription {}: {}", prescription_id, e);
                    None
                }
            },
            None => None,
        };

        Ok(Self::new(appointment, prescription))
    }

    /// Prescriptions are only shown once the visit is confirmed or done
    pub fn visible_prescription(&self) -> Option<&Prescription> {
        match self.appointment.status {
            AppointmentStatus::Confirmed | AppointmentStatus::Completed => {
                self.prescription.as_ref()
            }
            _ => None,
        }
    }

    pub fn can_cancel<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> bool {
        is_cancellable(&self.appointment, now)
    }
}

/// Confirm-then-cancel flow of the detail page
#[derive(Debug, Clone)]
pub struct CancellationFlow {
    appointment_id: String,
    reason: String,
}

impl CancellationFlow {
    pub fn begin<Tz: TimeZone>(appointment: &Appointment, now: &DateTime<Tz>) -> Result<Self> {
        if !is_cancellable(appointment, now) {
            return Err(PortalError::validation(
                "status",
                format!(
                    "A {} appointment on {} can no longer be cancelled",
                    appointment.status,
                    appointment.appointment_date.format("%Y-%m-%d")
                ),
            ));
        }
        Ok(Self {
            appointment_id: appointment.id.clone(),
            reason: String::new(),
        })
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn appointment_id(&self) -> &str {
        &self.appointment_id
    }

    /// Send the cancellation and return to the appointment list
    pub async fn confirm(self, api: &ApiClient) -> Result<()> {
        let reason = self.reason.trim();
        let reason = (!reason.is_empty()).then_some(reason);
        api.cancel_appointment(&self.appointment_id, reason).await?;
        api.navigator().navigate(Route::Appointments);
        Ok(())
    }
}

/// List-page cancel: no reason field, same checks. Returns the refreshed list,
/// or `None` when the user backed out and nothing was sent.
pub async fn quick_cancel<Tz: TimeZone>(
    api: &ApiClient,
    confirm: &impl Confirm,
    appointment: &Appointment,
    now: &DateTime<Tz>,
) -> Result<Option<Vec<Appointment>>> {
    let flow = CancellationFlow::begin(appointment, now)?;
    if !confirm.confirm("Are you sure you want to cancel this appointment?") {
        return Ok(None);
    }
    api.cancel_appointment(flow.appointment_id(), Some(QUICK_CANCEL_REASON))
        .await?;
    api.get_appointments().await.map(Some)
}
