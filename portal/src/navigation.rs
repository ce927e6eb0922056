use std::fmt;
use std::sync::Mutex;

/// Portal pages a user action can lead to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
    Appointments,
    AppointmentDetail(String),
    BookAppointment {
        facility_id: Option<String>,
        doctor_id: Option<String>,
    },
    Doctors,
    Facilities,
    Prescriptions,
    Reports,
    Profile,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Self::Login => "/login".to_string(),
            Self::Dashboard => "/dashboard".to_string(),
            Self::Appointments => "/appointments".to_string(),
            Self::AppointmentDetail(id) => format!("/appointments/{}", id),
            Self::BookAppointment {
                facility_id,
                doctor_id,
            } => {
                let mut params = Vec::new();
                if let Some(f) = facility_id {
                    params.push(format!("facilityId={}", f));
                }
                if let Some(d) = doctor_id {
                    params.push(format!("doctorId={}", d));
                }
                if params.is_empty() {
                    "/book-appointment".to_string()
                } else {
                    format!("/book-appointment?{}", params.join("&"))
                }
            }
            Self::Doctors => "/doctors".to_string(),
            Self::Facilities => "/facilities".to_string(),
            Self::Prescriptions => "/prescriptions".to_string(),
            Self::Reports => "/reports".to_string(),
            Self::Profile => "/profile".to_string(),
        }
    }

    /// Parse the `facilityId` / `doctorId` parameters of a booking deep link.
    /// Accepts a bare query (`facilityId=..`), one with a leading `?`, or a full path.
    pub fn book_from_query(query: &str) -> Self {
        let query = query.rsplit_once('?').map(|(_, q)| q).unwrap_or(query);
        let mut facility_id = None;
        let mut doctor_id = None;

        for pair in query.split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key {
                "facilityId" => facility_id = Some(value.to_string()),
                "doctorId" => doctor_id = Some(value.to_string()),
                _ => {}
            }
        }

        Self::BookAppointment {
            facility_id,
            doctor_id,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// Records navigations in order; `current` is the last one.
#[derive(Debug, Default)]
pub struct NavigationLog {
    history: Mutex<Vec<Route>>,
}

impl NavigationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<Route> {
        self.history
            .lock()
            .map(|h| h.clone())
            .unwrap_or_default()
    }

    pub fn current(&self) -> Option<Route> {
        self.history().pop()
    }
}

impl Navigator for NavigationLog {
    fn navigate(&self, route: Route) {
        tracing::debug!("navigate to {}", route);
        if let Ok(mut history) = self.history.lock() {
            history.push(route);
        }
    }
}
