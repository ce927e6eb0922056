use serde::{Deserialize, Serialize};

/// Identity of the logged-in patient as returned at login
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, alias = "fullName")]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none", alias = "mobile")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
}

/// Body of a successful OTP verification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpLogin {
    pub token: String,
    pub patient: User,
}

/// Fields collected by the signup form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub date_of_birth: String,
}

/// Signup payload in the backend's field names
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient<'a> {
    pub full_name: &'a str,
    pub email: &'a str,
    pub mobile: &'a str,
    pub gender: &'a str,
    pub date_of_birth: &'a str,
}

impl<'a> From<&'a SignupRequest> for NewPatient<'a> {
    fn from(request: &'a SignupRequest) -> Self {
        Self {
            full_name: request.name.trim(),
            email: request.email.trim(),
            mobile: request.phone.trim(),
            gender: request.gender.trim(),
            date_of_birth: request.date_of_birth.trim(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub upcoming_appointments: u32,
    #[serde(default)]
    pub total_doctors: u32,
    #[serde(default)]
    pub completed_appointments: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_otp_login_payload() {
        let login: OtpLogin = serde_json::from_value(json!({
            "token": "jwt-abc",
            "patient": {"_id": "p1", "fullName": "Asha", "email": "asha@example.com", "mobile": "9876543210"}
        }))
        .unwrap();
        assert_eq!(login.patient.name, "Asha");
        assert_eq!(login.patient.phone.as_deref(), Some("9876543210"));
    }

    #[test]
    fn test_signup_maps_backend_names() {
        let request = SignupRequest {
            name: " Asha ".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            gender: "female".to_string(),
            date_of_birth: "1990-04-01".to_string(),
        };
        let json = serde_json::to_value(NewPatient::from(&request)).unwrap();
        assert_eq!(json["fullName"], "Asha");
        assert_eq!(json["mobile"], "9876543210");
        assert_eq!(json["dateOfBirth"], "1990-04-01");
    }
}
