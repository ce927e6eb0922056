use reqwest::Method;
use serde_json::{json, Value};

use super::ApiClient;
use crate::error::{PortalError, Result};
use crate::models::{NewPatient, OtpLogin, SignupRequest};
use crate::navigation::Route;
use crate::session::Session;

/// Indian mobile numbers as entered on the login form: exactly ten digits
pub fn validate_mobile(mobile: &str) -> Result<&str> {
    let mobile = mobile.trim();
    if mobile.len() != 10 || !mobile.chars().all(|c| c.is_ascii_digit()) {
        return Err(PortalError::validation(
            "mobile",
            "Please enter a valid 10-digit mobile number",
        ));
    }
    Ok(mobile)
}

pub fn validate_signup(request: &SignupRequest) -> Result<()> {
    let required = [
        ("name", &request.name),
        ("email", &request.email),
        ("phone", &request.phone),
        ("gender", &request.gender),
        ("dateOfBirth", &request.date_of_birth),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(PortalError::validation(field, format!("{} is required", field)));
        }
    }

    let email = request.email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
        _ => return Err(PortalError::validation("email", "Email is invalid")),
    }

    validate_mobile(&request.phone).map_err(|_| {
        PortalError::validation("phone", "Phone number must be 10 digits")
    })?;

    chrono::NaiveDate::parse_from_str(request.date_of_birth.trim(), "%Y-%m-%d")
        .map_err(|_| PortalError::validation("dateOfBirth", "Date of birth must be YYYY-MM-DD"))?;

    Ok(())
}

/// Login, signup and password recovery
impl ApiClient {
    pub async fn send_otp(&self, mobile: &str) -> Result<()> {
        let mobile = validate_mobile(mobile)?;
        let _: Value = self
            .send_raw(
                self.request(Method::POST, "patients/auth/send-otp")
                    .json(&json!({ "mobile": mobile })),
            )
            .await?;
        tracing::info!("otp sent");
        Ok(())
    }

    /// Verify the OTP and persist the resulting session
    pub async fn login_with_otp(&self, mobile: &str, otp: &str) -> Result<Session> {
        let mobile = validate_mobile(mobile)?;
        let otp = otp.trim();
        if otp.is_empty() {
            return Err(PortalError::validation("otp", "Please enter the OTP"));
        }

        let login: OtpLogin = self
            .send_raw(
                self.request(Method::POST, "patients/auth/verify-otp")
                    .json(&json!({ "mobile": mobile, "otp": otp })),
            )
            .await?;

        let session = Session {
            token: login.token,
            user: login.patient,
        };
        self.session().save(&session)?;
        tracing::info!("logged in as {}", session.user.id);
        Ok(session)
    }

    pub async fn signup(&self, request: &SignupRequest) -> Result<()> {
        validate_signup(request)?;
        let _: Value = self
            .send_raw(
                self.request(Method::POST, "patients")
                    .json(&NewPatient::from(request)),
            )
            .await?;
        tracing::info!("signup submitted");
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        self.session().clear()?;
        self.navigator().navigate(Route::Login);
        tracing::info!("logged out");
        Ok(())
    }

    pub async fn forgot_password(&self, email: &str) -> Result<()> {
        let email = email.trim();
        if email.is_empty() {
            return Err(PortalError::validation("email", "Email is required"));
        }
        let _: Value = self
            .send_raw(
                self.request(Method::POST, "patient/auth/forgot-password")
                    .json(&json!({ "email": email })),
            )
            .await?;
        Ok(())
    }

    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<()> {
        if token.trim().is_empty() || new_password.is_empty() {
            return Err(PortalError::validation(
                "newPassword",
                "Please enter the reset token and a new password",
            ));
        }
        let _: Value = self
            .send_raw(
                self.request(
                    Method::POST,
                    &format!("patient/auth/reset-password/{}", token.trim()),
                )
                .json(&json!({ "newPassword": new_password })),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_mobile() {
        assert_eq!(validate_mobile(" 9876543210 ").unwrap(), "9876543210");
        assert!(validate_mobile("98765").is_err());
        assert!(validate_mobile("98765abcde").is_err());
        assert!(validate_mobile("").is_err());
    }

    #[test]
    fn test_validate_signup() {
        let mut request = SignupRequest {
            name: "Asha".to_string(),
            email: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            gender: "female".to_string(),
            date_of_birth: "1990-04-01".to_string(),
        };
        assert!(validate_signup(&request).is_ok());

        request.email = "asha".to_string();
        let err = validate_signup(&request).unwrap_err();
        assert!(matches!(err, PortalError::Validation { ref field, .. } if field == "email"));

        request.email = "asha@example.com".to_string();
        request.gender.clear();
        let err = validate_signup(&request).unwrap_err();
        assert!(matches!(err, PortalError::Validation { ref field, .. } if field == "gender"));

        request.gender = "female".to_string();
        request.date_of_birth = "01/04/1990".to_string();
        assert!(validate_signup(&request).is_err());
    }
}
