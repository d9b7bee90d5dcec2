//! Admin registration form rules.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AdminError;

/// Payload accepted by the registration endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub id: String,
    pub username: String,
    pub password: String,
    pub email: String,
    pub address: String,
    /// `DD-MM-YYYY`
    pub dob: String,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Raw registration input as typed by the administrator.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub phone: Option<String>,
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub email: String,
    pub address: String,
    /// `YYYY-MM-DD`
    pub dob: String,
    pub referral_code: Option<String>,
}

impl RegistrationForm {
    /// Validates the form and builds the request payload.
    ///
    /// # Errors
    /// `Validation` when passwords differ, the date of birth is missing or
    /// not `YYYY-MM-DD`, or a required field is empty.
    pub fn into_request(self, region: &str) -> Result<RegistrationRequest, AdminError> {
        if self.password != self.confirm_password {
            return Err(AdminError::validation("Passwords do not match"));
        }
        if self.dob.trim().is_empty() {
            return Err(AdminError::validation("Date of birth is required"));
        }
        if self.username.trim().is_empty() {
            return Err(AdminError::validation("Username is required"));
        }
        if self.password.is_empty() {
            return Err(AdminError::validation("Password is required"));
        }
        if self.email.trim().is_empty() {
            return Err(AdminError::validation("Email is required"));
        }

        let dob = format_dob_for_backend(&self.dob)?;
        let referral_code = self
            .referral_code
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty());

        Ok(RegistrationRequest {
            id: generate_user_id(),
            username: self.username.trim().to_string(),
            password: self.password,
            email: self.email.trim().to_string(),
            address: self.address.trim().to_string(),
            dob,
            region: region.to_string(),
            referral_code,
            phone: self.phone.filter(|p| !p.trim().is_empty()),
        })
    }
}

/// Converts `YYYY-MM-DD` to the backend's `DD-MM-YYYY`.
///
/// # Errors
/// `Validation` when the input is not a real calendar date.
pub fn format_dob_for_backend(dob: &str) -> Result<String, AdminError> {
    let date = NaiveDate::parse_from_str(dob.trim(), "%Y-%m-%d").map_err(|_| {
        AdminError::validation(format!("Date of birth '{dob}' must be YYYY-MM-DD"))
    })?;
    Ok(date.format("%d-%m-%Y").to_string())
}

/// Generates a client-side user id: `user_<base36 millis>_<5 base36 chars>`.
pub fn generate_user_id() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis());

    let random = uuid::Uuid::new_v4().as_u128();
    let suffix: String = to_base36(random).chars().rev().take(5).collect();

    format!("user_{}_{}", to_base36(millis), suffix)
}

fn to_base36(mut value: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}
