use serde::Deserialize;

use crate::errors::AppError;
use crate::models::validate::required;

#[derive(Debug, Clone, Deserialize)]
pub struct ContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub message: String,
}

impl ContactMessage {
    pub fn validate(self) -> Result<ContactMessage, AppError> {
        let all_present = [&self.name, &self.email, &self.phone, &self.message]
            .iter()
            .all(|v| !v.trim().is_empty());
        if !all_present {
            return Err(AppError::Validation("all fields are required".to_string()));
        }
        Ok(ContactMessage {
            name: required("name", &self.name)?,
            email: required("email", &self.email)?,
            phone: required("phone", &self.phone)?,
            message: required("message", &self.message)?,
        })
    }
}
