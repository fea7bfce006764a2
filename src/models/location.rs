use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::validate::{is_six_digit_pin, max_len, required};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub city: String,
    pub state: String,
    pub pin_code: String,
    pub coordinates: Option<Coordinates>,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationInput {
    pub name: String,
    pub city: String,
    pub state: String,
    pub pin_code: String,
    pub coordinates: Option<Coordinates>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl LocationInput {
    pub fn validate(self) -> Result<LocationInput, AppError> {
        let name = required("name", &self.name)?;
        max_len("name", &name, 100)?;

        let pin_code = required("pin_code", &self.pin_code)?;
        if !is_six_digit_pin(&pin_code) {
            return Err(AppError::Validation(
                "please enter a valid 6-digit PIN code".to_string(),
            ));
        }

        if let Some(c) = &self.coordinates {
            if !(-90.0..=90.0).contains(&c.latitude) {
                return Err(AppError::Validation(
                    "latitude must be between -90 and 90".to_string(),
                ));
            }
            if !(-180.0..=180.0).contains(&c.longitude) {
                return Err(AppError::Validation(
                    "longitude must be between -180 and 180".to_string(),
                ));
            }
        }

        Ok(LocationInput {
            name,
            city: required("city", &self.city)?,
            state: required("state", &self.state)?,
            pin_code,
            coordinates: self.coordinates,
            is_active: self.is_active,
        })
    }
}
