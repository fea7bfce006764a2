use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::validate::{max_len, required};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub description: String,
    pub base_price: f64,
    pub duration_minutes: i64,
    pub image: Option<String>,
    pub category: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Body of service create and update requests.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInput {
    pub name: String,
    pub description: String,
    pub base_price: f64,
    pub duration_minutes: i64,
    pub image: Option<String>,
    pub category: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ServiceInput {
    pub fn validate(self) -> Result<ServiceInput, AppError> {
        let name = required("name", &self.name)?;
        max_len("name", &name, 100)?;
        let description = required("description", &self.description)?;
        max_len("description", &description, 500)?;

        if !self.base_price.is_finite() || self.base_price < 0.0 {
            return Err(AppError::Validation("price cannot be negative".to_string()));
        }
        if self.duration_minutes < 0 {
            return Err(AppError::Validation("duration cannot be negative".to_string()));
        }

        Ok(ServiceInput {
            name,
            description,
            base_price: self.base_price,
            duration_minutes: self.duration_minutes,
            image: self.image.map(|i| i.trim().to_string()).filter(|i| !i.is_empty()),
            category: required("category", &self.category)?,
            is_active: self.is_active,
        })
    }
}
