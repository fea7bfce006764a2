use chrono::{NaiveDate, NaiveDateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::validate::{is_valid_email, is_ten_digit_phone, required};

const BOOKING_ID_PREFIX: &str = "BK";
const BOOKING_ID_RANDOM_LEN: usize = 8;
const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: String,
    pub booking_id: String,
    pub customer: Customer,
    pub car: Car,
    pub service: ServiceSnapshot,
    pub schedule: Schedule,
    pub address: Address,
    pub payment: Payment,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Car {
    pub brand: String,
    pub model: String,
    pub registration_number: String,
}

/// Service name and price as they were when the booking was made.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceSnapshot {
    pub service_id: String,
    pub name: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    pub date: NaiveDate,
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub pin_code: String,
    pub location_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Payment {
    pub method: PaymentMethod,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub amount: f64,
    pub status: PaymentStatus,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Online,
    Cod,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Online => "online",
            PaymentMethod::Cod => "cod",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "online" => Some(PaymentMethod::Online),
            "cod" => Some(PaymentMethod::Cod),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 5] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::InProgress,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in-progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

/// Public booking reference: `BK` + base36 millisecond timestamp + random base36 suffix.
pub fn generate_booking_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..BOOKING_ID_RANDOM_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{BOOKING_ID_PREFIX}{}{suffix}", to_base36(millis))
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

// ── Request schema ──

#[derive(Debug, Clone, Deserialize)]
pub struct BookingRequest {
    pub customer: CustomerInput,
    pub car: CarInput,
    pub service: ServiceInput,
    pub schedule: ScheduleInput,
    pub address: AddressInput,
    pub payment: PaymentInput,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomerInput {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CarInput {
    pub brand: String,
    pub model: String,
    pub registration_number: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInput {
    pub service_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleInput {
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressInput {
    pub street: String,
    pub city: String,
    pub pin_code: String,
    pub location_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentInput {
    pub amount: f64,
}

/// A booking request that passed validation; fields are trimmed and normalized.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer: Customer,
    pub car: Car,
    pub service: ServiceSnapshot,
    pub schedule: Schedule,
    pub address: Address,
    pub amount: f64,
}

impl BookingRequest {
    pub fn validate(self) -> Result<NewBooking, AppError> {
        let email = required("customer.email", &self.customer.email)?.to_lowercase();
        if !is_valid_email(&email) {
            return Err(AppError::Validation("please enter a valid email".to_string()));
        }
        let phone = required("customer.phone", &self.customer.phone)?;
        if !is_ten_digit_phone(&phone) {
            return Err(AppError::Validation(
                "please enter a valid 10-digit phone number".to_string(),
            ));
        }

        let amount = self.payment.amount;
        if !amount.is_finite() || amount <= 0.0 {
            return Err(AppError::Validation(
                "payment.amount must be a positive value".to_string(),
            ));
        }

        let date_str = required("schedule.date", &self.schedule.date)?;
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|_| {
            AppError::Validation(format!("schedule.date must be YYYY-MM-DD, got {date_str}"))
        })?;

        let location_id = self
            .address
            .location_id
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        Ok(NewBooking {
            customer: Customer {
                name: required("customer.name", &self.customer.name)?,
                email,
                phone,
            },
            car: Car {
                brand: required("car.brand", &self.car.brand)?,
                model: required("car.model", &self.car.model)?,
                registration_number: required(
                    "car.registration_number",
                    &self.car.registration_number,
                )?
                .to_uppercase(),
            },
            service: ServiceSnapshot {
                service_id: required("service.service_id", &self.service.service_id)?,
                name: required("service.name", &self.service.name)?,
                price: amount,
            },
            schedule: Schedule {
                date,
                time: required("schedule.time", &self.schedule.time)?,
            },
            address: Address {
                street: required("address.street", &self.address.street)?,
                city: required("address.city", &self.address.city)?,
                pin_code: required("address.pin_code", &self.address.pin_code)?,
                location_id,
            },
            amount,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn request() -> BookingRequest {
        serde_json::from_value(serde_json::json!({
            "customer": {"name": " Asha ", "email": "Asha@Example.com", "phone": "9876543210"},
            "car": {"brand": "Maruti", "model": "Swift", "registration_number": "ka01ab1234"},
            "service": {"service_id": "svc-1", "name": "Full Service"},
            "schedule": {"date": "2025-06-16", "time": "10:00 AM"},
            "address": {"street": "12 MG Road", "city": "Bengaluru", "pin_code": "560001"},
            "payment": {"amount": 499.0}
        }))
        .unwrap()
    }

    #[test]
    fn test_validate_normalizes_fields() {
        let booking = request().validate().unwrap();
        assert_eq!(booking.customer.name, "Asha");
        assert_eq!(booking.customer.email, "asha@example.com");
        assert_eq!(booking.car.registration_number, "KA01AB1234");
        assert_eq!(booking.service.price, 499.0);
        assert_eq!(booking.schedule.date, NaiveDate::from_ymd_opt(2025, 6, 16).unwrap());
        assert_eq!(booking.address.location_id, None);
    }

    #[test]
    fn test_validate_rejects_bad_phone() {
        let mut req = request();
        req.customer.phone = "98765".to_string();
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));

        let mut req = request();
        req.customer.phone = "98765abcde".to_string();
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_bad_email() {
        let mut req = request();
        req.customer.email = "not-an-email".to_string();
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_non_positive_amount() {
        for amount in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let mut req = request();
            req.payment.amount = amount;
            assert!(matches!(req.validate(), Err(AppError::Validation(_))), "{amount}");
        }
    }

    #[test]
    fn test_validate_rejects_blank_required_field() {
        let mut req = request();
        req.car.brand = "   ".to_string();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("car.brand"));
    }

    #[test]
    fn test_validate_rejects_bad_date() {
        let mut req = request();
        req.schedule.date = "16/06/2025".to_string();
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_booking_status_parse() {
        for status in BookingStatus::ALL {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("in-progress"), Some(BookingStatus::InProgress));
        assert_eq!(BookingStatus::parse("shipped"), None);
    }

    #[test]
    fn test_booking_status_serde_matches_as_str() {
        let json = serde_json::to_string(&BookingStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
    }

    #[test]
    fn test_booking_id_format() {
        let id = generate_booking_id();
        assert!(id.starts_with("BK"));
        assert_eq!(id, id.to_uppercase());
        assert!(id[2..].chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(id.len() > 2 + BOOKING_ID_RANDOM_LEN);
    }

    #[test]
    fn test_booking_ids_unique_across_rapid_generation() {
        let ids: HashSet<String> = (0..10_000).map(|_| generate_booking_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
    }
}
