use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::models::{
    Address, Booking, BookingStatus, Car, Coordinates, Customer, Location, LocationInput, Payment,
    PaymentMethod, PaymentStatus, Schedule, Service, ServiceInput, ServiceSnapshot,
};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn fmt_ts(ts: &NaiveDateTime) -> String {
    ts.format(TS_FORMAT).to_string()
}

fn parse_ts(s: &str) -> anyhow::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TS_FORMAT).with_context(|| format!("bad timestamp: {s}"))
}

// ── Services ──

const SERVICE_COLUMNS: &str = "id, name, description, base_price, duration_minutes, image, category, is_active, created_at, updated_at";

pub fn insert_service(conn: &Connection, input: &ServiceInput) -> anyhow::Result<Service> {
    let ts = now();
    let service = Service {
        id: uuid::Uuid::new_v4().to_string(),
        name: input.name.clone(),
        description: input.description.clone(),
        base_price: input.base_price,
        duration_minutes: input.duration_minutes,
        image: input.image.clone(),
        category: input.category.clone(),
        is_active: input.is_active,
        created_at: ts,
        updated_at: ts,
    };

    conn.execute(
        "INSERT INTO services (id, name, description, base_price, duration_minutes, image, category, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            service.id,
            service.name,
            service.description,
            service.base_price,
            service.duration_minutes,
            service.image,
            service.category,
            service.is_active,
            fmt_ts(&service.created_at),
            fmt_ts(&service.updated_at),
        ],
    )?;
    Ok(service)
}

pub fn get_service(conn: &Connection, id: &str) -> anyhow::Result<Option<Service>> {
    let result = conn
        .query_row(
            &format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?1"),
            params![id],
            |row| Ok(parse_service_row(row)),
        )
        .optional()?;
    result.transpose()
}

pub fn list_services(
    conn: &Connection,
    category: Option<&str>,
    is_active: Option<bool>,
) -> anyhow::Result<Vec<Service>> {
    let mut conditions = vec![];
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(category) = category {
        params_vec.push(Box::new(category.to_string()));
        conditions.push(format!("category = ?{}", params_vec.len()));
    }
    if let Some(active) = is_active {
        params_vec.push(Box::new(active));
        conditions.push(format!("is_active = ?{}", params_vec.len()));
    }

    let sql = format!(
        "SELECT {SERVICE_COLUMNS} FROM services{} ORDER BY created_at DESC, rowid DESC",
        where_clause(&conditions)
    );
    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_service_row(row)))?;

    let mut services = vec![];
    for row in rows {
        services.push(row??);
    }
    Ok(services)
}

pub fn update_service(
    conn: &Connection,
    id: &str,
    input: &ServiceInput,
) -> anyhow::Result<Option<Service>> {
    let count = conn.execute(
        "UPDATE services SET name = ?1, description = ?2, base_price = ?3, duration_minutes = ?4,
                image = ?5, category = ?6, is_active = ?7, updated_at = ?8
         WHERE id = ?9",
        params![
            input.name,
            input.description,
            input.base_price,
            input.duration_minutes,
            input.image,
            input.category,
            input.is_active,
            fmt_ts(&now()),
            id,
        ],
    )?;
    if count == 0 {
        return Ok(None);
    }
    get_service(conn, id)
}

pub fn delete_service(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM services WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_service_row(row: &rusqlite::Row) -> anyhow::Result<Service> {
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;
    Ok(Service {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        base_price: row.get(3)?,
        duration_minutes: row.get(4)?,
        image: row.get(5)?,
        category: row.get(6)?,
        is_active: row.get(7)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

// ── Locations ──

const LOCATION_COLUMNS: &str = "id, name, city, state, pin_code, latitude, longitude, is_active, created_at, updated_at";

pub fn insert_location(conn: &Connection, input: &LocationInput) -> anyhow::Result<Location> {
    let ts = now();
    let location = Location {
        id: uuid::Uuid::new_v4().to_string(),
        name: input.name.clone(),
        city: input.city.clone(),
        state: input.state.clone(),
        pin_code: input.pin_code.clone(),
        coordinates: input.coordinates,
        is_active: input.is_active,
        created_at: ts,
        updated_at: ts,
    };

    conn.execute(
        "INSERT INTO locations (id, name, city, state, pin_code, latitude, longitude, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            location.id,
            location.name,
            location.city,
            location.state,
            location.pin_code,
            location.coordinates.map(|c| c.latitude),
            location.coordinates.map(|c| c.longitude),
            location.is_active,
            fmt_ts(&location.created_at),
            fmt_ts(&location.updated_at),
        ],
    )?;
    Ok(location)
}

pub fn get_location(conn: &Connection, id: &str) -> anyhow::Result<Option<Location>> {
    let result = conn
        .query_row(
            &format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE id = ?1"),
            params![id],
            |row| Ok(parse_location_row(row)),
        )
        .optional()?;
    result.transpose()
}

pub fn list_locations(conn: &Connection, is_active: Option<bool>) -> anyhow::Result<Vec<Location>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match is_active {
        Some(active) => (
            format!("SELECT {LOCATION_COLUMNS} FROM locations WHERE is_active = ?1 ORDER BY city ASC, name ASC"),
            vec![Box::new(active) as Box<dyn rusqlite::types::ToSql>],
        ),
        None => (
            format!("SELECT {LOCATION_COLUMNS} FROM locations ORDER BY city ASC, name ASC"),
            vec![],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_location_row(row)))?;

    let mut locations = vec![];
    for row in rows {
        locations.push(row??);
    }
    Ok(locations)
}

pub fn update_location(
    conn: &Connection,
    id: &str,
    input: &LocationInput,
) -> anyhow::Result<Option<Location>> {
    let count = conn.execute(
        "UPDATE locations SET name = ?1, city = ?2, state = ?3, pin_code = ?4, latitude = ?5,
                longitude = ?6, is_active = ?7, updated_at = ?8
         WHERE id = ?9",
        params![
            input.name,
            input.city,
            input.state,
            input.pin_code,
            input.coordinates.map(|c| c.latitude),
            input.coordinates.map(|c| c.longitude),
            input.is_active,
            fmt_ts(&now()),
            id,
        ],
    )?;
    if count == 0 {
        return Ok(None);
    }
    get_location(conn, id)
}

pub fn delete_location(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM locations WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_location_row(row: &rusqlite::Row) -> anyhow::Result<Location> {
    let latitude: Option<f64> = row.get(5)?;
    let longitude: Option<f64> = row.get(6)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;
    Ok(Location {
        id: row.get(0)?,
        name: row.get(1)?,
        city: row.get(2)?,
        state: row.get(3)?,
        pin_code: row.get(4)?,
        coordinates: latitude
            .zip(longitude)
            .map(|(latitude, longitude)| Coordinates { latitude, longitude }),
        is_active: row.get(7)?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, booking_id, customer_name, customer_email, customer_phone, car_brand, car_model, car_number, \
     service_id, service_name, service_price, schedule_date, schedule_time, address_street, address_city, address_pin_code, \
     location_id, payment_method, razorpay_order_id, razorpay_payment_id, payment_amount, payment_status, status, created_at, updated_at";

/// Fails with a UNIQUE constraint error when `booking_id` is already taken.
pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, booking_id, customer_name, customer_email, customer_phone, car_brand, car_model, car_number,
             service_id, service_name, service_price, schedule_date, schedule_time, address_street, address_city, address_pin_code,
             location_id, payment_method, razorpay_order_id, razorpay_payment_id, payment_amount, payment_status, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25)",
        params![
            booking.id,
            booking.booking_id,
            booking.customer.name,
            booking.customer.email,
            booking.customer.phone,
            booking.car.brand,
            booking.car.model,
            booking.car.registration_number,
            booking.service.service_id,
            booking.service.name,
            booking.service.price,
            booking.schedule.date.format("%Y-%m-%d").to_string(),
            booking.schedule.time,
            booking.address.street,
            booking.address.city,
            booking.address.pin_code,
            booking.address.location_id,
            booking.payment.method.as_str(),
            booking.payment.razorpay_order_id,
            booking.payment.razorpay_payment_id,
            booking.payment.amount,
            booking.payment.status.as_str(),
            booking.status.as_str(),
            fmt_ts(&booking.created_at),
            fmt_ts(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;
    result.transpose()
}

pub fn get_booking_by_public_id(
    conn: &Connection,
    booking_id: &str,
) -> anyhow::Result<Option<Booking>> {
    let result = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = ?1"),
            params![booking_id],
            |row| Ok(parse_booking_row(row)),
        )
        .optional()?;
    result.transpose()
}

#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub status: Option<BookingStatus>,
    pub created_from: Option<NaiveDateTime>,
    pub created_to: Option<NaiveDateTime>,
}

pub fn list_bookings(conn: &Connection, filter: &BookingFilter) -> anyhow::Result<Vec<Booking>> {
    let mut conditions = vec![];
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(status) = filter.status {
        params_vec.push(Box::new(status.as_str()));
        conditions.push(format!("status = ?{}", params_vec.len()));
    }
    if let Some(from) = &filter.created_from {
        params_vec.push(Box::new(fmt_ts(from)));
        conditions.push(format!("created_at >= ?{}", params_vec.len()));
    }
    if let Some(to) = &filter.created_to {
        params_vec.push(Box::new(fmt_ts(to)));
        conditions.push(format!("created_at <= ?{}", params_vec.len()));
    }

    let sql = format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings{} ORDER BY created_at DESC, rowid DESC",
        where_clause(&conditions)
    );
    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Outcome of a payment-driven state transition on a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentTransition {
    Applied,
    /// The payment was already completed; nothing was written.
    AlreadyCompleted,
    /// The booking is `completed` or `cancelled`; only an admin override may move it.
    BookingClosed,
    NotFound,
}

/// Moves a booking to `(confirmed, completed)` and records the gateway payment id.
/// A booking whose payment is already completed, or that is closed, is left untouched.
pub fn mark_payment_completed(
    conn: &Connection,
    booking_id: &str,
    payment_id: &str,
) -> anyhow::Result<PaymentTransition> {
    let count = conn.execute(
        "UPDATE bookings SET razorpay_payment_id = ?1, payment_status = 'completed', status = 'confirmed', updated_at = ?2
         WHERE booking_id = ?3 AND payment_status <> 'completed'
           AND status NOT IN ('completed', 'cancelled')",
        params![payment_id, fmt_ts(&now()), booking_id],
    )?;
    transition_outcome(conn, booking_id, count)
}

/// Moves a booking to `(cancelled, failed)` unless its payment already completed or it is closed.
pub fn mark_payment_failed(conn: &Connection, booking_id: &str) -> anyhow::Result<PaymentTransition> {
    let count = conn.execute(
        "UPDATE bookings SET payment_status = 'failed', status = 'cancelled', updated_at = ?1
         WHERE booking_id = ?2 AND payment_status <> 'completed'
           AND status NOT IN ('completed', 'cancelled')",
        params![fmt_ts(&now()), booking_id],
    )?;
    transition_outcome(conn, booking_id, count)
}

fn transition_outcome(
    conn: &Connection,
    booking_id: &str,
    updated: usize,
) -> anyhow::Result<PaymentTransition> {
    if updated > 0 {
        return Ok(PaymentTransition::Applied);
    }
    let payment_status: Option<String> = conn
        .query_row(
            "SELECT payment_status FROM bookings WHERE booking_id = ?1",
            params![booking_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(match payment_status.as_deref() {
        None => PaymentTransition::NotFound,
        Some(s) if s == PaymentStatus::Completed.as_str() => PaymentTransition::AlreadyCompleted,
        Some(_) => PaymentTransition::BookingClosed,
    })
}

/// Replaces the booking-level status only; payment fields are not touched.
pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<Option<Booking>> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), fmt_ts(&now()), id],
    )?;
    if count == 0 {
        return Ok(None);
    }
    get_booking_by_id(conn, id)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let schedule_date: String = row.get(11)?;
    let payment_method: String = row.get(17)?;
    let payment_status: String = row.get(21)?;
    let status: String = row.get(22)?;
    let created_at: String = row.get(23)?;
    let updated_at: String = row.get(24)?;

    Ok(Booking {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        customer: Customer {
            name: row.get(2)?,
            email: row.get(3)?,
            phone: row.get(4)?,
        },
        car: Car {
            brand: row.get(5)?,
            model: row.get(6)?,
            registration_number: row.get(7)?,
        },
        service: ServiceSnapshot {
            service_id: row.get(8)?,
            name: row.get(9)?,
            price: row.get(10)?,
        },
        schedule: Schedule {
            date: NaiveDate::parse_from_str(&schedule_date, "%Y-%m-%d")
                .with_context(|| format!("bad schedule date: {schedule_date}"))?,
            time: row.get(12)?,
        },
        address: Address {
            street: row.get(13)?,
            city: row.get(14)?,
            pin_code: row.get(15)?,
            location_id: row.get(16)?,
        },
        payment: Payment {
            method: PaymentMethod::parse(&payment_method)
                .with_context(|| format!("unknown payment method: {payment_method}"))?,
            razorpay_order_id: row.get(18)?,
            razorpay_payment_id: row.get(19)?,
            amount: row.get(20)?,
            status: PaymentStatus::parse(&payment_status)
                .with_context(|| format!("unknown payment status: {payment_status}"))?,
        },
        status: BookingStatus::parse(&status)
            .with_context(|| format!("unknown booking status: {status}"))?,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

fn where_clause(conditions: &[String]) -> String {
    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

// ── Dashboard ──

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_bookings: i64,
    pub total_revenue: f64,
    pub bookings_by_status: Vec<StatusCount>,
    pub popular_services: Vec<ServiceStat>,
    pub recent_bookings: Vec<RecentBooking>,
    pub location_stats: Vec<CityCount>,
}

#[derive(Debug, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct ServiceStat {
    pub service_id: String,
    pub name: String,
    pub count: i64,
    pub revenue: f64,
}

#[derive(Debug, Serialize)]
pub struct RecentBooking {
    pub booking_id: String,
    pub customer_name: String,
    pub service_name: String,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct CityCount {
    pub city: String,
    pub count: i64,
}

pub fn get_dashboard_stats(conn: &Connection) -> anyhow::Result<DashboardStats> {
    let total_bookings: i64 =
        conn.query_row("SELECT COUNT(*) FROM bookings", [], |row| row.get(0))?;

    let total_revenue: f64 = conn.query_row(
        "SELECT COALESCE(SUM(payment_amount), 0.0) FROM bookings WHERE payment_status = 'completed'",
        [],
        |row| row.get(0),
    )?;

    let mut stmt =
        conn.prepare("SELECT status, COUNT(*) FROM bookings GROUP BY status ORDER BY status")?;
    let bookings_by_status = stmt
        .query_map([], |row| {
            Ok(StatusCount {
                status: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT service_id, MIN(service_name), COUNT(*) AS n, COALESCE(SUM(service_price), 0.0)
         FROM bookings GROUP BY service_id ORDER BY n DESC, service_id ASC LIMIT 5",
    )?;
    let popular_services = stmt
        .query_map([], |row| {
            Ok(ServiceStat {
                service_id: row.get(0)?,
                name: row.get(1)?,
                count: row.get(2)?,
                revenue: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT booking_id, customer_name, service_name, status, created_at
         FROM bookings ORDER BY created_at DESC, rowid DESC LIMIT 10",
    )?;
    let recent_bookings = stmt
        .query_map([], |row| {
            Ok(RecentBooking {
                booking_id: row.get(0)?,
                customer_name: row.get(1)?,
                service_name: row.get(2)?,
                status: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut stmt = conn.prepare(
        "SELECT address_city, COUNT(*) AS n FROM bookings
         GROUP BY address_city ORDER BY n DESC, address_city ASC LIMIT 5",
    )?;
    let location_stats = stmt
        .query_map([], |row| {
            Ok(CityCount {
                city: row.get(0)?,
                count: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DashboardStats {
        total_bookings,
        total_revenue,
        bookings_by_status,
        popular_services,
        recent_bookings,
        location_stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::booking::generate_booking_id;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn booking(method: PaymentMethod, status: BookingStatus) -> Booking {
        let ts = now();
        Booking {
            id: uuid::Uuid::new_v4().to_string(),
            booking_id: generate_booking_id(),
            customer: Customer {
                name: "Asha".to_string(),
                email: "asha@example.com".to_string(),
                phone: "9876543210".to_string(),
            },
            car: Car {
                brand: "Maruti".to_string(),
                model: "Swift".to_string(),
                registration_number: "KA01AB1234".to_string(),
            },
            service: ServiceSnapshot {
                service_id: "svc-1".to_string(),
                name: "Full Service".to_string(),
                price: 499.0,
            },
            schedule: Schedule {
                date: NaiveDate::from_ymd_opt(2025, 6, 16).unwrap(),
                time: "10:00".to_string(),
            },
            address: Address {
                street: "12 MG Road".to_string(),
                city: "Bengaluru".to_string(),
                pin_code: "560001".to_string(),
                location_id: None,
            },
            payment: Payment {
                method,
                razorpay_order_id: match method {
                    PaymentMethod::Online => Some("order_test".to_string()),
                    PaymentMethod::Cod => None,
                },
                razorpay_payment_id: None,
                amount: 499.0,
                status: PaymentStatus::Pending,
            },
            status,
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_insert_and_fetch_booking() {
        let conn = setup_db();
        let b = booking(PaymentMethod::Online, BookingStatus::Pending);
        insert_booking(&conn, &b).unwrap();

        let by_id = get_booking_by_id(&conn, &b.id).unwrap().unwrap();
        let by_public = get_booking_by_public_id(&conn, &b.booking_id).unwrap().unwrap();
        assert_eq!(by_id, by_public);
        assert_eq!(by_id.booking_id, b.booking_id);
        assert_eq!(by_id.payment.razorpay_order_id.as_deref(), Some("order_test"));
    }

    #[test]
    fn test_duplicate_booking_id_rejected() {
        let conn = setup_db();
        let first = booking(PaymentMethod::Cod, BookingStatus::Confirmed);
        insert_booking(&conn, &first).unwrap();

        let mut second = booking(PaymentMethod::Cod, BookingStatus::Confirmed);
        second.booking_id = first.booking_id.clone();
        let err = insert_booking(&conn, &second).unwrap_err();
        let app_err = crate::errors::AppError::from(err);
        assert!(matches!(app_err, crate::errors::AppError::Conflict(_)));

        let stored = get_booking_by_public_id(&conn, &first.booking_id).unwrap().unwrap();
        assert_eq!(stored.id, first.id);
    }

    #[test]
    fn test_online_booking_requires_order_id() {
        let conn = setup_db();
        let mut b = booking(PaymentMethod::Online, BookingStatus::Pending);
        b.payment.razorpay_order_id = None;
        assert!(insert_booking(&conn, &b).is_err());
    }

    #[test]
    fn test_mark_payment_completed_is_monotonic() {
        let conn = setup_db();
        let b = booking(PaymentMethod::Online, BookingStatus::Pending);
        insert_booking(&conn, &b).unwrap();

        assert_eq!(
            mark_payment_completed(&conn, &b.booking_id, "pay_1").unwrap(),
            PaymentTransition::Applied
        );
        assert_eq!(
            mark_payment_completed(&conn, &b.booking_id, "pay_1").unwrap(),
            PaymentTransition::AlreadyCompleted
        );
        assert_eq!(
            mark_payment_failed(&conn, &b.booking_id).unwrap(),
            PaymentTransition::AlreadyCompleted
        );

        let stored = get_booking_by_public_id(&conn, &b.booking_id).unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Confirmed);
        assert_eq!(stored.payment.status, PaymentStatus::Completed);
        assert_eq!(stored.payment.razorpay_payment_id.as_deref(), Some("pay_1"));
    }

    #[test]
    fn test_closed_booking_ignores_payment_transitions() {
        let conn = setup_db();
        let cod = booking(PaymentMethod::Cod, BookingStatus::Confirmed);
        insert_booking(&conn, &cod).unwrap();
        update_booking_status(&conn, &cod.id, BookingStatus::Completed).unwrap();

        assert_eq!(
            mark_payment_failed(&conn, &cod.booking_id).unwrap(),
            PaymentTransition::BookingClosed
        );
        let stored = get_booking_by_public_id(&conn, &cod.booking_id).unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Completed);
        assert_eq!(stored.payment.status, PaymentStatus::Pending);

        let online = booking(PaymentMethod::Online, BookingStatus::Pending);
        insert_booking(&conn, &online).unwrap();
        assert_eq!(
            mark_payment_failed(&conn, &online.booking_id).unwrap(),
            PaymentTransition::Applied
        );
        assert_eq!(
            mark_payment_completed(&conn, &online.booking_id, "pay_late").unwrap(),
            PaymentTransition::BookingClosed
        );
        let stored = get_booking_by_public_id(&conn, &online.booking_id).unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
        assert_eq!(stored.payment.status, PaymentStatus::Failed);
        assert!(stored.payment.razorpay_payment_id.is_none());
    }

    #[test]
    fn test_mark_payment_unknown_booking() {
        let conn = setup_db();
        assert_eq!(
            mark_payment_completed(&conn, "BKNOPE", "pay_1").unwrap(),
            PaymentTransition::NotFound
        );
        assert_eq!(
            mark_payment_failed(&conn, "BKNOPE").unwrap(),
            PaymentTransition::NotFound
        );
    }

    #[test]
    fn test_completed_payment_cannot_be_regressed_directly() {
        let conn = setup_db();
        let b = booking(PaymentMethod::Online, BookingStatus::Pending);
        insert_booking(&conn, &b).unwrap();
        mark_payment_completed(&conn, &b.booking_id, "pay_1").unwrap();

        let result = conn.execute(
            "UPDATE bookings SET payment_status = 'pending' WHERE booking_id = ?1",
            params![b.booking_id],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_service_snapshot_cannot_be_rewritten() {
        let conn = setup_db();
        let b = booking(PaymentMethod::Cod, BookingStatus::Confirmed);
        insert_booking(&conn, &b).unwrap();

        let result = conn.execute(
            "UPDATE bookings SET service_price = 1.0 WHERE id = ?1",
            params![b.id],
        );
        assert!(result.is_err());
        let result = conn.execute(
            "UPDATE bookings SET booking_id = 'BKOTHER' WHERE id = ?1",
            params![b.id],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_status_override_leaves_payment_alone() {
        let conn = setup_db();
        let b = booking(PaymentMethod::Online, BookingStatus::Pending);
        insert_booking(&conn, &b).unwrap();
        mark_payment_completed(&conn, &b.booking_id, "pay_1").unwrap();

        let updated = update_booking_status(&conn, &b.id, BookingStatus::Cancelled)
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, BookingStatus::Cancelled);
        assert_eq!(updated.payment.status, PaymentStatus::Completed);

        assert!(update_booking_status(&conn, "missing", BookingStatus::Completed)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_list_bookings_filters_by_status() {
        let conn = setup_db();
        insert_booking(&conn, &booking(PaymentMethod::Online, BookingStatus::Pending)).unwrap();
        insert_booking(&conn, &booking(PaymentMethod::Cod, BookingStatus::Confirmed)).unwrap();
        insert_booking(&conn, &booking(PaymentMethod::Cod, BookingStatus::Confirmed)).unwrap();

        let all = list_bookings(&conn, &BookingFilter::default()).unwrap();
        assert_eq!(all.len(), 3);

        let confirmed = list_bookings(
            &conn,
            &BookingFilter {
                status: Some(BookingStatus::Confirmed),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(confirmed.len(), 2);
        assert!(confirmed.iter().all(|b| b.status == BookingStatus::Confirmed));

        let future = list_bookings(
            &conn,
            &BookingFilter {
                created_from: Some(now() + chrono::Duration::days(1)),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(future.is_empty());
    }

    #[test]
    fn test_service_crud() {
        let conn = setup_db();
        let input = ServiceInput {
            name: "Wash".to_string(),
            description: "Exterior wash".to_string(),
            base_price: 99.0,
            duration_minutes: 30,
            image: None,
            category: "cleaning".to_string(),
            is_active: true,
        };
        let svc = insert_service(&conn, &input).unwrap();
        assert_eq!(get_service(&conn, &svc.id).unwrap().unwrap().name, "Wash");

        let mut changed = input.clone();
        changed.base_price = 149.0;
        changed.is_active = false;
        let updated = update_service(&conn, &svc.id, &changed).unwrap().unwrap();
        assert_eq!(updated.base_price, 149.0);

        assert_eq!(list_services(&conn, Some("cleaning"), None).unwrap().len(), 1);
        assert!(list_services(&conn, None, Some(true)).unwrap().is_empty());
        assert!(update_service(&conn, "missing", &input).unwrap().is_none());

        assert!(delete_service(&conn, &svc.id).unwrap());
        assert!(!delete_service(&conn, &svc.id).unwrap());
    }

    #[test]
    fn test_location_crud_and_ordering() {
        let conn = setup_db();
        for (name, city) in [("Andheri", "Mumbai"), ("Koramangala", "Bengaluru")] {
            insert_location(
                &conn,
                &LocationInput {
                    name: name.to_string(),
                    city: city.to_string(),
                    state: "X".to_string(),
                    pin_code: "400053".to_string(),
                    coordinates: Some(Coordinates {
                        latitude: 19.1,
                        longitude: 72.8,
                    }),
                    is_active: true,
                },
            )
            .unwrap();
        }

        let all = list_locations(&conn, None).unwrap();
        assert_eq!(all[0].city, "Bengaluru");
        assert_eq!(all[1].city, "Mumbai");
        assert_eq!(all[0].coordinates.unwrap().latitude, 19.1);
        assert_eq!(list_locations(&conn, Some(false)).unwrap().len(), 0);
    }

    #[test]
    fn test_dashboard_stats() {
        let conn = setup_db();
        let online = booking(PaymentMethod::Online, BookingStatus::Pending);
        insert_booking(&conn, &online).unwrap();
        insert_booking(&conn, &booking(PaymentMethod::Cod, BookingStatus::Confirmed)).unwrap();
        mark_payment_completed(&conn, &online.booking_id, "pay_1").unwrap();

        let stats = get_dashboard_stats(&conn).unwrap();
        assert_eq!(stats.total_bookings, 2);
        assert_eq!(stats.total_revenue, 499.0);
        assert_eq!(stats.bookings_by_status.len(), 1);
        assert_eq!(stats.bookings_by_status[0].status, "confirmed");
        assert_eq!(stats.bookings_by_status[0].count, 2);
        assert_eq!(stats.popular_services[0].count, 2);
        assert_eq!(stats.popular_services[0].revenue, 998.0);
        assert_eq!(stats.recent_bookings.len(), 2);
        assert_eq!(stats.location_stats[0].city, "Bengaluru");
    }
}
