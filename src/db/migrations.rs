use anyhow::Context;
use rusqlite::Connection;

/// Ordered schema migrations, applied once each and recorded in `_migrations`.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "001_catalog.sql",
        "CREATE TABLE services (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            base_price REAL NOT NULL CHECK (base_price >= 0),
            duration_minutes INTEGER NOT NULL CHECK (duration_minutes >= 0),
            image TEXT,
            category TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX idx_services_category ON services(category);
        CREATE INDEX idx_services_active ON services(is_active);

        CREATE TABLE locations (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            city TEXT NOT NULL,
            state TEXT NOT NULL,
            pin_code TEXT NOT NULL,
            latitude REAL CHECK (latitude IS NULL OR (latitude >= -90 AND latitude <= 90)),
            longitude REAL CHECK (longitude IS NULL OR (longitude >= -180 AND longitude <= 180)),
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX idx_locations_city_state ON locations(city, state);
        CREATE INDEX idx_locations_pin ON locations(pin_code);",
    ),
    (
        "002_bookings.sql",
        "CREATE TABLE bookings (
            id TEXT PRIMARY KEY,
            booking_id TEXT NOT NULL UNIQUE,
            customer_name TEXT NOT NULL,
            customer_email TEXT NOT NULL,
            customer_phone TEXT NOT NULL,
            car_brand TEXT NOT NULL,
            car_model TEXT NOT NULL,
            car_number TEXT NOT NULL,
            service_id TEXT NOT NULL,
            service_name TEXT NOT NULL,
            service_price REAL NOT NULL CHECK (service_price >= 0),
            schedule_date TEXT NOT NULL,
            schedule_time TEXT NOT NULL,
            address_street TEXT NOT NULL,
            address_city TEXT NOT NULL,
            address_pin_code TEXT NOT NULL,
            location_id TEXT,
            payment_method TEXT NOT NULL CHECK (payment_method IN ('online', 'cod')),
            razorpay_order_id TEXT,
            razorpay_payment_id TEXT,
            payment_amount REAL NOT NULL CHECK (payment_amount >= 0),
            payment_status TEXT NOT NULL CHECK (payment_status IN ('pending', 'completed', 'failed')),
            status TEXT NOT NULL CHECK (status IN ('pending', 'confirmed', 'in-progress', 'completed', 'cancelled')),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            CHECK (payment_method <> 'online' OR razorpay_order_id IS NOT NULL)
        );
        CREATE INDEX idx_bookings_email ON bookings(customer_email);
        CREATE INDEX idx_bookings_phone ON bookings(customer_phone);
        CREATE INDEX idx_bookings_status_created ON bookings(status, created_at DESC);
        CREATE INDEX idx_bookings_payment_status_created ON bookings(payment_status, created_at DESC);
        CREATE INDEX idx_bookings_schedule_date ON bookings(schedule_date);
        CREATE INDEX idx_bookings_created ON bookings(created_at DESC);

        CREATE TRIGGER bookings_snapshot_immutable
        BEFORE UPDATE OF booking_id, service_id, service_name, service_price ON bookings
        WHEN NEW.booking_id IS NOT OLD.booking_id
          OR NEW.service_id IS NOT OLD.service_id
          OR NEW.service_name IS NOT OLD.service_name
          OR NEW.service_price IS NOT OLD.service_price
        BEGIN
            SELECT RAISE(ABORT, 'booking id and service snapshot are immutable');
        END;

        CREATE TRIGGER bookings_payment_monotonic
        BEFORE UPDATE OF payment_status ON bookings
        WHEN OLD.payment_status = 'completed' AND NEW.payment_status <> 'completed'
        BEGIN
            SELECT RAISE(ABORT, 'completed payment cannot regress');
        END;",
    ),
];

pub fn run_migrations(conn: &Connection) -> anyhow::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .context("failed to create migrations table")?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM _migrations WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .context("failed to check migration status")?;

        if already_applied {
            continue;
        }

        conn.execute_batch(sql)
            .with_context(|| format!("failed to apply migration: {name}"))?;

        conn.execute("INSERT INTO _migrations (name) VALUES (?1)", [name])
            .with_context(|| format!("failed to record migration: {name}"))?;

        tracing::info!("applied migration: {name}");
    }

    Ok(())
}
