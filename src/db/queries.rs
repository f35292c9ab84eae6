use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::models::{
    hhmm, Booking, BookingStatus, Client, Package, Payment, PaymentMethod, PaymentType, Venue,
};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

fn fmt_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DATETIME_FORMAT).to_string()
}

fn fmt_date(d: &NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

fn parse_date(s: Option<String>) -> anyhow::Result<Option<NaiveDate>> {
    match s.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Ok(Some(NaiveDate::parse_from_str(s, DATE_FORMAT)?)),
    }
}

fn parse_decimal(s: &str) -> anyhow::Result<Decimal> {
    s.parse::<Decimal>()
        .map_err(|e| anyhow::anyhow!("invalid amount {s:?}: {e}"))
}

// ── Clients ──

pub fn create_client(conn: &Connection, client: &Client) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO clients (id, tenant_id, name, email, phone, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            client.id,
            client.tenant_id,
            client.name,
            client.email,
            client.phone,
            client.notes,
            fmt_datetime(&client.created_at),
        ],
    )?;
    Ok(())
}

fn parse_client_row(row: &rusqlite::Row) -> rusqlite::Result<Client> {
    let created_at: String = row.get(6)?;
    Ok(Client {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        notes: row.get(5)?,
        created_at: parse_datetime(&created_at),
    })
}

pub fn list_clients(conn: &Connection, tenant_id: &str) -> anyhow::Result<Vec<Client>> {
    let mut stmt = conn.prepare(
        "SELECT id, tenant_id, name, email, phone, notes, created_at
         FROM clients WHERE tenant_id = ?1 ORDER BY name COLLATE NOCASE ASC",
    )?;
    let rows = stmt.query_map(params![tenant_id], parse_client_row)?;

    let mut clients = vec![];
    for row in rows {
        clients.push(row?);
    }
    Ok(clients)
}

pub fn get_client(conn: &Connection, tenant_id: &str, id: &str) -> anyhow::Result<Option<Client>> {
    let client = conn
        .query_row(
            "SELECT id, tenant_id, name, email, phone, notes, created_at
             FROM clients WHERE tenant_id = ?1 AND id = ?2",
            params![tenant_id, id],
            parse_client_row,
        )
        .optional()?;
    Ok(client)
}

pub fn update_client(conn: &Connection, client: &Client) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE clients SET name = ?1, email = ?2, phone = ?3, notes = ?4
         WHERE tenant_id = ?5 AND id = ?6",
        params![
            client.name,
            client.email,
            client.phone,
            client.notes,
            client.tenant_id,
            client.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_client(conn: &Connection, tenant_id: &str, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM clients WHERE tenant_id = ?1 AND id = ?2",
        params![tenant_id, id],
    )?;
    Ok(count > 0)
}

// ── Packages ──

pub fn create_package(conn: &Connection, package: &Package) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO packages (id, tenant_id, name, description, price, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            package.id,
            package.tenant_id,
            package.name,
            package.description,
            package.price.to_string(),
            fmt_datetime(&package.created_at),
        ],
    )?;
    Ok(())
}

fn parse_package_row(row: &rusqlite::Row) -> anyhow::Result<Package> {
    let price: String = row.get(4)?;
    let created_at: String = row.get(5)?;
    Ok(Package {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        price: parse_decimal(&price)?,
        created_at: parse_datetime(&created_at),
    })
}

pub fn list_packages(conn: &Connection, tenant_id: &str) -> anyhow::Result<Vec<Package>> {
    let mut stmt = conn.prepare(
        "SELECT id, tenant_id, name, description, price, created_at
         FROM packages WHERE tenant_id = ?1 ORDER BY name COLLATE NOCASE ASC",
    )?;
    let rows = stmt.query_map(params![tenant_id], |row| Ok(parse_package_row(row)))?;

    let mut packages = vec![];
    for row in rows {
        packages.push(row??);
    }
    Ok(packages)
}

pub fn get_package(conn: &Connection, tenant_id: &str, id: &str) -> anyhow::Result<Option<Package>> {
    let result = conn.query_row(
        "SELECT id, tenant_id, name, description, price, created_at
         FROM packages WHERE tenant_id = ?1 AND id = ?2",
        params![tenant_id, id],
        |row| Ok(parse_package_row(row)),
    );

    match result {
        Ok(package) => Ok(Some(package?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_package(conn: &Connection, package: &Package) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE packages SET name = ?1, description = ?2, price = ?3
         WHERE tenant_id = ?4 AND id = ?5",
        params![
            package.name,
            package.description,
            package.price.to_string(),
            package.tenant_id,
            package.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn delete_package(conn: &Connection, tenant_id: &str, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM packages WHERE tenant_id = ?1 AND id = ?2",
        params![tenant_id, id],
    )?;
    Ok(count > 0)
}

// ── Venues ──

pub fn create_venue(conn: &Connection, venue: &Venue) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO venues (id, tenant_id, name, address, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            venue.id,
            venue.tenant_id,
            venue.name,
            venue.address,
            fmt_datetime(&venue.created_at),
        ],
    )?;
    Ok(())
}

fn parse_venue_row(row: &rusqlite::Row) -> rusqlite::Result<Venue> {
    let created_at: String = row.get(4)?;
    Ok(Venue {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        name: row.get(2)?,
        address: row.get(3)?,
        created_at: parse_datetime(&created_at),
    })
}

pub fn list_venues(conn: &Connection, tenant_id: &str) -> anyhow::Result<Vec<Venue>> {
    let mut stmt = conn.prepare(
        "SELECT id, tenant_id, name, address, created_at
         FROM venues WHERE tenant_id = ?1 ORDER BY name COLLATE NOCASE ASC",
    )?;
    let rows = stmt.query_map(params![tenant_id], parse_venue_row)?;

    let mut venues = vec![];
    for row in rows {
        venues.push(row?);
    }
    Ok(venues)
}

pub fn get_venue(conn: &Connection, tenant_id: &str, id: &str) -> anyhow::Result<Option<Venue>> {
    let venue = conn
        .query_row(
            "SELECT id, tenant_id, name, address, created_at
             FROM venues WHERE tenant_id = ?1 AND id = ?2",
            params![tenant_id, id],
            parse_venue_row,
        )
        .optional()?;
    Ok(venue)
}

pub fn update_venue(conn: &Connection, venue: &Venue) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE venues SET name = ?1, address = ?2 WHERE tenant_id = ?3 AND id = ?4",
        params![venue.name, venue.address, venue.tenant_id, venue.id],
    )?;
    Ok(count > 0)
}

pub fn delete_venue(conn: &Connection, tenant_id: &str, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM venues WHERE tenant_id = ?1 AND id = ?2",
        params![tenant_id, id],
    )?;
    Ok(count > 0)
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "b.id, b.tenant_id, b.event_name, b.event_date, b.from_time, b.to_time, \
     b.location, b.status, b.total_amount, b.client_id, b.package_id, b.venue_id, \
     c.name, p.name, v.name, b.created_at, b.updated_at \
     FROM bookings b \
     LEFT JOIN clients c ON c.id = b.client_id \
     LEFT JOIN packages p ON p.id = b.package_id \
     LEFT JOIN venues v ON v.id = b.venue_id";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO bookings (id, tenant_id, event_name, event_date, from_time, to_time, location, status,
                               total_amount, client_id, package_id, venue_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        params![
            booking.id,
            booking.tenant_id,
            booking.event_name,
            booking.event_date.as_ref().map(fmt_date),
            booking.from_time.as_ref().map(hhmm::format),
            booking.to_time.as_ref().map(hhmm::format),
            booking.location,
            booking.status.as_str(),
            booking.total_amount.to_string(),
            booking.client_id,
            booking.package_id,
            booking.venue_id,
            fmt_datetime(&booking.created_at),
            fmt_datetime(&booking.updated_at),
        ],
    )?;
    Ok(())
}

/// Rewrites the editable fields of a booking. The stored status is left alone.
pub fn update_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET event_name = ?1, event_date = ?2, from_time = ?3, to_time = ?4,
                location = ?5, total_amount = ?6, client_id = ?7, package_id = ?8, venue_id = ?9,
                updated_at = ?10
         WHERE tenant_id = ?11 AND id = ?12",
        params![
            booking.event_name,
            booking.event_date.as_ref().map(fmt_date),
            booking.from_time.as_ref().map(hhmm::format),
            booking.to_time.as_ref().map(hhmm::format),
            booking.location,
            booking.total_amount.to_string(),
            booking.client_id,
            booking.package_id,
            booking.venue_id,
            fmt_datetime(&booking.updated_at),
            booking.tenant_id,
            booking.id,
        ],
    )?;
    Ok(count > 0)
}

/// Tenant bookings, optionally limited to an inclusive event date range.
pub fn list_bookings(
    conn: &Connection,
    tenant_id: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> anyhow::Result<Vec<Booking>> {
    let sql = format!(
        "SELECT {BOOKING_COLUMNS}
         WHERE b.tenant_id = ?1
           AND (?2 IS NULL OR b.event_date >= ?2)
           AND (?3 IS NULL OR b.event_date <= ?3)
         ORDER BY b.event_date ASC, b.from_time ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        params![
            tenant_id,
            from.as_ref().map(fmt_date),
            to.as_ref().map(fmt_date)
        ],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_booking_by_id(
    conn: &Connection,
    tenant_id: &str,
    id: &str,
) -> anyhow::Result<Option<Booking>> {
    let sql = format!("SELECT {BOOKING_COLUMNS} WHERE b.tenant_id = ?1 AND b.id = ?2");
    let result = conn.query_row(&sql, params![tenant_id, id], |row| {
        Ok(parse_booking_row(row))
    });

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// True when another booking of the tenant already uses this event name.
pub fn booking_name_taken(
    conn: &Connection,
    tenant_id: &str,
    event_name: &str,
    exclude_id: Option<&str>,
) -> anyhow::Result<bool> {
    let taken: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM bookings
         WHERE tenant_id = ?1 AND event_name = ?2 COLLATE NOCASE AND (?3 IS NULL OR id != ?3)",
        params![tenant_id, event_name, exclude_id],
        |row| row.get(0),
    )?;
    Ok(taken)
}

pub fn update_booking_status(
    conn: &Connection,
    tenant_id: &str,
    id: &str,
    status: &BookingStatus,
    updated_at: NaiveDateTime,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE tenant_id = ?3 AND id = ?4",
        params![status.as_str(), fmt_datetime(&updated_at), tenant_id, id],
    )?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, tenant_id: &str, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM bookings WHERE tenant_id = ?1 AND id = ?2",
        params![tenant_id, id],
    )?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let event_date: Option<String> = row.get(3)?;
    let from_time: Option<String> = row.get(4)?;
    let to_time: Option<String> = row.get(5)?;
    let status_str: String = row.get(7)?;
    let total_amount: String = row.get(8)?;
    let created_at_str: String = row.get(15)?;
    let updated_at_str: String = row.get(16)?;

    Ok(Booking {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        event_name: row.get(2)?,
        event_date: parse_date(event_date)?,
        from_time: from_time.as_deref().map(hhmm::parse).transpose()?.flatten(),
        to_time: to_time.as_deref().map(hhmm::parse).transpose()?.flatten(),
        location: row.get(6)?,
        status: BookingStatus::parse(&status_str),
        total_amount: parse_decimal(&total_amount)?,
        client_id: row.get(9)?,
        package_id: row.get(10)?,
        venue_id: row.get(11)?,
        client_name: row.get(12)?,
        package_name: row.get(13)?,
        venue_name: row.get(14)?,
        created_at: parse_datetime(&created_at_str),
        updated_at: parse_datetime(&updated_at_str),
    })
}

// ── Payments ──

pub fn create_payment(conn: &Connection, payment: &Payment) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO payments (id, tenant_id, booking_id, amount, payment_type, refund_amount, method,
                               payment_date, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            payment.id,
            payment.tenant_id,
            payment.booking_id,
            payment.amount.to_string(),
            payment.payment_type.as_str(),
            payment.refund_amount.map(|r| r.to_string()),
            payment.method.as_str(),
            fmt_date(&payment.payment_date),
            payment.notes,
            fmt_datetime(&payment.created_at),
        ],
    )?;
    Ok(())
}

const PAYMENT_COLUMNS: &str = "id, tenant_id, booking_id, amount, payment_type, refund_amount, method, \
     payment_date, notes, created_at FROM payments";

/// Tenant payments, optionally for a single booking, oldest first.
pub fn list_payments(
    conn: &Connection,
    tenant_id: &str,
    booking_id: Option<&str>,
) -> anyhow::Result<Vec<Payment>> {
    let sql = format!(
        "SELECT {PAYMENT_COLUMNS}
         WHERE tenant_id = ?1 AND (?2 IS NULL OR booking_id = ?2)
         ORDER BY payment_date ASC, created_at ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![tenant_id, booking_id], |row| {
        Ok(parse_payment_row(row))
    })?;

    let mut payments = vec![];
    for row in rows {
        payments.push(row??);
    }
    Ok(payments)
}

pub fn get_payment(conn: &Connection, tenant_id: &str, id: &str) -> anyhow::Result<Option<Payment>> {
    let sql = format!("SELECT {PAYMENT_COLUMNS} WHERE tenant_id = ?1 AND id = ?2");
    let result = conn.query_row(&sql, params![tenant_id, id], |row| {
        Ok(parse_payment_row(row))
    });

    match result {
        Ok(payment) => Ok(Some(payment?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Converts an existing payment into a refund of `refund_amount`.
pub fn mark_refund(
    conn: &Connection,
    tenant_id: &str,
    id: &str,
    refund_amount: Decimal,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE payments SET payment_type = 'refund', refund_amount = ?1
         WHERE tenant_id = ?2 AND id = ?3",
        params![refund_amount.to_string(), tenant_id, id],
    )?;
    Ok(count > 0)
}

pub fn delete_payment(conn: &Connection, tenant_id: &str, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "DELETE FROM payments WHERE tenant_id = ?1 AND id = ?2",
        params![tenant_id, id],
    )?;
    Ok(count > 0)
}

fn parse_payment_row(row: &rusqlite::Row) -> anyhow::Result<Payment> {
    let amount: String = row.get(3)?;
    let payment_type: String = row.get(4)?;
    let refund_amount: Option<String> = row.get(5)?;
    let method: String = row.get(6)?;
    let payment_date: String = row.get(7)?;
    let created_at: String = row.get(9)?;

    Ok(Payment {
        id: row.get(0)?,
        tenant_id: row.get(1)?,
        booking_id: row.get(2)?,
        amount: parse_decimal(&amount)?,
        payment_type: PaymentType::parse(&payment_type)?,
        refund_amount: refund_amount.as_deref().map(parse_decimal).transpose()?,
        method: PaymentMethod::parse(&method)?,
        payment_date: NaiveDate::parse_from_str(&payment_date, DATE_FORMAT)?,
        notes: row.get(8)?,
        created_at: parse_datetime(&created_at),
    })
}
