// 📐 Schema bootstrap
//
// Creates the member tables and their neighbours (pages, sevas, bookings)
// if they are missing. Safe to run on every startup.
//
// Table and column layout mirrors the mandal's existing database:
// - ENUM columns become TEXT with CHECK constraints
// - ON UPDATE CURRENT_TIMESTAMP becomes an AFTER UPDATE trigger

use crate::error::{ImportError, Result};
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info, warn};

/// Every table the bootstrap owns, in creation order (parents first)
pub const TABLES: &[&str] = &[
    "users",
    "memberships",
    "pages",
    "sevas",
    "bookings",
    "booking_items",
];

// ============================================================================
// DDL
// ============================================================================

const CREATE_USERS: &str = "
CREATE TABLE IF NOT EXISTS users (
    id CHAR(36) NOT NULL PRIMARY KEY,
    first_name VARCHAR(100) NOT NULL,
    middle_name VARCHAR(100) DEFAULT NULL,
    surname VARCHAR(100) NOT NULL,
    email VARCHAR(255) DEFAULT NULL UNIQUE,
    password_hash VARCHAR(255) DEFAULT NULL,
    mobile_no VARCHAR(20) NOT NULL,
    user_type TEXT NOT NULL DEFAULT 'NM' CHECK (user_type IN ('M', 'NM')),
    is_admin BOOLEAN NOT NULL DEFAULT 0,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TRIGGER IF NOT EXISTS users_touch_updated_at
AFTER UPDATE ON users
FOR EACH ROW WHEN NEW.updated_at = OLD.updated_at
BEGIN
    UPDATE users SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
END;
";

const CREATE_MEMBERSHIPS: &str = "
CREATE TABLE IF NOT EXISTS memberships (
    id CHAR(36) NOT NULL PRIMARY KEY,
    user_id CHAR(36) NOT NULL UNIQUE,
    gender TEXT NOT NULL CHECK (gender IN ('MALE', 'FEMALE')),
    postal_address TEXT,
    pin_code VARCHAR(10),
    date_of_birth DATE,
    occupation VARCHAR(100),
    qualification VARCHAR(100),
    marital_status TEXT CHECK (marital_status IN ('MARRIED', 'UNMARRIED')),
    number_of_kids INT DEFAULT NULL,
    gotra VARCHAR(100),
    kuladevata VARCHAR(100),
    math TEXT CHECK (math IN ('KASHI', 'GOKARNA', 'KAVALE')),
    native_place VARCHAR(100),
    other_gsb_memberships TEXT DEFAULT NULL,
    introducer_name VARCHAR(100) DEFAULT NULL,
    membership_type TEXT NOT NULL DEFAULT 'PATRON'
        CHECK (membership_type IN ('PATRON', 'LIFE', 'ORDINARY')),
    status TEXT NOT NULL DEFAULT 'PENDING'
        CHECK (status IN ('PENDING', 'APPROVED', 'REJECTED')),
    application_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    approval_date TIMESTAMP NULL DEFAULT NULL,
    aadhar_number VARCHAR(16) DEFAULT NULL CHECK (length(aadhar_number) <= 16),
    pan_number VARCHAR(10) DEFAULT NULL CHECK (length(pan_number) <= 10),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);
";

const CREATE_PAGES: &str = "
CREATE TABLE IF NOT EXISTS pages (
    id CHAR(36) NOT NULL PRIMARY KEY,
    title VARCHAR(100) NOT NULL,
    slug VARCHAR(100) NOT NULL UNIQUE,
    content TEXT NOT NULL,
    created_by CHAR(36) NOT NULL,
    is_published BOOLEAN NOT NULL DEFAULT 0,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (created_by) REFERENCES users(id)
);

CREATE TRIGGER IF NOT EXISTS pages_touch_updated_at
AFTER UPDATE ON pages
FOR EACH ROW WHEN NEW.updated_at = OLD.updated_at
BEGIN
    UPDATE pages SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
END;
";

const CREATE_SEVAS: &str = "
CREATE TABLE IF NOT EXISTS sevas (
    id CHAR(36) NOT NULL PRIMARY KEY,
    name VARCHAR(100) NOT NULL UNIQUE,
    description TEXT DEFAULT NULL,
    price DECIMAL(10, 2) NOT NULL CHECK (price >= 0),
    is_active BOOLEAN NOT NULL DEFAULT 1
);
";

const CREATE_BOOKINGS: &str = "
CREATE TABLE IF NOT EXISTS bookings (
    id CHAR(36) NOT NULL PRIMARY KEY,
    user_id CHAR(36) NOT NULL,
    booking_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    total_amount DECIMAL(10, 2) NOT NULL,
    donation_amount DECIMAL(10, 2) DEFAULT 0,
    pan_number VARCHAR(10) DEFAULT NULL,
    payment_status TEXT NOT NULL DEFAULT 'PENDING'
        CHECK (payment_status IN ('PENDING', 'COMPLETED', 'FAILED')),
    receipt_id VARCHAR(50) UNIQUE,
    payment_gateway_ref VARCHAR(100) DEFAULT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    FOREIGN KEY (user_id) REFERENCES users(id)
);
";

const CREATE_BOOKING_ITEMS: &str = "
CREATE TABLE IF NOT EXISTS booking_items (
    id CHAR(36) NOT NULL PRIMARY KEY,
    booking_id CHAR(36) NOT NULL,
    seva_id CHAR(36) NOT NULL,
    quantity INT NOT NULL DEFAULT 1,
    price_at_booking DECIMAL(10, 2) NOT NULL,
    FOREIGN KEY (booking_id) REFERENCES bookings(id) ON DELETE CASCADE,
    FOREIGN KEY (seva_id) REFERENCES sevas(id)
);
";

const STATEMENTS: &[(&str, &str)] = &[
    ("users", CREATE_USERS),
    ("memberships", CREATE_MEMBERSHIPS),
    ("pages", CREATE_PAGES),
    ("sevas", CREATE_SEVAS),
    ("bookings", CREATE_BOOKINGS),
    ("booking_items", CREATE_BOOKING_ITEMS),
];

// ============================================================================
// BOOTSTRAP
// ============================================================================

/// Create any missing tables in one transaction, then verify them
///
/// Runs separately from imports. An error here should stop the process.
pub fn ensure_schema(conn: &mut Connection) -> Result<()> {
    // Has no effect inside a transaction, so set it first
    conn.pragma_update(None, "foreign_keys", true)?;

    let tx = conn.transaction()?;

    let created = STATEMENTS.iter().try_for_each(|(table, ddl)| {
        debug!(table, "ensuring table");
        tx.execute_batch(ddl)
    });

    match created {
        Ok(()) => tx.commit()?,
        Err(e) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(error = %rollback_err, "schema rollback failed");
            }
            return Err(e.into());
        }
    }

    verify_schema(conn)?;
    info!(tables = TABLES.len(), "schema ready");

    Ok(())
}

/// Check that every table exists
pub fn verify_schema(conn: &Connection) -> Result<()> {
    for table in TABLES {
        if !table_exists(conn, table)? {
            return Err(ImportError::SchemaIncomplete(table.to_string()));
        }
    }
    Ok(())
}

pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let found: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .optional()?;

    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    fn fresh() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        ensure_schema(&mut conn).unwrap();
        conn
    }

    fn insert_user(conn: &Connection, id: &str, email: Option<&str>) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT INTO users (id, first_name, surname, email, mobile_no, user_type)
             VALUES (?1, 'Anand', 'Kamath', ?2, '9000000001', 'M')",
            params![id, email],
        )
    }

    #[test]
    fn test_ensure_schema_creates_all_tables() {
        let conn = fresh();
        for table in TABLES {
            assert!(table_exists(&conn, table).unwrap(), "missing {}", table);
        }
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let mut conn = fresh();
        insert_user(&conn, "u-1", Some("anand@example.com")).unwrap();

        ensure_schema(&mut conn).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1, "re-running bootstrap must not touch data");
    }

    #[test]
    fn test_verify_schema_detects_missing_table() {
        let conn = fresh();
        conn.execute_batch("DROP TABLE booking_items").unwrap();

        match verify_schema(&conn) {
            Err(ImportError::SchemaIncomplete(table)) => assert_eq!(table, "booking_items"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_user_defaults() {
        let conn = fresh();
        conn.execute(
            "INSERT INTO users (id, first_name, surname, mobile_no) VALUES ('u-1', 'A', 'B', '1')",
            [],
        )
        .unwrap();

        let (user_type, is_admin): (String, bool) = conn
            .query_row(
                "SELECT user_type, is_admin FROM users WHERE id = 'u-1'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(user_type, "NM");
        assert!(!is_admin);
    }

    #[test]
    fn test_email_unique_but_nullable() {
        let conn = fresh();
        insert_user(&conn, "u-1", None).unwrap();
        insert_user(&conn, "u-2", None).unwrap();
        insert_user(&conn, "u-3", Some("a@x.com")).unwrap();

        assert!(insert_user(&conn, "u-4", Some("a@x.com")).is_err());
    }

    #[test]
    fn test_enum_check_constraints() {
        let conn = fresh();
        insert_user(&conn, "u-1", None).unwrap();

        let bad_gender = conn.execute(
            "INSERT INTO memberships (id, user_id, gender) VALUES ('m-1', 'u-1', 'OTHER')",
            [],
        );
        assert!(bad_gender.is_err());

        let bad_math = conn.execute(
            "INSERT INTO memberships (id, user_id, gender, math) VALUES ('m-1', 'u-1', 'MALE', 'UDUPI')",
            [],
        );
        assert!(bad_math.is_err());

        conn.execute(
            "INSERT INTO memberships (id, user_id, gender) VALUES ('m-1', 'u-1', 'MALE')",
            [],
        )
        .unwrap();

        let (membership_type, status): (String, String) = conn
            .query_row(
                "SELECT membership_type, status FROM memberships WHERE id = 'm-1'",
                [],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .unwrap();
        assert_eq!(membership_type, "PATRON");
        assert_eq!(status, "PENDING");
    }

    #[test]
    fn test_one_profile_per_account() {
        let conn = fresh();
        insert_user(&conn, "u-1", None).unwrap();
        conn.execute(
            "INSERT INTO memberships (id, user_id, gender) VALUES ('m-1', 'u-1', 'MALE')",
            [],
        )
        .unwrap();

        let second = conn.execute(
            "INSERT INTO memberships (id, user_id, gender) VALUES ('m-2', 'u-1', 'MALE')",
            [],
        );
        assert!(second.is_err());
    }

    #[test]
    fn test_profile_requires_account() {
        let conn = fresh();
        let orphan = conn.execute(
            "INSERT INTO memberships (id, user_id, gender) VALUES ('m-1', 'nobody', 'MALE')",
            [],
        );
        assert!(orphan.is_err(), "foreign keys must be enforced");
    }

    #[test]
    fn test_account_delete_cascades_to_profile() {
        let conn = fresh();
        insert_user(&conn, "u-1", None).unwrap();
        conn.execute(
            "INSERT INTO memberships (id, user_id, gender) VALUES ('m-1', 'u-1', 'FEMALE')",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM users WHERE id = 'u-1'", []).unwrap();

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM memberships", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_booking_items_chain() {
        let conn = fresh();
        insert_user(&conn, "u-1", None).unwrap();
        conn.execute_batch(
            "INSERT INTO sevas (id, name, price) VALUES ('s-1', 'Satyanarayan Pooja', 501.00);
             INSERT INTO bookings (id, user_id, total_amount) VALUES ('b-1', 'u-1', 501.00);
             INSERT INTO booking_items (id, booking_id, seva_id, price_at_booking)
                 VALUES ('i-1', 'b-1', 's-1', 501.00);",
        )
        .unwrap();

        assert!(conn
            .execute("INSERT INTO sevas (id, name, price) VALUES ('s-2', 'Free', -1)", [])
            .is_err());

        conn.execute("DELETE FROM bookings WHERE id = 'b-1'", []).unwrap();
        let items: i64 = conn
            .query_row("SELECT COUNT(*) FROM booking_items", [], |r| r.get(0))
            .unwrap();
        assert_eq!(items, 0);
    }
}
