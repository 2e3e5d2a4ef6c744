// 🗄️ Database access - accounts and membership profiles
//
// Every function takes a plain `&Connection`; a `rusqlite::Transaction`
// derefs to one, so the importer runs all of these inside its transaction.

use crate::entities::{
    Account, AccountClass, ApplicationStatus, Gender, MaritalStatus, Math, MembershipProfile,
    MembershipType, SupplementalPatch,
};
use crate::error::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::str::FromStr;

/// Open (or create) a database file with WAL and foreign keys enabled
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;

    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", true)?;

    Ok(conn)
}

// ============================================================================
// WRITES
// ============================================================================

pub fn insert_account(conn: &Connection, account: &Account) -> Result<()> {
    conn.execute(
        "INSERT INTO users (id, first_name, middle_name, surname, email, mobile_no, user_type, is_admin)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            account.id,
            account.first_name,
            account.middle_name,
            account.surname,
            account.email,
            account.mobile_no,
            account.user_type.as_str(),
            account.is_admin,
        ],
    )?;

    Ok(())
}

/// Insert a new profile; status and application date take their column defaults
pub fn insert_profile(conn: &Connection, profile: &MembershipProfile) -> Result<()> {
    conn.execute(
        "INSERT INTO memberships (
            id, user_id, gender, postal_address, pin_code, date_of_birth,
            membership_type, math, marital_status, occupation, qualification,
            number_of_kids, gotra, kuladevata, native_place,
            other_gsb_memberships, introducer_name, aadhar_number, pan_number
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
        params![
            profile.id,
            profile.user_id,
            profile.gender.as_str(),
            profile.postal_address,
            profile.pin_code,
            profile.date_of_birth.map(|d| d.format("%Y-%m-%d").to_string()),
            profile.membership_type.as_str(),
            profile.math.map(|m| m.as_str()),
            profile.marital_status.map(|m| m.as_str()),
            profile.occupation,
            profile.qualification,
            profile.number_of_kids,
            profile.gotra,
            profile.kuladevata,
            profile.native_place,
            profile.other_gsb_memberships,
            profile.introducer_name,
            profile.aadhar_number,
            profile.pan_number,
        ],
    )?;

    Ok(())
}

/// Overwrite the postal address and pin code of an account's profile
///
/// Returns the number of profiles changed (0 if the account has none).
pub fn update_profile_address(
    conn: &Connection,
    account_id: &str,
    postal_address: Option<&str>,
    pin_code: Option<&str>,
) -> Result<usize> {
    let changed = conn.execute(
        "UPDATE memberships SET postal_address = ?1, pin_code = ?2 WHERE user_id = ?3",
        params![postal_address, pin_code, account_id],
    )?;

    Ok(changed)
}

/// Write only the columns the patch carries
///
/// Returns the number of profiles changed; an empty patch touches nothing.
pub fn update_profile_supplemental(
    conn: &Connection,
    account_id: &str,
    patch: &SupplementalPatch,
) -> Result<usize> {
    let mut assignments = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(kids) = patch.number_of_kids {
        assignments.push("number_of_kids = ?");
        values.push(kids.map(Value::Integer).unwrap_or(Value::Null));
    }

    if let Some(memberships) = &patch.other_gsb_memberships {
        assignments.push("other_gsb_memberships = ?");
        values.push(memberships.clone().map(Value::Text).unwrap_or(Value::Null));
    }

    if let Some(introducer) = &patch.introducer_name {
        assignments.push("introducer_name = ?");
        values.push(introducer.clone().map(Value::Text).unwrap_or(Value::Null));
    }

    if assignments.is_empty() {
        return Ok(0);
    }

    values.push(Value::Text(account_id.to_string()));
    let sql = format!(
        "UPDATE memberships SET {} WHERE user_id = ?",
        assignments.join(", ")
    );

    let changed = conn.execute(&sql, params_from_iter(values))?;
    Ok(changed)
}

// ============================================================================
// READS
// ============================================================================

pub fn count_accounts(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}

pub fn count_profiles(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM memberships", [], |row| row.get(0))?;
    Ok(count)
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S").ok())
        .map(|dt| dt.and_utc())
}

/// Map a stored enum column; values outside the domain read as a conversion error
fn parse_stored<T: FromStr>(idx: usize, value: String) -> rusqlite::Result<T> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unexpected value {:?}", value).into(),
        )
    })
}

pub fn get_account(conn: &Connection, id: &str) -> Result<Option<Account>> {
    let account = conn
        .query_row(
            "SELECT id, first_name, middle_name, surname, email, mobile_no,
                    user_type, is_admin, created_at, updated_at
             FROM users WHERE id = ?1",
            [id],
            |row| {
                Ok(Account {
                    id: row.get(0)?,
                    first_name: row.get(1)?,
                    middle_name: row.get(2)?,
                    surname: row.get(3)?,
                    email: row.get(4)?,
                    mobile_no: row.get(5)?,
                    user_type: parse_stored::<AccountClass>(6, row.get(6)?)?,
                    is_admin: row.get(7)?,
                    created_at: parse_timestamp(row.get(8)?),
                    updated_at: parse_timestamp(row.get(9)?),
                })
            },
        )
        .optional()?;

    Ok(account)
}

pub fn get_profile_by_account(
    conn: &Connection,
    account_id: &str,
) -> Result<Option<MembershipProfile>> {
    let profile = conn
        .query_row(
            "SELECT id, user_id, gender, postal_address, pin_code, date_of_birth,
                    occupation, qualification, marital_status, number_of_kids,
                    gotra, kuladevata, math, native_place, other_gsb_memberships,
                    introducer_name, membership_type, status, application_date,
                    approval_date, aadhar_number, pan_number
             FROM memberships WHERE user_id = ?1",
            [account_id],
            |row| {
                let date_of_birth: Option<String> = row.get(5)?;
                let marital_status: Option<String> = row.get(8)?;
                let math: Option<String> = row.get(12)?;

                Ok(MembershipProfile {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    gender: parse_stored::<Gender>(2, row.get(2)?)?,
                    postal_address: row.get(3)?,
                    pin_code: row.get(4)?,
                    date_of_birth: date_of_birth
                        .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
                    occupation: row.get(6)?,
                    qualification: row.get(7)?,
                    marital_status: marital_status
                        .map(|s| parse_stored::<MaritalStatus>(8, s))
                        .transpose()?,
                    number_of_kids: row.get(9)?,
                    gotra: row.get(10)?,
                    kuladevata: row.get(11)?,
                    math: math.map(|s| parse_stored::<Math>(12, s)).transpose()?,
                    native_place: row.get(13)?,
                    other_gsb_memberships: row.get(14)?,
                    introducer_name: row.get(15)?,
                    membership_type: parse_stored::<MembershipType>(16, row.get(16)?)?,
                    status: parse_stored::<ApplicationStatus>(17, row.get(17)?)?,
                    application_date: parse_timestamp(row.get(18)?),
                    approval_date: parse_timestamp(row.get(19)?),
                    aadhar_number: row.get(20)?,
                    pan_number: row.get(21)?,
                })
            },
        )
        .optional()?;

    Ok(profile)
}
