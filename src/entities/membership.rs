// 🪷 Membership Profile - demographic and cultural record of a member
//
// Exactly one profile per account (unique user_id). Created with its account
// in the roster phase; later phases may patch address and supplemental
// fields only.

use super::{AccountId, UnknownVariant};
use crate::error::{ImportError, Result};
use crate::parser::Row;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::warn;

// ============================================================================
// ENUMERATIONS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
        }
    }
}

impl FromStr for Gender {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            _ => Err(UnknownVariant::new("gender", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaritalStatus {
    Married,
    Unmarried,
}

impl MaritalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaritalStatus::Married => "MARRIED",
            MaritalStatus::Unmarried => "UNMARRIED",
        }
    }
}

impl FromStr for MaritalStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MARRIED" => Ok(MaritalStatus::Married),
            "UNMARRIED" => Ok(MaritalStatus::Unmarried),
            _ => Err(UnknownVariant::new("marital status", s)),
        }
    }
}

/// Monastic institution the family follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Math {
    Kashi,
    Gokarna,
    Kavale,
}

impl Math {
    pub fn as_str(&self) -> &'static str {
        match self {
            Math::Kashi => "KASHI",
            Math::Gokarna => "GOKARNA",
            Math::Kavale => "KAVALE",
        }
    }
}

impl FromStr for Math {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "KASHI" => Ok(Math::Kashi),
            "GOKARNA" => Ok(Math::Gokarna),
            "KAVALE" => Ok(Math::Kavale),
            _ => Err(UnknownVariant::new("math", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipType {
    Patron,
    Life,
    Ordinary,
}

impl MembershipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipType::Patron => "PATRON",
            MembershipType::Life => "LIFE",
            MembershipType::Ordinary => "ORDINARY",
        }
    }
}

impl FromStr for MembershipType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PATRON" => Ok(MembershipType::Patron),
            "LIFE" => Ok(MembershipType::Life),
            "ORDINARY" => Ok(MembershipType::Ordinary),
            _ => Err(UnknownVariant::new("membership type", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Approved => "APPROVED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PENDING" => Ok(ApplicationStatus::Pending),
            "APPROVED" => Ok(ApplicationStatus::Approved),
            "REJECTED" => Ok(ApplicationStatus::Rejected),
            _ => Err(UnknownVariant::new("application status", s)),
        }
    }
}

// ============================================================================
// FIELD PARSING
// ============================================================================

/// Date formats seen in the roster exports, tried in order
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y"];

fn invalid(row: &Row, column: &str, value: &str) -> ImportError {
    ImportError::InvalidValue {
        column: column.to_string(),
        value: value.to_string(),
        row: row.line(),
    }
}

fn parse_column<T>(row: &Row, column: &str) -> Result<Option<T>>
where
    T: FromStr<Err = UnknownVariant>,
{
    match row.optional(column) {
        Some(value) => value.parse().map(Some).map_err(|_| invalid(row, column, value)),
        None => Ok(None),
    }
}

/// Unrecognized dates are stored as NULL rather than failing the row
fn parse_date(row: &Row, column: &str) -> Option<NaiveDate> {
    let value = row.optional(column)?.trim();

    let parsed = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok());

    if parsed.is_none() {
        warn!(line = row.line(), column, value, "unrecognized date, storing NULL");
    }
    parsed
}

fn text(row: &Row, column: &str) -> Option<String> {
    row.optional(column).map(str::to_string)
}

// ============================================================================
// MEMBERSHIP PROFILE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MembershipProfile {
    pub id: String,
    pub user_id: AccountId,
    pub gender: Gender,

    // Address (patched by the address phase)
    pub postal_address: Option<String>,
    pub pin_code: Option<String>,

    pub date_of_birth: Option<NaiveDate>,
    pub occupation: Option<String>,
    pub qualification: Option<String>,
    pub marital_status: Option<MaritalStatus>,
    pub number_of_kids: Option<i64>,

    // Community record
    pub gotra: Option<String>,
    pub kuladevata: Option<String>,
    pub math: Option<Math>,
    pub native_place: Option<String>,
    pub other_gsb_memberships: Option<String>,
    pub introducer_name: Option<String>,

    pub membership_type: MembershipType,
    pub status: ApplicationStatus,
    pub application_date: Option<DateTime<Utc>>,
    pub approval_date: Option<DateTime<Utc>>,

    pub aadhar_number: Option<String>,
    pub pan_number: Option<String>,
}

impl MembershipProfile {
    pub fn new(id: String, user_id: AccountId, gender: Gender) -> Self {
        MembershipProfile {
            id,
            user_id,
            gender,
            postal_address: None,
            pin_code: None,
            date_of_birth: None,
            occupation: None,
            qualification: None,
            marital_status: None,
            number_of_kids: None,
            gotra: None,
            kuladevata: None,
            math: None,
            native_place: None,
            other_gsb_memberships: None,
            introducer_name: None,
            membership_type: MembershipType::Ordinary,
            status: ApplicationStatus::Pending,
            application_date: None,
            approval_date: None,
            aadhar_number: None,
            pan_number: None,
        }
    }

    /// Map the demographic columns of a roster row
    ///
    /// GENDER defaults to MALE and MEMBERSHIP_TYPE to ORDINARY when blank.
    /// Address and supplemental fields are left for the later phases.
    pub fn from_roster_row(row: &Row, id: String, user_id: &str) -> Result<Self> {
        let gender = parse_column(row, "GENDER")?.unwrap_or(Gender::Male);

        let mut profile = MembershipProfile::new(id, user_id.to_string(), gender);
        profile.date_of_birth = parse_date(row, "DATE_OF_BIRTH");
        profile.membership_type =
            parse_column(row, "MEMBERSHIP_TYPE")?.unwrap_or(MembershipType::Ordinary);
        profile.math = parse_column(row, "MATH")?;
        profile.marital_status = parse_column(row, "MARITAL_STATUS")?;
        profile.occupation = text(row, "OCCUPATION");
        profile.qualification = text(row, "QUALIFICATION");
        profile.gotra = text(row, "GOTRA");
        profile.kuladevata = text(row, "KULADEVATA");
        profile.native_place = text(row, "NATIVE_PLACE");
        profile.aadhar_number = text(row, "AADHAR");
        profile.pan_number = text(row, "PAN");

        Ok(profile)
    }

    pub fn is_approved(&self) -> bool {
        self.status == ApplicationStatus::Approved
    }
}

// ============================================================================
// SUPPLEMENTAL PATCH
// ============================================================================

/// Supplemental columns carried by one consolidated-file row
///
/// Outer `None`: column absent from the file, leave the stored value alone.
/// `Some(None)`: column present but blank, store NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupplementalPatch {
    pub number_of_kids: Option<Option<i64>>,
    pub other_gsb_memberships: Option<Option<String>>,
    pub introducer_name: Option<Option<String>>,
}

impl SupplementalPatch {
    pub fn from_row(row: &Row) -> Result<Self> {
        let mut patch = SupplementalPatch::default();

        if row.has("NUMBER_OF_KIDS") {
            patch.number_of_kids = Some(match row.optional("NUMBER_OF_KIDS") {
                Some(value) => Some(
                    value
                        .trim()
                        .parse::<i64>()
                        .map_err(|_| invalid(row, "NUMBER_OF_KIDS", value))?,
                ),
                None => None,
            });
        }

        if row.has("OTHER_GSB_MEMBERSHIPS") {
            patch.other_gsb_memberships = Some(text(row, "OTHER_GSB_MEMBERSHIPS"));
        }

        if row.has("INTRODUCER_NAME") {
            patch.introducer_name = Some(text(row, "INTRODUCER_NAME"));
        }

        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.number_of_kids.is_none()
            && self.other_gsb_memberships.is_none()
            && self.introducer_name.is_none()
    }
}
