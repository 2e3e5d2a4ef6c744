// 👤 Account Entity - one person known to the mandal
//
// Accounts are only ever created by the roster phase of an import.
// Later phases locate an existing account; they never create one.

use super::UnknownVariant;
use crate::error::Result;
use crate::parser::Row;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Opaque 36-character account identifier
pub type AccountId = String;

// ============================================================================
// ACCOUNT CLASS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountClass {
    /// Registered member (stored as "M")
    Member,

    /// Non-member, e.g. a devotee who only books sevas (stored as "NM")
    NonMember,
}

impl AccountClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountClass::Member => "M",
            AccountClass::NonMember => "NM",
        }
    }
}

impl FromStr for AccountClass {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "M" => Ok(AccountClass::Member),
            "NM" => Ok(AccountClass::NonMember),
            _ => Err(UnknownVariant::new("account class", s)),
        }
    }
}

// ============================================================================
// ACCOUNT ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub surname: String,

    /// Unique when present
    pub email: Option<String>,

    pub mobile_no: String,
    pub user_type: AccountClass,
    pub is_admin: bool,

    /// Assigned by the database on insert
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn new(id: AccountId, first_name: &str, surname: &str, mobile_no: &str) -> Self {
        Account {
            id,
            first_name: first_name.to_string(),
            middle_name: None,
            surname: surname.to_string(),
            email: None,
            mobile_no: mobile_no.to_string(),
            user_type: AccountClass::Member,
            is_admin: false,
            created_at: None,
            updated_at: None,
        }
    }

    /// Map the name and contact columns of a roster row
    ///
    /// NAME and SURNAME columns must exist; blank values are stored as empty
    /// strings. A blank EMAIL is stored as NULL so that it does not collide
    /// with the unique index.
    pub fn from_roster_row(row: &Row, id: AccountId) -> Result<Self> {
        let mut account = Account::new(
            id,
            row.required("NAME")?,
            row.required("SURNAME")?,
            row.get("MOBILE").unwrap_or(""),
        );

        account.middle_name = row.optional("MIDDLE_NAME").map(str::to_string);
        account.email = row.optional("EMAIL").map(str::to_string);

        Ok(account)
    }

    pub fn full_name(&self) -> String {
        match &self.middle_name {
            Some(middle) => format!("{} {} {}", self.first_name, middle, self.surname),
            None => format!("{} {}", self.first_name, self.surname),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImportError;

    #[test]
    fn test_account_class_round_trip() {
        assert_eq!(AccountClass::Member.as_str(), "M");
        assert_eq!("nm".parse::<AccountClass>().unwrap(), AccountClass::NonMember);
        assert!("X".parse::<AccountClass>().is_err());
    }

    #[test]
    fn test_from_roster_row() {
        let row = Row::from_pairs(
            2,
            [
                ("NAME", "Anand"),
                ("MIDDLE_NAME", ""),
                ("SURNAME", "Kamath"),
                ("EMAIL", "anand@example.com"),
                ("MOBILE", "9000000001"),
            ],
        );

        let account = Account::from_roster_row(&row, "id-1".to_string()).unwrap();

        assert_eq!(account.first_name, "Anand");
        assert_eq!(account.middle_name, None);
        assert_eq!(account.surname, "Kamath");
        assert_eq!(account.email.as_deref(), Some("anand@example.com"));
        assert_eq!(account.mobile_no, "9000000001");
        assert_eq!(account.user_type, AccountClass::Member);
        assert!(!account.is_admin);
        assert_eq!(account.full_name(), "Anand Kamath");
    }

    #[test]
    fn test_blank_email_becomes_none() {
        let row = Row::from_pairs(2, [("NAME", "Meera"), ("SURNAME", "Pai"), ("EMAIL", " ")]);
        let account = Account::from_roster_row(&row, "id-2".to_string()).unwrap();

        assert_eq!(account.email, None);
        assert_eq!(account.mobile_no, "");
    }

    #[test]
    fn test_blank_name_is_stored_empty() {
        let row = Row::from_pairs(3, [("NAME", ""), ("SURNAME", "Pai"), ("MOBILE", "2")]);
        let account = Account::from_roster_row(&row, "id-4".to_string()).unwrap();

        assert_eq!(account.first_name, "");
        assert_eq!(account.surname, "Pai");
    }

    #[test]
    fn test_missing_surname_column_fails() {
        let row = Row::from_pairs(4, [("NAME", "Meera")]);
        let err = Account::from_roster_row(&row, "id-3".to_string()).unwrap_err();

        assert!(matches!(
            err,
            ImportError::MissingColumn { ref column, row: 4 } if column == "SURNAME"
        ));
    }
}
