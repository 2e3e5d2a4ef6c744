// Entity Models
//
// Two persisted entities, created together from the member roster:
// - Account (users table): who the person is and how to reach them
// - MembershipProfile (memberships table): 1:1 demographic and cultural record
//
// Enumerations store their upper-case wire value (`as_str`) and parse it back
// case-insensitively (`FromStr`).

pub mod account;
pub mod membership;

pub use account::{Account, AccountClass, AccountId};
pub use membership::{
    ApplicationStatus, Gender, MaritalStatus, Math, MembershipProfile, MembershipType,
    SupplementalPatch,
};

use thiserror::Error;

/// A stored enum column held a value outside its domain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        UnknownVariant {
            kind,
            value: value.to_string(),
        }
    }
}
