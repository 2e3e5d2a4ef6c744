// 🔍 Identity Resolution - find the account a row describes
//
// The three exports share no key, so rows are matched on whatever identity
// columns they carry:
// 1. EMAIL, when present, is the only thing compared (exact, case-sensitive)
// 2. Otherwise (NAME AND SURNAME) OR MOBILE, whichever are present
//
// The first matching account in storage order wins. Zero matches and
// ambiguous matches are not told apart; callers skip NotFound rows.

use crate::entities::AccountId;
use crate::error::Result;
use crate::parser::Row;
use rusqlite::{params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use tracing::debug;

// ============================================================================
// RESULT TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(AccountId),
    NotFound,
}

impl Resolution {
    pub fn account_id(&self) -> Option<&str> {
        match self {
            Resolution::Found(id) => Some(id.as_str()),
            Resolution::NotFound => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// Which identity columns a lookup used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MatchStrategy {
    Email,
    NameOrMobile,
}

// ============================================================================
// IDENTITY QUERY
// ============================================================================

/// Predicates and parameters derived from one row's identity columns
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityQuery {
    pub strategy: MatchStrategy,
    predicates: Vec<&'static str>,
    params: Vec<String>,
}

impl IdentityQuery {
    /// Build the lookup for a row, or None if it carries no identity column
    pub fn from_row(row: &Row) -> Option<Self> {
        if let Some(email) = row.optional("EMAIL") {
            return Some(IdentityQuery {
                strategy: MatchStrategy::Email,
                predicates: vec!["email = ?"],
                params: vec![email.to_string()],
            });
        }

        let mut predicates = Vec::new();
        let mut params = Vec::new();

        if let (Some(name), Some(surname)) = (row.optional("NAME"), row.optional("SURNAME")) {
            predicates.push("(first_name = ? AND surname = ?)");
            params.push(name.to_string());
            params.push(surname.to_string());
        }

        if let Some(mobile) = row.optional("MOBILE") {
            predicates.push("mobile_no = ?");
            params.push(mobile.to_string());
        }

        if predicates.is_empty() {
            return None;
        }

        Some(IdentityQuery {
            strategy: MatchStrategy::NameOrMobile,
            predicates,
            params,
        })
    }

    pub fn sql(&self) -> String {
        format!(
            "SELECT id FROM users WHERE {} LIMIT 1",
            self.predicates.join(" OR ")
        )
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Read-only lookup of existing accounts; never creates one
pub struct IdentityResolver<'c> {
    conn: &'c Connection,
}

impl<'c> IdentityResolver<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        IdentityResolver { conn }
    }

    pub fn resolve(&self, row: &Row) -> Result<Resolution> {
        let query = match IdentityQuery::from_row(row) {
            Some(query) => query,
            None => {
                debug!(line = row.line(), "row has no identity columns");
                return Ok(Resolution::NotFound);
            }
        };

        let found: Option<AccountId> = self
            .conn
            .query_row(&query.sql(), params_from_iter(query.params()), |r| r.get(0))
            .optional()?;

        Ok(match found {
            Some(id) => {
                debug!(line = row.line(), strategy = ?query.strategy, account = %id, "matched");
                Resolution::Found(id)
            }
            None => Resolution::NotFound,
        })
    }
}
