// Member Import - Core Library
// CSV exports of the mandal's member register → SQLite, in one transaction

pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod identity;
pub mod ids;
pub mod importer;
pub mod logging;
pub mod parser;
pub mod schema;

// Re-export commonly used types
pub use db::{
    count_accounts, count_profiles, get_account, get_profile_by_account, open_database,
};
pub use entities::{
    Account, AccountClass, AccountId, ApplicationStatus, Gender, MaritalStatus, Math,
    MembershipProfile, MembershipType, SupplementalPatch,
};
pub use error::{ImportError, Phase, Result};
pub use identity::{IdentityResolver, MatchStrategy, Resolution};
pub use ids::{IdGenerator, RandomIdGenerator};
pub use importer::{ImportCoordinator, ImportReport, PatchCounts, SourceFile};
pub use parser::{CsvOptions, CsvReader, Row};
pub use schema::{ensure_schema, verify_schema};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
