// 📥 Member Import - three exports merged in one transaction
//
// Phase 1 (roster):       every row creates an account and its profile
// Phase 2 (addresses):    matched rows overwrite postal address and pin code
// Phase 3 (supplemental): matched rows overwrite the supplemental columns they carry
//
// All three phases share one transaction. Any failure rolls back every
// insert and update made by the call; nothing is ever partially imported.

use crate::db;
use crate::entities::{Account, MembershipProfile, SupplementalPatch};
use crate::error::{ImportError, Phase, Result};
use crate::identity::{IdentityResolver, Resolution};
use crate::ids::{IdGenerator, RandomIdGenerator};
use crate::parser::{file_digest, CsvOptions, CsvReader, Row};
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// ============================================================================
// REPORT
// ============================================================================

/// Outcome of a patch phase (addresses or supplemental)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PatchCounts {
    /// Rows that changed a profile
    pub updated: usize,

    /// Rows whose identity columns matched no account
    pub unmatched: usize,

    /// Rows that matched but had nothing to write (no profile, no columns)
    pub unchanged: usize,
}

impl PatchCounts {
    pub fn total(&self) -> usize {
        self.updated + self.unmatched + self.unchanged
    }
}

/// Provenance of one input file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    pub phase: Phase,
    pub path: PathBuf,
    pub sha256: String,
    pub rows: usize,
}

/// Summary of a committed import
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub accounts_created: usize,
    pub profiles_created: usize,
    pub addresses: PatchCounts,

    /// None when the supplemental file was not supplied or does not exist
    pub supplemental: Option<PatchCounts>,

    pub sources: Vec<SourceFile>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ImportReport {
    /// Rows from phases 2 and 3 that matched no account
    pub fn rows_skipped(&self) -> usize {
        self.addresses.unmatched + self.supplemental.map(|s| s.unmatched).unwrap_or(0)
    }

    pub fn source(&self, phase: Phase) -> Option<&SourceFile> {
        self.sources.iter().find(|s| s.phase == phase)
    }
}

// ============================================================================
// COORDINATOR
// ============================================================================

pub struct ImportCoordinator<'c> {
    conn: &'c mut Connection,
    reader: CsvReader,
    ids: Box<dyn IdGenerator>,
}

impl<'c> ImportCoordinator<'c> {
    /// The connection must already have the schema (see `schema::ensure_schema`)
    pub fn new(conn: &'c mut Connection) -> Self {
        ImportCoordinator {
            conn,
            reader: CsvReader::default(),
            ids: Box::new(RandomIdGenerator::new()),
        }
    }

    pub fn with_csv_options(mut self, options: CsvOptions) -> Self {
        self.reader = CsvReader::new(options);
        self
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Run all three phases and commit, or roll everything back
    ///
    /// A missing roster fails before the transaction opens. A missing
    /// address file fails inside it, undoing the roster phase. A missing
    /// supplemental file skips phase 3.
    pub fn import_all(
        &mut self,
        roster: &Path,
        addresses: &Path,
        supplemental: Option<&Path>,
    ) -> Result<ImportReport> {
        if !roster.exists() {
            return Err(ImportError::FileNotFound(roster.to_path_buf())
                .in_phase(Phase::Roster, roster));
        }

        let started_at = Utc::now();
        info!(
            roster = %roster.display(),
            addresses = %addresses.display(),
            "starting member import"
        );

        let tx = self.conn.transaction()?;

        let outcome = run_phases(
            &tx,
            &self.reader,
            self.ids.as_mut(),
            roster,
            addresses,
            supplemental,
        );

        match outcome {
            Ok(mut report) => {
                tx.commit()?;
                report.started_at = started_at;
                report.finished_at = Utc::now();

                info!(
                    accounts = report.accounts_created,
                    addresses = report.addresses.updated,
                    skipped = report.rows_skipped(),
                    "member import committed"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "member import failed, rolling back");
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }
}

// ============================================================================
// PHASES
// ============================================================================

fn run_phases(
    tx: &Connection,
    reader: &CsvReader,
    ids: &mut dyn IdGenerator,
    roster: &Path,
    addresses: &Path,
    supplemental: Option<&Path>,
) -> Result<ImportReport> {
    let now = Utc::now();
    let mut sources = Vec::new();

    let (created, roster_source) =
        import_roster(tx, reader, ids, roster).map_err(|e| e.in_phase(Phase::Roster, roster))?;
    sources.push(roster_source);

    let (address_counts, address_source) =
        patch_rows(tx, reader, Phase::Addresses, addresses, apply_address)
            .map_err(|e| e.in_phase(Phase::Addresses, addresses))?;
    sources.push(address_source);

    let supplemental_counts = match supplemental {
        Some(path) if path.exists() => {
            let (counts, source) =
                patch_rows(tx, reader, Phase::Supplemental, path, apply_supplemental)
                    .map_err(|e| e.in_phase(Phase::Supplemental, path))?;
            sources.push(source);
            Some(counts)
        }
        Some(path) => {
            info!(path = %path.display(), "supplemental file not found, skipping");
            None
        }
        None => None,
    };

    Ok(ImportReport {
        accounts_created: created,
        profiles_created: created,
        addresses: address_counts,
        supplemental: supplemental_counts,
        sources,
        started_at: now,
        finished_at: now,
    })
}

/// Phase 1: one account and one profile per roster row
///
/// No existence check: importing the same roster twice creates duplicates.
fn import_roster(
    tx: &Connection,
    reader: &CsvReader,
    ids: &mut dyn IdGenerator,
    path: &Path,
) -> Result<(usize, SourceFile)> {
    info!(phase = %Phase::Roster, path = %path.display(), "phase started");

    let rows = reader.parse(path)?;
    let sha256 = file_digest(path)?;
    let mut created = 0;

    for row in rows {
        let row = row?;

        let account = Account::from_roster_row(&row, ids.new_id())?;
        let profile = MembershipProfile::from_roster_row(&row, ids.new_id(), &account.id)?;

        db::insert_account(tx, &account)?;
        db::insert_profile(tx, &profile)?;
        created += 1;
    }

    if created == 0 {
        return Err(ImportError::EmptyRoster(path.to_path_buf()));
    }

    info!(phase = %Phase::Roster, created, "phase finished");

    Ok((
        created,
        SourceFile {
            phase: Phase::Roster,
            path: path.to_path_buf(),
            sha256,
            rows: created,
        },
    ))
}

/// Phases 2 and 3: resolve each row to an account and patch its profile
fn patch_rows<F>(
    tx: &Connection,
    reader: &CsvReader,
    phase: Phase,
    path: &Path,
    mut apply: F,
) -> Result<(PatchCounts, SourceFile)>
where
    F: FnMut(&Connection, &str, &Row) -> Result<usize>,
{
    info!(%phase, path = %path.display(), "phase started");

    let rows = reader.parse(path)?;
    let sha256 = file_digest(path)?;
    let resolver = IdentityResolver::new(tx);
    let mut counts = PatchCounts::default();

    for row in rows {
        let row = row?;

        match resolver.resolve(&row)? {
            Resolution::Found(account_id) => {
                if apply(tx, &account_id, &row)? > 0 {
                    counts.updated += 1;
                } else {
                    counts.unchanged += 1;
                }
            }
            Resolution::NotFound => {
                debug!(%phase, line = row.line(), "no matching account, row skipped");
                counts.unmatched += 1;
            }
        }
    }

    info!(
        %phase,
        updated = counts.updated,
        unmatched = counts.unmatched,
        unchanged = counts.unchanged,
        "phase finished"
    );

    Ok((
        counts,
        SourceFile {
            phase,
            path: path.to_path_buf(),
            sha256,
            rows: counts.total(),
        },
    ))
}

fn apply_address(tx: &Connection, account_id: &str, row: &Row) -> Result<usize> {
    db::update_profile_address(
        tx,
        account_id,
        row.optional("ADDRESS"),
        row.optional("PIN_CODE"),
    )
}

fn apply_supplemental(tx: &Connection, account_id: &str, row: &Row) -> Result<usize> {
    let patch = SupplementalPatch::from_row(row)?;
    db::update_profile_supplemental(tx, account_id, &patch)
}
