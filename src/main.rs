use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

use member_import::config::{Command, Settings};
use member_import::logging::init_logging;
use member_import::{ensure_schema, open_database, ImportCoordinator, ImportReport, Phase};

fn main() -> Result<()> {
    init_logging();
    let settings = Settings::parse();

    match &settings.command {
        Command::Schema => run_schema(&settings.database),
        Command::Import {
            roster,
            addresses,
            supplemental,
            json,
        } => run_import(
            &settings,
            roster,
            addresses,
            supplemental.as_deref(),
            *json,
        ),
    }
}

fn run_schema(db_path: &Path) -> Result<()> {
    println!("📐 Schema bootstrap");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let mut conn = open_database(db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
    ensure_schema(&mut conn).context("Schema bootstrap failed")?;

    println!("✓ Schema ready in {}", db_path.display());
    Ok(())
}

fn run_import(
    settings: &Settings,
    roster: &Path,
    addresses: &Path,
    supplemental: Option<&Path>,
    json: bool,
) -> Result<()> {
    if !json {
        println!("📥 Member Import - roster + addresses + supplemental → SQLite");
        println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    // 1. Open database and make sure the tables exist
    let mut conn = open_database(&settings.database)
        .with_context(|| format!("Failed to open database: {}", settings.database.display()))?;
    ensure_schema(&mut conn).context("Schema bootstrap failed")?;

    // 2. Run all three phases in one transaction
    let report = ImportCoordinator::new(&mut conn)
        .with_csv_options(settings.csv_options())
        .import_all(roster, addresses, supplemental)
        .context("Import failed, no changes were saved")?;

    // 3. Report
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }

    Ok(())
}

fn print_summary(report: &ImportReport) {
    println!("\n👥 Roster");
    println!("✓ Accounts created: {}", report.accounts_created);
    println!("✓ Profiles created: {}", report.profiles_created);

    println!("\n🏠 Addresses");
    println!("✓ Updated:   {}", report.addresses.updated);
    println!("✓ Unchanged: {}", report.addresses.unchanged);
    println!("⚠️  No match: {}", report.addresses.unmatched);

    println!("\n📎 Supplemental");
    match report.supplemental {
        Some(counts) => {
            println!("✓ Updated:   {}", counts.updated);
            println!("✓ Unchanged: {}", counts.unchanged);
            println!("⚠️  No match: {}", counts.unmatched);
        }
        None => println!("- Skipped (no consolidated file)"),
    }

    println!("\n🔏 Sources");
    for phase in [Phase::Roster, Phase::Addresses, Phase::Supplemental] {
        if let Some(source) = report.source(phase) {
            println!(
                "  {:<12} {} rows  sha256:{}  {}",
                phase.as_str(),
                source.rows,
                &source.sha256[..12.min(source.sha256.len())],
                source.path.display()
            );
        }
    }

    println!("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    let elapsed = report.finished_at - report.started_at;
    println!(
        "🎉 Import committed in {} ms ({} rows skipped)",
        elapsed.num_milliseconds(),
        report.rows_skipped()
    );
}
