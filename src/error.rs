// ⚠️ Error taxonomy for the import pipeline
// Fatal errors abort the import; "no match" is not an error (see identity::Resolution)

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImportError>;

// ============================================================================
// PHASE
// ============================================================================

/// The three ordered phases of a member import
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Phase {
    Roster,
    Addresses,
    Supplemental,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Roster => "roster",
            Phase::Addresses => "addresses",
            Phase::Supplemental => "supplemental",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// IMPORT ERROR
// ============================================================================

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("could not read headers from {} or file is empty", .0.display())]
    HeaderReadFailure(PathBuf),

    #[error("row {row} has {actual} columns, but headers have {expected} columns")]
    RowShapeMismatch {
        row: u64,
        expected: usize,
        actual: usize,
    },

    #[error("row {row} is missing required column {column}")]
    MissingColumn { column: String, row: u64 },

    #[error("row {row}: invalid value {value:?} for column {column}")]
    InvalidValue {
        column: String,
        value: String,
        row: u64,
    },

    #[error("no data found in member file {}", .0.display())]
    EmptyRoster(PathBuf),

    #[error("no data to export")]
    EmptyExport,

    #[error("schema verification failed: table {0} is missing")]
    SchemaIncomplete(String),

    #[error("query execution failed: {0}")]
    QueryExecutionFailure(#[from] rusqlite::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{phase} phase failed ({}): {source}", .path.display())]
    Phase {
        phase: Phase,
        path: PathBuf,
        #[source]
        source: Box<ImportError>,
    },
}

impl ImportError {
    /// Wrap an error with the phase and file it happened in
    pub fn in_phase(self, phase: Phase, path: impl Into<PathBuf>) -> Self {
        match self {
            // Already attributed; keep the innermost phase
            ImportError::Phase { .. } => self,
            other => ImportError::Phase {
                phase,
                path: path.into(),
                source: Box::new(other),
            },
        }
    }

    /// Phase the error was raised in, if it was raised inside an import
    pub fn phase(&self) -> Option<Phase> {
        match self {
            ImportError::Phase { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// The underlying error with any phase wrapper stripped
    pub fn root(&self) -> &ImportError {
        match self {
            ImportError::Phase { source, .. } => source.root(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_wrapper_exposes_root() {
        let err = ImportError::FileNotFound(PathBuf::from("addr.csv"))
            .in_phase(Phase::Addresses, "addr.csv");

        assert_eq!(err.phase(), Some(Phase::Addresses));
        assert!(matches!(err.root(), ImportError::FileNotFound(_)));
        assert!(err.to_string().starts_with("addresses phase failed"));
    }

    #[test]
    fn test_phase_wrapper_not_nested_twice() {
        let err = ImportError::EmptyExport
            .in_phase(Phase::Roster, "a.csv")
            .in_phase(Phase::Supplemental, "b.csv");

        assert_eq!(err.phase(), Some(Phase::Roster));
    }

    #[test]
    fn test_row_shape_message() {
        let err = ImportError::RowShapeMismatch {
            row: 3,
            expected: 4,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "row 3 has 2 columns, but headers have 4 columns"
        );
    }
}
