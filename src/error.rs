use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

/// Failures that abort a computation pass.
///
/// Malformed numeric cells are not errors (they become missing values);
/// only structural problems with a source end up here.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("workbook write error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{source_name}: missing required column '{column}'")]
    MissingColumn {
        source_name: &'static str,
        column: &'static str,
    },

    #[error("{0} has no header row")]
    EmptySource(String),

    #[error("species '{0}' is not in the current selection")]
    SpeciesNotOnSheet(String),

    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),
}

impl ReportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }
}
