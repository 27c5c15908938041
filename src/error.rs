//! Error types for the metrics layer and its loaders

use thiserror::Error;

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between reading a spreadsheet and exporting a report
///
/// An empty filter result is never an error: metric functions return an
/// empty `Vec` instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A column the computation needs is not part of the table
    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    /// A column holds a value that cannot be summed or compared
    #[error("type mismatch in column '{column}': cannot use value {sample:?}")]
    TypeMismatch { column: String, sample: String },

    /// A caller supplied parameter is out of range
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The source file could not be turned into a table
    #[error("load error: {0}")]
    Load(String),

    /// Bad command line or environment value
    #[error("configuration error: {0}")]
    Config(String),

    /// A chart could not be rendered
    #[error("chart error: {0}")]
    Chart(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("excel read error: {0}")]
    Excel(#[from] calamine::XlsxError),

    #[error("excel write error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn missing_column(column: &str) -> Self {
        Error::MissingColumn {
            column: column.to_string(),
        }
    }

    pub(crate) fn type_mismatch(column: &str, sample: impl ToString) -> Self {
        Error::TypeMismatch {
            column: column.to_string(),
            sample: sample.to_string(),
        }
    }
}
