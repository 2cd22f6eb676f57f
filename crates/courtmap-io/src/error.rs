use courtmap_geometry::HomographyError;

/// Error types for reading and writing courtmap files.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum IoError {
    /// Failed to open, read or write a file
    #[error("Failed to access file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV content
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed JSON content
    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A required column is absent from the header
    #[error("Missing column `{0}`")]
    MissingColumn(String),

    /// A cell could not be parsed as a number
    #[error("Invalid number `{value}` in column `{column}` at row {row}")]
    InvalidNumber {
        /// 1-based data row (the header is not counted).
        row: usize,
        /// Column name.
        column: String,
        /// Offending cell content.
        value: String,
    },

    /// A configuration value cannot be used
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The trajectory table has no `<name>_x` / `<name>_y` pairs
    #[error("No `<name>_x` / `<name>_y` column pairs found")]
    NoStreams,

    /// A stored homography is invalid
    #[error(transparent)]
    Homography(#[from] HomographyError),
}
