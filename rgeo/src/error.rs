//! Error types for the rgeo library.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or querying a gazetteer.
///
/// A lookup that finds nothing is not an error: it is reported as `Ok(None)`.
#[derive(Error, Debug)]
pub enum RgeoError {
    /// IO error when reading reference files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Latitude is outside the encodable range.
    #[error("Latitude out of range: {lat} (valid: -90 <= lat < 90)")]
    LatitudeOutOfRange { lat: f64 },

    /// Longitude is NaN or infinite and cannot be wrapped.
    #[error("Invalid longitude: {lon} (must be a finite number)")]
    InvalidLongitude { lon: f64 },

    /// Candidate window size must be at least 1.
    #[error("Invalid window size: {size} (must be at least 1)")]
    InvalidWindowSize { size: usize },

    /// Distance threshold must be a non-negative number.
    #[error("Invalid maximum distance: {km} km (must be >= 0)")]
    InvalidMaxDistance { km: f64 },

    /// A coordinate could not be interpreted.
    #[error("Invalid coordinate: {message}")]
    InvalidCoordinate { message: String },

    /// The reference data directory does not exist.
    #[error("Data directory not found: {path}")]
    DataDirNotFound { path: PathBuf },

    /// A zipped reference file could not be read.
    #[error("Failed to read archive {path}: {message}")]
    Archive { path: PathBuf, message: String },

    /// No data directory was configured.
    #[error("No data directory configured (set RGEO_DATA_DIR)")]
    MissingDataDir,
}

/// Result type alias using [`RgeoError`].
pub type Result<T> = std::result::Result<T, RgeoError>;
