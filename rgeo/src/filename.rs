//! Reference file naming utilities.
//!
//! A data directory holds one file per country:
//!
//! - `<COUNTRY>.csv` - plain comma-separated rows
//! - `<COUNTRY>.csv.zip` - a zip archive whose `.csv` entries are read in turn
//!
//! The country tag is the file name up to the first `.` (e.g., `US.csv` → `US`).

/// Extension of plain reference files.
pub const CSV_EXTENSION: &str = ".csv";

/// Extension of zipped reference files.
pub const ZIP_EXTENSION: &str = ".csv.zip";

/// Extract the country tag from a reference file name.
///
/// # Arguments
///
/// * `filename` - The filename (with or without path)
///
/// # Returns
///
/// The text before the first `.` of the file name, or `None` if it is empty.
///
/// # Examples
///
/// ```
/// use rgeo::filename::country_from_filename;
///
/// assert_eq!(country_from_filename("US.csv"), Some("US"));
/// assert_eq!(country_from_filename("/data/places/DE.csv.zip"), Some("DE"));
/// assert_eq!(country_from_filename(".csv"), None);
/// ```
pub fn country_from_filename(filename: &str) -> Option<&str> {
    let name = base_name(filename);
    let country = name.split('.').next().unwrap_or(name);

    if country.is_empty() {
        None
    } else {
        Some(country)
    }
}

/// Whether `filename` follows the reference file naming convention.
///
/// Matching is case-insensitive on the extension. Hidden files are never
/// reference files.
///
/// # Examples
///
/// ```
/// use rgeo::filename::is_reference_file;
///
/// assert!(is_reference_file("US.csv"));
/// assert!(is_reference_file("FR.CSV.ZIP"));
/// assert!(!is_reference_file("README.md"));
/// assert!(!is_reference_file(".csv"));
/// ```
pub fn is_reference_file(filename: &str) -> bool {
    let name = base_name(filename);
    if name.starts_with('.') {
        return false;
    }

    let lower = name.to_ascii_lowercase();
    (lower.ends_with(CSV_EXTENSION) || lower.ends_with(ZIP_EXTENSION))
        && country_from_filename(name).is_some()
}

/// Whether `filename` is a zipped reference file.
pub fn is_zip_file(filename: &str) -> bool {
    base_name(filename)
        .to_ascii_lowercase()
        .ends_with(ZIP_EXTENSION)
}

fn base_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_from_filename() {
        assert_eq!(country_from_filename("US.csv"), Some("US"));
        assert_eq!(country_from_filename("GB.csv.zip"), Some("GB"));
        assert_eq!(country_from_filename("allCountries.csv"), Some("allCountries"));
        assert_eq!(country_from_filename("NOEXT"), Some("NOEXT"));
    }

    #[test]
    fn test_country_from_filename_with_path() {
        assert_eq!(country_from_filename("/path/to/data/JP.csv"), Some("JP"));
        assert_eq!(country_from_filename("C:\\data\\BR.csv"), Some("BR"));
    }

    #[test]
    fn test_country_from_filename_empty() {
        assert_eq!(country_from_filename(""), None);
        assert_eq!(country_from_filename(".csv"), None);
        assert_eq!(country_from_filename("/data/"), None);
    }

    #[test]
    fn test_is_reference_file() {
        assert!(is_reference_file("US.csv"));
        assert!(is_reference_file("US.csv.zip"));
        assert!(is_reference_file("us.Csv"));
        assert!(is_reference_file("/data/CA.csv"));

        assert!(!is_reference_file("US.txt"));
        assert!(!is_reference_file("US.zip"));
        assert!(!is_reference_file("US.csv.bak"));
        assert!(!is_reference_file(".hidden.csv"));
        assert!(!is_reference_file(""));
    }

    #[test]
    fn test_is_zip_file() {
        assert!(is_zip_file("DE.csv.zip"));
        assert!(is_zip_file("/data/DE.CSV.ZIP"));
        assert!(!is_zip_file("DE.csv"));
    }
}
