//! Reference data loading.
//!
//! Reads a directory of per-country files into a [`Gazetteer`]. See
//! [`crate::filename`] for the naming convention.
//!
//! # Line Format
//!
//! Each line is `postal,latitude,longitude,city,region` with no header row:
//!
//! ```text
//! 10001,40.7506,-73.9972,New York City,New York
//! 90210,34.0901,-118.4065,Beverly Hills,California
//! ```
//!
//! Fields are trimmed and extra fields are ignored. Blank lines are skipped
//! silently. Lines that are short, carry an unparsable number, or encode an
//! invalid coordinate are skipped and counted in [`LoadStats::records_skipped`].
//! Only I/O failures abort a load.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use csv::{ReaderBuilder, StringRecord, Trim};
use zip::ZipArchive;

use crate::error::{Result, RgeoError};
use crate::filename::{country_from_filename, is_reference_file, is_zip_file, CSV_EXTENSION};
use crate::gazetteer::{Gazetteer, GazetteerBuilder, PlaceRecord};

/// Number of fields a usable line must have.
const FIELD_COUNT: usize = 5;

/// Summary of a completed load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Reference files read (a zip archive counts once).
    pub files_read: usize,
    /// Lines that produced a record, including ones that replaced an earlier record.
    pub records_inserted: usize,
    /// Non-blank lines that were rejected.
    pub records_skipped: usize,
    /// Records that replaced an earlier record with the same key.
    pub records_overwritten: usize,
    /// Wall-clock time of the load in milliseconds.
    pub elapsed_ms: u64,
}

/// List the reference files in `dir`, sorted by file name.
///
/// # Errors
///
/// - [`RgeoError::DataDirNotFound`] if `dir` does not exist
/// - [`RgeoError::Io`] if the directory cannot be read
pub fn scan_reference_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Err(RgeoError::DataDirNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            tracing::warn!(path = %path.display(), "Skipping file with non UTF-8 name");
            continue;
        };
        if is_reference_file(name) {
            files.push(path);
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

/// Load every reference file in `dir` into a new gazetteer.
///
/// Files are read in sorted order, so when two records quantize to the same
/// key the one from the later file wins.
///
/// # Errors
///
/// - [`RgeoError::DataDirNotFound`] if `dir` does not exist
/// - [`RgeoError::Io`] / [`RgeoError::Archive`] if a file cannot be read
///
/// # Examples
///
/// ```no_run
/// use rgeo::loader::load_directory;
///
/// let (gazetteer, stats) = load_directory("/data/places")?;
/// println!("{} places from {} files", gazetteer.len(), stats.files_read);
/// # Ok::<(), rgeo::RgeoError>(())
/// ```
pub fn load_directory(dir: impl AsRef<Path>) -> Result<(Gazetteer, LoadStats)> {
    let dir = dir.as_ref();
    let start = Instant::now();

    let files = scan_reference_files(dir)?;
    let mut builder = GazetteerBuilder::new();
    let mut stats = LoadStats::default();

    for path in &files {
        load_file(path, &mut builder, &mut stats)?;
    }

    let gazetteer = builder.finalize();
    stats.elapsed_ms = start.elapsed().as_millis() as u64;

    tracing::info!(
        dir = %dir.display(),
        files = stats.files_read,
        places = gazetteer.len(),
        skipped = stats.records_skipped,
        overwritten = stats.records_overwritten,
        elapsed_ms = stats.elapsed_ms,
        "Loaded reference data"
    );

    Ok((gazetteer, stats))
}

/// Load a single reference file (plain or zipped) into `builder`.
///
/// The country tag comes from the file name.
pub fn load_file(path: &Path, builder: &mut GazetteerBuilder, stats: &mut LoadStats) -> Result<()> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let country = country_from_filename(name).unwrap_or_default().to_string();

    let before = stats.clone();
    if is_zip_file(name) {
        load_zip(path, &country, builder, stats)?;
    } else {
        let file = File::open(path)?;
        load_reader(file, &country, builder, stats)?;
    }
    stats.files_read += 1;

    let inserted = stats.records_inserted - before.records_inserted;
    let skipped = stats.records_skipped - before.records_skipped;
    if inserted == 0 {
        tracing::warn!(file = %path.display(), skipped, "No usable records in file");
    } else {
        tracing::info!(file = %path.display(), country = %country, inserted, skipped, "Read reference file");
    }

    Ok(())
}

/// Read every `.csv` entry of a zip archive, in entry name order.
fn load_zip(
    path: &Path,
    country: &str,
    builder: &mut GazetteerBuilder,
    stats: &mut LoadStats,
) -> Result<()> {
    let archive_error = |e: zip::result::ZipError| RgeoError::Archive {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file).map_err(archive_error)?;

    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.to_ascii_lowercase().ends_with(CSV_EXTENSION))
        .map(String::from)
        .collect();
    names.sort();

    if names.is_empty() {
        tracing::warn!(file = %path.display(), "Archive contains no .csv entries");
    }

    for entry_name in names {
        let entry = archive.by_name(&entry_name).map_err(archive_error)?;
        tracing::debug!(file = %path.display(), entry = %entry_name, "Reading archive entry");
        load_reader(entry, country, builder, stats)?;
    }

    Ok(())
}

/// Parse reference lines from `reader`, tagging each record with `country`.
///
/// # Errors
///
/// Returns [`RgeoError::Io`] only if the underlying reader fails. Malformed
/// lines are counted in `stats` and skipped.
pub fn load_reader<R: Read>(
    reader: R,
    country: &str,
    builder: &mut GazetteerBuilder,
    stats: &mut LoadStats,
) -> Result<()> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(Trim::All)
        .from_reader(reader);

    let mut record = StringRecord::new();
    loop {
        match csv_reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => {
                return Err(RgeoError::Io(e.into()));
            }
            Err(e) => {
                tracing::debug!(country, error = %e, "Skipping unparsable line");
                stats.records_skipped += 1;
                continue;
            }
        }

        if record.iter().all(str::is_empty) {
            continue;
        }

        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let Some((lat, lon, place)) = parse_record(&record, country) else {
            tracing::debug!(country, line, "Skipping malformed line");
            stats.records_skipped += 1;
            continue;
        };

        match builder.insert(lat, lon, place) {
            Ok(insertion) => {
                stats.records_inserted += 1;
                if insertion.overwrote {
                    stats.records_overwritten += 1;
                }
            }
            Err(e) => {
                tracing::debug!(country, line, error = %e, "Skipping invalid coordinate");
                stats.records_skipped += 1;
            }
        }
    }

    Ok(())
}

fn parse_record(record: &StringRecord, country: &str) -> Option<(f64, f64, PlaceRecord)> {
    if record.len() < FIELD_COUNT {
        return None;
    }

    let latitude: f64 = record.get(1)?.parse().ok()?;
    let longitude: f64 = record.get(2)?.parse().ok()?;

    let place = PlaceRecord {
        country: country.to_string(),
        region: record.get(4)?.to_string(),
        city: record.get(3)?.to_string(),
        postal_code: record.get(0)?.to_string(),
        latitude,
        longitude,
    };
    Some((latitude, longitude, place))
}
