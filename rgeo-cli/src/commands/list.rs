use anyhow::{Context, Result};
use rgeo::filename::{country_from_filename, is_zip_file};
use rgeo::loader::scan_reference_files;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{format_size, ServiceArgs};

pub fn run(args: &ServiceArgs) -> Result<()> {
    let dir = args.data_dir()?;

    if !dir.exists() {
        anyhow::bail!("Data directory does not exist: {}", dir.display());
    }

    let files = scan_reference_files(&dir).context("Failed to read data directory")?;
    print_listing(&mut io::stdout().lock(), &dir, &files)
}

fn print_listing(out: &mut impl Write, dir: &Path, files: &[PathBuf]) -> Result<()> {
    if files.is_empty() {
        writeln!(out, "No reference files found in: {}", dir.display())?;
        return Ok(());
    }

    let mut total_size: u64 = 0;
    let mut zipped = 0;

    writeln!(out, "{:<20} {:>8} {:>12}", "FILE", "COUNTRY", "SIZE")?;
    writeln!(out, "{}", "-".repeat(42))?;

    for path in files {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let size = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        total_size += size;

        if is_zip_file(&filename) {
            zipped += 1;
        }

        let country = country_from_filename(&filename).unwrap_or("???");
        writeln!(out, "{:<20} {:>8} {:>12}", filename, country, format_size(size))?;
    }

    // Summary
    writeln!(out)?;
    writeln!(out, "Summary:")?;
    writeln!(out, "  Total files: {}", files.len())?;
    if zipped > 0 {
        writeln!(out, "  Zipped: {}", zipped)?;
    }
    writeln!(out, "  Total size: {}", format_size(total_size))?;
    writeln!(out, "  Data directory: {}", dir.display())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn listing(dir: &Path) -> String {
        let files = scan_reference_files(dir).unwrap();
        let mut out = Vec::new();
        print_listing(&mut out, dir, &files).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_listing_shows_reference_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("US.csv"), "10001,40.7506,-73.9972,New York City,New York\n").unwrap();
        fs::write(dir.path().join("JP.csv.zip"), [0u8; 2048]).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let text = listing(dir.path());
        let rows: Vec<&str> = text.lines().filter(|l| l.contains(".csv")).collect();

        assert_eq!(rows.len(), 2);
        assert!(rows[0].starts_with("JP.csv.zip") && rows[0].contains("JP"));
        assert!(rows[0].contains("2.00 KB"));
        assert!(rows[1].starts_with("US.csv") && rows[1].contains("US"));
        assert!(text.contains("Total files: 2"));
        assert!(text.contains("Zipped: 1"));
        assert!(!text.contains("notes.txt"));
    }

    #[test]
    fn test_listing_empty_directory() {
        let dir = TempDir::new().unwrap();
        let text = listing(dir.path());
        assert!(text.starts_with("No reference files found"));
    }

    #[test]
    fn test_run_missing_directory() {
        let args = ServiceArgs {
            data_dir: Some(PathBuf::from("/nonexistent/rgeo/data")),
            window_size: 10,
            max_distance: None,
            no_threshold: false,
        };
        assert!(run(&args).is_err());
    }
}
