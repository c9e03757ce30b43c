pub mod batch;
pub mod info;
pub mod list;
pub mod query;

use anyhow::{Context, Result};
use rgeo::service::parse_max_distance;
use rgeo::{GeocodeService, GeocodeServiceBuilder};
use std::path::PathBuf;

/// Global options shared by every subcommand.
#[derive(Debug, Clone)]
pub struct ServiceArgs {
    pub data_dir: Option<PathBuf>,
    pub window_size: usize,
    pub max_distance: Option<String>,
    pub no_threshold: bool,
}

impl ServiceArgs {
    /// The data directory from `--data-dir` or `RGEO_DATA_DIR`.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => {
                let dir = std::env::var("RGEO_DATA_DIR").context(
                    "RGEO_DATA_DIR environment variable not set. Use --data-dir or set RGEO_DATA_DIR",
                )?;
                Ok(PathBuf::from(dir))
            }
        }
    }

    /// The match threshold; `None` means unlimited.
    pub fn max_distance_km(&self) -> Result<Option<f64>> {
        if self.no_threshold {
            return Ok(None);
        }
        match &self.max_distance {
            Some(value) => parse_max_distance(value)
                .with_context(|| format!("Invalid maximum distance: '{}'", value)),
            None => Ok(Some(rgeo::DEFAULT_MAX_DISTANCE_KM)),
        }
    }

    /// Load the data directory into a service.
    pub fn build_service(&self) -> Result<GeocodeService> {
        let mut builder = GeocodeServiceBuilder::new(self.data_dir()?).window_size(self.window_size);

        builder = match self.max_distance_km()? {
            Some(km) => builder.max_distance_km(km),
            None => builder.no_threshold(),
        };

        builder.build().context("Failed to load reference data")
    }
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) fn data_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("US.csv"),
            "10001,40.7506,-73.9972,New York City,New York\n\
             90210,34.0901,-118.4065,Beverly Hills,California\n",
        )
        .unwrap();
        dir
    }

    pub(crate) fn args(dir: &TempDir) -> ServiceArgs {
        ServiceArgs {
            data_dir: Some(dir.path().to_path_buf()),
            window_size: 10,
            max_distance: None,
            no_threshold: false,
        }
    }

    #[test]
    fn test_max_distance_km() {
        let dir = data_dir();
        let mut args = args(&dir);
        assert_eq!(args.max_distance_km().unwrap(), Some(50.0));

        args.max_distance = Some("12".to_string());
        assert_eq!(args.max_distance_km().unwrap(), Some(12.0));

        args.max_distance = Some("off".to_string());
        assert_eq!(args.max_distance_km().unwrap(), None);

        args.max_distance = Some("far".to_string());
        assert!(args.max_distance_km().is_err());

        args.max_distance = Some("12".to_string());
        args.no_threshold = true;
        assert_eq!(args.max_distance_km().unwrap(), None);
    }

    #[test]
    fn test_build_service() {
        let dir = data_dir();
        let service = args(&dir).build_service().unwrap();
        assert_eq!(service.stats().places, 2);

        let mut bad = args(&dir);
        bad.window_size = 0;
        assert!(bad.build_service().is_err());
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
