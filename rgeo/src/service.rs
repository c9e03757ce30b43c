//! Reverse geocoding service with hot reload.
//!
//! This module provides [`GeocodeService`], a high-level interface that owns a
//! loaded [`Gazetteer`] and answers lookups from any number of threads.
//!
//! # Reloading
//!
//! The gazetteer is held behind `RwLock<Arc<Gazetteer>>`. A lookup clones the
//! `Arc` under a short read lock and searches without holding any lock.
//! [`GeocodeService::reload`] builds a complete new gazetteer first and only
//! then swaps it in, so readers see either the old dataset or the new one,
//! never a partial build. A failed reload leaves the old dataset in place.
//!
//! ```no_run
//! use rgeo::GeocodeServiceBuilder;
//!
//! let service = GeocodeServiceBuilder::new("/data/places")
//!     .window_size(20)
//!     .max_distance_km(25.0)
//!     .build()?;
//!
//! if let Some(found) = service.locate(40.7128, -74.0060)? {
//!     println!("{}, {}", found.place.city, found.place.country);
//! }
//!
//! // Pick up new files without restarting
//! service.reload()?;
//! # Ok::<(), rgeo::RgeoError>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{Result, RgeoError};
use crate::gazetteer::Gazetteer;
use crate::loader::{load_directory, LoadStats};
use crate::locator::{locate, LocateOptions, PlaceMatch, DEFAULT_MAX_DISTANCE_KM, DEFAULT_WINDOW_SIZE};

/// Statistics about lookups served.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupStats {
    /// Number of places in the current gazetteer.
    pub places: usize,
    /// Total lookups attempted.
    pub queries: u64,
    /// Lookups that returned a place.
    pub matches: u64,
    /// Lookups that returned no place.
    pub no_matches: u64,
    /// Lookups rejected with an error.
    pub errors: u64,
}

impl LookupStats {
    /// Fraction of lookups that returned a place (0.0 to 1.0).
    ///
    /// Returns 0.0 if no lookups have been made.
    pub fn match_rate(&self) -> f64 {
        if self.queries == 0 {
            0.0
        } else {
            self.matches as f64 / self.queries as f64
        }
    }
}

/// Parse a distance threshold setting.
///
/// `none` and `off` (any case) disable the threshold. Returns `None` if the
/// value is neither a keyword nor a number.
///
/// # Examples
///
/// ```
/// use rgeo::service::parse_max_distance;
///
/// assert_eq!(parse_max_distance("25"), Some(Some(25.0)));
/// assert_eq!(parse_max_distance("off"), Some(None));
/// assert_eq!(parse_max_distance("far"), None);
/// ```
pub fn parse_max_distance(value: &str) -> Option<Option<f64>> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") || value.eq_ignore_ascii_case("off") {
        return Some(None);
    }
    value.parse().ok().map(Some)
}

/// Reverse geocoding service over a shared, reloadable gazetteer.
///
/// `GeocodeService` is `Send + Sync`; wrap it in an `Arc` to share it between
/// threads or request handlers.
///
/// # Example
///
/// ```
/// use rgeo::{GeocodeService, Gazetteer, LocateOptions, PlaceRecord};
///
/// let place = PlaceRecord {
///     country: "JP".into(),
///     region: "Tokyo".into(),
///     city: "Chiyoda".into(),
///     postal_code: "100-0001".into(),
///     latitude: 35.6852,
///     longitude: 139.7528,
/// };
/// let gazetteer: Gazetteer = vec![(35.6852, 139.7528, place)].into_iter().collect();
/// let service = GeocodeService::from_gazetteer(gazetteer, LocateOptions::default());
///
/// let found = service.locate(35.68, 139.75).unwrap().unwrap();
/// assert_eq!(found.place.city, "Chiyoda");
///
/// let stats = service.stats();
/// println!("Match rate: {:.1}%", stats.match_rate() * 100.0);
/// ```
#[derive(Debug)]
pub struct GeocodeService {
    /// Directory reloaded from, if any.
    data_dir: Option<PathBuf>,
    /// Options used by [`GeocodeService::locate`].
    options: LocateOptions,
    /// Current dataset.
    gazetteer: RwLock<Arc<Gazetteer>>,
    /// Summary of the most recent successful load.
    last_load: RwLock<Option<LoadStats>>,
    queries: AtomicU64,
    matches: AtomicU64,
    no_matches: AtomicU64,
    errors: AtomicU64,
}

impl GeocodeService {
    /// Create a builder that loads from `data_dir`.
    pub fn builder<P: AsRef<Path>>(data_dir: P) -> GeocodeServiceBuilder {
        GeocodeServiceBuilder::new(data_dir)
    }

    /// Serve an in-memory gazetteer.
    ///
    /// The service has no data directory, so [`GeocodeService::reload`] fails
    /// with [`RgeoError::MissingDataDir`].
    pub fn from_gazetteer(gazetteer: Gazetteer, options: LocateOptions) -> Self {
        Self::with_parts(None, options, gazetteer, None)
    }

    fn with_parts(
        data_dir: Option<PathBuf>,
        options: LocateOptions,
        gazetteer: Gazetteer,
        last_load: Option<LoadStats>,
    ) -> Self {
        Self {
            data_dir,
            options,
            gazetteer: RwLock::new(Arc::new(gazetteer)),
            last_load: RwLock::new(last_load),
            queries: AtomicU64::new(0),
            matches: AtomicU64::new(0),
            no_matches: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Find the nearest place using the configured options.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(match))` - nearest place within the threshold
    /// - `Ok(None)` - no place close enough, or no data loaded
    /// - `Err(...)` - latitude out of range or non-finite longitude
    pub fn locate(&self, lat: f64, lon: f64) -> Result<Option<PlaceMatch>> {
        let options = self.options;
        self.locate_recorded(lat, lon, &options)
    }

    /// Find the nearest place with per-call options.
    ///
    /// # Errors
    ///
    /// Also fails with a configuration error if the options are invalid.
    pub fn locate_with(
        &self,
        lat: f64,
        lon: f64,
        window_size: usize,
        max_distance_km: Option<f64>,
    ) -> Result<Option<PlaceMatch>> {
        self.locate_recorded(lat, lon, &LocateOptions::new(window_size, max_distance_km))
    }

    /// Look up a batch of coordinates against a single snapshot of the data.
    ///
    /// Returns one entry per input coordinate, in input order. Invalid
    /// coordinates yield `None` and are counted as errors.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let coords = vec![(40.7128, -74.0060), (35.6762, 139.6503)];
    /// let places = service.locate_batch(&coords);
    /// ```
    pub fn locate_batch(&self, coords: &[(f64, f64)]) -> Vec<Option<PlaceMatch>> {
        let gazetteer = self.gazetteer();
        coords
            .iter()
            .map(|&(lat, lon)| {
                let result = locate(&gazetteer, lat, lon, &self.options);
                self.record(&result);
                result.ok().flatten()
            })
            .collect()
    }

    fn locate_recorded(
        &self,
        lat: f64,
        lon: f64,
        options: &LocateOptions,
    ) -> Result<Option<PlaceMatch>> {
        let gazetteer = self.gazetteer();
        let result = locate(&gazetteer, lat, lon, options);
        self.record(&result);
        result
    }

    fn record(&self, result: &Result<Option<PlaceMatch>>) {
        self.queries.fetch_add(1, Ordering::Relaxed);
        let counter = match result {
            Ok(Some(_)) => &self.matches,
            Ok(None) => &self.no_matches,
            Err(_) => &self.errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Rebuild the gazetteer from the data directory and swap it in.
    ///
    /// Lookups keep running against the old data while the new one is built.
    ///
    /// # Errors
    ///
    /// - [`RgeoError::MissingDataDir`] if the service was built from memory
    /// - Any loader error; the current gazetteer is kept
    pub fn reload(&self) -> Result<LoadStats> {
        let data_dir = self.data_dir.as_deref().ok_or(RgeoError::MissingDataDir)?;

        let (gazetteer, stats) = match load_directory(data_dir) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(dir = %data_dir.display(), error = %e, "Reload failed, keeping current data");
                return Err(e);
            }
        };
        let places = gazetteer.len();

        *self.gazetteer.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(gazetteer);
        *self.last_load.write().unwrap_or_else(PoisonError::into_inner) = Some(stats.clone());

        tracing::info!(places, elapsed_ms = stats.elapsed_ms, "Reloaded reference data");
        Ok(stats)
    }

    /// Snapshot of the current gazetteer.
    pub fn gazetteer(&self) -> Arc<Gazetteer> {
        self.gazetteer
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get lookup statistics.
    pub fn stats(&self) -> LookupStats {
        LookupStats {
            places: self.gazetteer().len(),
            queries: self.queries.load(Ordering::Relaxed),
            matches: self.matches.load(Ordering::Relaxed),
            no_matches: self.no_matches.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    /// Summary of the most recent successful load, if data came from disk.
    pub fn last_load(&self) -> Option<LoadStats> {
        self.last_load
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Options used by [`GeocodeService::locate`].
    pub fn options(&self) -> &LocateOptions {
        &self.options
    }

    /// Get the data directory path, if any.
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }
}

/// Builder for [`GeocodeService`].
///
/// # Example
///
/// ```no_run
/// use rgeo::GeocodeServiceBuilder;
///
/// let service = GeocodeServiceBuilder::from_env()?
///     .window_size(32)
///     .build()?;
/// # Ok::<(), rgeo::RgeoError>(())
/// ```
#[derive(Debug, Clone)]
pub struct GeocodeServiceBuilder {
    data_dir: PathBuf,
    window_size: usize,
    max_distance_km: Option<f64>,
}

impl GeocodeServiceBuilder {
    /// Create a new builder with the specified data directory.
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            window_size: DEFAULT_WINDOW_SIZE,
            max_distance_km: Some(DEFAULT_MAX_DISTANCE_KM),
        }
    }

    /// Create a builder configured from environment variables.
    ///
    /// # Environment Variables
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `RGEO_DATA_DIR` | Directory of `<COUNTRY>.csv` files | Required |
    /// | `RGEO_WINDOW_SIZE` | Candidate keys examined per lookup | 10 |
    /// | `RGEO_MAX_DISTANCE_KM` | Match threshold in km, `none`/`off` to disable | 50 |
    ///
    /// Unparsable numbers fall back to the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RgeoError::MissingDataDir`] if `RGEO_DATA_DIR` is not set.
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var("RGEO_DATA_DIR").map_err(|_| RgeoError::MissingDataDir)?;

        let window_size: usize = std::env::var("RGEO_WINDOW_SIZE")
            .ok()
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_WINDOW_SIZE);

        let max_distance_km = std::env::var("RGEO_MAX_DISTANCE_KM")
            .ok()
            .and_then(|s| parse_max_distance(&s))
            .unwrap_or(Some(DEFAULT_MAX_DISTANCE_KM));

        Ok(Self {
            data_dir: PathBuf::from(data_dir),
            window_size,
            max_distance_km,
        })
    }

    /// Set the data directory.
    ///
    /// Overrides the directory set in the constructor or from environment.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = path.as_ref().to_path_buf();
        self
    }

    /// Set the number of candidate keys examined per lookup.
    ///
    /// Default is 10.
    pub fn window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    /// Set the match threshold in kilometers.
    ///
    /// Default is 50 km.
    pub fn max_distance_km(mut self, km: f64) -> Self {
        self.max_distance_km = Some(km);
        self
    }

    /// Accept the nearest candidate however far away it is.
    pub fn no_threshold(mut self) -> Self {
        self.max_distance_km = None;
        self
    }

    /// The lookup options this builder will use.
    pub fn options(&self) -> LocateOptions {
        LocateOptions::new(self.window_size, self.max_distance_km)
    }

    /// Validate the options, load the data directory, and build the [`GeocodeService`].
    ///
    /// # Errors
    ///
    /// - Configuration errors for an invalid window or threshold
    /// - [`RgeoError::DataDirNotFound`] or I/O errors from loading
    pub fn build(self) -> Result<GeocodeService> {
        let options = self.options();
        options.validate()?;

        let (gazetteer, stats) = load_directory(&self.data_dir)?;
        Ok(GeocodeService::with_parts(
            Some(self.data_dir),
            options,
            gazetteer,
            Some(stats),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::tests::place;
    use crate::loader::tests::{data_dir, JP_ROWS, US_ROWS};
    use std::fs;

    fn memory_service() -> GeocodeService {
        let gazetteer: Gazetteer = vec![
            (40.7506, -73.9972, place("US", "New York City", 40.7506, -73.9972)),
            (35.6852, 139.7528, place("JP", "Chiyoda", 35.6852, 139.7528)),
        ]
        .into_iter()
        .collect();
        GeocodeService::from_gazetteer(gazetteer, LocateOptions::default())
    }

    #[test]
    fn test_service_basic() {
        let dir = data_dir(&[("US.csv", US_ROWS), ("JP.csv", JP_ROWS)]);
        let service = GeocodeServiceBuilder::new(dir.path()).build().unwrap();

        let found = service.locate(34.09, -118.41).unwrap().unwrap();
        assert_eq!(found.place.city, "Beverly Hills");
        assert_eq!(found.place.country, "US");

        assert!(service.locate(0.0, 0.0).unwrap().is_none());
        assert_eq!(service.data_dir(), Some(dir.path()));
        assert_eq!(service.last_load().unwrap().files_read, 2);
    }

    #[test]
    fn test_stats_counters() {
        let service = memory_service();

        service.locate(40.75, -74.0).unwrap();
        service.locate(0.0, 0.0).unwrap();
        assert!(service.locate(100.0, 0.0).is_err());

        let stats = service.stats();
        assert_eq!(stats.places, 2);
        assert_eq!(stats.queries, 3);
        assert_eq!(stats.matches, 1);
        assert_eq!(stats.no_matches, 1);
        assert_eq!(stats.errors, 1);
        assert!((stats.match_rate() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_match_rate_no_queries() {
        assert_eq!(LookupStats::default().match_rate(), 0.0);
    }

    #[test]
    fn test_locate_with_overrides() {
        let service = memory_service();

        // 200 km away: outside the default threshold, inside an explicit one
        assert!(service.locate(38.95, -74.0).unwrap().is_none());
        let found = service.locate_with(38.95, -74.0, 10, Some(500.0)).unwrap();
        assert_eq!(found.unwrap().place.city, "New York City");

        let found = service.locate_with(38.95, -74.0, 10, None).unwrap();
        assert!(found.is_some());

        assert!(matches!(
            service.locate_with(40.0, -74.0, 0, None),
            Err(RgeoError::InvalidWindowSize { .. })
        ));
    }

    #[test]
    fn test_locate_batch() {
        let service = memory_service();

        let coords = vec![(40.75, -74.0), (95.0, 0.0), (0.0, 0.0), (35.68, 139.75)];
        let results = service.locate_batch(&coords);

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].as_ref().unwrap().place.city, "New York City");
        assert!(results[1].is_none()); // invalid latitude
        assert!(results[2].is_none()); // nothing nearby
        assert_eq!(results[3].as_ref().unwrap().place.city, "Chiyoda");

        let stats = service.stats();
        assert_eq!(stats.queries, 4);
        assert_eq!(stats.errors, 1);
    }

    #[test]
    fn test_reload_picks_up_new_files() {
        let dir = data_dir(&[("US.csv", US_ROWS)]);
        let service = GeocodeService::builder(dir.path()).build().unwrap();
        assert!(service.locate(35.68, 139.75).unwrap().is_none());

        fs::write(dir.path().join("JP.csv"), JP_ROWS).unwrap();
        let stats = service.reload().unwrap();
        assert_eq!(stats.files_read, 2);

        let found = service.locate(35.68, 139.75).unwrap().unwrap();
        assert_eq!(found.place.country, "JP");
        assert_eq!(service.stats().places, 5);
    }

    #[test]
    fn test_failed_reload_keeps_data() {
        let dir = data_dir(&[("US.csv", US_ROWS)]);
        let service = GeocodeService::builder(dir.path()).build().unwrap();
        let before = service.gazetteer();

        fs::write(dir.path().join("ZZ.csv.zip"), "not a zip archive").unwrap();
        assert!(matches!(service.reload(), Err(RgeoError::Archive { .. })));

        assert!(Arc::ptr_eq(&before, &service.gazetteer()));
        assert!(service.locate(40.75, -74.0).unwrap().is_some());
    }

    #[test]
    fn test_reload_without_data_dir() {
        let service = memory_service();
        assert!(matches!(service.reload(), Err(RgeoError::MissingDataDir)));
        assert!(service.last_load().is_none());
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let dir = data_dir(&[("US.csv", US_ROWS)]);
        let service = GeocodeService::builder(dir.path()).build().unwrap();

        let snapshot = service.gazetteer();
        fs::write(dir.path().join("JP.csv"), JP_ROWS).unwrap();
        service.reload().unwrap();

        assert_eq!(snapshot.len(), 3);
        assert_eq!(service.gazetteer().len(), 5);
    }

    #[test]
    fn test_concurrent_lookups_during_reload() {
        let dir = data_dir(&[("US.csv", US_ROWS), ("JP.csv", JP_ROWS)]);
        let service = GeocodeService::builder(dir.path()).build().unwrap();

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..200 {
                        let found = service.locate(41.88, -87.62).unwrap().unwrap();
                        assert_eq!(found.place.city, "Chicago");
                    }
                });
            }
            s.spawn(|| {
                for _ in 0..5 {
                    service.reload().unwrap();
                }
            });
        });

        assert_eq!(service.stats().queries, 800);
    }

    #[test]
    fn test_build_validates_options() {
        let dir = data_dir(&[("US.csv", US_ROWS)]);

        let result = GeocodeServiceBuilder::new(dir.path()).window_size(0).build();
        assert!(matches!(result, Err(RgeoError::InvalidWindowSize { .. })));

        let result = GeocodeServiceBuilder::new(dir.path())
            .max_distance_km(-5.0)
            .build();
        assert!(matches!(result, Err(RgeoError::InvalidMaxDistance { .. })));
    }

    #[test]
    fn test_build_missing_dir() {
        let result = GeocodeServiceBuilder::new("/nonexistent/rgeo").build();
        assert!(matches!(result, Err(RgeoError::DataDirNotFound { .. })));
    }

    #[test]
    fn test_builder_no_threshold() {
        let dir = data_dir(&[("US.csv", US_ROWS)]);
        let service = GeocodeServiceBuilder::new(dir.path())
            .no_threshold()
            .build()
            .unwrap();

        assert_eq!(service.options().max_distance_km, None);
        assert!(service.locate(0.0, 0.0).unwrap().is_some());
    }

    #[test]
    fn test_parse_max_distance() {
        assert_eq!(parse_max_distance("50"), Some(Some(50.0)));
        assert_eq!(parse_max_distance(" 12.5 "), Some(Some(12.5)));
        assert_eq!(parse_max_distance("NONE"), Some(None));
        assert_eq!(parse_max_distance("off"), Some(None));
        assert_eq!(parse_max_distance(""), None);
        assert_eq!(parse_max_distance("abc"), None);
    }

    // Environment variables are process-wide, so every from_env case runs in one test.
    #[test]
    fn test_from_env() {
        let temp_dir = tempfile::TempDir::new().unwrap();

        let vars = ["RGEO_DATA_DIR", "RGEO_WINDOW_SIZE", "RGEO_MAX_DISTANCE_KM"];
        let originals: Vec<Option<String>> = vars.iter().map(|v| std::env::var(v).ok()).collect();
        for var in vars {
            std::env::remove_var(var);
        }

        // Missing data dir
        assert!(matches!(
            GeocodeServiceBuilder::from_env(),
            Err(RgeoError::MissingDataDir)
        ));

        // Defaults
        std::env::set_var("RGEO_DATA_DIR", temp_dir.path());
        let builder = GeocodeServiceBuilder::from_env().unwrap();
        assert_eq!(builder.data_dir, temp_dir.path());
        assert_eq!(builder.options(), LocateOptions::default());

        // Explicit values
        std::env::set_var("RGEO_WINDOW_SIZE", "25");
        std::env::set_var("RGEO_MAX_DISTANCE_KM", "12.5");
        let options = GeocodeServiceBuilder::from_env().unwrap().options();
        assert_eq!(options.window_size, 25);
        assert_eq!(options.max_distance_km, Some(12.5));

        // Threshold disabled, unparsable window falls back
        std::env::set_var("RGEO_WINDOW_SIZE", "lots");
        std::env::set_var("RGEO_MAX_DISTANCE_KM", "off");
        let options = GeocodeServiceBuilder::from_env().unwrap().options();
        assert_eq!(options.window_size, DEFAULT_WINDOW_SIZE);
        assert_eq!(options.max_distance_km, None);

        for (var, original) in vars.iter().zip(originals) {
            match original {
                Some(v) => std::env::set_var(var, v),
                None => std::env::remove_var(var),
            }
        }
    }
}
