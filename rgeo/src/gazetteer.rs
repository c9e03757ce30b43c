//! The place dataset: key → record map plus its sorted key index.
//!
//! A [`Gazetteer`] is produced by a [`GazetteerBuilder`]: records are inserted
//! in any order, then [`GazetteerBuilder::finalize`] materializes and sorts the
//! key sequence in one pass. Finalizing consumes the builder, so a gazetteer is
//! never observable with its map and index out of agreement.

use std::collections::{BTreeMap, HashMap};

use crate::codec::{encode, SpatialKey};
use crate::error::Result;
use crate::index::SortedIndex;

/// An immutable reference place.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceRecord {
    /// Country tag of the source batch (e.g., "US")
    pub country: String,
    /// State, province, or other first-level region
    pub region: String,
    /// City or locality name
    pub city: String,
    /// Postal code or place identifier
    pub postal_code: String,
    /// Latitude as given in the reference data
    pub latitude: f64,
    /// Longitude as given in the reference data
    pub longitude: f64,
}

/// Outcome of [`GazetteerBuilder::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Insertion {
    /// Key the record was stored under.
    pub key: SpatialKey,
    /// Whether an earlier record with the same key was replaced.
    pub overwrote: bool,
}

/// Accumulates records before the index is built.
#[derive(Debug, Default)]
pub struct GazetteerBuilder {
    places: HashMap<SpatialKey, PlaceRecord>,
}

impl GazetteerBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty builder with room for `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            places: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a record at the given coordinate.
    ///
    /// When two coordinates quantize to the same key the later record wins.
    ///
    /// # Errors
    ///
    /// Returns the encoding error for an invalid coordinate; nothing is inserted.
    /// Loaders are expected to skip such records and carry on.
    pub fn insert(&mut self, lat: f64, lon: f64, record: PlaceRecord) -> Result<Insertion> {
        let key = encode(lat, lon)?;
        let overwrote = self.places.insert(key, record).is_some();
        Ok(Insertion { key, overwrote })
    }

    /// Number of distinct keys inserted so far.
    pub fn len(&self) -> usize {
        self.places.len()
    }

    /// Returns `true` if nothing has been inserted.
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Sort the key set and freeze the dataset.
    pub fn finalize(self) -> Gazetteer {
        let index = SortedIndex::from_keys(self.places.keys().copied().collect());
        Gazetteer {
            places: self.places,
            index,
        }
    }
}

/// A built, read-only place dataset.
///
/// Safe to share across threads; all methods take `&self`.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    places: HashMap<SpatialKey, PlaceRecord>,
    index: SortedIndex,
}

impl Gazetteer {
    /// Start building a new gazetteer.
    pub fn builder() -> GazetteerBuilder {
        GazetteerBuilder::new()
    }

    /// An empty gazetteer. Every lookup against it is a no-match.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Record stored under `key`.
    pub fn get(&self, key: SpatialKey) -> Option<&PlaceRecord> {
        self.places.get(&key)
    }

    /// Number of places.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if there are no places.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The sorted key index.
    pub fn index(&self) -> &SortedIndex {
        &self.index
    }

    /// Iterate over places in key order.
    pub fn iter(&self) -> impl Iterator<Item = (SpatialKey, &PlaceRecord)> + '_ {
        self.index
            .keys()
            .iter()
            .filter_map(move |key| self.places.get(key).map(|place| (*key, place)))
    }

    /// Number of places per country tag, sorted by country.
    pub fn country_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for place in self.places.values() {
            *counts.entry(place.country.clone()).or_insert(0) += 1;
        }
        counts
    }
}

impl FromIterator<(f64, f64, PlaceRecord)> for Gazetteer {
    /// Builds a gazetteer, silently skipping invalid coordinates.
    fn from_iter<I: IntoIterator<Item = (f64, f64, PlaceRecord)>>(iter: I) -> Self {
        let mut builder = GazetteerBuilder::new();
        for (lat, lon, record) in iter {
            let _ = builder.insert(lat, lon, record);
        }
        builder.finalize()
    }
}
