//! Sorted key sequence with lower-bound search.

use std::ops::Range;

use crate::codec::SpatialKey;

/// Ascending, duplicate-free sequence of [`SpatialKey`]s.
///
/// Built once from the gazetteer's key set and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct SortedIndex {
    keys: Vec<SpatialKey>,
}

impl SortedIndex {
    /// Sort and de-duplicate `keys` into an index.
    pub fn from_keys(mut keys: Vec<SpatialKey>) -> Self {
        keys.sort_unstable();
        keys.dedup();
        Self { keys }
    }

    /// Smallest position `i` with `keys[i] >= target`, or `len()` if every key is smaller.
    ///
    /// Runs in O(log n). Never wraps around to 0 when `target` is past the end.
    ///
    /// # Examples
    ///
    /// ```
    /// use rgeo::codec::SpatialKey;
    /// use rgeo::index::SortedIndex;
    ///
    /// let keys = [10, 20, 30].map(SpatialKey::from_raw).to_vec();
    /// let index = SortedIndex::from_keys(keys);
    /// assert_eq!(index.lower_bound(SpatialKey::from_raw(5)), 0);
    /// assert_eq!(index.lower_bound(SpatialKey::from_raw(20)), 1);
    /// assert_eq!(index.lower_bound(SpatialKey::from_raw(25)), 2);
    /// assert_eq!(index.lower_bound(SpatialKey::from_raw(35)), 3);
    /// ```
    pub fn lower_bound(&self, target: SpatialKey) -> usize {
        self.keys.partition_point(|key| *key < target)
    }

    /// Positions of the `size` keys centered on `center`.
    ///
    /// The range is `[center - size/2, center + size/2)` truncated to `[0, len())`,
    /// so a window at either end holds fewer keys. An odd `size` keeps its extra
    /// key on the low side. An index with fewer than `size` keys is returned whole.
    ///
    /// # Examples
    ///
    /// ```
    /// use rgeo::codec::SpatialKey;
    /// use rgeo::index::SortedIndex;
    ///
    /// let index = SortedIndex::from_keys((0..100).map(SpatialKey::from_raw).collect());
    /// assert_eq!(index.window(50, 10), 45..55);
    /// assert_eq!(index.window(0, 10), 0..5);
    /// assert_eq!(index.window(100, 10), 95..100);
    /// ```
    pub fn window(&self, center: usize, size: usize) -> Range<usize> {
        let len = self.keys.len();
        if len < size {
            return 0..len;
        }

        // Bounds in half-key units so an odd size splits without rounding
        let center = center.min(len);
        let low = (2 * center).saturating_sub(size);
        let high = (2 * center + size).min(2 * len);
        if high <= low {
            return center..center;
        }

        let start = low / 2;
        let end = start + (high - low).div_ceil(2);
        start..end.min(len)
    }

    /// Number of keys in the index.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if the index holds no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key at `position`, if any.
    pub fn get(&self, position: usize) -> Option<SpatialKey> {
        self.keys.get(position).copied()
    }

    /// Smallest key.
    pub fn first(&self) -> Option<SpatialKey> {
        self.keys.first().copied()
    }

    /// Largest key.
    pub fn last(&self) -> Option<SpatialKey> {
        self.keys.last().copied()
    }

    /// All keys in ascending order.
    pub fn keys(&self) -> &[SpatialKey] {
        &self.keys
    }
}
