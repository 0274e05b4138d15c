use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::core::types::{PlotRange, SignDomain};

/// Point type storable in a [`DataContainer`].
///
/// Points are ordered by `sort_key`; `value_range` is the span the point
/// covers along the value axis (degenerate for single-valued points).
pub trait SortedData: Copy {
    fn sort_key(&self) -> f64;
    fn main_value(&self) -> f64;
    fn value_range(&self) -> PlotRange;
}

/// Container shared between plottables viewing the same data.
pub type SharedDataContainer<T> = Rc<RefCell<DataContainer<T>>>;

/// Key-ordered point storage.
///
/// Invariant: `points[i].sort_key() <= points[i + 1].sort_key()` for all `i`.
/// Duplicate keys are allowed; points with equal keys keep insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct DataContainer<T: SortedData> {
    points: Vec<T>,
}

impl<T: SortedData> Default for DataContainer<T> {
    fn default() -> Self {
        Self { points: Vec::new() }
    }
}

impl<T: SortedData> DataContainer<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a container from a bulk set of points.
    #[must_use]
    pub fn from_points(points: Vec<T>, already_sorted: bool) -> Self {
        let mut container = Self::new();
        container.add_bulk(points, already_sorted);
        container
    }

    #[must_use]
    pub fn into_shared(self) -> SharedDataContainer<T> {
        Rc::new(RefCell::new(self))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.points.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        self.points.get(index)
    }

    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.points.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.points.last()
    }

    /// Replaces the whole content.
    pub fn set(&mut self, points: Vec<T>, already_sorted: bool) {
        self.points.clear();
        self.add_bulk(points, already_sorted);
    }

    pub fn clear(&mut self) {
        debug!(removed = self.points.len(), "clear data container");
        self.points.clear();
    }

    /// Merges `points` into the container, keeping global key order.
    ///
    /// With `already_sorted` the input is trusted to be ascending (verified in
    /// a linear pass); input appended past the current last key costs O(n).
    pub fn add_bulk(&mut self, points: Vec<T>, already_sorted: bool) {
        let mut incoming = drop_non_finite_keys(points);
        if incoming.is_empty() {
            return;
        }

        if !already_sorted || !is_key_sorted(&incoming) {
            if already_sorted {
                warn!(
                    count = incoming.len(),
                    "input flagged as sorted is out of order, sorting"
                );
            }
            incoming.sort_by(|a, b| a.sort_key().total_cmp(&b.sort_key()));
        }

        let incoming_count = incoming.len();
        match self.key_bounds() {
            Some((first_key, last_key)) => {
                let incoming_first = incoming[0].sort_key();
                let incoming_last = incoming[incoming_count - 1].sort_key();
                if incoming_first >= last_key {
                    self.points.extend(incoming);
                } else if incoming_last < first_key {
                    incoming.append(&mut self.points);
                    self.points = incoming;
                } else {
                    let existing = std::mem::take(&mut self.points);
                    self.points = merge_sorted(existing, incoming);
                }
            }
            None => self.points = incoming,
        }

        debug!(
            added = incoming_count,
            total = self.points.len(),
            "bulk add to data container"
        );
    }

    /// Adds a single point; O(1) amortized when its key is not below the last key.
    pub fn add(&mut self, point: T) {
        let key = point.sort_key();
        if !key.is_finite() {
            warn!(key, "dropping point with non-finite key");
            return;
        }

        match self.key_bounds() {
            Some((_, last_key)) if key >= last_key => self.points.push(point),
            Some((first_key, _)) if key < first_key => self.points.insert(0, point),
            Some(_) => {
                let index = self.points.partition_point(|p| p.sort_key() <= key);
                self.points.insert(index, point);
            }
            None => self.points.push(point),
        }
        trace!(count = self.points.len(), "add data point");
    }

    fn key_bounds(&self) -> Option<(f64, f64)> {
        Some((self.points.first()?.sort_key(), self.points.last()?.sort_key()))
    }

    /// Index of the first point with key `>= key`; with `expanded`, one point earlier.
    #[must_use]
    pub fn find_begin(&self, key: f64, expanded: bool) -> usize {
        let index = self.points.partition_point(|p| p.sort_key() < key);
        if expanded && index > 0 {
            index - 1
        } else {
            index
        }
    }

    /// Index one past the last point with key `<= key`; with `expanded`, one point later.
    #[must_use]
    pub fn find_end(&self, key: f64, expanded: bool) -> usize {
        let index = self.points.partition_point(|p| p.sort_key() <= key);
        if expanded && index < self.points.len() {
            index + 1
        } else {
            index
        }
    }

    /// Index range of points with `lower <= key <= upper`.
    ///
    /// Returns an empty range when no point overlaps the interval.
    #[must_use]
    pub fn find_range(&self, lower: f64, upper: f64) -> Range<usize> {
        let range = PlotRange::new(lower, upper).normalized();
        let begin = self.find_begin(range.lower, false);
        let end = self.find_end(range.upper, false);
        if begin >= end { begin..begin } else { begin..end }
    }

    /// Like [`find_range`](Self::find_range) but widened by one point on each side,
    /// so elements partially inside the interval are included.
    #[must_use]
    pub fn visible_range(&self, lower: f64, upper: f64) -> Range<usize> {
        let range = PlotRange::new(lower, upper).normalized();
        let begin = self.find_begin(range.lower, true);
        let end = self.find_end(range.upper, true);
        if begin >= end { begin..begin } else { begin..end }
    }

    /// Points inside `[lower, upper]`.
    #[must_use]
    pub fn slice_in(&self, lower: f64, upper: f64) -> &[T] {
        &self.points[self.find_range(lower, upper)]
    }

    /// Key span of all points whose key matches `sign_domain`.
    #[must_use]
    pub fn key_range(&self, sign_domain: SignDomain) -> Option<PlotRange> {
        let lower = self
            .points
            .iter()
            .map(SortedData::sort_key)
            .find(|key| sign_domain.admits(*key))?;
        let upper = self
            .points
            .iter()
            .rev()
            .map(SortedData::sort_key)
            .find(|key| sign_domain.admits(*key))?;
        Some(PlotRange::new(lower, upper))
    }

    /// Envelope of the point value ranges, optionally restricted to a key interval.
    ///
    /// Each bound only counts when it lies in `sign_domain`; `None` means no
    /// qualifying lower and upper bound was found.
    #[must_use]
    pub fn value_range(
        &self,
        sign_domain: SignDomain,
        in_key_range: Option<PlotRange>,
    ) -> Option<PlotRange> {
        let points = match in_key_range {
            Some(range) => &self.points[self.find_range(range.lower, range.upper)],
            None => &self.points[..],
        };

        let mut lower: Option<f64> = None;
        let mut upper: Option<f64> = None;
        for point in points {
            let current = point.value_range();
            if !current.lower.is_nan()
                && sign_domain.admits(current.lower)
                && lower.is_none_or(|l| current.lower < l)
            {
                lower = Some(current.lower);
            }
            if !current.upper.is_nan()
                && sign_domain.admits(current.upper)
                && upper.is_none_or(|u| current.upper > u)
            {
                upper = Some(current.upper);
            }
        }

        match (lower, upper) {
            (Some(lower), Some(upper)) => Some(PlotRange::new(lower, upper)),
            _ => None,
        }
    }

    /// Removes all points with key `< key`.
    pub fn remove_before(&mut self, key: f64) {
        let end = self.find_begin(key, false);
        self.points.drain(..end);
        debug!(removed = end, key, "remove points before key");
    }

    /// Removes all points with key `> key`.
    pub fn remove_after(&mut self, key: f64) {
        let begin = self.find_end(key, false);
        let removed = self.points.len() - begin;
        self.points.truncate(begin);
        debug!(removed, key, "remove points after key");
    }

    /// Removes all points with `from <= key <= to`; does nothing when `from >= to`.
    pub fn remove_range(&mut self, from: f64, to: f64) {
        if from >= to || self.points.is_empty() {
            return;
        }
        let range = self.find_range(from, to);
        let removed = range.len();
        self.points.drain(range);
        debug!(removed, from, to, "remove points in key range");
    }
}

impl<'a, T: SortedData> IntoIterator for &'a DataContainer<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

fn drop_non_finite_keys<T: SortedData>(mut points: Vec<T>) -> Vec<T> {
    let original = points.len();
    points.retain(|p| p.sort_key().is_finite());
    let dropped = original - points.len();
    if dropped > 0 {
        warn!(dropped, "dropping points with non-finite keys");
    }
    points
}

fn is_key_sorted<T: SortedData>(points: &[T]) -> bool {
    points
        .windows(2)
        .all(|pair| pair[0].sort_key() <= pair[1].sort_key())
}

/// Stable merge: for equal keys, points of `existing` come first.
fn merge_sorted<T: SortedData>(existing: Vec<T>, incoming: Vec<T>) -> Vec<T> {
    let mut merged = Vec::with_capacity(existing.len() + incoming.len());
    let mut left = existing.into_iter().peekable();
    let mut right = incoming.into_iter().peekable();
    loop {
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => l.sort_key() <= r.sort_key(),
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        merged.extend(next);
    }
    merged
}
