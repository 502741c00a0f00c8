// model = "claude-opus-4-5"
// created = "2026-10-16"
// modified = "2026-10-16"
// driver = "Isaac Clayton"

//! Append-only log of timestamped entries, clustered into foldable groups.
//!
//! Consecutive entries belong to the same group while each one arrives
//! within `group_duration` of the entry stored right before it. A folded
//! group shows up as one row (its header); an expanded group shows its
//! header followed by one row per entry.
//!
//! The rows are never materialised. Each group is a leaf in a
//! `WeightedIndexTree` whose weight is the number of rows it currently
//! shows, so a visible index maps back to a group and an offset inside it
//! with one rank query.
//!
//! ```text
//! groups:   [3: 4 entries, expanded] [6.5: 6 entries] [20: 5 entries]
//! weights:   5                        1                1
//! rows:      0  1  2  3  4            5                6
//!            H  e0 e1 e2 e3           H                H
//! ```

use std::ops::Range;

use tracing::debug;
use tracing::trace;

use crate::config::Config;
use crate::error::Error;
use crate::error::Result;
use crate::index_tree::WeightedIndexTree;

/// Entry timestamps. Fractional values are fine; NaN is rejected on append.
pub type Time = f64;

/// A timestamped item in the log. Immutable once appended.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    pub content: String,
    pub time: Time,
}

impl Entry {
    pub fn new(content: impl Into<String>, time: Time) -> Entry {
        return Entry { content: content.into(), time };
    }
}

/// A contiguous run of entries that folds into a single header row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    /// Position of this group in the log, and of its leaf in the tree.
    pub index: usize,
    /// The time of the group's first entry, rendered with `Display`.
    pub name: String,
    pub is_expanded: bool,
    pub first_entry_index: usize,
    pub entry_count: usize,
}

impl Group {
    /// Rows this group contributes: the header, plus its entries when expanded.
    pub fn visible_rows(&self) -> usize {
        if self.is_expanded {
            return 1 + self.entry_count;
        }
        return 1;
    }

    /// Indexes of this group's entries in the log.
    pub fn entry_range(&self) -> Range<usize> {
        return self.first_entry_index..self.first_entry_index + self.entry_count;
    }
}

/// One visible row: either a group header or an entry of an expanded group.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Row<'a> {
    Group(&'a Group),
    Entry(&'a Entry),
}

/// Where a visible index lands.
///
/// `offset == 0` is the group's header row; `offset == k` for `k >= 1` is
/// the group's k-th entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub group_index: usize,
    pub offset: usize,
}

/// The grouped log. Single writer; reads assume no append is in progress.
#[derive(Clone, Debug)]
pub struct GroupedLog {
    config: Config,
    entries: Vec<Entry>,
    groups: Vec<Group>,
    /// Leaf `i` holds `groups[i].visible_rows()`, except that the last group's
    /// leaf may lag behind while an append is running.
    tree: WeightedIndexTree,
    /// Cached `tree.total()`.
    visible: usize,
}

impl GroupedLog {
    /// Create an empty log.
    pub fn new(config: Config) -> GroupedLog {
        return GroupedLog {
            config,
            entries: Vec::new(),
            groups: Vec::new(),
            tree: WeightedIndexTree::new(),
            visible: 0,
        };
    }

    pub fn config(&self) -> &Config {
        return &self.config;
    }

    /// Number of visible rows. O(1).
    pub fn visible_count(&self) -> usize {
        return self.visible;
    }

    pub fn group_count(&self) -> usize {
        return self.groups.len();
    }

    pub fn entry_count(&self) -> usize {
        return self.entries.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }

    pub fn groups(&self) -> &[Group] {
        return &self.groups;
    }

    pub fn entries(&self) -> &[Entry] {
        return &self.entries;
    }

    pub fn group(&self, index: usize) -> Result<&Group> {
        return self
            .groups
            .get(index)
            .ok_or_else(|| Error::group_not_found(index, self.groups.len()));
    }

    pub fn entry(&self, index: usize) -> Result<&Entry> {
        return self
            .entries
            .get(index)
            .ok_or_else(|| Error::entry_not_found(index, self.entries.len()));
    }

    // --- Appending ---

    /// Append a batch of entries in time order.
    ///
    /// The whole batch is checked before anything is stored: if any entry is
    /// older than the one before it, `OrderViolation` is returned and the log
    /// is left untouched.
    ///
    /// Entries merged into an expanded group do not touch the tree. The group's
    /// leaf is written once when the batch crosses into a new group, and once
    /// more for the last group at the end, so a batch costs one tree write per
    /// group boundary rather than one per entry.
    pub fn append<I>(&mut self, batch: I) -> Result<()>
    where
        I: IntoIterator<Item = Entry>,
    {
        let batch: Vec<Entry> = batch.into_iter().collect();
        if batch.is_empty() {
            return Ok(());
        }
        self.check_order(&batch)?;

        let added = batch.len();
        let groups_before = self.groups.len();
        let duration = self.config.group_duration();

        for entry in batch {
            let last_time = self.entries.last().map(|last| last.time);
            match last_time {
                Some(last) if entry.time <= last + duration => {
                    if let Some(group) = self.groups.last_mut() {
                        group.entry_count += 1;
                        if group.is_expanded {
                            self.visible += 1;
                        }
                    }
                }
                Some(_) => {
                    self.sync_last_group()?;
                    self.start_group(&entry);
                }
                None => self.start_group(&entry),
            }
            self.entries.push(entry);
        }
        self.sync_last_group()?;

        debug!(
            added,
            groups_started = self.groups.len() - groups_before,
            visible = self.visible,
            "appended batch"
        );
        self.check_invariants();
        return Ok(());
    }

    /// Every entry must be at least as late as the one before it.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    fn check_order(&self, batch: &[Entry]) -> Result<()> {
        let mut previous = self.entries.last().map_or(f64::NEG_INFINITY, |last| last.time);
        for (offset, entry) in batch.iter().enumerate() {
            // Negated so that NaN fails as well.
            if !(entry.time >= previous) {
                return Err(Error::OrderViolation {
                    index: self.entries.len() + offset,
                    time: entry.time,
                    previous,
                });
            }
            previous = entry.time;
        }
        return Ok(());
    }

    /// Open a new folded group whose first entry is about to be pushed.
    fn start_group(&mut self, first: &Entry) {
        let index = self.groups.len();
        let group = Group {
            index,
            name: first.time.to_string(),
            is_expanded: false,
            first_entry_index: self.entries.len(),
            entry_count: 1,
        };
        trace!(group = index, name = %group.name, "started group");
        self.groups.push(group);
        let leaf = self.tree.append(1);
        debug_assert_eq!(leaf, index);
        self.visible += 1;
    }

    /// Bring the last group's leaf weight up to date. Folded groups always
    /// weigh 1, so only an expanded group can be stale.
    fn sync_last_group(&mut self) -> Result<()> {
        let Some(group) = self.groups.last() else {
            return Ok(());
        };
        if group.is_expanded {
            self.tree.set(group.index, group.visible_rows() as u64)?;
        }
        return Ok(());
    }

    // --- Folding ---

    /// Collapse a group to its header row. No-op if already folded.
    pub fn fold(&mut self, group_index: usize) -> Result<()> {
        let len = self.groups.len();
        let group = self
            .groups
            .get_mut(group_index)
            .ok_or_else(|| Error::group_not_found(group_index, len))?;
        if !group.is_expanded {
            return Ok(());
        }

        self.tree.set(group_index, 1)?;
        group.is_expanded = false;
        self.visible -= group.entry_count;

        trace!(group = group_index, visible = self.visible, "folded group");
        self.check_invariants();
        return Ok(());
    }

    /// Show a group's entries below its header. No-op if already expanded.
    pub fn expand(&mut self, group_index: usize) -> Result<()> {
        let len = self.groups.len();
        let group = self
            .groups
            .get_mut(group_index)
            .ok_or_else(|| Error::group_not_found(group_index, len))?;
        if group.is_expanded {
            return Ok(());
        }

        self.tree.set(group_index, 1 + group.entry_count as u64)?;
        group.is_expanded = true;
        self.visible += group.entry_count;

        trace!(group = group_index, visible = self.visible, "expanded group");
        self.check_invariants();
        return Ok(());
    }

    /// Fold an expanded group or expand a folded one.
    /// Returns whether the group is expanded afterwards.
    pub fn toggle(&mut self, group_index: usize) -> Result<bool> {
        let expanded = self.group(group_index)?.is_expanded;
        if expanded {
            self.fold(group_index)?;
        } else {
            self.expand(group_index)?;
        }
        return Ok(!expanded);
    }

    // --- Resolving visible rows ---

    /// Map a visible index to its group and offset. O(log n).
    pub fn locate(&self, visible_index: usize) -> Result<Position> {
        let (group_index, offset) = self.tree.query(visible_index as u64)?;
        return Ok(Position { group_index, offset: offset as usize });
    }

    /// The row shown at a single visible index. O(log n).
    pub fn row(&self, visible_index: usize) -> Result<Row<'_>> {
        let position = self.locate(visible_index)?;
        return self.row_at(position);
    }

    fn row_at(&self, position: Position) -> Result<Row<'_>> {
        let group = self.group(position.group_index)?;
        if position.offset == 0 {
            return Ok(Row::Group(group));
        }
        let entry = self.entry(group.first_entry_index + position.offset - 1)?;
        return Ok(Row::Entry(entry));
    }

    /// Iterate over the rows of a contiguous visible range.
    ///
    /// One rank query finds the first row; every row after it is a step
    /// forward from the previous one. An empty range yields nothing.
    pub fn rows(&self, range: Range<usize>) -> Result<VisibleRows<'_>> {
        if range.is_empty() {
            return Ok(VisibleRows {
                log: self,
                group_index: 0,
                offset: 0,
                remaining: 0,
            });
        }
        if range.end > self.visible {
            return Err(Error::OutOfRange {
                index: (range.end - 1) as u64,
                bound: self.visible as u64,
            });
        }

        let start = self.locate(range.start)?;
        return Ok(VisibleRows {
            log: self,
            group_index: start.group_index,
            offset: start.offset,
            remaining: range.len(),
        });
    }

    /// Collect the rows of a contiguous visible range.
    pub fn resolve_visible_range(&self, range: Range<usize>) -> Result<Vec<Row<'_>>> {
        return Ok(self.rows(range)?.collect());
    }

    /// Resolve an arbitrary list of visible indexes, in the order given.
    ///
    /// A gap-free ascending run is walked like `resolve_visible_range`; any
    /// other list costs one rank query per index.
    pub fn resolve_visible(&self, indexes: &[usize]) -> Result<Vec<Row<'_>>> {
        let (Some(&first), Some(&last)) = (indexes.first(), indexes.last()) else {
            return Ok(Vec::new());
        };

        let contiguous = indexes
            .windows(2)
            .all(|pair| pair[0].checked_add(1) == Some(pair[1]));
        if contiguous {
            if last >= self.visible {
                return Err(Error::OutOfRange {
                    index: last as u64,
                    bound: self.visible as u64,
                });
            }
            return self.resolve_visible_range(first..last + 1);
        }

        let mut rows = Vec::with_capacity(indexes.len());
        for &index in indexes {
            rows.push(self.row(index)?);
        }
        return Ok(rows);
    }

    // --- Invariant checking ---

    #[cfg(debug_assertions)]
    fn check_invariants(&self) {
        let mut next_entry = 0;
        let mut visible = 0;
        for (i, group) in self.groups.iter().enumerate() {
            assert_eq!(group.index, i);
            assert!(group.entry_count >= 1, "INVARIANT VIOLATED: group {} is empty", i);
            assert_eq!(
                group.first_entry_index, next_entry,
                "INVARIANT VIOLATED: group {} does not start where group {} ends",
                i,
                i.wrapping_sub(1)
            );
            assert_eq!(
                self.tree.weight(i),
                Ok(group.visible_rows() as u64),
                "INVARIANT VIOLATED: stale leaf weight for group {}",
                i
            );
            next_entry += group.entry_count;
            visible += group.visible_rows();
        }
        assert_eq!(next_entry, self.entries.len());
        assert_eq!(self.tree.len(), self.groups.len());
        assert_eq!(
            visible, self.visible,
            "INVARIANT VIOLATED: visible rows={} != cached visible={}",
            visible, self.visible
        );
        assert_eq!(self.tree.total(), self.visible as u64);
        assert!(self.entries.windows(2).all(|pair| pair[0].time <= pair[1].time));
    }

    #[cfg(not(debug_assertions))]
    #[inline(always)]
    fn check_invariants(&self) {}
}

impl Default for GroupedLog {
    fn default() -> Self {
        return Self::new(Config::default());
    }
}

/// Rows of a contiguous visible range, produced by walking forward from the
/// first one. Built by `GroupedLog::rows`.
#[derive(Clone, Debug)]
pub struct VisibleRows<'a> {
    log: &'a GroupedLog,
    group_index: usize,
    /// 0 = next row is the header, k = next row is the k-th entry.
    offset: usize,
    remaining: usize,
}

impl<'a> Iterator for VisibleRows<'a> {
    type Item = Row<'a>;

    fn next(&mut self) -> Option<Row<'a>> {
        if self.remaining == 0 {
            return None;
        }
        let group = self.log.groups.get(self.group_index)?;
        self.remaining -= 1;

        if self.offset == 0 {
            if group.is_expanded {
                self.offset = 1;
            } else {
                self.group_index += 1;
            }
            return Some(Row::Group(group));
        }

        let entry = self.log.entries.get(group.first_entry_index + self.offset - 1)?;
        self.offset += 1;
        if self.offset > group.entry_count {
            self.offset = 0;
            self.group_index += 1;
        }
        return Some(Row::Entry(entry));
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        return (self.remaining, Some(self.remaining));
    }
}

impl ExactSizeIterator for VisibleRows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with_times(duration: f64, times: &[f64]) -> GroupedLog {
        let mut log = GroupedLog::new(Config::new(duration).unwrap());
        log.append(times.iter().enumerate().map(|(i, &t)| Entry::new(format!("entry {}", i), t)))
            .unwrap();
        return log;
    }

    fn spans(log: &GroupedLog) -> Vec<(usize, usize)> {
        return log
            .groups()
            .iter()
            .map(|g| (g.first_entry_index, g.entry_count))
            .collect();
    }

    #[test]
    fn empty_log() {
        let log = GroupedLog::default();
        assert!(log.is_empty());
        assert_eq!(log.visible_count(), 0);
        assert_eq!(log.group_count(), 0);
        assert!(matches!(log.locate(0), Err(Error::OutOfRange { .. })));
        assert_eq!(log.resolve_visible_range(0..0), Ok(vec![]));
    }

    #[test]
    fn empty_batch_is_noop() {
        let mut log = GroupedLog::default();
        log.append(Vec::new()).unwrap();
        assert!(log.is_empty());
        assert_eq!(log.tree.len(), 0);
    }

    #[test]
    fn threshold_is_chained_not_anchored() {
        // Every gap is 2, so one group even though 0 and 8 are far apart.
        let log = log_with_times(2.0, &[0.0, 2.0, 4.0, 6.0, 8.0]);
        assert_eq!(spans(&log), vec![(0, 5)]);
    }

    #[test]
    fn threshold_is_inclusive() {
        let log = log_with_times(2.0, &[0.0, 2.0, 4.5, 6.5]);
        assert_eq!(spans(&log), vec![(0, 2), (2, 2)]);
    }

    #[test]
    fn zero_duration_groups_equal_times() {
        let log = log_with_times(0.0, &[1.0, 1.0, 2.0, 2.0, 2.0, 3.0]);
        assert_eq!(spans(&log), vec![(0, 2), (2, 3), (5, 1)]);
    }

    #[test]
    fn group_names_render_first_time() {
        let log = log_with_times(2.0, &[3.0, 4.0, 6.5, 20.0]);
        let names: Vec<_> = log.groups().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["3", "6.5", "20"]);
    }

    #[test]
    fn merging_into_expanded_group_syncs_leaf() {
        let mut log = log_with_times(2.0, &[1.0, 2.0]);
        log.expand(0).unwrap();
        assert_eq!(log.tree.weight(0), Ok(3));

        log.append(vec![Entry::new("a", 3.0), Entry::new("b", 4.0)]).unwrap();
        assert_eq!(log.tree.weight(0), Ok(5));
        assert_eq!(log.visible_count(), 5);
    }

    #[test]
    fn crossing_a_boundary_syncs_previous_group() {
        let mut log = log_with_times(2.0, &[1.0]);
        log.expand(0).unwrap();

        // Grows group 0 by two, then opens two new groups in the same batch.
        log.append(vec![
            Entry::new("a", 2.0),
            Entry::new("b", 3.0),
            Entry::new("c", 10.0),
            Entry::new("d", 20.0),
        ])
        .unwrap();

        assert_eq!(spans(&log), vec![(0, 3), (3, 1), (4, 1)]);
        assert_eq!(log.tree.weight(0), Ok(4));
        assert_eq!(log.tree.weight(1), Ok(1));
        assert_eq!(log.tree.weight(2), Ok(1));
        assert_eq!(log.visible_count(), 6);
    }

    #[test]
    fn order_violation_leaves_log_untouched() {
        let mut log = log_with_times(2.0, &[1.0, 5.0]);
        let err = log
            .append(vec![Entry::new("ok", 6.0), Entry::new("late", 3.0)])
            .unwrap_err();
        assert_eq!(err, Error::OrderViolation { index: 3, time: 3.0, previous: 6.0 });
        assert_eq!(log.entry_count(), 2);
        assert_eq!(spans(&log), vec![(0, 1), (1, 1)]);
        assert_eq!(log.visible_count(), 2);
    }

    #[test]
    fn nan_is_an_order_violation() {
        let mut log = GroupedLog::default();
        let err = log.append(vec![Entry::new("nan", f64::NAN)]).unwrap_err();
        assert!(matches!(err, Error::OrderViolation { index: 0, .. }));
        assert!(log.is_empty());
    }

    #[test]
    fn fold_and_expand_are_idempotent() {
        let mut log = log_with_times(2.0, &[1.0, 1.5, 10.0]);
        log.fold(0).unwrap();
        assert_eq!(log.visible_count(), 2);

        log.expand(0).unwrap();
        log.expand(0).unwrap();
        assert_eq!(log.visible_count(), 4);

        log.fold(0).unwrap();
        log.fold(0).unwrap();
        assert_eq!(log.visible_count(), 2);
    }

    #[test]
    fn toggle_flips_state() {
        let mut log = log_with_times(2.0, &[1.0, 1.5]);
        assert_eq!(log.toggle(0), Ok(true));
        assert_eq!(log.visible_count(), 3);
        assert_eq!(log.toggle(0), Ok(false));
        assert_eq!(log.visible_count(), 1);
        assert!(matches!(log.toggle(1), Err(Error::NotFound { .. })));
    }

    #[test]
    fn rows_reports_exact_len() {
        let mut log = log_with_times(2.0, &[1.0, 1.5, 10.0]);
        log.expand(0).unwrap();
        let rows = log.rows(1..4).unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn rows_rejects_range_past_end() {
        let log = log_with_times(2.0, &[1.0, 10.0]);
        assert_eq!(
            log.rows(1..3).err(),
            Some(Error::OutOfRange { index: 2, bound: 2 })
        );
    }

    #[test]
    fn group_entry_range() {
        let log = log_with_times(2.0, &[1.0, 1.5, 10.0, 11.0, 12.0]);
        assert_eq!(log.group(1).unwrap().entry_range(), 2..5);
    }
}
