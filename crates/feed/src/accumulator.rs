use aduan_model::{FeedFilter, ReportItem};
use std::collections::HashSet;

/// Result of merging one fetched page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Items actually appended (duplicates filtered out).
    pub appended: usize,
    /// True once the feed has no more pages to fetch.
    pub exhausted: bool,
    /// True when the page was requested under an older filter context
    /// and discarded without touching state.
    pub stale: bool,
}

/// Ordered report collection for one feed view.
///
/// Owns the page cursor and the dedup set. The cursor only grows within
/// one filter context; a filter change resets everything and bumps the
/// epoch so responses from before the change are discarded on arrival
/// (there is no request cancellation).
#[derive(Debug)]
pub struct FeedAccumulator {
    items: Vec<ReportItem>,
    seen: HashSet<String>,
    offset: usize,
    has_more: bool,
    epoch: u64,
    filter: FeedFilter,
    page_size: usize,
}

impl FeedAccumulator {
    pub fn new(filter: FeedFilter) -> Self {
        Self::with_page_size(filter, 10)
    }

    pub fn with_page_size(filter: FeedFilter, page_size: usize) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            offset: 0,
            has_more: true,
            epoch: 0,
            filter,
            page_size,
        }
    }

    pub fn items(&self) -> &[ReportItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn filter(&self) -> &FeedFilter {
        &self.filter
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Switch predicates. A no-op when the filter is unchanged;
    /// otherwise the collection is cleared and the cursor zeroed before
    /// any fetch under the new predicates.
    pub fn set_filter(&mut self, filter: FeedFilter) {
        if filter == self.filter {
            return;
        }
        self.filter = filter;
        self.reset();
    }

    /// Clear items and cursor, invalidating responses in flight.
    pub fn reset(&mut self) {
        self.items.clear();
        self.seen.clear();
        self.offset = 0;
        self.has_more = true;
        self.epoch += 1;
    }

    /// Merge a fetched page requested under `epoch`.
    ///
    /// Existing order is preserved, then unseen page items in page
    /// order. Re-applying the same page (a retried request) appends
    /// nothing. A page shorter than the page size marks the feed
    /// exhausted.
    pub fn merge_page(&mut self, epoch: u64, page: &[ReportItem]) -> MergeOutcome {
        if epoch != self.epoch {
            log::warn!(
                "discarding stale page: epoch {epoch} != current {}",
                self.epoch
            );
            return MergeOutcome {
                appended: 0,
                exhausted: !self.has_more,
                stale: true,
            };
        }

        let mut appended = 0;
        for item in page {
            if self.seen.insert(item.id.clone()) {
                self.items.push(item.clone());
                appended += 1;
            }
        }
        self.offset += page.len();
        if page.len() < self.page_size {
            self.has_more = false;
        }
        log::debug!(
            "merged page of {} ({appended} new), offset={}, has_more={}",
            page.len(),
            self.offset,
            self.has_more
        );
        MergeOutcome {
            appended,
            exhausted: !self.has_more,
            stale: false,
        }
    }

    /// Patch one realtime insert into current state: prepend when it
    /// matches the active filter and is not already present. Returns
    /// whether state changed.
    pub fn apply_insert(&mut self, item: &ReportItem) -> bool {
        if !self.filter.matches(item) {
            return false;
        }
        if !self.seen.insert(item.id.clone()) {
            return false;
        }
        self.items.insert(0, item.clone());
        self.offset += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aduan_model::{EngagementCounts, ReportCategory, ReportStatus};
    use pretty_assertions::assert_eq;

    fn item(id: &str) -> ReportItem {
        ReportItem {
            id: id.to_string(),
            title: format!("report {id}"),
            description: None,
            category: ReportCategory::Other,
            status: ReportStatus::Open,
            photo_url: None,
            location: None,
            created_at_unix_ms: 0,
            creator_id: None,
            counts: EngagementCounts::default(),
            is_hidden: false,
            is_locked: false,
        }
    }

    fn page(ids: &[&str]) -> Vec<ReportItem> {
        ids.iter().map(|id| item(id)).collect()
    }

    fn ids(acc: &FeedAccumulator) -> Vec<&str> {
        acc.items().iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn full_then_short_page_sets_sizes_and_exhaustion() {
        let mut acc = FeedAccumulator::new(FeedFilter::all());
        let first: Vec<ReportItem> = (0..10).map(|i| item(&format!("r{i}"))).collect();
        let outcome = acc.merge_page(acc.epoch(), &first);
        assert_eq!(outcome.appended, 10);
        assert!(!outcome.exhausted);
        assert!(acc.has_more());
        assert_eq!(acc.offset(), 10);

        let second: Vec<ReportItem> = (10..14).map(|i| item(&format!("r{i}"))).collect();
        let outcome = acc.merge_page(acc.epoch(), &second);
        assert_eq!(outcome.appended, 4);
        assert!(outcome.exhausted);
        assert!(!acc.has_more());
        assert_eq!(acc.len(), 14);

        // No duplicate identifiers anywhere.
        let unique: HashSet<&str> = ids(&acc).into_iter().collect();
        assert_eq!(unique.len(), 14);
    }

    #[test]
    fn merge_preserves_relative_order_and_filters_duplicates() {
        let mut acc = FeedAccumulator::with_page_size(FeedFilter::all(), 3);
        acc.merge_page(acc.epoch(), &page(&["a", "b", "c"]));
        acc.merge_page(acc.epoch(), &page(&["b", "d", "e"]));
        assert_eq!(ids(&acc), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn reapplying_a_page_changes_nothing() {
        let mut acc = FeedAccumulator::with_page_size(FeedFilter::all(), 3);
        let p = page(&["a", "b", "c"]);
        acc.merge_page(acc.epoch(), &p);
        let before: Vec<String> = ids(&acc).into_iter().map(String::from).collect();
        let outcome = acc.merge_page(acc.epoch(), &p);
        assert_eq!(outcome.appended, 0);
        assert_eq!(ids(&acc), before);
    }

    #[test]
    fn empty_page_is_a_noop_that_exhausts() {
        let mut acc = FeedAccumulator::new(FeedFilter::all());
        let outcome = acc.merge_page(acc.epoch(), &[]);
        assert_eq!(outcome.appended, 0);
        assert!(outcome.exhausted);
        assert!(acc.is_empty());
        assert_eq!(acc.offset(), 0);
    }

    #[test]
    fn stale_epoch_is_discarded_after_filter_change() {
        let mut acc = FeedAccumulator::new(FeedFilter::all());
        let epoch = acc.epoch();
        acc.set_filter(FeedFilter::with_status(ReportStatus::Closed));
        let outcome = acc.merge_page(epoch, &page(&["a", "b"]));
        assert!(outcome.stale);
        assert!(acc.is_empty());
        assert_eq!(acc.offset(), 0);
    }

    #[test]
    fn setting_the_same_filter_does_not_reset() {
        let mut acc = FeedAccumulator::new(FeedFilter::all());
        acc.merge_page(acc.epoch(), &page(&["a"]));
        let epoch = acc.epoch();
        acc.set_filter(FeedFilter::all());
        assert_eq!(acc.epoch(), epoch);
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn insert_patch_prepends_matching_unseen_items() {
        let mut acc = FeedAccumulator::with_page_size(FeedFilter::all(), 2);
        acc.merge_page(acc.epoch(), &page(&["a", "b"]));
        assert!(acc.apply_insert(&item("c")));
        assert_eq!(ids(&acc), vec!["c", "a", "b"]);
        assert_eq!(acc.offset(), 3);

        // Already present: ignored.
        assert!(!acc.apply_insert(&item("a")));

        // Filtered out: ignored.
        acc.set_filter(FeedFilter::with_status(ReportStatus::Closed));
        assert!(!acc.apply_insert(&item("d")));
        assert!(acc.is_empty());
    }
}
