use crate::accumulator::{FeedAccumulator, MergeOutcome};
use crate::config::FeedTuning;
use crate::error::Result;
use aduan_backend::CommunityBackend;
use aduan_model::{FeedFilter, ReportItem};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

/// One feed view's session: owns the accumulator and drives fetches
/// against the injected backend.
///
/// Page requests are causally ordered by cursor; the epoch captured
/// before each fetch guards against responses that land after a filter
/// change.
pub struct FeedSession {
    backend: Arc<dyn CommunityBackend>,
    acc: FeedAccumulator,
}

impl FeedSession {
    pub fn new(backend: Arc<dyn CommunityBackend>, filter: FeedFilter) -> Self {
        Self::with_tuning(backend, filter, &FeedTuning::default())
    }

    pub fn with_tuning(
        backend: Arc<dyn CommunityBackend>,
        filter: FeedFilter,
        tuning: &FeedTuning,
    ) -> Self {
        Self {
            backend,
            acc: FeedAccumulator::with_page_size(filter, tuning.page_size),
        }
    }

    pub fn items(&self) -> &[ReportItem] {
        self.acc.items()
    }

    pub fn accumulator(&self) -> &FeedAccumulator {
        &self.acc
    }

    pub fn has_more(&self) -> bool {
        self.acc.has_more()
    }

    pub fn set_filter(&mut self, filter: FeedFilter) {
        self.acc.set_filter(filter);
    }

    /// Fetch and merge the next page. Returns without a network call
    /// once the feed is exhausted.
    pub async fn load_more(&mut self) -> Result<MergeOutcome> {
        if !self.acc.has_more() {
            return Ok(MergeOutcome {
                appended: 0,
                exhausted: true,
                stale: false,
            });
        }
        let epoch = self.acc.epoch();
        let filter = self.acc.filter().clone();
        let offset = self.acc.offset();
        let limit = self.acc.page_size();
        let page = self.backend.fetch_page(&filter, offset, limit).await?;
        Ok(self.acc.merge_page(epoch, &page))
    }

    pub fn subscribe_inserts(&self) -> broadcast::Receiver<ReportItem> {
        self.backend.subscribe_inserts()
    }

    /// Apply all queued realtime inserts through the filter-aware
    /// patch. Returns how many changed state. Lagged events are
    /// skipped; a later page fetch picks those items up by cursor.
    pub fn drain_inserts(&mut self, rx: &mut broadcast::Receiver<ReportItem>) -> usize {
        let mut applied = 0;
        loop {
            match rx.try_recv() {
                Ok(item) => {
                    if self.acc.apply_insert(&item) {
                        applied += 1;
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    log::warn!("insert stream lagged, skipped {skipped} events");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        applied
    }
}
