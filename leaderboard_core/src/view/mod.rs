pub mod page;

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use score_schema::{Metric, UserScoreRecord};
use tokio::runtime::Handle;

use self::page::{LeaderboardPage, LeaderboardRow, YourRank};
use crate::config::ViewConfig;
use crate::enrichment::fetcher::ImageFetcher;
use crate::enrichment::{
    EnrichmentResult, EnrichmentStats, EnrichmentTag, EnrichmentTarget, Generation, ImageAsset,
    ImageState, ImageUpdate,
};
use crate::error::LeaderboardError;
use crate::identity::IdentityProvider;
use crate::store::ScoreStore;

/// Paged projection over a [`ScoreStore`] with generation-stamped avatar
/// loading.
///
/// Fetches run on the injected tokio runtime and report back over a channel.
/// Nothing is applied until the owner calls [`pump`](Self::pump),
/// [`pump_timeout`](Self::pump_timeout) or [`wait_idle`](Self::wait_idle);
/// results stamped with an older generation are dropped at that point.
///
/// Population runs to completion inside [`set_page`](Self::set_page), so a
/// caller only ever observes a fully built page.
///
/// The blocking pump variants must not be called from inside the runtime's
/// own worker threads.
pub struct LeaderboardView {
    store: ScoreStore,
    config: ViewConfig,
    fetcher: Arc<dyn ImageFetcher>,
    identity: Arc<dyn IdentityProvider>,
    runtime: Handle,

    page: LeaderboardPage,
    generation: Generation,
    /// Unresolved row fetches of the current generation.
    pending: usize,

    profile_picture: ImageState,
    profile_generation: Generation,

    stats: EnrichmentStats,
    results_tx: Sender<EnrichmentResult>,
    results_rx: Receiver<EnrichmentResult>,
}

impl LeaderboardView {
    pub fn new(
        config: ViewConfig,
        fetcher: Arc<dyn ImageFetcher>,
        identity: Arc<dyn IdentityProvider>,
        runtime: Handle,
    ) -> Self {
        let (results_tx, results_rx) = unbounded();
        Self {
            store: ScoreStore::new(),
            config,
            fetcher,
            identity,
            runtime,
            page: LeaderboardPage::empty(),
            generation: Generation::default(),
            pending: 0,
            profile_picture: ImageState::NoImage,
            profile_generation: Generation::default(),
            stats: EnrichmentStats::default(),
            results_tx,
            results_rx,
        }
    }

    pub fn with_store(mut self, store: ScoreStore) -> Self {
        self.store = store;
        self
    }

    // --- Command surface ---

    /// Switches the sort metric and jumps back to the first page.
    pub fn select_metric(&mut self, metric: Metric) -> &LeaderboardPage {
        self.set_page(0, metric)
    }

    pub fn select_page(&mut self, page_index: usize) -> &LeaderboardPage {
        let metric = self.store.active_metric();
        self.set_page(page_index, metric)
    }

    pub fn refresh(&mut self) -> &LeaderboardPage {
        let page_index = self.page.page_index;
        let metric = self.store.active_metric();
        self.set_page(page_index, metric)
    }

    /// Swaps in a new record set. The displayed page is left as is until the
    /// next population, which re-sorts.
    pub fn replace_records(&mut self, records: Vec<UserScoreRecord>) -> Result<(), LeaderboardError> {
        self.store.replace_all(records)
    }

    // --- Population ---

    pub fn set_page(&mut self, page_index: usize, metric: Metric) -> &LeaderboardPage {
        if metric != self.store.active_metric() || !self.store.is_sorted() {
            self.store.reorder(metric);
            tracing::debug!(%metric, records = self.store.len(), "re-sorted score store");
        }

        self.generation = self.generation.next();
        let generation = self.generation;

        let page_size = self.config.page_size();
        let start = page_index.saturating_mul(page_size);

        let mut rows = Vec::with_capacity(page_size);
        let mut fetches = Vec::new();
        for local_index in 0..page_size {
            let position = start.saturating_add(local_index);
            let record = self.store.get(position).cloned();
            let mut row = LeaderboardRow::new(page_index, position.saturating_add(1), record, metric);

            if let Some(record) = row.record.as_ref().filter(|record| record.has_picture()) {
                fetches.push((local_index, record.picture_url.clone()));
                row.image = ImageState::Pending;
            }
            rows.push(row);
        }

        let your_rank = self.your_rank();

        self.pending = fetches.len();
        for (local_index, url) in fetches {
            self.spawn_fetch(EnrichmentTag::row(local_index, generation), url);
        }

        self.page = LeaderboardPage {
            page_index,
            metric,
            generation,
            rows,
            your_rank,
        };

        tracing::debug!(
            page_index,
            %metric,
            %generation,
            fetches = self.pending,
            "populated leaderboard page"
        );

        &self.page
    }

    fn your_rank(&self) -> YourRank {
        match self.identity.current_user_id() {
            None => YourRank::LoginPrompt,
            Some(user_id) => match self.store.rank(&user_id) {
                Some(rank) => YourRank::Ranked(rank),
                None => YourRank::Unranked,
            },
        }
    }

    // --- Enrichment ---

    /// Loads the signed-in user's own avatar. An empty url selects the
    /// default picture without fetching.
    pub fn set_profile_picture(&mut self, url: &str) {
        self.profile_generation = self.profile_generation.next();
        if url.is_empty() {
            self.profile_picture = ImageState::NoImage;
            return;
        }
        self.profile_picture = ImageState::Pending;
        self.spawn_fetch(EnrichmentTag::profile(self.profile_generation), url.to_owned());
    }

    fn spawn_fetch(&mut self, tag: EnrichmentTag, url: String) {
        self.stats.issued += 1;

        let fetcher = Arc::clone(&self.fetcher);
        let results = self.results_tx.clone();
        let timeout = self.config.fetch_timeout();
        self.runtime.spawn(async move {
            let image = match timeout {
                Some(limit) => tokio::time::timeout(limit, fetcher.fetch(&url))
                    .await
                    .ok()
                    .flatten(),
                None => fetcher.fetch(&url).await,
            };
            let _ = results.send(EnrichmentResult { tag, image });
        });
    }

    /// Applies one completed fetch. Returns the resulting state change, or
    /// `None` when the result was stale or its slot is no longer pending.
    pub fn on_enrichment_result(
        &mut self,
        tag: EnrichmentTag,
        image: Option<ImageAsset>,
    ) -> Option<ImageUpdate> {
        let current = match tag.target {
            EnrichmentTarget::Row(_) => self.generation,
            EnrichmentTarget::Profile => self.profile_generation,
        };
        if tag.generation != current {
            self.stats.stale += 1;
            tracing::trace!(
                enrichment = ?tag.target,
                generation = %tag.generation,
                %current,
                "dropping stale enrichment"
            );
            return None;
        }

        let slot = match tag.target {
            EnrichmentTarget::Row(index) => &mut self.page.rows.get_mut(index)?.image,
            EnrichmentTarget::Profile => &mut self.profile_picture,
        };
        // Each slot resolves once per generation.
        if !slot.is_pending() {
            tracing::trace!(enrichment = ?tag.target, %current, "ignoring repeated enrichment");
            return None;
        }
        if let EnrichmentTarget::Row(_) = tag.target {
            self.pending = self.pending.saturating_sub(1);
        }

        *slot = match image {
            Some(image) => {
                self.stats.loaded += 1;
                ImageState::Loaded(image)
            }
            None => {
                self.stats.failed += 1;
                ImageState::NoImage
            }
        };

        Some(ImageUpdate {
            target: tag.target,
            state: slot.clone(),
        })
    }

    /// Applies every result that has already arrived.
    pub fn pump(&mut self) -> Vec<ImageUpdate> {
        let mut updates = Vec::new();
        while let Ok(result) = self.results_rx.try_recv() {
            updates.extend(self.on_enrichment_result(result.tag, result.image));
        }
        updates
    }

    /// Waits up to `timeout` for the next result, then drains the rest.
    pub fn pump_timeout(&mut self, timeout: Duration) -> Vec<ImageUpdate> {
        let mut updates = Vec::new();
        if let Ok(result) = self.results_rx.recv_timeout(timeout) {
            updates.extend(self.on_enrichment_result(result.tag, result.image));
            updates.extend(self.pump());
        }
        updates
    }

    /// Applies results until the current generation has nothing in flight or
    /// the deadline passes.
    pub fn wait_idle(&mut self, timeout: Duration) -> Vec<ImageUpdate> {
        let deadline = Instant::now() + timeout;
        let mut updates = self.pump();

        while self.pending > 0 || self.profile_picture.is_pending() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match self.results_rx.recv_timeout(remaining) {
                Ok(result) => updates.extend(self.on_enrichment_result(result.tag, result.image)),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        if self.pending > 0 {
            tracing::debug!(pending = self.pending, "avatar fetches still in flight after wait");
        }
        updates
    }

    // --- Accessors ---

    pub fn page(&self) -> &LeaderboardPage {
        &self.page
    }

    pub fn store(&self) -> &ScoreStore {
        &self.store
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn profile_picture(&self) -> &ImageState {
        &self.profile_picture
    }

    pub fn stats(&self) -> EnrichmentStats {
        self.stats
    }
}
