use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use leaderboard_core::enrichment::fetcher::ImageFetcher;
use leaderboard_core::enrichment::{EnrichmentTag, EnrichmentTarget, ImageAsset, ImageState};
use leaderboard_core::identity::Anonymous;
use leaderboard_core::{LeaderboardView, ViewConfig};
use parking_lot::Mutex;
use score_schema::{Metric, UserScoreRecord};
use tokio::runtime::Runtime;
use tokio::sync::oneshot;

const WAIT: Duration = Duration::from_secs(5);

/// Fetcher whose requests stay in flight until the test resolves them.
#[derive(Default)]
struct ManualFetcher {
    waiting: Mutex<HashMap<String, VecDeque<oneshot::Sender<Option<ImageAsset>>>>>,
}

impl ManualFetcher {
    /// Completes the oldest outstanding request for `url`.
    fn resolve(&self, url: &str, image: Option<ImageAsset>) {
        let deadline = Instant::now() + WAIT;
        loop {
            let sender = self
                .waiting
                .lock()
                .get_mut(url)
                .and_then(|queue| queue.pop_front());
            if let Some(sender) = sender {
                let _ = sender.send(image);
                return;
            }
            assert!(Instant::now() < deadline, "no request for {url} was issued");
            thread::sleep(Duration::from_millis(5));
        }
    }
}

#[async_trait]
impl ImageFetcher for ManualFetcher {
    async fn fetch(&self, url: &str) -> Option<ImageAsset> {
        let (tx, rx) = oneshot::channel();
        self.waiting
            .lock()
            .entry(url.to_string())
            .or_default()
            .push_back(tx);
        rx.await.ok().flatten()
    }
}

/// Fetcher that never answers.
struct SilentFetcher;

#[async_trait]
impl ImageFetcher for SilentFetcher {
    async fn fetch(&self, _url: &str) -> Option<ImageAsset> {
        std::future::pending().await
    }
}

fn image(tag: &str) -> ImageAsset {
    ImageAsset::new(tag.as_bytes().to_vec(), Some("image/png".to_string()))
}

fn with_picture(id: &str, easy: i64) -> UserScoreRecord {
    UserScoreRecord::new(id, id)
        .with_score(Metric::Easy, easy)
        .with_picture_url(format!("https://img.test/{id}.png"))
}

fn url(id: &str) -> String {
    format!("https://img.test/{id}.png")
}

fn setup(rt: &Runtime, page_size: usize) -> (Arc<ManualFetcher>, LeaderboardView) {
    let fetcher = Arc::new(ManualFetcher::default());
    let view = LeaderboardView::new(
        ViewConfig::new(page_size).unwrap(),
        fetcher.clone(),
        Arc::new(Anonymous),
        rt.handle().clone(),
    );
    (fetcher, view)
}

#[test]
fn loaded_image_is_applied_to_its_row() {
    let rt = Runtime::new().unwrap();
    let (fetcher, mut view) = setup(&rt, 2);
    view.replace_records(vec![with_picture("a", 10), UserScoreRecord::new("b", "b")])
        .unwrap();

    let page = view.set_page(0, Metric::Easy);
    assert!(page.rows[0].image.is_pending());
    assert_eq!(page.rows[1].image, ImageState::NoImage);
    assert_eq!(view.pending(), 1);

    fetcher.resolve(&url("a"), Some(image("a")));
    let updates = view.wait_idle(WAIT);

    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].target, EnrichmentTarget::Row(0));
    assert_eq!(view.page().rows[0].image, ImageState::Loaded(image("a")));
    assert_eq!(view.pending(), 0);
    assert_eq!(view.stats().loaded, 1);
}

#[test]
fn failed_fetch_degrades_to_no_image() {
    let rt = Runtime::new().unwrap();
    let (fetcher, mut view) = setup(&rt, 1);
    view.replace_records(vec![with_picture("a", 10)]).unwrap();
    view.set_page(0, Metric::Easy);

    fetcher.resolve(&url("a"), None);
    view.wait_idle(WAIT);

    assert_eq!(view.page().rows[0].image, ImageState::NoImage);
    assert_eq!(view.stats().failed, 1);
}

#[test]
fn stale_result_does_not_touch_the_new_page() {
    let rt = Runtime::new().unwrap();
    let (fetcher, mut view) = setup(&rt, 1);
    view.replace_records(vec![with_picture("a", 20), with_picture("b", 10)])
        .unwrap();

    view.set_page(0, Metric::Easy);
    let old_generation = view.generation();
    view.select_page(1);
    assert!(view.generation() > old_generation);
    assert_eq!(view.page().rows[0].user_id(), Some("b"));

    // Row 0 of the old page finishes after the page changed.
    fetcher.resolve(&url("a"), Some(image("a")));
    let deadline = Instant::now() + WAIT;
    while view.stats().stale == 0 && Instant::now() < deadline {
        assert!(view.pump_timeout(Duration::from_millis(50)).is_empty());
    }

    assert_eq!(view.stats().stale, 1);
    assert!(view.page().rows[0].image.is_pending());

    fetcher.resolve(&url("b"), Some(image("b")));
    view.wait_idle(WAIT);
    assert_eq!(view.page().rows[0].image, ImageState::Loaded(image("b")));
}

#[test]
fn direct_stale_delivery_is_ignored() {
    let rt = Runtime::new().unwrap();
    let (_fetcher, mut view) = setup(&rt, 1);
    view.replace_records(vec![with_picture("a", 1)]).unwrap();

    view.set_page(0, Metric::Easy);
    let old = view.generation();
    view.refresh();

    let update = view.on_enrichment_result(EnrichmentTag::row(0, old), Some(image("old")));
    assert!(update.is_none());
    assert!(view.page().rows[0].image.is_pending());

    let update = view
        .on_enrichment_result(EnrichmentTag::row(0, view.generation()), Some(image("new")))
        .expect("current generation applies");
    assert_eq!(update.state, ImageState::Loaded(image("new")));
    assert_eq!(view.pending(), 0);
}

#[test]
fn repeated_delivery_for_a_resolved_row_is_ignored() {
    let rt = Runtime::new().unwrap();
    let (fetcher, mut view) = setup(&rt, 2);
    view.replace_records(vec![with_picture("a", 2), with_picture("b", 1)])
        .unwrap();
    view.set_page(0, Metric::Easy);

    fetcher.resolve(&url("a"), Some(image("a")));
    let deadline = Instant::now() + WAIT;
    while view.pending() == 2 && Instant::now() < deadline {
        view.pump_timeout(Duration::from_millis(50));
    }
    assert_eq!(view.pending(), 1);
    let stats = view.stats();
    assert_eq!(stats.loaded, 1);

    let tag = EnrichmentTag::row(0, view.generation());
    assert!(view.on_enrichment_result(tag, Some(image("again"))).is_none());
    assert!(view.on_enrichment_result(tag, None).is_none());

    assert_eq!(view.stats(), stats);
    assert_eq!(view.pending(), 1);
    let shown = view.page().rows[0].image.image().map(|asset| asset.bytes().to_vec());
    assert_eq!(shown, Some(b"a".to_vec()));
}

#[test]
fn completion_order_does_not_change_row_order() {
    let rt = Runtime::new().unwrap();
    let (fetcher, mut view) = setup(&rt, 3);
    view.replace_records(vec![
        with_picture("a", 30),
        with_picture("b", 20),
        with_picture("c", 10),
    ])
    .unwrap();
    view.set_page(0, Metric::Easy);

    for id in ["c", "a", "b"] {
        fetcher.resolve(&url(id), Some(image(id)));
    }
    view.wait_idle(WAIT);

    let page = view.page();
    for (row, id) in page.rows.iter().zip(["a", "b", "c"]) {
        assert_eq!(row.user_id(), Some(id));
        assert_eq!(row.image, ImageState::Loaded(image(id)));
    }
}

#[test]
fn fetch_timeout_resolves_to_no_image() {
    let rt = Runtime::new().unwrap();
    let config = ViewConfig::new(1)
        .unwrap()
        .with_fetch_timeout(Duration::from_millis(20));
    let mut view = LeaderboardView::new(
        config,
        Arc::new(SilentFetcher),
        Arc::new(Anonymous),
        rt.handle().clone(),
    );
    view.replace_records(vec![with_picture("a", 1)]).unwrap();
    view.set_page(0, Metric::Easy);

    view.wait_idle(WAIT);

    assert_eq!(view.page().rows[0].image, ImageState::NoImage);
    assert_eq!(view.pending(), 0);
}

#[test]
fn unanswered_fetch_leaves_row_pending() {
    let rt = Runtime::new().unwrap();
    let mut view = LeaderboardView::new(
        ViewConfig::new(1).unwrap(),
        Arc::new(SilentFetcher),
        Arc::new(Anonymous),
        rt.handle().clone(),
    );
    view.replace_records(vec![with_picture("a", 1)]).unwrap();
    view.set_page(0, Metric::Easy);

    assert!(view.wait_idle(Duration::from_millis(30)).is_empty());
    assert!(view.page().rows[0].image.is_pending());
    assert_eq!(view.pending(), 1);
}

#[test]
fn profile_picture_follows_its_own_generation() {
    let rt = Runtime::new().unwrap();
    let (fetcher, mut view) = setup(&rt, 1);

    view.set_profile_picture("");
    assert_eq!(view.profile_picture(), &ImageState::NoImage);
    assert_eq!(view.stats().issued, 0);

    view.set_profile_picture("https://img.test/me-old.png");
    view.set_profile_picture("https://img.test/me.png");
    assert!(view.profile_picture().is_pending());

    fetcher.resolve("https://img.test/me-old.png", Some(image("old")));
    fetcher.resolve("https://img.test/me.png", Some(image("me")));
    view.wait_idle(WAIT);

    assert_eq!(view.profile_picture(), &ImageState::Loaded(image("me")));

    // The older request may land after the newer one; either way it is dropped.
    let deadline = Instant::now() + WAIT;
    while view.stats().stale == 0 && Instant::now() < deadline {
        view.pump_timeout(Duration::from_millis(50));
    }
    assert_eq!(view.stats().stale, 1);
    assert_eq!(view.profile_picture(), &ImageState::Loaded(image("me")));
}

#[test]
fn page_changes_do_not_invalidate_profile_picture() {
    let rt = Runtime::new().unwrap();
    let (fetcher, mut view) = setup(&rt, 1);

    view.set_profile_picture("https://img.test/me.png");
    view.set_page(0, Metric::Easy);
    view.refresh();

    fetcher.resolve("https://img.test/me.png", Some(image("me")));
    view.wait_idle(WAIT);

    assert_eq!(view.profile_picture(), &ImageState::Loaded(image("me")));
}
