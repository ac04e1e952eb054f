//! Integration tests for Marquee Core

use async_trait::async_trait;
use marquee_core::{
    Collaborators, EpisodeResolver, FixedOnboarding, Mount, NavigationLog, OnboardingCheck,
    PlayerMeta, PlayerView, ResolvedEpisode, RunOutput, ScrapeMedia, ScrapeOrchestrator,
    ScrapeOutcome, ScrapingItem, SessionConfig, StaticHistory, StatusKind, Stream,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tokio_test::{assert_err, assert_ok};

// =============================================================================
// Scripted collaborators
// =============================================================================

fn hls(source_id: &str) -> ScrapeOutcome {
    ScrapeOutcome::success(RunOutput {
        source_id: source_id.to_string(),
        embed_id: None,
        stream: Stream::Hls {
            id: "main".into(),
            playlist: format!("https://cdn.example.com/{}/master.m3u8", source_id),
            flags: vec![],
            captions: vec![],
        },
    })
}

fn exhausted() -> ScrapeOutcome {
    ScrapeOutcome::exhausted(
        BTreeMap::new(),
        vec![ScrapingItem {
            id: "flixhq".into(),
            children: vec!["upcloud".into()],
        }],
    )
}

/// Scraper answering every request with a fixed outcome
struct FixedScraper {
    outcome: ScrapeOutcome,
    calls: AtomicUsize,
    seen: Mutex<Vec<ScrapeMedia>>,
}

impl FixedScraper {
    fn new(outcome: ScrapeOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ScrapeOrchestrator for FixedScraper {
    async fn scrape(&self, media: &ScrapeMedia) -> ScrapeOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(media.clone());
        self.outcome.clone()
    }
}

/// Scraper that holds each request until the test releases it
#[derive(Default)]
struct GatedScraper {
    pending: Mutex<HashMap<String, oneshot::Receiver<ScrapeOutcome>>>,
}

impl GatedScraper {
    fn hold(&self, tmdb_id: &str) -> oneshot::Sender<ScrapeOutcome> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(tmdb_id.to_string(), rx);
        tx
    }
}

#[async_trait]
impl ScrapeOrchestrator for GatedScraper {
    async fn scrape(&self, media: &ScrapeMedia) -> ScrapeOutcome {
        let rx = self.pending.lock().unwrap().remove(&media.tmdb_id);
        match rx {
            Some(rx) => rx.await.unwrap_or_else(|_| exhausted()),
            None => exhausted(),
        }
    }
}

/// Resolver that holds each lookup until the test releases it
#[derive(Default)]
struct GatedResolver {
    pending: Mutex<HashMap<String, oneshot::Receiver<Option<ResolvedEpisode>>>>,
    calls: AtomicUsize,
}

impl GatedResolver {
    fn hold(&self, media_id: &str) -> oneshot::Sender<Option<ResolvedEpisode>> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(media_id.to_string(), rx);
        tx
    }
}

#[async_trait]
impl EpisodeResolver for GatedResolver {
    async fn resolve(&self, media_id: &str) -> anyhow::Result<Option<ResolvedEpisode>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let rx = self.pending.lock().unwrap().remove(media_id);
        match rx {
            Some(rx) => Ok(rx.await?),
            None => Ok(None),
        }
    }
}

struct FailingResolver;

#[async_trait]
impl EpisodeResolver for FailingResolver {
    async fn resolve(&self, _media_id: &str) -> anyhow::Result<Option<ResolvedEpisode>> {
        anyhow::bail!("metadata service unreachable")
    }
}

struct BrokenOnboarding;

#[async_trait]
impl OnboardingCheck for BrokenOnboarding {
    async fn needs_onboarding(&self) -> anyhow::Result<bool> {
        anyhow::bail!("local storage unavailable")
    }
}

struct Harness {
    collaborators: Collaborators,
    navigation: Arc<NavigationLog>,
}

impl Harness {
    fn new(
        onboarding: Arc<dyn OnboardingCheck>,
        episodes: Arc<dyn EpisodeResolver>,
        scraper: Arc<dyn ScrapeOrchestrator>,
    ) -> Self {
        let navigation = Arc::new(NavigationLog::new());
        Self {
            collaborators: Collaborators {
                onboarding,
                episodes,
                scraper,
                navigator: navigation.clone(),
                history: Arc::new(StaticHistory(Some("/browse".into()))),
            },
            navigation,
        }
    }

    async fn mount(&self, path: &str) -> PlayerView {
        let mount = PlayerView::open(SessionConfig::default(), self.collaborators.clone(), path).await;
        match assert_ok!(mount) {
            Mount::Mounted(view) => view,
            Mount::Redirected(target) => panic!("unexpected redirect to {}", target),
        }
    }
}

// =============================================================================
// Onboarding gate
// =============================================================================

#[tokio::test]
async fn test_onboarding_redirect_prevents_mount() {
    let scraper = FixedScraper::new(hls("flixhq"));
    let resolver = Arc::new(GatedResolver::default());
    let harness = Harness::new(Arc::new(FixedOnboarding(true)), resolver.clone(), scraper.clone());

    let mount = PlayerView::open(SessionConfig::default(), harness.collaborators.clone(), "/media/X/1/2?t=5").await;

    match assert_ok!(mount) {
        Mount::Redirected(target) => {
            assert_eq!(target.path, "/onboarding?redirect=%2Fmedia%2FX%2F1%2F2");
            assert!(target.replace);
        }
        Mount::Mounted(_) => panic!("session mounted despite onboarding"),
    }
    assert_eq!(harness.navigation.entries().len(), 1);
    assert_eq!(scraper.calls.load(Ordering::SeqCst), 0);
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_onboarding_failure_is_fatal() {
    let harness = Harness::new(
        Arc::new(BrokenOnboarding),
        Arc::new(GatedResolver::default()),
        FixedScraper::new(hls("flixhq")),
    );

    let err = assert_err!(PlayerView::open(SessionConfig::default(), harness.collaborators.clone(), "/media/X").await);
    assert!(err.is_fatal());
    assert!(harness.navigation.entries().is_empty());
}

// =============================================================================
// Episode resolution and navigation
// =============================================================================

#[tokio::test]
async fn test_series_defaults_while_lookup_pending() {
    let resolver = Arc::new(GatedResolver::default());
    let _held = resolver.hold("X");
    let scraper = FixedScraper::new(exhausted());
    let harness = Harness::new(Arc::new(FixedOnboarding(false)), resolver, scraper.clone());

    let view = harness.mount("/media/X").await;
    let task = assert_ok!(view.confirm_metadata(PlayerMeta::show("X", "Show X", 2020)).await);
    task.await.unwrap();

    assert_eq!(harness.navigation.last().unwrap().path, "/media/X/1/1");
    let seen = scraper.seen.lock().unwrap();
    let episode = seen[0].episode.as_ref().unwrap();
    assert_eq!((episode.season, episode.episode), (1, 1));
}

#[tokio::test]
async fn test_resolved_episode_drives_navigation() {
    let resolver = Arc::new(GatedResolver::default());
    let release = resolver.hold("X");
    let harness = Harness::new(Arc::new(FixedOnboarding(false)), resolver, FixedScraper::new(exhausted()));

    let view = harness.mount("/media/W").await;
    let lookup = assert_ok!(view.navigate_to("/media/X").await).unwrap();
    release.send(Some(ResolvedEpisode::new(2, 3))).unwrap();
    lookup.await.unwrap();

    // season/episode changes alone never trigger another lookup
    assert!(assert_ok!(view.navigate_to("/media/X/2/3").await).is_none());

    let meta = PlayerMeta::show("X", "Show X", 2020);
    assert_ok!(view.confirm_metadata(meta).await).await.unwrap();
    assert_eq!(harness.navigation.last().unwrap().path, "/media/X/2/3");
}

#[tokio::test]
async fn test_resolver_failure_falls_back_to_defaults() {
    let harness = Harness::new(
        Arc::new(FixedOnboarding(false)),
        Arc::new(FailingResolver),
        FixedScraper::new(hls("flixhq")),
    );

    let view = harness.mount("/media/X").await;
    let lookup = assert_ok!(view.navigate_to("/media/Z").await).unwrap();
    lookup.await.unwrap();

    let task = assert_ok!(view.confirm_metadata(PlayerMeta::show("Z", "Show Z", 2020)).await);
    task.await.unwrap();
    assert_eq!(harness.navigation.last().unwrap().path, "/media/Z/1/1");
    assert_eq!(view.status().await.kind(), StatusKind::Playing);
}

#[tokio::test]
async fn test_following_confirmation_navigation_converges() {
    let harness = Harness::new(
        Arc::new(FixedOnboarding(false)),
        Arc::new(GatedResolver::default()),
        FixedScraper::new(hls("flixhq")),
    );
    let view = harness.mount("/media/X").await;
    let meta = PlayerMeta::show("X", "Show X", 2020);

    // first confirmation points at a different identity
    let first = assert_ok!(view.confirm_metadata(meta.clone()).await);
    let target = harness.navigation.last().unwrap();
    assert!(view.navigate_to(&target.path).await.unwrap().is_none());
    first.await.unwrap();
    assert_eq!(view.status().await.kind(), StatusKind::Idle);

    // on the canonical path the same confirmation is a fixed point
    let second = assert_ok!(view.confirm_metadata(meta).await);
    assert_eq!(harness.navigation.last().unwrap(), target);
    view.navigate_to(&target.path).await.unwrap();
    second.await.unwrap();
    assert_eq!(view.status().await.kind(), StatusKind::Playing);
}

// =============================================================================
// Scraping and launch
// =============================================================================

#[tokio::test]
async fn test_stale_scrape_does_not_override_new_identity() {
    let scraper = Arc::new(GatedScraper::default());
    let release_a = scraper.hold("A");
    let release_b = scraper.hold("B");
    let harness = Harness::new(
        Arc::new(FixedOnboarding(false)),
        Arc::new(GatedResolver::default()),
        scraper.clone(),
    );

    let view = harness.mount("/media/A").await;
    let scrape_a = assert_ok!(view.begin_scrape(PlayerMeta::movie("A", "A", 2001)).await);

    view.navigate_to("/media/B").await.unwrap();
    assert_eq!(view.status().await.kind(), StatusKind::Idle);
    let scrape_b = assert_ok!(view.begin_scrape(PlayerMeta::movie("B", "B", 2002)).await);

    release_b.send(exhausted()).unwrap();
    scrape_b.await.unwrap();
    assert_eq!(view.status().await.kind(), StatusKind::ScrapeNotFound);

    release_a.send(hls("flixhq")).unwrap();
    scrape_a.await.unwrap();
    let status = view.status().await;
    assert_eq!(status.kind(), StatusKind::ScrapeNotFound);
    assert!(status.report().is_some());
    assert!(status.payload().is_none());
}

#[tokio::test]
async fn test_exhaustion_report_is_kept_until_identity_changes() {
    let harness = Harness::new(
        Arc::new(FixedOnboarding(false)),
        Arc::new(GatedResolver::default()),
        FixedScraper::new(exhausted()),
    );
    let view = harness.mount("/media/550").await;
    assert_ok!(view.begin_scrape(PlayerMeta::movie("550", "Fight Club", 1999)).await)
        .await
        .unwrap();

    view.navigate_to("/media/550?t=30").await.unwrap();
    let status = view.status().await;
    assert_eq!(status.report().unwrap().source_order[0].children, vec!["upcloud".to_string()]);

    view.navigate_to("/media/550/1/1").await.unwrap();
    let status = view.status().await;
    assert_eq!(status.kind(), StatusKind::Idle);
    assert!(status.report().is_none());
}

#[tokio::test]
async fn test_identity_change_clears_launch_payload() {
    let harness = Harness::new(
        Arc::new(FixedOnboarding(false)),
        Arc::new(GatedResolver::default()),
        FixedScraper::new(hls("flixhq")),
    );
    let view = harness.mount("/media/550?t=90").await;
    let rx = view.subscribe_status();
    assert_ok!(view.begin_scrape(PlayerMeta::movie("550", "Fight Club", 1999)).await)
        .await
        .unwrap();
    assert!(view.status().await.payload().is_some());

    view.navigate_to("/media/551").await.unwrap();
    let status = view.status().await;
    assert_eq!(status.kind(), StatusKind::Idle);
    assert!(status.payload().is_none());
    assert!(rx.borrow().payload().is_none());
}

#[tokio::test]
async fn test_restart_from_beginning_is_one_shot() {
    let harness = Harness::new(
        Arc::new(FixedOnboarding(false)),
        Arc::new(GatedResolver::default()),
        FixedScraper::new(hls("flixhq")),
    );
    let view = harness.mount("/media/550?t=125").await;
    view.set_restart_from_beginning(true).await;

    assert_ok!(view.begin_scrape(PlayerMeta::movie("550", "Fight Club", 1999)).await)
        .await
        .unwrap();
    assert_eq!(view.status().await.payload().unwrap().start_offset, Some(0.0));

    view.navigate_to("/media/551?t=125").await.unwrap();
    assert_ok!(view.begin_scrape(PlayerMeta::movie("551", "Other", 2000)).await)
        .await
        .unwrap();
    assert_eq!(view.status().await.payload().unwrap().start_offset, Some(125.0));
}

#[tokio::test]
async fn test_status_subscription_sees_playing_with_payload() {
    let harness = Harness::new(
        Arc::new(FixedOnboarding(false)),
        Arc::new(GatedResolver::default()),
        FixedScraper::new(hls("flixhq")),
    );
    let view = harness.mount("/media/550").await;
    let mut rx = view.subscribe_status();

    let _task = assert_ok!(view.begin_scrape(PlayerMeta::movie("550", "Fight Club", 1999)).await);
    let status = rx.wait_for(|s| s.kind() == StatusKind::Playing).await.unwrap().clone();

    let payload = status.payload().unwrap();
    assert_eq!(payload.source_id, "flixhq");
    assert_eq!(payload.start_offset, None);
}

#[tokio::test]
async fn test_playback_error_is_a_sink() {
    let harness = Harness::new(
        Arc::new(FixedOnboarding(false)),
        Arc::new(GatedResolver::default()),
        FixedScraper::new(exhausted()),
    );
    let view = harness.mount("/media/550").await;
    assert_err!(view.report_playback_error().await);

    assert_ok!(view.begin_scrape(PlayerMeta::movie("550", "Fight Club", 1999)).await)
        .await
        .unwrap();
    assert_ok!(view.report_playback_error().await);
    assert_ok!(view.report_playback_error().await);
    assert!(view.begin_scrape(PlayerMeta::movie("550", "Fight Club", 1999)).await.is_err());
    assert_eq!(view.status().await.kind(), StatusKind::PlaybackError);
    assert_eq!(view.back_url(), "/browse");
}
