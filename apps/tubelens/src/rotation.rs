//! # Rotation Module
//!
//! The loading-word rotation cache and its timers.
//!
//! [`WordRotation`] owns the history cache and the exclusion set. Every
//! refresh reuses cached history keywords younger than the TTL, otherwise
//! fetches a fresh batch; any fetch failure degrades silently to the static
//! table.
//!
//! [`RotationController`] shares one rotation between an internal refresh
//! timer (started on mount), an optional externally controlled timer, and
//! manual refreshes. The rotation sits behind an async mutex held across the
//! fetch, so concurrent ticks wait for the in-flight fetch and then hit the
//! cache instead of issuing duplicate requests.

use rand::SeedableRng;
use rand::rngs::StdRng;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};
use tubelens_core::select::pick_word;
use tubelens_core::{ExclusionSet, HistoryKeyword, Language, LoadingWord};
use tubelens_sdk::HistoryClient;

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Interval between automatic refreshes.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// How long fetched history keywords are reused.
pub const HISTORY_TTL: Duration = Duration::from_secs(5 * 60);

/// Rotation tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationSettings {
    pub refresh_interval: Duration,
    pub history_ttl: Duration,
    pub fetch_limit: usize,
    pub exclusion_capacity: usize,
    pub language: Language,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            refresh_interval: REFRESH_INTERVAL,
            history_ttl: HISTORY_TTL,
            fetch_limit: tubelens_sdk::DEFAULT_KEYWORD_LIMIT,
            exclusion_capacity: tubelens_core::DEFAULT_EXCLUSION_CAPACITY,
            language: Language::En,
        }
    }
}

// =============================================================================
// HISTORY SOURCE
// =============================================================================

/// Anything that can supply history keywords.
pub trait HistorySource: Send + Sync {
    fn fetch_keywords(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<HistoryKeyword>, tubelens_sdk::Error>> + Send;
}

impl HistorySource for HistoryClient {
    fn fetch_keywords(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<HistoryKeyword>, tubelens_sdk::Error>> + Send {
        HistoryClient::fetch_keywords(self, limit)
    }
}

// =============================================================================
// WORD ROTATION
// =============================================================================

/// Lifecycle of a rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationState {
    /// No word yet.
    Idle,
    /// A history fetch may be in flight.
    Fetching,
    /// A word is current.
    Displaying,
}

#[derive(Debug)]
struct CachedHistory {
    keywords: Vec<HistoryKeyword>,
    fetched_at: Instant,
}

/// History cache, exclusion set and current word for one session.
pub struct WordRotation<S> {
    source: S,
    settings: RotationSettings,
    cache: Option<CachedHistory>,
    exclusion: ExclusionSet,
    rng: StdRng,
    state: RotationState,
    current: Option<LoadingWord>,
    mounted: Arc<AtomicBool>,
    fetch_count: u64,
    refresh_count: u64,
}

impl<S: HistorySource> WordRotation<S> {
    pub fn new(source: S, settings: RotationSettings) -> Self {
        Self {
            source,
            settings,
            cache: None,
            exclusion: ExclusionSet::new(settings.exclusion_capacity),
            rng: StdRng::from_entropy(),
            state: RotationState::Idle,
            current: None,
            mounted: Arc::new(AtomicBool::new(true)),
            fetch_count: 0,
            refresh_count: 0,
        }
    }

    /// Use a deterministic random source.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn state(&self) -> RotationState {
        self.state
    }

    pub fn current(&self) -> Option<&LoadingWord> {
        self.current.as_ref()
    }

    pub fn exclusion(&self) -> &ExclusionSet {
        &self.exclusion
    }

    pub fn settings(&self) -> &RotationSettings {
        &self.settings
    }

    /// Network fetches attempted so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count
    }

    /// Refreshes that produced a word.
    pub fn refresh_count(&self) -> u64 {
        self.refresh_count
    }

    pub fn set_language(&mut self, language: Language) {
        self.settings.language = language;
    }

    /// Flag checked before applying results of an async fetch.
    pub fn mounted_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.mounted)
    }

    /// Pick the next word.
    ///
    /// Returns `None` only if the rotation was unmounted while fetching.
    pub async fn refresh(&mut self) -> Option<LoadingWord> {
        if !self.mounted.load(Ordering::Acquire) {
            return None;
        }
        let previous = self.state;
        self.state = RotationState::Fetching;

        let history = self.history().await;

        if !self.mounted.load(Ordering::Acquire) {
            debug!("rotation unmounted during fetch; dropping result");
            self.state = previous;
            return None;
        }

        let word = pick_word(
            &history,
            self.settings.language,
            &mut self.exclusion,
            &mut self.rng,
        );

        self.state = if word.is_some() {
            RotationState::Displaying
        } else {
            RotationState::Idle
        };
        if word.is_some() {
            self.refresh_count = self.refresh_count.saturating_add(1);
        }
        self.current.clone_from(&word);
        word
    }

    async fn history(&mut self) -> Vec<HistoryKeyword> {
        let ttl = self.settings.history_ttl;
        if let Some(cached) = self
            .cache
            .as_ref()
            .filter(|c| !c.keywords.is_empty() && c.fetched_at.elapsed() < ttl)
        {
            debug!(count = cached.keywords.len(), "reusing cached history keywords");
            return cached.keywords.clone();
        }

        self.fetch_count = self.fetch_count.saturating_add(1);
        match self.source.fetch_keywords(self.settings.fetch_limit).await {
            Ok(keywords) => {
                debug!(count = keywords.len(), "history keywords fetched");
                self.cache = Some(CachedHistory {
                    keywords: keywords.clone(),
                    fetched_at: Instant::now(),
                });
                keywords
            }
            Err(tubelens_sdk::Error::Unauthenticated) => {
                debug!("no signed-in user; using static words");
                Vec::new()
            }
            Err(e) => {
                info!(error = %e, "history keyword fetch failed; using static words");
                Vec::new()
            }
        }
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

async fn refresh_shared<S: HistorySource>(
    rotation: &Mutex<WordRotation<S>>,
    tx: &watch::Sender<Option<LoadingWord>>,
) -> Option<LoadingWord> {
    let mut guard = rotation.lock().await;
    let word = guard.refresh().await?;
    tx.send_replace(Some(word.clone()));
    Some(word)
}

/// Drives a shared [`WordRotation`] from timers and manual refreshes.
///
/// Two timers may run at once: the internal one started by [`mount`] and the
/// external one controlled by [`start_timer`]/[`stop_timer`]. Running both
/// doubles the refresh rate.
///
/// [`mount`]: RotationController::mount
/// [`start_timer`]: RotationController::start_timer
/// [`stop_timer`]: RotationController::stop_timer
pub struct RotationController<S> {
    rotation: Arc<Mutex<WordRotation<S>>>,
    mounted: Arc<AtomicBool>,
    tx: Arc<watch::Sender<Option<LoadingWord>>>,
    interval: Duration,
    internal: Option<JoinHandle<()>>,
    external: Option<JoinHandle<()>>,
}

impl<S: HistorySource + 'static> RotationController<S> {
    pub fn new(rotation: WordRotation<S>) -> Self {
        let mounted = rotation.mounted_flag();
        let interval = rotation.settings().refresh_interval;
        let (tx, _rx) = watch::channel(None);
        Self {
            rotation: Arc::new(Mutex::new(rotation)),
            mounted,
            tx: Arc::new(tx),
            interval,
            internal: None,
            external: None,
        }
    }

    /// Receive every newly selected word.
    pub fn subscribe(&self) -> watch::Receiver<Option<LoadingWord>> {
        self.tx.subscribe()
    }

    /// The most recently published word.
    pub fn current(&self) -> Option<LoadingWord> {
        self.tx.borrow().clone()
    }

    /// Shared handle to the rotation, for inspection.
    pub fn rotation(&self) -> Arc<Mutex<WordRotation<S>>> {
        Arc::clone(&self.rotation)
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    /// Refresh now, outside any timer.
    pub async fn refresh(&self) -> Option<LoadingWord> {
        refresh_shared(&self.rotation, &self.tx).await
    }

    /// Start the internal timer: one refresh immediately, then one per interval.
    pub fn mount(&mut self) {
        self.mounted.store(true, Ordering::Release);
        if self.internal.is_some() {
            return;
        }
        info!(interval_secs = self.interval.as_secs(), "loading-word rotation mounted");
        self.internal = Some(self.spawn_ticker(Instant::now()));
    }

    /// Start the external timer; its first tick comes one interval from now.
    pub fn start_timer(&mut self) {
        if self.external.is_some() {
            return;
        }
        debug!("external rotation timer started");
        self.external = Some(self.spawn_ticker(Instant::now() + self.interval));
    }

    pub fn stop_timer(&mut self) {
        if let Some(handle) = self.external.take() {
            handle.abort();
            debug!("external rotation timer stopped");
        }
    }

    pub fn is_timer_running(&self) -> bool {
        self.external.is_some()
    }

    /// Stop both timers and ignore results of in-flight fetches.
    pub fn unmount(&mut self) {
        self.mounted.store(false, Ordering::Release);
        if let Some(handle) = self.internal.take() {
            handle.abort();
        }
        self.stop_timer();
        info!("loading-word rotation unmounted");
    }

    fn spawn_ticker(&self, start: Instant) -> JoinHandle<()> {
        let rotation = Arc::clone(&self.rotation);
        let tx = Arc::clone(&self.tx);
        let mounted = Arc::clone(&self.mounted);
        let period = self.interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !mounted.load(Ordering::Acquire) {
                    break;
                }
                refresh_shared(&rotation, &tx).await;
            }
        })
    }
}

impl<S> Drop for RotationController<S> {
    fn drop(&mut self) {
        self.mounted.store(false, Ordering::Release);
        if let Some(handle) = self.internal.take() {
            handle.abort();
        }
        if let Some(handle) = self.external.take() {
            handle.abort();
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
