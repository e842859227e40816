//! Time-to-live dataset cache with single-flight refresh.
//!
//! The cache holds at most one [`Snapshot`]: a feature collection together
//! with the index built from it. Snapshots are immutable and shared through
//! `Arc`, so readers never see a dataset paired with another dataset's
//! index. A refresh builds a complete new snapshot off to the side and swaps
//! it in under the lock; a refresh that fails leaves the previous snapshot
//! in place.
//!
//! Only one refresh runs at a time. It runs on its own thread, which alone
//! clears the in-flight marker when the fetch returns. Callers that find the
//! cache stale wait for that refresh until its deadline and share its
//! outcome; a refresh that overruns keeps going and installs its snapshot
//! whenever it lands.

use crate::query;
use crate::source::DatasetSource;
use crate::spatial::{IndexKind, SpatialIndex};
use crate::{IndexError, Result};
use chrono::{DateTime, Utc};
use geoscope_common::{Clock, SystemClock};
use geoscope_geom::{Bounds, Feature, FeatureCollection, LatLng};
use geoscope_metrics::{metric_defs, metrics};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Snapshots older than this are refreshed on the next access.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// How long callers wait for one fetch-and-index run.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// After a failed refresh, a stale snapshot is served without retrying for
/// this long.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(60);

/// A dataset and the spatial index built over it.
#[derive(Debug)]
pub struct Snapshot {
    data: FeatureCollection,
    index: Box<dyn SpatialIndex>,
    fetched_at: DateTime<Utc>,
}

impl Snapshot {
    /// Index `data` and stamp it with `fetched_at`.
    pub fn build(data: FeatureCollection, kind: IndexKind, fetched_at: DateTime<Utc>) -> Self {
        let index = kind.build(&data.features);
        Self {
            data,
            index,
            fetched_at,
        }
    }

    /// The feature collection.
    pub fn data(&self) -> &FeatureCollection {
        &self.data
    }

    /// The features, in dataset order.
    pub fn features(&self) -> &[Feature] {
        &self.data.features
    }

    /// The index over [`features`](Self::features).
    pub fn index(&self) -> &dyn SpatialIndex {
        self.index.as_ref()
    }

    /// When the data was fetched.
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    /// Time elapsed since the fetch.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.fetched_at
    }

    /// The first feature containing `point`.
    pub fn containing(&self, point: LatLng) -> Option<&Feature> {
        query::query_containment(self.features(), self.index(), point)
    }

    /// Features whose bounds overlap `viewport`, in dataset order.
    pub fn in_viewport(&self, viewport: &Bounds) -> Vec<&Feature> {
        query::filter_indexed(self.features(), self.index(), viewport)
    }
}

fn failure_reason(err: &IndexError) -> &'static str {
    match err {
        IndexError::Timeout(_) => "timeout",
        IndexError::InvalidDataset(_) => "invalid",
        IndexError::FetchFailed(_) | IndexError::DatasetUnavailable(_) => "fetch",
    }
}

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Option<Arc<Snapshot>>,
    /// Set by [`DatasetCache::invalidate`]; the snapshot stays as a fallback.
    invalidated: bool,
    /// Bumped by every invalidation.
    invalidations: u64,
    /// A refresh thread is running. Only that thread clears it.
    refreshing: bool,
    /// When callers stop waiting for the running refresh.
    deadline: Option<Instant>,
    /// Bumped each time a refresh finishes, successful or not.
    generation: u64,
    last_failure: Option<String>,
    failed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<CacheState>,
    refreshed: Condvar,
}

/// One refresh run on its worker thread.
///
/// Publishes its outcome exactly once. If the source panics the run is
/// published as a failure while unwinding, so waiters are never stranded.
struct Refresh {
    shared: Arc<Shared>,
    source: Arc<dyn DatasetSource>,
    clock: Arc<dyn Clock>,
    kind: IndexKind,
    /// Invalidation count when the refresh started.
    invalidations: u64,
    finished: bool,
}

impl Refresh {
    fn run(mut self) {
        let result = self
            .source
            .fetch()
            .map(|data| Snapshot::build(data, self.kind, self.clock.now()));
        self.finish(result);
    }

    fn finish(&mut self, result: Result<Snapshot>) {
        self.finished = true;
        let mut state = self.shared.state.lock();
        state.refreshing = false;
        state.deadline = None;
        state.generation = state.generation.wrapping_add(1);

        match result {
            Ok(snapshot) => {
                let features = snapshot.features().len();
                tracing::info!(
                    source = %self.source.describe(),
                    features,
                    "dataset refreshed"
                );
                metrics::counter!(metric_defs::CACHE_REFRESHES.name).increment(1);
                metrics::gauge!(metric_defs::CACHE_FEATURES.name).set(features as f64);
                state.snapshot = Some(Arc::new(snapshot));
                // An invalidation that arrived mid-fetch may postdate this data.
                if state.invalidations == self.invalidations {
                    state.invalidated = false;
                }
                state.last_failure = None;
                state.failed_at = None;
            }
            Err(err) => {
                tracing::warn!(
                    source = %self.source.describe(),
                    error = %err,
                    have_snapshot = state.snapshot.is_some(),
                    "dataset refresh failed"
                );
                metrics::counter!(
                    metric_defs::CACHE_REFRESH_FAILURES.name,
                    "reason" => failure_reason(&err)
                )
                .increment(1);
                state.last_failure = Some(err.to_string());
                state.failed_at = Some(self.clock.now());
            }
        }

        drop(state);
        self.shared.refreshed.notify_all();
    }
}

impl Drop for Refresh {
    fn drop(&mut self) {
        if !self.finished {
            self.finish(Err(IndexError::FetchFailed(
                "dataset source panicked during fetch".to_string(),
            )));
        }
    }
}

/// Fetch-or-reuse cache over a [`DatasetSource`].
///
/// ```
/// use geoscope_geom::{FeatureCollection, LatLng};
/// use geoscope_index::{DatasetCache, DatasetSource, Result};
/// use std::sync::Arc;
///
/// struct Empty;
///
/// impl DatasetSource for Empty {
///     fn fetch(&self) -> Result<FeatureCollection> {
///         Ok(FeatureCollection::default())
///     }
///     fn describe(&self) -> String {
///         "empty".to_string()
///     }
/// }
///
/// let cache = DatasetCache::new(Arc::new(Empty));
/// let snapshot = cache.get()?;
/// assert!(snapshot.containing(LatLng::new(0.0, 0.0)).is_none());
/// # Ok::<(), geoscope_index::IndexError>(())
/// ```
pub struct DatasetCache {
    source: Arc<dyn DatasetSource>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    fetch_timeout: Duration,
    retry_backoff: Duration,
    index_kind: IndexKind,
    shared: Arc<Shared>,
}

impl std::fmt::Debug for DatasetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatasetCache")
            .field("source", &self.source.describe())
            .field("ttl", &self.ttl)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("retry_backoff", &self.retry_backoff)
            .field("index_kind", &self.index_kind)
            .finish()
    }
}

impl DatasetCache {
    /// Create an empty cache with the wall clock and default settings.
    pub fn new(source: Arc<dyn DatasetSource>) -> Self {
        Self {
            source,
            clock: Arc::new(SystemClock),
            ttl: DEFAULT_TTL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            index_kind: IndexKind::default(),
            shared: Arc::new(Shared::default()),
        }
    }

    /// Use `clock` for ages, fetch timestamps and retry backoff.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the time-to-live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set how long callers wait for each refresh.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Set the pause between a failed refresh and the next attempt while a
    /// stale snapshot is available. Zero retries on every access.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Choose the index built on refresh.
    pub fn with_index_kind(mut self, kind: IndexKind) -> Self {
        self.index_kind = kind;
        self
    }

    /// The time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current snapshot, refreshing first if it is missing, expired or
    /// invalidated.
    ///
    /// If the refresh fails and an older snapshot exists, the older snapshot
    /// is returned and retries wait out the backoff. Without one the
    /// failure is returned as [`IndexError::DatasetUnavailable`], or
    /// [`IndexError::Timeout`] when the refresh is still running at its
    /// deadline. Concurrent callers that arrive during a refresh all get
    /// that refresh's outcome.
    pub fn get(&self) -> Result<Arc<Snapshot>> {
        let now = self.clock.now();
        let mut state = self.shared.state.lock();

        if let Some(snapshot) = &state.snapshot {
            if !state.invalidated && !self.expired(snapshot, now) {
                return Ok(Arc::clone(snapshot));
            }
            if !state.refreshing && self.backing_off(&state, now) {
                metrics::counter!(metric_defs::CACHE_STALE_SERVED.name).increment(1);
                return Ok(Arc::clone(snapshot));
            }
        }

        if !state.refreshing {
            if let Err(err) = self.start_refresh(&mut state) {
                tracing::warn!(error = %err, "could not start dataset refresh");
                return state.snapshot.clone().ok_or(err);
            }
        }

        let generation = state.generation;
        while state.generation == generation {
            let deadline = state.deadline;
            match deadline {
                Some(deadline) => {
                    if self.shared.refreshed.wait_until(&mut state, deadline).timed_out() {
                        break;
                    }
                }
                None => self.shared.refreshed.wait(&mut state),
            }
        }

        if state.generation == generation {
            return self.overdue(&state);
        }
        self.settle(&state)
    }

    /// Force the next [`get`](Self::get) to refresh. The current snapshot is
    /// kept and still served if that refresh fails.
    pub fn invalidate(&self) {
        let mut state = self.shared.state.lock();
        state.invalidated = true;
        state.invalidations = state.invalidations.wrapping_add(1);
        state.failed_at = None;
        tracing::debug!("dataset cache invalidated");
    }

    /// Whether the snapshot is missing, expired or invalidated at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        let state = self.shared.state.lock();
        match &state.snapshot {
            Some(snapshot) => state.invalidated || self.expired(snapshot, now),
            None => true,
        }
    }

    /// The current snapshot without refreshing, if there is one.
    pub fn peek(&self) -> Option<Arc<Snapshot>> {
        self.shared.state.lock().snapshot.clone()
    }

    /// Age of the current snapshot at `now`.
    pub fn snapshot_age(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        self.shared.state.lock().snapshot.as_ref().map(|s| s.age(now))
    }

    fn expired(&self, snapshot: &Snapshot, now: DateTime<Utc>) -> bool {
        // A negative age (clock stepped back) counts as fresh.
        snapshot
            .age(now)
            .to_std()
            .map(|age| age >= self.ttl)
            .unwrap_or(false)
    }

    fn backing_off(&self, state: &CacheState, now: DateTime<Utc>) -> bool {
        state.failed_at.map_or(false, |failed_at| {
            (now - failed_at)
                .to_std()
                .map_or(true, |elapsed| elapsed < self.retry_backoff)
        })
    }

    /// Spawn the refresh thread. Called with the lock held, so the worker
    /// cannot publish before the caller starts waiting.
    fn start_refresh(&self, state: &mut CacheState) -> Result<()> {
        let shared = Arc::clone(&self.shared);
        let source = Arc::clone(&self.source);
        let clock = Arc::clone(&self.clock);
        let kind = self.index_kind;
        let invalidations = state.invalidations;
        tracing::info!(source = %source.describe(), index = %kind, "refreshing dataset");

        thread::Builder::new()
            .name("geoscope-dataset-fetch".to_string())
            .spawn(move || {
                Refresh {
                    shared,
                    source,
                    clock,
                    kind,
                    invalidations,
                    finished: false,
                }
                .run()
            })
            .map_err(|e| IndexError::DatasetUnavailable(format!("cannot start refresh: {}", e)))?;

        state.refreshing = true;
        state.deadline = Instant::now().checked_add(self.fetch_timeout);
        Ok(())
    }

    /// Result handed to every caller that saw a refresh finish.
    fn settle(&self, state: &CacheState) -> Result<Arc<Snapshot>> {
        match (&state.last_failure, &state.snapshot) {
            (None, Some(snapshot)) => Ok(Arc::clone(snapshot)),
            (Some(_), Some(snapshot)) => {
                metrics::counter!(metric_defs::CACHE_STALE_SERVED.name).increment(1);
                Ok(Arc::clone(snapshot))
            }
            (Some(reason), None) => Err(IndexError::DatasetUnavailable(reason.clone())),
            (None, None) => Err(IndexError::DatasetUnavailable(
                "no dataset has been fetched".to_string(),
            )),
        }
    }

    /// Result for callers whose wait ran past the refresh deadline.
    fn overdue(&self, state: &CacheState) -> Result<Arc<Snapshot>> {
        tracing::warn!(
            source = %self.source.describe(),
            timeout = ?self.fetch_timeout,
            have_snapshot = state.snapshot.is_some(),
            "dataset refresh still running past its deadline"
        );
        match &state.snapshot {
            Some(snapshot) => {
                metrics::counter!(metric_defs::CACHE_STALE_SERVED.name).increment(1);
                Ok(Arc::clone(snapshot))
            }
            None => Err(IndexError::Timeout(self.fetch_timeout)),
        }
    }
}
