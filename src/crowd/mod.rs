//! Simulated crowd-density estimation.
//!
//! A [`CrowdEstimator`] derives a live density for each spot from its baseline,
//! the time of day, the day of week and an injectable random source, and keeps
//! the latest value per spot in an in-memory cache.

use crate::spot::{DensityLevel, Spot, SpotId};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, SystemTime};
use tokio::task::JoinSet;
use tracing::{debug, warn};

pub mod clock;
pub mod periodic;
pub mod rules;

use clock::{Clock, SystemClock};
use rules::{DEFAULT_ADJUSTMENT_PROBABILITY, adjust_density, roll_jitter};

pub const DEFAULT_UPDATE_PROBABILITY: f64 = 0.3;
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_millis(500);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(1500);

/// Densities keyed by spot id, as produced by one estimation round.
pub type DensityUpdates = HashMap<SpotId, DensityLevel>;

#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorSettings {
    /// Chance of the extra random up/down step.
    pub adjustment_probability: f64,
    /// Chance of each spot being picked in a periodic round.
    pub update_probability: f64,
    /// Simulated latency bounds for a single estimate.
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub update_interval: Duration,
}

impl Default for EstimatorSettings {
    fn default() -> Self {
        Self {
            adjustment_probability: DEFAULT_ADJUSTMENT_PROBABILITY,
            update_probability: DEFAULT_UPDATE_PROBABILITY,
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            update_interval: DEFAULT_UPDATE_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedDensity {
    pub density: DensityLevel,
    pub last_updated: SystemTime,
}

struct Inner {
    settings: EstimatorSettings,
    clock: Arc<dyn Clock>,
    rng: Mutex<Box<dyn RngCore + Send>>,
    cache: RwLock<HashMap<SpotId, CachedDensity>>,
}

/// Cheap to clone; clones share the cache and random source.
#[derive(Clone)]
pub struct CrowdEstimator {
    inner: Arc<Inner>,
}

impl fmt::Debug for CrowdEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self
            .inner
            .cache
            .read()
            .map(|cache| cache.len())
            .unwrap_or_default();
        f.debug_struct("CrowdEstimator")
            .field("settings", &self.inner.settings)
            .field("clock", &self.inner.clock)
            .field("cached", &cached)
            .finish()
    }
}

impl CrowdEstimator {
    /// Estimator on the system clock with an OS-seeded random source.
    pub fn new(settings: EstimatorSettings) -> Self {
        Self::with_parts(
            settings,
            Arc::new(SystemClock::new()),
            StdRng::from_os_rng(),
        )
    }

    pub fn with_parts(
        settings: EstimatorSettings,
        clock: Arc<dyn Clock>,
        rng: impl RngCore + Send + 'static,
    ) -> Self {
        let settings = EstimatorSettings {
            adjustment_probability: settings.adjustment_probability.clamp(0.0, 1.0),
            update_probability: settings.update_probability.clamp(0.0, 1.0),
            ..settings
        };
        Self {
            inner: Arc::new(Inner {
                settings,
                clock,
                rng: Mutex::new(Box::new(rng)),
                cache: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn settings(&self) -> &EstimatorSettings {
        &self.inner.settings
    }

    /// Estimate the current density of `spot` and cache it.
    ///
    /// Suspends for the simulated latency first; concurrent calls do not wait
    /// on each other. Racing calls for the same id leave whichever finished
    /// last in the cache.
    pub async fn estimate(&self, spot: &Spot) -> DensityLevel {
        let delay = self.sample_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let now = self.inner.clock.now();
        let probability = self.inner.settings.adjustment_probability;
        let jitter = self.with_rng(|rng| roll_jitter(rng, probability));
        let density = adjust_density(spot.crowd_density, now.hour(), now.weekday(), jitter);

        self.store(
            &spot.id,
            CachedDensity {
                density,
                last_updated: SystemTime::from(now),
            },
        );
        debug!(
            spot_id = %spot.id,
            baseline = %spot.crowd_density,
            density = %density,
            jitter = ?jitter,
            "Crowd density estimated"
        );
        density
    }

    /// Estimate every spot concurrently.
    pub async fn bulk_estimate(&self, spots: &[Spot]) -> DensityUpdates {
        let mut tasks = JoinSet::new();
        for spot in spots {
            let estimator = self.clone();
            let spot = spot.clone();
            tasks.spawn(async move {
                let density = estimator.estimate(&spot).await;
                (spot.id, density)
            });
        }

        let mut updates = HashMap::with_capacity(spots.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, density)) => {
                    updates.insert(id, density);
                }
                Err(err) => warn!(error = %err, "Crowd estimation task failed"),
            }
        }
        updates
    }

    pub fn get_cached(&self, spot_id: &str) -> Option<CachedDensity> {
        self.inner
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(spot_id)
            .copied()
    }

    pub fn cached_snapshot(&self) -> HashMap<SpotId, CachedDensity> {
        self.inner
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Pick each spot independently with the configured update probability.
    pub(crate) fn pick_update_subset(&self, spots: &[Spot]) -> Vec<Spot> {
        let probability = self.inner.settings.update_probability;
        self.with_rng(|rng| {
            spots
                .iter()
                .filter(|_| rng.random_bool(probability))
                .cloned()
                .collect()
        })
    }

    fn store(&self, spot_id: &str, entry: CachedDensity) {
        let mut cache = self
            .inner
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        cache.insert(spot_id.to_string(), entry);
    }

    fn sample_delay(&self) -> Duration {
        let settings = &self.inner.settings;
        let min_ms = u64::try_from(settings.min_delay.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(settings.max_delay.as_millis()).unwrap_or(u64::MAX);
        if max_ms <= min_ms {
            return settings.min_delay;
        }
        let millis = self.with_rng(|rng| rng.random_range(min_ms..max_ms));
        Duration::from_millis(millis)
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut Box<dyn RngCore + Send>) -> T) -> T {
        let mut rng = self
            .inner
            .rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut *rng)
    }
}
