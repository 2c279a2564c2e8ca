use crate::crowd::{CrowdEstimator, DensityUpdates};
use crate::spot::Spot;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

type UpdateCallback = Box<dyn FnMut(DensityUpdates) + Send>;

/// Handle to a running periodic update task.
///
/// Cancelling is idempotent. Once [`UpdateHandle::cancel`] returns, the
/// callback is never invoked again; an invocation already in progress
/// finishes before `cancel` returns. Dropping the handle cancels as well.
pub struct UpdateHandle {
    callback: Arc<Mutex<Option<UpdateCallback>>>,
    task: Option<JoinHandle<()>>,
}

impl fmt::Debug for UpdateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl UpdateHandle {
    /// Must not be called from inside the update callback.
    pub fn cancel(&mut self) {
        let removed = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if removed.is_some() {
            info!("Periodic crowd updates cancelled");
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for UpdateHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl CrowdEstimator {
    /// Every `update_interval`, re-estimate a random subset of `spots` and
    /// pass the new densities to `callback`. Rounds that pick no spot emit
    /// nothing. The first round runs one interval after the call.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_periodic_updates<F>(&self, spots: Vec<Spot>, callback: F) -> UpdateHandle
    where
        F: FnMut(DensityUpdates) + Send + 'static,
    {
        let boxed: UpdateCallback = Box::new(callback);
        let callback = Arc::new(Mutex::new(Some(boxed)));
        let interval = self.settings().update_interval;
        let estimator = self.clone();
        let task_callback = Arc::clone(&callback);

        info!(
            interval_ms = interval.as_millis(),
            spots = spots.len(),
            "Starting periodic crowd updates"
        );

        let task = tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                let subset = estimator.pick_update_subset(&spots);
                if subset.is_empty() {
                    debug!("No spots picked for this crowd update round");
                    continue;
                }

                let updates = estimator.bulk_estimate(&subset).await;
                if updates.is_empty() {
                    continue;
                }

                let delivered = {
                    let mut slot = task_callback
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner);
                    match slot.as_mut() {
                        Some(callback) => {
                            debug!(changed = updates.len(), "Emitting crowd updates");
                            callback(updates);
                            true
                        }
                        None => false,
                    }
                };
                if !delivered {
                    break;
                }
            }
        });

        UpdateHandle {
            callback,
            task: Some(task),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::crowd::tests::{estimator_at, instant_settings, spot};
    use crate::crowd::{DensityUpdates, EstimatorSettings};
    use crate::spot::DensityLevel;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use time::macros::datetime;

    fn recording() -> (
        Arc<Mutex<Vec<DensityUpdates>>>,
        impl FnMut(DensityUpdates) + Send + 'static,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |updates| {
            sink.lock().expect("record updates").push(updates);
        })
    }

    fn every_spot_settings() -> EstimatorSettings {
        EstimatorSettings {
            update_probability: 1.0,
            update_interval: Duration::from_secs(30),
            ..instant_settings(0.0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn emits_once_per_interval() {
        let estimator = estimator_at(datetime!(2026-10-14 08:00 UTC), every_spot_settings(), 1);
        let spots = vec![spot("a", DensityLevel::Low), spot("b", DensityLevel::High)];
        let (seen, callback) = recording();

        let _handle = estimator.start_periodic_updates(spots, callback);
        tokio::time::sleep(Duration::from_secs(65)).await;

        let seen = seen.lock().expect("read updates");
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].len(), 2);
        assert_eq!(seen[0]["a"], DensityLevel::Low);
        assert_eq!(seen[1]["b"], DensityLevel::High);
    }

    #[tokio::test(start_paused = true)]
    async fn nothing_is_emitted_before_the_first_interval() {
        let estimator = estimator_at(datetime!(2026-10-14 08:00 UTC), every_spot_settings(), 1);
        let (seen, callback) = recording();

        let _handle =
            estimator.start_periodic_updates(vec![spot("a", DensityLevel::Low)], callback);
        tokio::time::sleep(Duration::from_secs(29)).await;

        assert!(seen.lock().expect("read updates").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn empty_rounds_are_not_emitted() {
        let settings = EstimatorSettings {
            update_probability: 0.0,
            ..every_spot_settings()
        };
        let estimator = estimator_at(datetime!(2026-10-14 08:00 UTC), settings, 1);
        let (seen, callback) = recording();

        let _handle =
            estimator.start_periodic_updates(vec![spot("a", DensityLevel::Low)], callback);
        tokio::time::sleep(Duration::from_secs(300)).await;

        assert!(seen.lock().expect("read updates").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_emissions_and_is_idempotent() {
        let estimator = estimator_at(datetime!(2026-10-14 08:00 UTC), every_spot_settings(), 1);
        let (seen, callback) = recording();

        let mut handle =
            estimator.start_periodic_updates(vec![spot("a", DensityLevel::Low)], callback);
        tokio::time::sleep(Duration::from_secs(31)).await;
        handle.cancel();
        handle.cancel();
        tokio::time::sleep(Duration::from_secs(300)).await;

        assert!(handle.is_cancelled());
        assert_eq!(seen.lock().expect("read updates").len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels() {
        let estimator = estimator_at(datetime!(2026-10-14 08:00 UTC), every_spot_settings(), 1);
        let (seen, callback) = recording();

        drop(estimator.start_periodic_updates(vec![spot("a", DensityLevel::Low)], callback));
        tokio::time::sleep(Duration::from_secs(300)).await;

        assert!(seen.lock().expect("read updates").is_empty());
    }
}
