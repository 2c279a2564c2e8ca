//! Glue between the crowd estimator and the shared application state.

use crate::crowd::periodic::UpdateHandle;
use crate::crowd::{CrowdEstimator, DensityUpdates};
use crate::error::AppError;
use crate::recommend::CrowdOverrides;
use crate::state::AppState;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use tracing::{info, warn};

/// Re-estimate every catalog spot and replace the stored overrides.
pub async fn refresh_all(
    estimator: &CrowdEstimator,
    state: &Arc<RwLock<AppState>>,
) -> Result<DensityUpdates, AppError> {
    let spots = {
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        guard.spots().to_vec()
    };

    if spots.is_empty() {
        warn!("Crowd refresh requested with an empty catalog");
    }

    let updates = estimator.bulk_estimate(&spots).await;

    let mut guard = state.write().map_err(|_| AppError::StateLock)?;
    guard.set_crowd(CrowdOverrides::from(updates.clone()), SystemTime::now());
    info!(spots = updates.len(), "Crowd densities refreshed");

    Ok(updates)
}

/// Start periodic estimation, merging each emitted subset into `state`.
pub fn start_crowd_updates(
    estimator: &CrowdEstimator,
    state: &Arc<RwLock<AppState>>,
) -> Result<UpdateHandle, AppError> {
    let spots = {
        let guard = state.read().map_err(|_| AppError::StateLock)?;
        guard.spots().to_vec()
    };
    let state = Arc::clone(state);

    Ok(estimator.start_periodic_updates(spots, move |updates| {
        let changed = updates.len();
        match state.write() {
            Ok(mut guard) => {
                guard.merge_crowd(CrowdOverrides::from(updates), SystemTime::now());
                info!(changed, "Crowd densities updated");
            }
            Err(_) => warn!("State lock poisoned while applying crowd updates"),
        }
    }))
}
