use crate::recommend::CrowdOverrides;
use crate::spot::Spot;
use std::time::SystemTime;
use tokio::sync::watch;

/// Latest crowd overrides and when they were last touched.
#[derive(Debug, Clone, PartialEq)]
pub struct CrowdSnapshot {
    pub overrides: CrowdOverrides,
    pub updated_at: SystemTime,
}

#[derive(Debug)]
pub struct AppState {
    spots: Vec<Spot>,
    crowd: Option<CrowdSnapshot>,
    crowd_tx: watch::Sender<Option<CrowdSnapshot>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_spots(Vec::new())
    }

    pub fn with_spots(spots: Vec<Spot>) -> Self {
        let (crowd_tx, _crowd_rx) = watch::channel(None);
        Self {
            spots,
            crowd: None,
            crowd_tx,
        }
    }

    pub fn spots(&self) -> &[Spot] {
        &self.spots
    }

    pub fn set_spots(&mut self, spots: Vec<Spot>) {
        self.spots = spots;
    }

    pub fn crowd(&self) -> Option<&CrowdSnapshot> {
        self.crowd.as_ref()
    }

    /// Current overrides, empty before the first refresh.
    pub fn crowd_overrides(&self) -> CrowdOverrides {
        self.crowd
            .as_ref()
            .map(|snapshot| snapshot.overrides.clone())
            .unwrap_or_default()
    }

    pub fn subscribe_crowd(&self) -> watch::Receiver<Option<CrowdSnapshot>> {
        self.crowd_tx.subscribe()
    }

    /// Replace all overrides, as after a full refresh.
    pub fn set_crowd(&mut self, overrides: CrowdOverrides, updated_at: SystemTime) {
        self.publish_crowd(CrowdSnapshot {
            overrides,
            updated_at,
        });
    }

    /// Layer a partial update over the current overrides.
    pub fn merge_crowd(&mut self, updates: CrowdOverrides, updated_at: SystemTime) {
        let mut overrides = self.crowd_overrides();
        overrides.extend(updates);
        self.publish_crowd(CrowdSnapshot {
            overrides,
            updated_at,
        });
    }

    fn publish_crowd(&mut self, snapshot: CrowdSnapshot) {
        self.crowd = Some(snapshot.clone());
        self.crowd_tx.send_replace(Some(snapshot));
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommend::ReportedDensity;
    use crate::spot::DensityLevel;
    use std::time::{Duration, UNIX_EPOCH};

    fn overrides(entries: &[(&str, DensityLevel)]) -> CrowdOverrides {
        entries
            .iter()
            .map(|(id, level)| (id.to_string(), *level))
            .collect()
    }

    #[test]
    fn set_crowd_updates_state_and_watch() {
        let mut state = AppState::new();
        let receiver = state.subscribe_crowd();
        let snapshot = overrides(&[("1", DensityLevel::High)]);

        state.set_crowd(snapshot.clone(), UNIX_EPOCH + Duration::from_secs(1));

        let stored = state.crowd().expect("crowd snapshot");
        assert_eq!(stored.overrides, snapshot);
        assert_eq!(receiver.borrow().as_ref(), Some(stored));
    }

    #[test]
    fn set_crowd_without_subscribers_still_stores() {
        let mut state = AppState::new();

        state.set_crowd(overrides(&[("1", DensityLevel::Low)]), UNIX_EPOCH);

        assert_eq!(state.crowd_overrides().len(), 1);
    }

    #[test]
    fn merge_crowd_keeps_untouched_spots() {
        let mut state = AppState::new();
        state.set_crowd(
            overrides(&[("1", DensityLevel::Low), ("2", DensityLevel::Low)]),
            UNIX_EPOCH,
        );

        state.merge_crowd(
            overrides(&[("2", DensityLevel::VeryHigh)]),
            UNIX_EPOCH + Duration::from_secs(30),
        );

        let current = state.crowd_overrides();
        assert_eq!(current.get("1"), Some(&ReportedDensity::Level(DensityLevel::Low)));
        assert_eq!(
            current.get("2"),
            Some(&ReportedDensity::Level(DensityLevel::VeryHigh))
        );
        assert_eq!(
            state.crowd().map(|c| c.updated_at),
            Some(UNIX_EPOCH + Duration::from_secs(30))
        );
    }

    #[test]
    fn overrides_are_empty_before_first_refresh() {
        let state = AppState::new();
        assert!(state.crowd().is_none());
        assert!(state.crowd_overrides().is_empty());
    }
}
