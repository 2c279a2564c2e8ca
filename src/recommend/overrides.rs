use crate::spot::{DensityLevel, Spot, SpotId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Density as reported by a live source.
///
/// Reported values that are not one of the four known levels are kept as
/// `Unknown` instead of being rejected. An unknown level has no position on
/// the ordered scale: it passes every max-crowd check and scores the neutral
/// crowd bonus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportedDensity {
    Level(DensityLevel),
    Unknown(String),
}

impl ReportedDensity {
    pub fn level(&self) -> Option<DensityLevel> {
        match self {
            Self::Level(level) => Some(*level),
            Self::Unknown(_) => None,
        }
    }

    pub fn is_within(&self, max: DensityLevel) -> bool {
        match self {
            Self::Level(level) => *level <= max,
            Self::Unknown(_) => true,
        }
    }
}

impl From<DensityLevel> for ReportedDensity {
    fn from(level: DensityLevel) -> Self {
        Self::Level(level)
    }
}

impl fmt::Display for ReportedDensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level(level) => level.fmt(f),
            Self::Unknown(raw) => f.write_str(raw),
        }
    }
}

/// Live densities that supersede each spot's baseline, keyed by spot id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CrowdOverrides(HashMap<SpotId, ReportedDensity>);

impl CrowdOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, spot_id: impl Into<SpotId>, density: impl Into<ReportedDensity>) {
        self.0.insert(spot_id.into(), density.into());
    }

    /// Merge `other` on top of `self`; entries in `other` win.
    pub fn extend(&mut self, other: CrowdOverrides) {
        self.0.extend(other.0);
    }

    pub fn get(&self, spot_id: &str) -> Option<&ReportedDensity> {
        self.0.get(spot_id)
    }

    /// The override for `spot` if present, otherwise its baseline.
    pub fn effective_for(&self, spot: &Spot) -> ReportedDensity {
        self.get(&spot.id)
            .cloned()
            .unwrap_or(ReportedDensity::Level(spot.crowd_density))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SpotId, &ReportedDensity)> {
        self.0.iter()
    }
}

impl From<HashMap<SpotId, DensityLevel>> for CrowdOverrides {
    fn from(levels: HashMap<SpotId, DensityLevel>) -> Self {
        levels.into_iter().collect()
    }
}

impl FromIterator<(SpotId, DensityLevel)> for CrowdOverrides {
    fn from_iter<I: IntoIterator<Item = (SpotId, DensityLevel)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(id, level)| (id, ReportedDensity::Level(level)))
                .collect(),
        )
    }
}
