//! Preference-based ranking of spots.
//!
//! [`RecommendationEngine::recommend`] is pure: it filters the candidates by
//! distance and crowd level, scores the survivors and returns the best few.

use crate::spot::{Category, Coordinate, DensityLevel, Spot};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub mod geo;
pub mod overrides;

use geo::{haversine_km, walking_minutes};
pub use overrides::{CrowdOverrides, ReportedDensity};

pub const DEFAULT_MAX_RESULTS: usize = 5;

pub const CATEGORY_MATCH_BONUS: f64 = 30.0;
pub const VISIT_TIME_BONUS: f64 = 20.0;
/// Minutes of slack, inclusive, for the visit time bonus.
pub const VISIT_TIME_TOLERANCE_MINUTES: u32 = 30;
pub const RATING_WEIGHT: f64 = 10.0;
pub const DISTANCE_SCORE_CEILING: f64 = 50.0;
pub const DISTANCE_PENALTY_PER_KM: f64 = 10.0;
/// Crowd bonuses above this earn the quiet-visit reason.
pub const LOW_CROWD_REASON_THRESHOLD: f64 = 15.0;

pub const LOW_CROWD_REASON: &str = "Low crowd density for peaceful visit";
pub const VISIT_TIME_REASON: &str = "Perfect visit duration for your schedule";
pub const FALLBACK_REASON: &str = "Good match for your preferences";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub categories: HashSet<Category>,
    pub max_crowd_level: DensityLevel,
    /// Kilometres.
    pub max_travel_distance: f64,
    /// Minutes.
    pub preferred_visit_time: u32,
}

impl Preferences {
    /// Reject values the engine cannot reason about.
    pub fn validate(&self) -> Result<(), String> {
        if !self.max_travel_distance.is_finite() || self.max_travel_distance < 0.0 {
            return Err(format!(
                "max_travel_distance must be a non-negative number, got {}",
                self.max_travel_distance
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation<'a> {
    pub spot: &'a Spot,
    pub score: f64,
    /// `reasons` joined with `". "`, or the fallback text when empty.
    pub reason: String,
    pub reasons: Vec<String>,
    /// Walking minutes from the origin.
    pub estimated_travel_time: u32,
    pub distance_km: f64,
    pub crowd_density: ReportedDensity,
}

/// Bonus for the effective crowd level; unknown levels score in between
/// medium and high.
pub fn crowd_bonus(density: &ReportedDensity) -> f64 {
    match density {
        ReportedDensity::Level(DensityLevel::Low) => 25.0,
        ReportedDensity::Level(DensityLevel::Medium) => 15.0,
        ReportedDensity::Level(DensityLevel::High) => 5.0,
        ReportedDensity::Level(DensityLevel::VeryHigh) => 0.0,
        ReportedDensity::Unknown(_) => 10.0,
    }
}

#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    max_results: usize,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESULTS)
    }
}

impl RecommendationEngine {
    /// Limits above `DEFAULT_MAX_RESULTS` are clamped to it.
    pub fn new(max_results: usize) -> Self {
        Self {
            max_results: max_results.min(DEFAULT_MAX_RESULTS),
        }
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Rank `spots` for a visitor at `origin`.
    ///
    /// Results are ordered by descending score. Equal scores keep the order
    /// of `spots`. At most `max_results` entries are returned.
    pub fn recommend<'a>(
        &self,
        origin: Coordinate,
        spots: &'a [Spot],
        preferences: &Preferences,
        overrides: &CrowdOverrides,
    ) -> Vec<Recommendation<'a>> {
        let mut recommendations: Vec<_> = spots
            .iter()
            .filter_map(|spot| score_spot(origin, spot, preferences, overrides))
            .collect();

        // stable: ties stay in catalog order
        recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));
        recommendations.truncate(self.max_results);
        recommendations
    }
}

/// Score a single spot, or `None` when it is too far or too crowded.
pub fn score_spot<'a>(
    origin: Coordinate,
    spot: &'a Spot,
    preferences: &Preferences,
    overrides: &CrowdOverrides,
) -> Option<Recommendation<'a>> {
    let distance_km = haversine_km(origin, spot.location);
    if distance_km > preferences.max_travel_distance {
        return None;
    }

    let crowd_density = overrides.effective_for(spot);
    if !crowd_density.is_within(preferences.max_crowd_level) {
        return None;
    }

    let mut score = 0.0;
    let mut reasons = Vec::new();

    if preferences.categories.contains(&spot.category) {
        score += CATEGORY_MATCH_BONUS;
        reasons.push(format!("Matches your interest in {}", spot.category));
    }

    let bonus = crowd_bonus(&crowd_density);
    score += bonus;
    if bonus > LOW_CROWD_REASON_THRESHOLD {
        reasons.push(LOW_CROWD_REASON.to_string());
    }

    score += spot.rating * RATING_WEIGHT;
    score += (DISTANCE_SCORE_CEILING - distance_km * DISTANCE_PENALTY_PER_KM).max(0.0);

    if spot
        .estimated_visit_time
        .abs_diff(preferences.preferred_visit_time)
        <= VISIT_TIME_TOLERANCE_MINUTES
    {
        score += VISIT_TIME_BONUS;
        reasons.push(VISIT_TIME_REASON.to_string());
    }

    let reason = if reasons.is_empty() {
        FALLBACK_REASON.to_string()
    } else {
        reasons.join(". ")
    };

    Some(Recommendation {
        spot,
        score,
        reason,
        reasons,
        estimated_travel_time: walking_minutes(distance_km),
        distance_km,
        crowd_density,
    })
}
