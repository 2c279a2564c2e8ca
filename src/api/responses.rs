use crate::recommend::{Preferences, ReportedDensity};
use crate::spot::{Category, Coordinate, DensityLevel, OpeningHours};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    Degraded,
    Ko,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthSuccessResponse {
    pub status: HealthStatus,
    pub spot_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_crowd_update: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SpotStatusResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub location: Coordinate,
    pub baseline_density: DensityLevel,
    pub current_density: ReportedDensity,
    pub rating: f64,
    pub estimated_visit_time: u32,
    pub opening_hours: OpeningHours,
    /// `None` when the opening hours cannot be parsed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_now: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SpotsSuccessResponse {
    pub spots: Vec<SpotStatusResponse>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CrowdSuccessResponse {
    pub densities: BTreeMap<String, ReportedDensity>,
    pub updated_at: String,
    pub timestamp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RecommendationRequest {
    #[serde(default)]
    pub origin: Option<Coordinate>,
    pub preferences: Preferences,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RecommendationResponse {
    pub spot_id: String,
    pub name: String,
    pub category: Category,
    pub score: f64,
    pub reason: String,
    pub reasons: Vec<String>,
    pub estimated_travel_time: u32,
    pub distance_km: f64,
    pub crowd_density: ReportedDensity,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RecommendationsSuccessResponse {
    pub origin: Coordinate,
    pub recommendations: Vec<RecommendationResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crowd_updated_at: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ApiErrorResponse {
    pub error_code: ApiErrorCode,
    pub error_message: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    NoData,
    CatalogEmpty,
    InvalidRequest,
    InternalError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn health_response_omits_missing_crowd_update() {
        let response = HealthSuccessResponse {
            status: HealthStatus::Degraded,
            spot_count: 6,
            last_crowd_update: None,
            timestamp: "2026-10-14T12:30:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize health response");
        assert_eq!(
            value,
            json!({
                "status": "degraded",
                "spot_count": 6,
                "timestamp": "2026-10-14T12:30:00Z"
            })
        );
    }

    #[test]
    fn error_response_uses_screaming_snake_case_code() {
        let response = ApiErrorResponse {
            error_code: ApiErrorCode::InvalidRequest,
            error_message: "bad preferences".to_string(),
            timestamp: "2026-10-14T12:32:00Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize error response");
        assert_eq!(
            value,
            json!({
                "error_code": "INVALID_REQUEST",
                "error_message": "bad preferences",
                "timestamp": "2026-10-14T12:32:00Z"
            })
        );
    }

    #[test]
    fn crowd_response_lists_densities_by_id() {
        let mut densities = BTreeMap::new();
        densities.insert("2".to_string(), ReportedDensity::Level(DensityLevel::VeryHigh));
        densities.insert("1".to_string(), ReportedDensity::Unknown("packed".to_string()));
        let response = CrowdSuccessResponse {
            densities,
            updated_at: "2026-10-14T12:00:00Z".to_string(),
            timestamp: "2026-10-14T12:00:05Z".to_string(),
        };

        let value = serde_json::to_value(response).expect("serialize crowd response");
        assert_eq!(
            value,
            json!({
                "densities": { "1": "packed", "2": "very-high" },
                "updated_at": "2026-10-14T12:00:00Z",
                "timestamp": "2026-10-14T12:00:05Z"
            })
        );
    }

    #[test]
    fn recommendation_request_origin_is_optional() {
        let request: RecommendationRequest = serde_json::from_value(json!({
            "preferences": {
                "categories": ["park", "museum"],
                "max_crowd_level": "very-high",
                "max_travel_distance": 5.0,
                "preferred_visit_time": 120
            }
        }))
        .expect("parse request");

        assert!(request.origin.is_none());
        assert_eq!(request.preferences.categories.len(), 2);
        assert_eq!(request.preferences.max_crowd_level, DensityLevel::VeryHigh);
    }
}
