use crate::api::ApiContext;
use crate::api::responses::{
    ApiErrorCode, ApiErrorResponse, CrowdSuccessResponse, HealthStatus, HealthSuccessResponse,
    RecommendationRequest, RecommendationResponse, RecommendationsSuccessResponse,
    SpotStatusResponse, SpotsSuccessResponse,
};
use crate::pipeline;
use crate::spot::Coordinate;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, error};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

#[derive(Debug)]
enum TimestampError {
    Format(time::error::Format),
}

impl fmt::Display for TimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampError::Format(err) => write!(f, "timestamp format error: {err}"),
        }
    }
}

pub enum ApiResponse<T> {
    Success {
        status: StatusCode,
        body: T,
    },
    Error {
        status: StatusCode,
        body: ApiErrorResponse,
    },
}

impl<T> ApiResponse<T> {
    fn ok(body: T) -> Self {
        ApiResponse::Success {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiResponse::Success { status, .. } | ApiResponse::Error { status, .. } => *status,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match self {
            ApiResponse::Success { status, body } => (status, Json(body)).into_response(),
            ApiResponse::Error { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub async fn get_health(State(context): State<ApiContext>) -> impl IntoResponse {
    build_health_response(&context.state, context.clock.now())
}

pub async fn get_spots(State(context): State<ApiContext>) -> impl IntoResponse {
    build_spots_response(&context.state, context.clock.now())
}

pub async fn get_crowd(State(context): State<ApiContext>) -> impl IntoResponse {
    build_crowd_response(&context.state, context.clock.now())
}

pub async fn refresh_crowd(State(context): State<ApiContext>) -> impl IntoResponse {
    if let Err(err) = pipeline::refresh_all(&context.estimator, &context.state).await {
        return internal_error::<CrowdSuccessResponse>("/api/crowd/refresh", &err.to_string());
    }
    build_crowd_response(&context.state, context.clock.now())
}

pub async fn post_recommendations(
    State(context): State<ApiContext>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> impl IntoResponse {
    let now = context.clock.now();
    match payload {
        Ok(Json(request)) => build_recommendations_response(&context, request, now),
        Err(rejection) => rejected_body_response(&rejection, now),
    }
}

fn rejected_body_response<T>(rejection: &JsonRejection, now: OffsetDateTime) -> ApiResponse<T> {
    debug!(error = %rejection.body_text(), "Rejected request body");
    error_response(
        StatusCode::BAD_REQUEST,
        ApiErrorCode::InvalidRequest,
        &rejection.body_text(),
        now,
    )
}

fn build_health_response(
    state: &Arc<RwLock<AppState>>,
    now: OffsetDateTime,
) -> ApiResponse<HealthSuccessResponse> {
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => return internal_error("/api/health", "state lock poisoned while reading"),
    };
    let spot_count = guard.spots().len();
    let last_update = guard.crowd().map(|crowd| crowd.updated_at);
    drop(guard);

    let status = match (spot_count, last_update) {
        (0, _) => HealthStatus::Ko,
        (_, None) => HealthStatus::Degraded,
        (_, Some(_)) => HealthStatus::Ok,
    };
    let status_code = match status {
        HealthStatus::Ko => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Ok | HealthStatus::Degraded => StatusCode::OK,
    };

    let last_crowd_update = match last_update.map(format_system_time).transpose() {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/health", "timestamp formatting failure"),
    };
    let timestamp = match format_timestamp(now) {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/health", "timestamp formatting failure"),
    };

    ApiResponse::Success {
        status: status_code,
        body: HealthSuccessResponse {
            status,
            spot_count,
            last_crowd_update,
            timestamp,
        },
    }
}

fn build_spots_response(
    state: &Arc<RwLock<AppState>>,
    now: OffsetDateTime,
) -> ApiResponse<SpotsSuccessResponse> {
    let guard = match state.read() {
        Ok(guard) => guard,
        Err(_) => return internal_error("/api/spots", "state lock poisoned while reading"),
    };
    if guard.spots().is_empty() {
        drop(guard);
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::CatalogEmpty,
            "Spot catalog is empty",
            now,
        );
    }

    let overrides = guard.crowd_overrides();
    let spots = guard
        .spots()
        .iter()
        .map(|spot| SpotStatusResponse {
            id: spot.id.clone(),
            name: spot.name.clone(),
            description: spot.description.clone(),
            category: spot.category,
            location: spot.location,
            baseline_density: spot.crowd_density,
            current_density: overrides.effective_for(spot),
            rating: spot.rating,
            estimated_visit_time: spot.estimated_visit_time,
            opening_hours: spot.opening_hours.clone(),
            open_now: spot.opening_hours.is_open_at(now.hour(), now.minute()),
            image_url: spot.image_url.clone(),
            tags: spot.tags.clone(),
        })
        .collect();
    drop(guard);

    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::ok(SpotsSuccessResponse { spots, timestamp }),
        Err(_) => internal_error("/api/spots", "timestamp formatting failure"),
    }
}

fn build_crowd_response(
    state: &Arc<RwLock<AppState>>,
    now: OffsetDateTime,
) -> ApiResponse<CrowdSuccessResponse> {
    let crowd = match state.read() {
        Ok(guard) => guard.crowd().cloned(),
        Err(_) => return internal_error("/api/crowd", "state lock poisoned while reading"),
    };

    let Some(crowd) = crowd else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            ApiErrorCode::NoData,
            "No crowd estimate available",
            now,
        );
    };

    let (updated_at, timestamp) =
        match (format_system_time(crowd.updated_at), format_timestamp(now)) {
            (Ok(updated_at), Ok(timestamp)) => (updated_at, timestamp),
            _ => return internal_error("/api/crowd", "timestamp formatting failure"),
        };

    ApiResponse::ok(CrowdSuccessResponse {
        densities: crowd
            .overrides
            .iter()
            .map(|(id, density)| (id.clone(), density.clone()))
            .collect(),
        updated_at,
        timestamp,
    })
}

fn build_recommendations_response(
    context: &ApiContext,
    request: RecommendationRequest,
    now: OffsetDateTime,
) -> ApiResponse<RecommendationsSuccessResponse> {
    if let Err(message) = request.preferences.validate() {
        return error_response(
            StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidRequest,
            &message,
            now,
        );
    }
    let origin = request.origin.unwrap_or(context.default_origin);
    if !is_valid_coordinate(origin) {
        return error_response(
            StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidRequest,
            "origin must be a valid latitude/longitude pair",
            now,
        );
    }

    let guard = match context.state.read() {
        Ok(guard) => guard,
        Err(_) => {
            return internal_error("/api/recommendations", "state lock poisoned while reading");
        }
    };
    let overrides = guard.crowd_overrides();
    let crowd_updated_at = guard.crowd().map(|crowd| crowd.updated_at);
    let recommendations: Vec<_> = context
        .engine
        .recommend(origin, guard.spots(), &request.preferences, &overrides)
        .into_iter()
        .map(|rec| RecommendationResponse {
            spot_id: rec.spot.id.clone(),
            name: rec.spot.name.clone(),
            category: rec.spot.category,
            score: rec.score,
            reason: rec.reason,
            reasons: rec.reasons,
            estimated_travel_time: rec.estimated_travel_time,
            distance_km: rec.distance_km,
            crowd_density: rec.crowd_density,
        })
        .collect();
    drop(guard);

    debug!(
        lat = origin.lat,
        lng = origin.lng,
        count = recommendations.len(),
        "Recommendations generated"
    );

    let crowd_updated_at = match crowd_updated_at.map(format_system_time).transpose() {
        Ok(formatted) => formatted,
        Err(_) => return internal_error("/api/recommendations", "timestamp formatting failure"),
    };
    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::ok(RecommendationsSuccessResponse {
            origin,
            recommendations,
            crowd_updated_at,
            timestamp,
        }),
        Err(_) => internal_error("/api/recommendations", "timestamp formatting failure"),
    }
}

fn is_valid_coordinate(coordinate: Coordinate) -> bool {
    coordinate.lat.is_finite()
        && coordinate.lng.is_finite()
        && (-90.0..=90.0).contains(&coordinate.lat)
        && (-180.0..=180.0).contains(&coordinate.lng)
}

fn error_response<T>(
    status: StatusCode,
    error_code: ApiErrorCode,
    message: &str,
    now: OffsetDateTime,
) -> ApiResponse<T> {
    match format_timestamp(now) {
        Ok(timestamp) => ApiResponse::Error {
            status,
            body: ApiErrorResponse {
                error_code,
                error_message: message.to_string(),
                timestamp,
            },
        },
        Err(_) => internal_error("error response", "timestamp formatting failure"),
    }
}

fn internal_error<T>(endpoint: &str, message: &str) -> ApiResponse<T> {
    error!(
        endpoint = endpoint,
        message = message,
        "Internal error while handling request"
    );
    let formatted = format_timestamp(OffsetDateTime::now_utc()).unwrap_or_else(|err| {
        error!(error = %err, "Failed to format internal error timestamp");
        "1970-01-01T00:00:00Z".to_string()
    });
    ApiResponse::Error {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: ApiErrorResponse {
            error_code: ApiErrorCode::InternalError,
            error_message: INTERNAL_ERROR_MESSAGE.to_string(),
            timestamp: formatted,
        },
    }
}

fn format_timestamp(timestamp: OffsetDateTime) -> Result<String, TimestampError> {
    timestamp.format(&Rfc3339).map_err(TimestampError::Format)
}

fn format_system_time(timestamp: SystemTime) -> Result<String, TimestampError> {
    format_timestamp(OffsetDateTime::from(timestamp))
}
