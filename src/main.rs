use rand::SeedableRng;
use rand::rngs::StdRng;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use tourist_flow::api::{self, ApiContext};
use tourist_flow::config;
use tourist_flow::crowd::CrowdEstimator;
use tourist_flow::crowd::clock::{Clock, SystemClock};
use tourist_flow::pipeline;
use tourist_flow::recommend::RecommendationEngine;
use tourist_flow::spot::catalog::load_catalog_from_path;
use tourist_flow::state::AppState;

fn init_tracing(level: tracing::Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(level)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_default()?;
    init_tracing(config.log_level());
    tracing::info!(
        app = %config.app.name,
        config_path = config::DEFAULT_CONFIG_PATH,
        "tourist-flow starting"
    );

    let spots = load_catalog_from_path(config.catalog_path())?;
    tracing::info!(
        path = %config.catalog_path().display(),
        count = spots.len(),
        "Spot catalog loaded"
    );
    if spots.is_empty() {
        tracing::warn!("Spot catalog is empty, recommendations will be empty");
    }
    let state = Arc::new(RwLock::new(AppState::with_spots(spots)));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let estimator = CrowdEstimator::with_parts(
        config.estimator_settings(),
        Arc::clone(&clock),
        StdRng::from_os_rng(),
    );

    // Seed the overrides so the first requests see live densities
    if let Err(err) = pipeline::refresh_all(&estimator, &state).await {
        tracing::warn!(error = %err, "Initial crowd refresh failed");
    }
    let mut crowd_updates = pipeline::start_crowd_updates(&estimator, &state)?;

    let app = api::router(ApiContext {
        state: Arc::clone(&state),
        estimator,
        engine: RecommendationEngine::default(),
        clock,
        default_origin: config.default_origin(),
    });
    let port = config.server_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await?;

    crowd_updates.cancel();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::config;

    #[test]
    fn default_config_is_valid_toml() -> Result<(), Box<dyn std::error::Error>> {
        let _config = config::load_default()?;
        Ok(())
    }
}
