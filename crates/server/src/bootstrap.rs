use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use petstore_agent::{HttpLlmClient, ProductRecommender, RecommendationError};
use petstore_core::config::{AppConfig, ConfigError, LoadOptions, SeedProfile};
use petstore_core::SaleProcessor;
use petstore_db::{CatalogStore, SeedDataset};
use thiserror::Error;
use tracing::info;

use crate::api::AppState;
use crate::health::HealthState;

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
    pub health: HealthState,
}

impl Application {
    pub fn router(&self) -> Router {
        crate::router(self.state.clone(), self.health.clone())
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("llm client setup failed: {0}")]
    LlmClient(String),
    #[error(transparent)]
    Recommender(#[from] RecommendationError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let seed = match config.catalog.seed {
        SeedProfile::Sample => SeedDataset::sample(),
        SeedProfile::Empty => SeedDataset::empty(),
    };
    let processor = SaleProcessor::new(config.sales.unknown_customer);
    let store = Arc::new(CatalogStore::new(seed, processor));
    let seed_label = format!("{:?}", config.catalog.seed).to_ascii_lowercase();
    info!(
        event_name = "system.bootstrap.store_seeded",
        correlation_id = "bootstrap",
        seed = %seed_label,
        unknown_customer = ?processor.policy(),
        "catalog store initialized"
    );

    let client = HttpLlmClient::from_config(&config.llm)
        .map_err(|error| BootstrapError::LlmClient(format!("{error:#}")))?;
    let recommender = ProductRecommender::new(
        Arc::new(client),
        Duration::from_secs(config.llm.timeout_secs),
    )?;
    let llm_detail = format!("{} model {}", config.llm.provider.as_str(), config.llm.model);
    info!(
        event_name = "system.bootstrap.recommender_ready",
        correlation_id = "bootstrap",
        provider = config.llm.provider.as_str(),
        model = %config.llm.model,
        timeout_secs = config.llm.timeout_secs,
        "recommendation client configured"
    );

    let health = HealthState::new(store.clone(), llm_detail);
    let state = AppState { store, recommender: Arc::new(recommender) };

    Ok(Application { config, state, health })
}
