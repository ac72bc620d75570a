use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use petstore_db::CatalogStore;
use serde::Serialize;

const STORE_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Clone)]
pub struct HealthState {
    store: Arc<CatalogStore>,
    recommendations: HealthCheck,
}

impl HealthState {
    pub fn new(store: Arc<CatalogStore>, recommendations_detail: impl Into<String>) -> Self {
        Self {
            store,
            recommendations: HealthCheck {
                status: "ready",
                detail: recommendations_detail.into(),
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub store: HealthCheck,
    pub recommendations: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: HealthState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let store = store_check(&state.store).await;
    let ready = store.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "petstore-server runtime initialized".to_string(),
        },
        store,
        recommendations: state.recommendations.clone(),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

// A writer holding the lock past the probe timeout reports as degraded.
async fn store_check(store: &CatalogStore) -> HealthCheck {
    match tokio::time::timeout(STORE_PROBE_TIMEOUT, store.stats()).await {
        Ok(stats) => HealthCheck {
            status: "ready",
            detail: format!(
                "catalog holds {} pets, {} products, {} sales",
                stats.total_pets, stats.total_products, stats.total_sales
            ),
        },
        Err(_) => HealthCheck {
            status: "degraded",
            detail: format!("catalog store did not respond within {STORE_PROBE_TIMEOUT:?}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use petstore_core::SaleProcessor;
    use petstore_db::{CatalogStore, SeedDataset};

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_returns_ready_with_catalog_summary() {
        let store = Arc::new(CatalogStore::new(SeedDataset::sample(), SaleProcessor::default()));

        let (status, Json(payload)) =
            health(State(HealthState::new(store, "ollama model llama3.1"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.store.detail, "catalog holds 5 pets, 5 products, 2 sales");
        assert_eq!(payload.recommendations.detail, "ollama model llama3.1");
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn empty_catalog_is_still_ready() {
        let store = Arc::new(CatalogStore::new(SeedDataset::empty(), SaleProcessor::default()));

        let (status, Json(payload)) = health(State(HealthState::new(store, "disabled"))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.store.status, "ready");
        assert_eq!(payload.store.detail, "catalog holds 0 pets, 0 products, 0 sales");
    }
}
