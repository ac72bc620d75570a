//! HTTP facade for the pet store catalog.
//!
//! `api` serves the six catalog resources, `recommendations` proxies product
//! suggestions through the LLM agent, and `health` reports readiness.

pub mod api;
pub mod bootstrap;
pub mod error;
pub mod health;
pub mod recommendations;

use axum::Router;

pub use api::AppState;
pub use health::HealthState;

pub fn router(state: AppState, health: HealthState) -> Router {
    api::router(state).merge(health::router(health))
}
