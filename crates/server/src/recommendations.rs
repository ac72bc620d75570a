use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use petstore_agent::{CatalogHint, Recommendation, RecommendationError, RecommendationRequest};
use petstore_core::Product;
use tracing::{error, info, warn};

use crate::api::{correlation_id, parse_body, AppState};
use crate::error::ApiError;

const RECOMMENDATION_FAILURE: &str =
    "An unexpected error occurred while fetching recommendations.";

/// `POST /api/recommendations`
pub async fn recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> Result<Json<Recommendation>, ApiError> {
    let correlation_id = correlation_id();
    let mut request = parse_body(payload, "recommendation", &correlation_id)?;
    request.validate().map_err(into_api_error)?;

    if request.purchase_history.is_empty() {
        if let Some(customer_id) = &request.customer_id {
            request.purchase_history = state.store.purchase_history(customer_id).await;
        }
    }

    let catalog: Vec<CatalogHint> = state
        .store
        .list::<Product>()
        .await
        .into_iter()
        .filter(|product| product.in_stock > 0)
        .map(|product| CatalogHint {
            id: product.id,
            name: product.name,
            category: product.category,
        })
        .collect();

    let mut recommendation =
        state.recommender.recommend(&request, &catalog).await.map_err(|failure| {
            error!(
                event_name = "recommendations.request.failed",
                correlation_id = %correlation_id,
                pet_type = %request.pet_type,
                error = %failure,
                "product recommendation failed"
            );
            into_api_error(failure)
        })?;

    let proposed = recommendation.recommended_products.len();
    recommendation.recommended_products =
        state.store.known_products(recommendation.recommended_products).await;
    let dropped = proposed - recommendation.recommended_products.len();
    if dropped > 0 {
        warn!(
            event_name = "recommendations.response.unknown_products",
            correlation_id = %correlation_id,
            dropped,
            "discarded recommended ids missing from the catalog"
        );
    }

    info!(
        event_name = "recommendations.request.completed",
        correlation_id = %correlation_id,
        pet_type = %request.pet_type,
        history_len = request.purchase_history.len(),
        recommended = recommendation.recommended_products.len(),
        "product recommendation completed"
    );
    Ok(Json(recommendation))
}

fn into_api_error(error: RecommendationError) -> ApiError {
    match error {
        RecommendationError::InvalidInput(fields) => ApiError::invalid_form(fields),
        RecommendationError::Timeout(_) => {
            ApiError::new(StatusCode::GATEWAY_TIMEOUT, RECOMMENDATION_FAILURE)
        }
        RecommendationError::Upstream(_)
        | RecommendationError::MalformedResponse(_)
        | RecommendationError::Template(_) => {
            ApiError::new(StatusCode::BAD_GATEWAY, RECOMMENDATION_FAILURE)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use petstore_agent::RecommendationRequest;
    use petstore_core::RecordId;

    use super::recommend;
    use crate::api::tests::{state_with_llm, CannedLlm};

    fn request(pet_type: &str) -> RecommendationRequest {
        RecommendationRequest {
            pet_type: pet_type.to_string(),
            pet_breed: Some("Labrador".to_string()),
            purchase_history: Vec::new(),
            customer_id: Some(RecordId::from("customer:001")),
        }
    }

    #[tokio::test]
    async fn unknown_recommended_ids_are_dropped() {
        let state = state_with_llm(Arc::new(CannedLlm(
            "{\"recommendedProducts\": [\"product:003\", \"product:999\"], \"reasoning\": \"walks\"}",
        )));

        let Json(recommendation) =
            recommend(State(state), Ok(Json(request("dog")))).await.expect("recommendation");

        assert_eq!(recommendation.recommended_products, vec![RecordId::from("product:003")]);
        assert_eq!(recommendation.reasoning, "walks");
    }

    #[tokio::test]
    async fn missing_pet_type_yields_field_errors() {
        let state = state_with_llm(Arc::new(CannedLlm("{}")));

        let error = recommend(State(state), Ok(Json(request("")))).await.expect_err("invalid");

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert_eq!(error.message(), "Invalid form data.");
    }

    #[tokio::test]
    async fn unusable_model_answer_is_bad_gateway() {
        let state = state_with_llm(Arc::new(CannedLlm("no idea")));

        let error = recommend(State(state), Ok(Json(request("dog")))).await.expect_err("failure");

        assert_eq!(error.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(error.message(), "An unexpected error occurred while fetching recommendations.");
    }
}
