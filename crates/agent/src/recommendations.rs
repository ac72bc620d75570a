//! Product recommendations for a pet, delegated to an [`LlmClient`].
//!
//! The request is validated before any prompt is rendered, the model call is
//! bounded by a timeout, and the first JSON object in the completion is taken
//! as the answer.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use petstore_core::RecordId;
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use thiserror::Error;

use crate::llm::LlmClient;

const PROMPT_TEMPLATE_NAME: &str = "product_recommendations.tera";

/// Field name to human readable problems, shaped for form feedback.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("invalid recommendation request")]
    InvalidInput(FieldErrors),
    #[error("recommendation model did not answer within {0:?}")]
    Timeout(Duration),
    #[error("recommendation model call failed: {0}")]
    Upstream(String),
    #[error("recommendation model returned an unusable answer: {0}")]
    MalformedResponse(String),
    #[error("recommendation prompt could not be rendered: {0}")]
    Template(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    #[serde(default)]
    pub pet_type: String,
    #[serde(default)]
    pub pet_breed: Option<String>,
    #[serde(default)]
    pub purchase_history: Vec<RecordId>,
    /// Used to look up purchase history when none is supplied.
    #[serde(default)]
    pub customer_id: Option<RecordId>,
}

impl RecommendationRequest {
    pub fn validate(&self) -> Result<(), RecommendationError> {
        let mut errors = FieldErrors::new();
        if self.pet_type.trim().is_empty() {
            errors
                .entry("petType".to_string())
                .or_default()
                .push("Pet type is required.".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RecommendationError::InvalidInput(errors))
        }
    }

    fn breed(&self) -> Option<&str> {
        self.pet_breed.as_deref().map(str::trim).filter(|breed| !breed.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    #[serde(alias = "recommended_products")]
    pub recommended_products: Vec<RecordId>,
    #[serde(default)]
    pub reasoning: String,
}

/// A product the model may choose from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CatalogHint {
    pub id: RecordId,
    pub name: String,
    pub category: String,
}

#[derive(Clone)]
pub struct ProductRecommender {
    client: Arc<dyn LlmClient>,
    tera: Tera,
    timeout: Duration,
}

impl ProductRecommender {
    pub fn new(client: Arc<dyn LlmClient>, timeout: Duration) -> Result<Self, RecommendationError> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            PROMPT_TEMPLATE_NAME,
            include_str!("../../../templates/recommendations/product_recommendations.tera"),
        )
        .map_err(|error| RecommendationError::Template(error.to_string()))?;

        Ok(Self { client, tera, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn render_prompt(
        &self,
        request: &RecommendationRequest,
        catalog: &[CatalogHint],
    ) -> Result<String, RecommendationError> {
        let mut context = Context::new();
        context.insert("pet_type", request.pet_type.trim());
        context.insert("pet_breed", &request.breed());
        context.insert("purchase_history", &request.purchase_history);
        context.insert("catalog", catalog);

        self.tera
            .render(PROMPT_TEMPLATE_NAME, &context)
            .map_err(|error| RecommendationError::Template(error.to_string()))
    }

    /// Asks the model for recommendations. Returned ids are not checked
    /// against the catalog.
    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
        catalog: &[CatalogHint],
    ) -> Result<Recommendation, RecommendationError> {
        request.validate()?;
        let prompt = self.render_prompt(request, catalog)?;

        let completion = tokio::time::timeout(self.timeout, self.client.complete(&prompt))
            .await
            .map_err(|_| RecommendationError::Timeout(self.timeout))?
            .map_err(|error| RecommendationError::Upstream(format!("{error:#}")))?;

        parse_recommendation(&completion)
    }
}

impl std::fmt::Debug for ProductRecommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductRecommender").field("timeout", &self.timeout).finish_non_exhaustive()
    }
}

/// Parses the outermost JSON object in a completion, tolerating prose or
/// code fences around it.
pub fn parse_recommendation(completion: &str) -> Result<Recommendation, RecommendationError> {
    let start = completion.find('{');
    let end = completion.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &completion[start..=end],
        _ => {
            return Err(RecommendationError::MalformedResponse(
                "completion contained no json object".to_string(),
            ))
        }
    };

    serde_json::from_str(json)
        .map_err(|error| RecommendationError::MalformedResponse(error.to_string()))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use petstore_core::RecordId;

    use super::{
        parse_recommendation, CatalogHint, ProductRecommender, RecommendationError,
        RecommendationRequest,
    };
    use crate::llm::LlmClient;

    struct FixedClient {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl FixedClient {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self { reply: reply.to_string(), prompts: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl LlmClient for FixedClient {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().expect("prompt log").push(prompt.to_string());
            Ok(self.reply.clone())
        }
    }

    struct SlowClient;

    #[async_trait]
    impl LlmClient for SlowClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("{}".to_string())
        }
    }

    struct FailingClient;

    #[async_trait]
    impl LlmClient for FailingClient {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            bail!("connection refused")
        }
    }

    fn request(pet_type: &str, breed: Option<&str>, history: &[&str]) -> RecommendationRequest {
        RecommendationRequest {
            pet_type: pet_type.to_string(),
            pet_breed: breed.map(str::to_string),
            purchase_history: history.iter().map(|id| RecordId::from(*id)).collect(),
            customer_id: None,
        }
    }

    fn recommender(client: Arc<dyn LlmClient>, timeout: Duration) -> ProductRecommender {
        ProductRecommender::new(client, timeout).expect("template should load")
    }

    #[tokio::test]
    async fn returns_parsed_recommendation_and_sends_rendered_prompt() {
        let client = FixedClient::new(
            "Sure!\n```json\n{\"recommendedProducts\": [\"product:003\"], \"reasoning\": \"Puppies need a leash.\"}\n```",
        );
        let recommender = recommender(client.clone(), Duration::from_secs(1));
        let catalog = vec![CatalogHint {
            id: RecordId::from("product:003"),
            name: "Leather Leash".to_string(),
            category: "accessory".to_string(),
        }];

        let recommendation = recommender
            .recommend(&request("dog", Some("Labrador"), &["product:001"]), &catalog)
            .await
            .expect("recommendation");

        assert_eq!(recommendation.recommended_products, vec![RecordId::from("product:003")]);
        assert_eq!(recommendation.reasoning, "Puppies need a leash.");

        let prompts = client.prompts.lock().expect("prompt log");
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Pet Type: dog"));
        assert!(prompts[0].contains("Pet Breed: Labrador"));
        assert!(prompts[0].contains("Purchase History: product:001, "));
        assert!(prompts[0].contains("- product:003: Leather Leash (accessory)"));
    }

    #[tokio::test]
    async fn prompt_omits_breed_line_when_blank() {
        let recommender = recommender(FixedClient::new("{}"), Duration::from_secs(1));

        let prompt =
            recommender.render_prompt(&request("cat", Some("  "), &[]), &[]).expect("prompt");

        assert!(prompt.contains("Pet Type: cat"));
        assert!(!prompt.contains("Pet Breed"));
        assert!(!prompt.contains("Products in stock"));
    }

    #[tokio::test]
    async fn blank_pet_type_is_rejected_before_calling_the_model() {
        let client = FixedClient::new("{}");
        let recommender = recommender(client.clone(), Duration::from_secs(1));

        let error = recommender
            .recommend(&request("   ", None, &[]), &[])
            .await
            .expect_err("pet type is required");

        match error {
            RecommendationError::InvalidInput(fields) => {
                assert_eq!(fields["petType"], vec!["Pet type is required.".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(client.prompts.lock().expect("prompt log").is_empty());
    }

    #[tokio::test]
    async fn slow_model_times_out() {
        let recommender = recommender(Arc::new(SlowClient), Duration::from_millis(20));

        let error =
            recommender.recommend(&request("bird", None, &[]), &[]).await.expect_err("timeout");

        assert!(matches!(error, RecommendationError::Timeout(timeout) if timeout == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn client_failure_is_upstream_error() {
        let recommender = recommender(Arc::new(FailingClient), Duration::from_secs(1));

        let error =
            recommender.recommend(&request("dog", None, &[]), &[]).await.expect_err("upstream");

        assert!(matches!(error, RecommendationError::Upstream(ref detail) if detail.contains("connection refused")));
    }

    #[tokio::test]
    async fn non_json_completion_is_malformed() {
        let recommender =
            recommender(FixedClient::new("I recommend a chew toy."), Duration::from_secs(1));

        let error =
            recommender.recommend(&request("dog", None, &[]), &[]).await.expect_err("malformed");

        assert!(matches!(error, RecommendationError::MalformedResponse(_)));
    }

    #[test]
    fn parse_accepts_snake_case_keys_and_missing_reasoning() {
        let parsed = parse_recommendation("{\"recommended_products\": [\"product:002\"]}")
            .expect("snake case accepted");

        assert_eq!(parsed.recommended_products, vec![RecordId::from("product:002")]);
        assert!(parsed.reasoning.is_empty());
    }

    #[test]
    fn parse_requires_product_list() {
        assert!(matches!(
            parse_recommendation("{\"reasoning\": \"none\"}"),
            Err(RecommendationError::MalformedResponse(_))
        ));
    }
}
