//! Recommendation agent: LLM-backed product suggestions for a pet.
//!
//! The model only proposes product ids and a rationale. Callers own catalog
//! lookups and must discard ids the catalog does not know.
//!
//! - `llm` - the `LlmClient` capability and an HTTP client for OpenAI,
//!   Anthropic and Ollama style endpoints
//! - `recommendations` - request validation, prompt rendering, bounded model
//!   call and response parsing

pub mod llm;
pub mod recommendations;

pub use llm::{HttpLlmClient, LlmClient};
pub use recommendations::{
    CatalogHint, FieldErrors, ProductRecommender, Recommendation, RecommendationError,
    RecommendationRequest,
};
