//! JSON routes for the catalog resources.

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use petstore_agent::ProductRecommender;
use petstore_core::{
    CatalogStats, Customer, CustomerLink, NewCustomer, NewPet, NewProduct, NewSale, NewService,
    Pet, PetStatus, Product, RecordId, Sale, Service,
};
use petstore_db::{CatalogStore, Record};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::recommendations;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CatalogStore>,
    pub recommender: Arc<ProductRecommender>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api", get(list_pets).post(add_pet))
        .route("/api/pets", get(list_pets).post(add_pet))
        .route("/api/pets/{id}", get(get_pet))
        .route("/api/pets/{id}/status", post(update_pet_status))
        .route("/api/products", get(list_products).post(add_product))
        .route("/api/products/{id}", get(get_product))
        .route("/api/customers", get(list_customers).post(add_customer))
        .route("/api/customers/{id}", get(get_customer))
        .route("/api/services", get(list_services).post(add_service))
        .route("/api/services/{id}", get(get_service))
        .route("/api/sales", get(list_sales).post(add_sale))
        .route("/api/sales/{id}", get(get_sale))
        .route("/api/stats", get(stats))
        .route("/api/recommendations", post(recommendations::recommend))
        .with_state(state)
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PetQuery {
    #[serde(rename = "type")]
    pub species: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub category: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ServiceQuery {
    #[serde(rename = "type")]
    pub service_type: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleQuery {
    pub customer_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PetStatusUpdate {
    pub status: PetStatus,
    #[serde(default)]
    pub owner_id: Option<RecordId>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PetList {
    pub pets: Vec<Pet>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PetEnvelope {
    pub pet: Pet,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductList {
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductEnvelope {
    pub product: Product,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerList {
    pub customers: Vec<Customer>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerEnvelope {
    pub customer: Customer,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceList {
    pub services: Vec<Service>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceEnvelope {
    pub service: Service,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaleList {
    pub sales: Vec<Sale>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SaleEnvelope {
    pub sale: Sale,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsEnvelope {
    pub stats: CatalogStats,
}

type Created<T> = (StatusCode, Json<T>);

pub async fn list_pets(
    State(state): State<AppState>,
    query: Result<Query<PetQuery>, QueryRejection>,
) -> Result<Json<PetList>, ApiError> {
    let query = parse_query(query)?;
    let pets = list_or_filter(&state.store, "type", query.species).await;
    Ok(Json(PetList { pets }))
}

pub async fn get_pet(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<PetEnvelope>, ApiError> {
    let pet = fetch_one(&state.store, &id, "Pet").await?;
    Ok(Json(PetEnvelope { pet }))
}

pub async fn add_pet(
    State(state): State<AppState>,
    payload: Result<Json<NewPet>, JsonRejection>,
) -> Result<Created<PetEnvelope>, ApiError> {
    let correlation_id = correlation_id();
    let draft = parse_body(payload, "pet", &correlation_id)?;

    let pet = state.store.add_pet(draft).await.map_err(|error| {
        warn!(
            event_name = "catalog.pet.add_failed",
            correlation_id = %correlation_id,
            error = %error,
            "failed to add pet"
        );
        ApiError::from_store(&error, "pet")
    })?;

    info!(
        event_name = "catalog.pet.added",
        correlation_id = %correlation_id,
        pet_id = %pet.id,
        species = %pet.species,
        "pet added"
    );
    Ok((StatusCode::CREATED, Json(PetEnvelope { pet })))
}

pub async fn update_pet_status(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
    payload: Result<Json<PetStatusUpdate>, JsonRejection>,
) -> Result<Json<PetEnvelope>, ApiError> {
    let correlation_id = correlation_id();
    let update = parse_body(payload, "pet status", &correlation_id)?;

    let Some(pet) = state.store.update_pet_status(&id, update.status, update.owner_id).await
    else {
        return Err(ApiError::not_found("Pet"));
    };

    info!(
        event_name = "catalog.pet.status_changed",
        correlation_id = %correlation_id,
        pet_id = %pet.id,
        status = pet.status.as_str(),
        "pet status updated"
    );
    Ok(Json(PetEnvelope { pet }))
}

pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ProductQuery>, QueryRejection>,
) -> Result<Json<ProductList>, ApiError> {
    let query = parse_query(query)?;
    let products = list_or_filter(&state.store, "category", query.category).await;
    Ok(Json(ProductList { products }))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<ProductEnvelope>, ApiError> {
    let product = fetch_one(&state.store, &id, "Product").await?;
    Ok(Json(ProductEnvelope { product }))
}

pub async fn add_product(
    State(state): State<AppState>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> Result<Created<ProductEnvelope>, ApiError> {
    let correlation_id = correlation_id();
    let draft = parse_body(payload, "product", &correlation_id)?;

    let product = state.store.add_product(draft).await.map_err(|error| {
        warn!(
            event_name = "catalog.product.add_failed",
            correlation_id = %correlation_id,
            error = %error,
            "failed to add product"
        );
        ApiError::from_store(&error, "product")
    })?;

    info!(
        event_name = "catalog.product.added",
        correlation_id = %correlation_id,
        product_id = %product.id,
        sku = %product.sku,
        "product added"
    );
    Ok((StatusCode::CREATED, Json(ProductEnvelope { product })))
}

pub async fn list_customers(State(state): State<AppState>) -> Json<CustomerList> {
    Json(CustomerList { customers: state.store.list::<Customer>().await })
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<CustomerEnvelope>, ApiError> {
    let customer = fetch_one(&state.store, &id, "Customer").await?;
    Ok(Json(CustomerEnvelope { customer }))
}

pub async fn add_customer(
    State(state): State<AppState>,
    payload: Result<Json<NewCustomer>, JsonRejection>,
) -> Result<Created<CustomerEnvelope>, ApiError> {
    let correlation_id = correlation_id();
    let draft = parse_body(payload, "customer", &correlation_id)?;
    draft.validate().map_err(|error| {
        warn!(
            event_name = "catalog.customer.invalid_contact",
            correlation_id = %correlation_id,
            error = %error,
            "rejected customer contact details"
        );
        ApiError::bad_request(format!("Invalid customer payload: {error}"))
    })?;

    let customer = state.store.add_customer(draft).await.map_err(|error| {
        warn!(
            event_name = "catalog.customer.add_failed",
            correlation_id = %correlation_id,
            error = %error,
            "failed to add customer"
        );
        ApiError::from_store(&error, "customer")
    })?;

    info!(
        event_name = "catalog.customer.added",
        correlation_id = %correlation_id,
        customer_id = %customer.id,
        "customer added"
    );
    Ok((StatusCode::CREATED, Json(CustomerEnvelope { customer })))
}

pub async fn list_services(
    State(state): State<AppState>,
    query: Result<Query<ServiceQuery>, QueryRejection>,
) -> Result<Json<ServiceList>, ApiError> {
    let query = parse_query(query)?;
    let services = list_or_filter(&state.store, "type", query.service_type).await;
    Ok(Json(ServiceList { services }))
}

pub async fn get_service(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<ServiceEnvelope>, ApiError> {
    let service = fetch_one(&state.store, &id, "Service").await?;
    Ok(Json(ServiceEnvelope { service }))
}

pub async fn add_service(
    State(state): State<AppState>,
    payload: Result<Json<NewService>, JsonRejection>,
) -> Result<Created<ServiceEnvelope>, ApiError> {
    let correlation_id = correlation_id();
    let draft = parse_body(payload, "service", &correlation_id)?;

    let service = state.store.add_service(draft).await.map_err(|error| {
        warn!(
            event_name = "catalog.service.add_failed",
            correlation_id = %correlation_id,
            error = %error,
            "failed to add service"
        );
        ApiError::from_store(&error, "service")
    })?;

    info!(
        event_name = "catalog.service.added",
        correlation_id = %correlation_id,
        service_id = %service.id,
        "service added"
    );
    Ok((StatusCode::CREATED, Json(ServiceEnvelope { service })))
}

pub async fn list_sales(
    State(state): State<AppState>,
    query: Result<Query<SaleQuery>, QueryRejection>,
) -> Result<Json<SaleList>, ApiError> {
    let query = parse_query(query)?;
    let sales = list_or_filter(&state.store, "customer_id", query.customer_id).await;
    Ok(Json(SaleList { sales }))
}

pub async fn get_sale(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Result<Json<SaleEnvelope>, ApiError> {
    let sale = fetch_one(&state.store, &id, "Sale").await?;
    Ok(Json(SaleEnvelope { sale }))
}

pub async fn add_sale(
    State(state): State<AppState>,
    payload: Result<Json<NewSale>, JsonRejection>,
) -> Result<Created<SaleEnvelope>, ApiError> {
    let correlation_id = correlation_id();
    let draft = parse_body(payload, "sale", &correlation_id)?;
    let customer_id = draft.customer_id.clone();

    let receipt = state.store.record_sale(draft).await.map_err(|error| {
        warn!(
            event_name = "catalog.sale.rejected",
            correlation_id = %correlation_id,
            customer_id = %customer_id,
            error = %error,
            "sale rejected"
        );
        ApiError::from_store(&error, "sale")
    })?;

    if receipt.link == CustomerLink::Orphaned {
        warn!(
            event_name = "catalog.sale.orphaned",
            correlation_id = %correlation_id,
            sale_id = %receipt.sale.id,
            customer_id = %customer_id,
            "sale recorded for unknown customer; customer history not updated"
        );
    }
    for pet_id in &receipt.pets_sold {
        info!(
            event_name = "catalog.pet.sold",
            correlation_id = %correlation_id,
            pet_id = %pet_id,
            sale_id = %receipt.sale.id,
            "pet marked sold"
        );
    }
    info!(
        event_name = "catalog.sale.recorded",
        correlation_id = %correlation_id,
        sale_id = %receipt.sale.id,
        customer_id = %customer_id,
        total = %receipt.sale.total,
        items = receipt.sale.items.len(),
        "sale recorded"
    );

    Ok((StatusCode::CREATED, Json(SaleEnvelope { sale: receipt.sale })))
}

pub async fn stats(State(state): State<AppState>) -> Json<StatsEnvelope> {
    Json(StatsEnvelope { stats: state.store.stats().await })
}

pub(crate) fn correlation_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn parse_body<T>(
    payload: Result<Json<T>, JsonRejection>,
    resource: &str,
    correlation_id: &str,
) -> Result<T, ApiError> {
    match payload {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            warn!(
                event_name = "api.request.invalid_payload",
                correlation_id = %correlation_id,
                resource,
                error = %rejection.body_text(),
                "rejected malformed request body"
            );
            Err(ApiError::invalid_payload(resource, &rejection))
        }
    }
}

fn parse_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    match query {
        Ok(Query(value)) => Ok(value),
        Err(rejection) => {
            warn!(
                event_name = "api.request.invalid_query",
                correlation_id = %correlation_id(),
                error = %rejection.body_text(),
                "rejected malformed query string"
            );
            Err(ApiError::invalid_query(&rejection))
        }
    }
}

async fn list_or_filter<T: Record>(
    store: &CatalogStore,
    field: &str,
    value: Option<String>,
) -> Vec<T> {
    match value.as_deref().map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => store.filter::<T>(field, value).await,
        None => store.list::<T>().await,
    }
}

async fn fetch_one<T: Record>(
    store: &CatalogStore,
    id: &RecordId,
    singular: &str,
) -> Result<T, ApiError> {
    store.get::<T>(id).await.ok_or_else(|| ApiError::not_found(singular))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::Result;
    use async_trait::async_trait;
    use axum::{
        extract::{Path, Query, State},
        http::StatusCode,
        Json,
    };
    use petstore_agent::{LlmClient, ProductRecommender};
    use petstore_core::{
        ItemKind, NewSale, PaymentMethod, PetStatus, RecordId, SaleItem, SaleProcessor,
    };
    use petstore_db::{CatalogStore, SeedDataset};
    use rust_decimal::Decimal;

    use super::{
        add_sale, get_customer, get_pet, list_pets, list_sales, stats, update_pet_status,
        AppState, PetQuery, PetStatusUpdate, SaleQuery,
    };

    pub(crate) struct CannedLlm(pub &'static str);

    #[async_trait]
    impl LlmClient for CannedLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    pub(crate) fn state_with_llm(client: Arc<dyn LlmClient>) -> AppState {
        AppState {
            store: Arc::new(CatalogStore::new(SeedDataset::sample(), SaleProcessor::default())),
            recommender: Arc::new(
                ProductRecommender::new(client, Duration::from_millis(200))
                    .expect("prompt template"),
            ),
        }
    }

    fn state() -> AppState {
        state_with_llm(Arc::new(CannedLlm("{\"recommendedProducts\": []}")))
    }

    #[tokio::test]
    async fn list_pets_filters_by_type_and_ignores_blank_filter() {
        let state = state();

        let Json(cats) = list_pets(
            State(state.clone()),
            Ok(Query(PetQuery { species: Some("cat".to_string()) })),
        )
        .await
        .expect("cats");
        let Json(all) =
            list_pets(State(state), Ok(Query(PetQuery { species: Some(" ".to_string()) })))
                .await
                .expect("all pets");

        assert_eq!(cats.pets.len(), 2);
        assert!(cats.pets.iter().all(|pet| pet.species == "cat"));
        assert_eq!(all.pets.len(), 5);
    }

    #[tokio::test]
    async fn get_pet_returns_not_found_for_unknown_id() {
        let error = get_pet(State(state()), Path(RecordId::from("pet:999")))
            .await
            .expect_err("missing pet");

        assert_eq!(error.status(), StatusCode::NOT_FOUND);
        assert_eq!(error.message(), "Pet not found");
    }

    #[tokio::test]
    async fn add_sale_links_customer_and_returns_created() {
        let state = state();
        let draft = NewSale {
            customer_id: RecordId::from("customer:002"),
            items: vec![SaleItem {
                reference: RecordId::from("pet:004"),
                kind: ItemKind::Pet,
                price: Decimal::new(75_000, 2),
                quantity: 1,
            }],
            tax: None,
            payment_method: PaymentMethod::Online,
        };

        let (status, Json(created)) =
            add_sale(State(state.clone()), Ok(Json(draft))).await.expect("sale accepted");

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.sale.id.as_str(), "sale:003");
        assert_eq!(created.sale.total, Decimal::new(75_000, 2));

        let Json(customer) =
            get_customer(State(state.clone()), Path(RecordId::from("customer:002")))
                .await
                .expect("customer");
        assert_eq!(customer.customer.transaction_ids.last(), Some(&created.sale.id));

        let Json(pet) =
            get_pet(State(state.clone()), Path(RecordId::from("pet:004"))).await.expect("pet");
        assert_eq!(pet.pet.status, PetStatus::Sold);

        let Json(sales) = list_sales(
            State(state),
            Ok(Query(SaleQuery { customer_id: Some("customer:002".to_string()) })),
        )
        .await
        .expect("sales");
        assert_eq!(sales.sales.len(), 2);
    }

    #[tokio::test]
    async fn add_sale_rejects_unknown_item_reference() {
        let draft = NewSale {
            customer_id: RecordId::from("customer:001"),
            items: vec![SaleItem {
                reference: RecordId::from("product:404"),
                kind: ItemKind::Product,
                price: Decimal::new(100, 2),
                quantity: 1,
            }],
            tax: None,
            payment_method: PaymentMethod::Card,
        };

        let error = add_sale(State(state()), Ok(Json(draft))).await.expect_err("rejected");

        assert_eq!(error.status(), StatusCode::BAD_REQUEST);
        assert!(error.message().contains("product:404"));
    }

    #[tokio::test]
    async fn pet_status_update_is_reflected_in_stats() {
        let state = state();

        let Json(updated) = update_pet_status(
            State(state.clone()),
            Path(RecordId::from("pet:002")),
            Ok(Json(PetStatusUpdate {
                status: PetStatus::Sold,
                owner_id: Some(RecordId::from("customer:001")),
            })),
        )
        .await
        .expect("status updated");
        assert_eq!(updated.pet.owner_id, Some(RecordId::from("customer:001")));

        let Json(envelope) = stats(State(state)).await;
        assert_eq!(envelope.stats.sold_pets, 3);
        assert_eq!(envelope.stats.available_pets, 2);
    }
}
