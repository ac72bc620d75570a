use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use petstore_core::{
    CatalogLookup, CatalogStats, Customer, CustomerLink, DomainError, EntityKind, ItemKind,
    NewCustomer, NewPet, NewProduct, NewSale, NewService, Pet, PetStatus, Product, RecordId, Sale,
    SaleProcessor, Service,
};

use crate::fixtures::SeedDataset;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("{kind} id sequence exhausted")]
    SequenceExhausted { kind: EntityKind },
}

/// A record kind held by the catalog.
pub trait Record: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &RecordId;

    /// String value of a filterable field, `None` when unset or not filterable.
    fn field(&self, name: &str) -> Option<&str>;

    fn collection(catalog: &Catalog) -> &Collection<Self>;

    fn collection_mut(catalog: &mut Catalog) -> &mut Collection<Self>;
}

/// Insertion-ordered records of one kind plus the last issued sequence.
#[derive(Debug)]
pub struct Collection<T> {
    records: Vec<T>,
    last_sequence: u64,
}

impl<T: Record> Collection<T> {
    fn seeded(records: Vec<T>) -> Self {
        let highest = records
            .iter()
            .filter_map(|record| record.id().sequence_for(T::KIND))
            .max()
            .unwrap_or(0);
        let last_sequence = highest.max(records.len() as u64);
        Self { records, last_sequence }
    }

    fn allocate(&mut self) -> Result<(RecordId, u64), StoreError> {
        let sequence = self
            .last_sequence
            .checked_add(1)
            .ok_or(StoreError::SequenceExhausted { kind: T::KIND })?;
        self.last_sequence = sequence;
        Ok((RecordId::new(T::KIND, sequence), sequence))
    }

    fn get(&self, id: &RecordId) -> Option<&T> {
        self.records.iter().find(|record| record.id() == id)
    }

    fn get_mut(&mut self, id: &RecordId) -> Option<&mut T> {
        self.records.iter_mut().find(|record| record.id() == id)
    }

    fn filter(&self, field: &str, value: &str) -> Vec<T> {
        self.records.iter().filter(|record| record.field(field) == Some(value)).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[derive(Debug)]
pub struct Catalog {
    pets: Collection<Pet>,
    products: Collection<Product>,
    customers: Collection<Customer>,
    services: Collection<Service>,
    sales: Collection<Sale>,
}

impl CatalogLookup for Catalog {
    fn item_exists(&self, kind: ItemKind, id: &RecordId) -> bool {
        match kind {
            ItemKind::Product => self.products.get(id).is_some(),
            ItemKind::Pet => self.pets.get(id).is_some(),
        }
    }

    fn pet_available(&self, id: &RecordId) -> bool {
        self.pets.get(id).is_some_and(Pet::is_available)
    }

    fn customer_exists(&self, id: &RecordId) -> bool {
        self.customers.get(id).is_some()
    }
}

/// Outcome of recording a sale.
#[derive(Clone, Debug, PartialEq)]
pub struct SaleReceipt {
    pub sale: Sale,
    pub link: CustomerLink,
    pub pets_sold: Vec<RecordId>,
}

/// Process-local catalog. All collections sit behind one lock so every write,
/// including a sale and its customer/pet side effects, is applied atomically.
#[derive(Debug)]
pub struct CatalogStore {
    state: RwLock<Catalog>,
    processor: SaleProcessor,
}

impl CatalogStore {
    pub fn new(seed: SeedDataset, processor: SaleProcessor) -> Self {
        let catalog = Catalog {
            pets: Collection::seeded(seed.pets),
            products: Collection::seeded(seed.products),
            customers: Collection::seeded(seed.customers),
            services: Collection::seeded(seed.services),
            sales: Collection::seeded(seed.sales),
        };
        Self { state: RwLock::new(catalog), processor }
    }

    pub fn processor(&self) -> &SaleProcessor {
        &self.processor
    }

    pub async fn list<T: Record>(&self) -> Vec<T> {
        let catalog = self.state.read().await;
        T::collection(&catalog).records.clone()
    }

    pub async fn get<T: Record>(&self, id: &RecordId) -> Option<T> {
        let catalog = self.state.read().await;
        T::collection(&catalog).get(id).cloned()
    }

    pub async fn filter<T: Record>(&self, field: &str, value: &str) -> Vec<T> {
        let catalog = self.state.read().await;
        T::collection(&catalog).filter(field, value)
    }

    pub async fn add_pet(&self, draft: NewPet) -> Result<Pet, StoreError> {
        self.append(|id, _, now| draft.into_pet(id, now)).await
    }

    pub async fn add_product(&self, draft: NewProduct) -> Result<Product, StoreError> {
        self.append(|id, sequence, _| draft.into_product(id, sequence)).await
    }

    pub async fn add_customer(&self, draft: NewCustomer) -> Result<Customer, StoreError> {
        draft.validate()?;
        self.append(|id, _, now| draft.into_customer(id, now)).await
    }

    pub async fn add_service(&self, draft: NewService) -> Result<Service, StoreError> {
        self.append(|id, _, _| draft.into_service(id)).await
    }

    pub async fn record_sale(&self, draft: NewSale) -> Result<SaleReceipt, StoreError> {
        let mut catalog = self.state.write().await;
        let link = self.processor.validate(&draft, &*catalog)?;
        let (id, _) = catalog.sales.allocate()?;

        let now = Utc::now();
        let sale = self.processor.finalize(draft, id, now)?;
        catalog.sales.records.push(sale.clone());

        if link == CustomerLink::Linked {
            if let Some(customer) = catalog.customers.get_mut(&sale.customer_id) {
                customer.record_transaction(sale.id.clone(), now);
            }
        }

        let mut pets_sold = Vec::new();
        for pet_id in sale.pet_ids() {
            if let Some(pet) = catalog.pets.get_mut(pet_id) {
                pet.set_status(PetStatus::Sold, Some(sale.customer_id.clone()));
                pets_sold.push(pet_id.clone());
            }
        }

        Ok(SaleReceipt { sale, link, pets_sold })
    }

    pub async fn update_pet_status(
        &self,
        id: &RecordId,
        status: PetStatus,
        owner_id: Option<RecordId>,
    ) -> Option<Pet> {
        let mut catalog = self.state.write().await;
        let pet = catalog.pets.get_mut(id)?;
        pet.set_status(status, owner_id);
        Some(pet.clone())
    }

    pub async fn stats(&self) -> CatalogStats {
        let catalog = self.state.read().await;
        let count_status = |status: PetStatus| {
            catalog.pets.records.iter().filter(|pet| pet.status == status).count()
        };

        CatalogStats {
            total_pets: catalog.pets.len(),
            total_products: catalog.products.len(),
            total_customers: catalog.customers.len(),
            total_sales: catalog.sales.len(),
            total_services: catalog.services.len(),
            available_pets: count_status(PetStatus::Available),
            sold_pets: count_status(PetStatus::Sold),
        }
    }

    /// Product ids bought by a customer, in sale order, first occurrence kept.
    pub async fn purchase_history(&self, customer_id: &RecordId) -> Vec<RecordId> {
        let catalog = self.state.read().await;
        let mut seen = HashSet::new();
        catalog
            .sales
            .records
            .iter()
            .filter(|sale| &sale.customer_id == customer_id)
            .flat_map(Sale::product_ids)
            .filter(|id| seen.insert(*id))
            .cloned()
            .collect()
    }

    /// Keeps only ids present in the product collection, preserving order.
    pub async fn known_products(&self, ids: Vec<RecordId>) -> Vec<RecordId> {
        let catalog = self.state.read().await;
        ids.into_iter().filter(|id| catalog.products.get(id).is_some()).collect()
    }

    async fn append<T, F>(&self, build: F) -> Result<T, StoreError>
    where
        T: Record,
        F: FnOnce(RecordId, u64, DateTime<Utc>) -> T,
    {
        let mut catalog = self.state.write().await;
        let collection = T::collection_mut(&mut catalog);
        let (id, sequence) = collection.allocate()?;
        let record = build(id, sequence, Utc::now());
        collection.records.push(record.clone());
        Ok(record)
    }
}

impl Record for Pet {
    const KIND: EntityKind = EntityKind::Pet;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "type" => Some(&self.species),
            "status" => Some(self.status.as_str()),
            "breed" => self.breed.as_deref(),
            "owner_id" => self.owner_id.as_ref().map(RecordId::as_str),
            _ => None,
        }
    }

    fn collection(catalog: &Catalog) -> &Collection<Self> {
        &catalog.pets
    }

    fn collection_mut(catalog: &mut Catalog) -> &mut Collection<Self> {
        &mut catalog.pets
    }
}

impl Record for Product {
    const KIND: EntityKind = EntityKind::Product;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "category" => Some(&self.category),
            "brand" => self.brand.as_deref(),
            "sku" => Some(&self.sku),
            _ => None,
        }
    }

    fn collection(catalog: &Catalog) -> &Collection<Self> {
        &catalog.products
    }

    fn collection_mut(catalog: &mut Catalog) -> &mut Collection<Self> {
        &mut catalog.products
    }
}

impl Record for Customer {
    const KIND: EntityKind = EntityKind::Customer;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "email_address" => self.email_address.as_deref(),
            "last_name" => Some(&self.last_name),
            _ => None,
        }
    }

    fn collection(catalog: &Catalog) -> &Collection<Self> {
        &catalog.customers
    }

    fn collection_mut(catalog: &mut Catalog) -> &mut Collection<Self> {
        &mut catalog.customers
    }
}

impl Record for Service {
    const KIND: EntityKind = EntityKind::Service;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "type" => Some(&self.service_type),
            _ => None,
        }
    }

    fn collection(catalog: &Catalog) -> &Collection<Self> {
        &catalog.services
    }

    fn collection_mut(catalog: &mut Catalog) -> &mut Collection<Self> {
        &mut catalog.services
    }
}

impl Record for Sale {
    const KIND: EntityKind = EntityKind::Sale;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "customer_id" => Some(self.customer_id.as_str()),
            "payment_method" => Some(self.payment_method.as_str()),
            _ => None,
        }
    }

    fn collection(catalog: &Catalog) -> &Collection<Self> {
        &catalog.sales
    }

    fn collection_mut(catalog: &mut Catalog) -> &mut Collection<Self> {
        &mut catalog.sales
    }
}
