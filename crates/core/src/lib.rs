//! Pet store domain: catalog records, identifiers, sale processing and configuration.
//!
//! Nothing in this crate performs I/O. The in-memory store lives in `petstore-db`
//! and the HTTP facade in `petstore-server`.

pub mod config;
pub mod domain;
pub mod errors;
pub mod sales;

pub use domain::customer::{Customer, NewCustomer};
pub use domain::ids::{EntityKind, RecordId};
pub use domain::pet::{Gender, NewPet, Pet, PetStatus};
pub use domain::product::{NewProduct, Product};
pub use domain::sale::{ItemKind, NewSale, PaymentMethod, Sale, SaleItem};
pub use domain::service::{NewService, Service};
pub use domain::stats::CatalogStats;
pub use errors::DomainError;
pub use sales::{CatalogLookup, CustomerLink, SaleProcessor, UnknownCustomerPolicy};
