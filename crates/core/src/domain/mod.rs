pub mod customer;
pub mod ids;
pub mod pet;
pub mod product;
pub mod sale;
pub mod service;
pub mod stats;
