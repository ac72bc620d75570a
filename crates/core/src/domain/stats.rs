use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_pets: usize,
    pub total_products: usize,
    pub total_customers: usize,
    pub total_sales: usize,
    pub total_services: usize,
    pub available_pets: usize,
    pub sold_pets: usize,
}
