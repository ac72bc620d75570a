use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::RecordId;

pub const CATEGORY_FOOD: &str = "food";
pub const CATEGORY_TOY: &str = "toy";
pub const CATEGORY_ACCESSORY: &str = "accessory";
pub const CATEGORY_HEALTH: &str = "health";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: RecordId,
    pub name: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Decimal>,
    pub sku: String,
    pub in_stock: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub brand: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub cost: Option<Decimal>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub in_stock: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_id: String,
}

impl NewProduct {
    /// Builds the product, generating a SKU from `sequence` when none was supplied.
    pub fn into_product(self, id: RecordId, sequence: u64) -> Product {
        let sku = match self.sku.filter(|sku| !sku.trim().is_empty()) {
            Some(sku) => sku,
            None => generate_sku(self.brand.as_deref(), &self.category, sequence),
        };

        Product {
            id,
            name: self.name,
            category: self.category,
            brand: self.brand,
            price: self.price,
            cost: self.cost,
            sku,
            in_stock: self.in_stock,
            tags: self.tags,
            image_id: self.image_id,
        }
    }
}

/// First four characters of the brand (or category when the brand is blank),
/// uppercased, followed by the 4-digit product sequence.
pub fn generate_sku(brand: Option<&str>, category: &str, sequence: u64) -> String {
    let source =
        brand.map(str::trim).filter(|brand| !brand.is_empty()).unwrap_or(category.trim());
    let prefix: String = source.chars().take(4).collect::<String>().to_uppercase();
    format!("{prefix}-{sequence:04}")
}
