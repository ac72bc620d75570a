use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::{EntityKind, RecordId};

/// Which collection a sale line item points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Product,
    Pet,
}

impl ItemKind {
    pub fn entity_kind(self) -> EntityKind {
        match self {
            Self::Product => EntityKind::Product,
            Self::Pet => EntityKind::Pet,
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.entity_kind().prefix())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Cash,
    Online,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Cash => "cash",
            Self::Online => "online",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    #[serde(rename = "ref")]
    pub reference: RecordId,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub price: Decimal,
    pub quantity: u32,
}

impl SaleItem {
    /// `price * quantity`, or `None` when the product leaves the decimal range.
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: RecordId,
    pub customer_id: RecordId,
    pub items: Vec<SaleItem>,
    pub total: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax: Option<Decimal>,
    pub payment_method: PaymentMethod,
    pub timestamp: DateTime<Utc>,
}

impl Sale {
    pub fn pet_ids(&self) -> impl Iterator<Item = &RecordId> {
        self.items.iter().filter(|item| item.kind == ItemKind::Pet).map(|item| &item.reference)
    }

    pub fn product_ids(&self) -> impl Iterator<Item = &RecordId> {
        self.items.iter().filter(|item| item.kind == ItemKind::Product).map(|item| &item.reference)
    }
}

/// Sale payload accepted on creation. Any client-supplied total is ignored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub customer_id: RecordId,
    pub items: Vec<SaleItem>,
    #[serde(default)]
    pub tax: Option<Decimal>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}
