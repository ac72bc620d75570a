//! Sale processing: line item validation, totals, and the customer link decision.
//!
//! The store performs the actual mutation under its write lock; this module only
//! decides whether a sale may be recorded and what it looks like.

use std::collections::HashSet;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ids::RecordId;
use crate::domain::sale::{ItemKind, NewSale, Sale, SaleItem};
use crate::errors::DomainError;

/// Read access the processor needs to validate references at write time.
pub trait CatalogLookup {
    fn item_exists(&self, kind: ItemKind, id: &RecordId) -> bool;
    fn pet_available(&self, id: &RecordId) -> bool;
    fn customer_exists(&self, id: &RecordId) -> bool;
}

/// What to do when a sale names a customer that does not exist.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownCustomerPolicy {
    /// Record the sale and skip the customer history update.
    #[default]
    RecordOrphan,
    /// Refuse the sale.
    Reject,
}

impl FromStr for UnknownCustomerPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "record_orphan" => Ok(Self::RecordOrphan),
            "reject" => Ok(Self::Reject),
            other => Err(format!(
                "unsupported unknown customer policy `{other}` (expected record_orphan|reject)"
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CustomerLink {
    Linked,
    Orphaned,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SaleProcessor {
    policy: UnknownCustomerPolicy,
}

impl SaleProcessor {
    pub fn new(policy: UnknownCustomerPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> UnknownCustomerPolicy {
        self.policy
    }

    pub fn validate(
        &self,
        draft: &NewSale,
        lookup: &impl CatalogLookup,
    ) -> Result<CustomerLink, DomainError> {
        validate_items(&draft.items, lookup)?;

        if lookup.customer_exists(&draft.customer_id) {
            return Ok(CustomerLink::Linked);
        }

        match self.policy {
            UnknownCustomerPolicy::RecordOrphan => Ok(CustomerLink::Orphaned),
            UnknownCustomerPolicy::Reject => {
                Err(DomainError::UnknownCustomer(draft.customer_id.clone()))
            }
        }
    }

    pub fn finalize(
        &self,
        draft: NewSale,
        id: RecordId,
        timestamp: DateTime<Utc>,
    ) -> Result<Sale, DomainError> {
        let total = sale_total(&draft.items).ok_or(DomainError::TotalOverflow)?;
        Ok(Sale {
            id,
            customer_id: draft.customer_id,
            items: draft.items,
            total,
            tax: draft.tax,
            payment_method: draft.payment_method,
            timestamp,
        })
    }
}

/// Sum of the line totals, `None` on decimal overflow.
pub fn sale_total(items: &[SaleItem]) -> Option<Decimal> {
    items
        .iter()
        .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.line_total()?))
}

fn validate_items(items: &[SaleItem], lookup: &impl CatalogLookup) -> Result<(), DomainError> {
    if items.is_empty() {
        return Err(DomainError::EmptySale);
    }

    let mut pets_seen = HashSet::new();
    for (index, item) in items.iter().enumerate() {
        if item.quantity == 0 {
            return Err(DomainError::InvalidQuantity { index, quantity: item.quantity });
        }
        if item.price < Decimal::ZERO {
            return Err(DomainError::NegativePrice { index });
        }
        if !lookup.item_exists(item.kind, &item.reference) {
            return Err(DomainError::UnknownItemReference {
                index,
                kind: item.kind,
                reference: item.reference.clone(),
            });
        }
        if item.kind == ItemKind::Pet {
            if !pets_seen.insert(&item.reference) || item.quantity > 1 {
                return Err(DomainError::DuplicatePet(item.reference.clone()));
            }
            if !lookup.pet_available(&item.reference) {
                return Err(DomainError::PetUnavailable(item.reference.clone()));
            }
        }
    }

    sale_total(items).ok_or(DomainError::TotalOverflow)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::{sale_total, CatalogLookup, CustomerLink, SaleProcessor, UnknownCustomerPolicy};
    use crate::domain::ids::RecordId;
    use crate::domain::sale::{ItemKind, NewSale, PaymentMethod, SaleItem};
    use crate::errors::DomainError;

    struct StubCatalog;

    impl CatalogLookup for StubCatalog {
        fn item_exists(&self, kind: ItemKind, id: &RecordId) -> bool {
            match kind {
                ItemKind::Product => id.as_str().starts_with("product:00"),
                ItemKind::Pet => matches!(id.as_str(), "pet:001" | "pet:002"),
            }
        }

        fn pet_available(&self, id: &RecordId) -> bool {
            id.as_str() == "pet:002"
        }

        fn customer_exists(&self, id: &RecordId) -> bool {
            id.as_str() == "customer:001"
        }
    }

    fn item(reference: &str, kind: ItemKind, cents: i64, quantity: u32) -> SaleItem {
        SaleItem {
            reference: RecordId::from(reference),
            kind,
            price: Decimal::new(cents, 2),
            quantity,
        }
    }

    fn draft(customer: &str, items: Vec<SaleItem>) -> NewSale {
        NewSale {
            customer_id: RecordId::from(customer),
            items,
            tax: None,
            payment_method: PaymentMethod::Card,
        }
    }

    #[test]
    fn total_is_sum_of_price_times_quantity() {
        let items = vec![
            item("pet:002", ItemKind::Pet, 80_000, 1),
            item("product:001", ItemKind::Product, 4_599, 2),
        ];
        assert_eq!(sale_total(&items), Some(Decimal::new(89_198, 2)));
    }

    #[test]
    fn known_customer_links_the_sale() {
        let processor = SaleProcessor::default();
        let link = processor
            .validate(
                &draft("customer:001", vec![item("product:003", ItemKind::Product, 2_550, 1)]),
                &StubCatalog,
            )
            .expect("valid sale");
        assert_eq!(link, CustomerLink::Linked);
    }

    #[test]
    fn unknown_customer_follows_policy() {
        let sale = draft("customer:999", vec![item("product:001", ItemKind::Product, 999, 3)]);

        let orphan = SaleProcessor::new(UnknownCustomerPolicy::RecordOrphan)
            .validate(&sale, &StubCatalog)
            .expect("orphan sales are allowed by default");
        assert_eq!(orphan, CustomerLink::Orphaned);

        let rejected = SaleProcessor::new(UnknownCustomerPolicy::Reject)
            .validate(&sale, &StubCatalog)
            .expect_err("reject policy refuses unknown customers");
        assert_eq!(rejected, DomainError::UnknownCustomer(RecordId::from("customer:999")));
    }

    #[test]
    fn item_reference_is_checked_against_its_own_collection() {
        let processor = SaleProcessor::default();
        let error = processor
            .validate(
                &draft("customer:001", vec![item("pet:002", ItemKind::Product, 100, 1)]),
                &StubCatalog,
            )
            .expect_err("pet id under product type must fail");

        assert!(matches!(
            error,
            DomainError::UnknownItemReference { index: 0, kind: ItemKind::Product, .. }
        ));
    }

    #[test]
    fn rejects_empty_zero_quantity_and_negative_price() {
        let processor = SaleProcessor::default();

        assert_eq!(
            processor.validate(&draft("customer:001", vec![]), &StubCatalog),
            Err(DomainError::EmptySale)
        );
        assert_eq!(
            processor.validate(
                &draft("customer:001", vec![item("product:001", ItemKind::Product, 100, 0)]),
                &StubCatalog
            ),
            Err(DomainError::InvalidQuantity { index: 0, quantity: 0 })
        );
        assert_eq!(
            processor.validate(
                &draft("customer:001", vec![item("product:001", ItemKind::Product, -100, 1)]),
                &StubCatalog
            ),
            Err(DomainError::NegativePrice { index: 0 })
        );
    }

    #[test]
    fn sold_or_repeated_pets_are_refused() {
        let processor = SaleProcessor::default();

        assert_eq!(
            processor.validate(
                &draft("customer:001", vec![item("pet:001", ItemKind::Pet, 100, 1)]),
                &StubCatalog
            ),
            Err(DomainError::PetUnavailable(RecordId::from("pet:001")))
        );
        assert_eq!(
            processor.validate(
                &draft(
                    "customer:001",
                    vec![
                        item("pet:002", ItemKind::Pet, 100, 1),
                        item("pet:002", ItemKind::Pet, 100, 1)
                    ]
                ),
                &StubCatalog
            ),
            Err(DomainError::DuplicatePet(RecordId::from("pet:002")))
        );
    }

    #[test]
    fn total_outside_decimal_range_is_rejected() {
        let processor = SaleProcessor::default();
        let mut huge = item("product:001", ItemKind::Product, 0, 2);
        huge.price = Decimal::MAX;

        assert_eq!(
            processor.validate(&draft("customer:001", vec![huge]), &StubCatalog),
            Err(DomainError::TotalOverflow)
        );

        let mut half = item("product:001", ItemKind::Product, 0, 1);
        half.price = Decimal::MAX;
        let pair = vec![half.clone(), half];
        assert_eq!(sale_total(&pair), None);
        assert_eq!(
            processor.validate(&draft("customer:001", pair), &StubCatalog),
            Err(DomainError::TotalOverflow)
        );
    }

    #[test]
    fn finalize_computes_total_and_keeps_tax_separate() {
        let mut sale = draft("customer:001", vec![item("product:004", ItemKind::Product, 12_000, 1)]);
        sale.tax = Some(Decimal::new(960, 2));

        let finalized = SaleProcessor::default()
            .finalize(sale, RecordId::from("sale:003"), Utc::now())
            .expect("total fits");

        assert_eq!(finalized.total, Decimal::new(12_000, 2));
        assert_eq!(finalized.tax, Some(Decimal::new(960, 2)));
        assert_eq!(finalized.id.as_str(), "sale:003");
    }
}
