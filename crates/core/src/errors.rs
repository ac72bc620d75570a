use thiserror::Error;

use crate::domain::{ids::RecordId, sale::ItemKind};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("sale must contain at least one item")]
    EmptySale,
    #[error("sale item {index} has invalid quantity {quantity} (must be at least 1)")]
    InvalidQuantity { index: usize, quantity: u32 },
    #[error("sale item {index} has a negative price")]
    NegativePrice { index: usize },
    #[error("sale item {index} references unknown {kind} `{reference}`")]
    UnknownItemReference { index: usize, kind: ItemKind, reference: RecordId },
    #[error("pet `{0}` is not available for sale")]
    PetUnavailable(RecordId),
    #[error("pet `{0}` appears more than once in the sale")]
    DuplicatePet(RecordId),
    #[error("sale total exceeds the supported amount range")]
    TotalOverflow,
    #[error("customer `{0}` does not exist")]
    UnknownCustomer(RecordId),
    #[error("{0}")]
    InvalidContact(String),
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    /// Stable code for logs and API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptySale => "empty_sale",
            Self::InvalidQuantity { .. } => "invalid_quantity",
            Self::NegativePrice { .. } => "negative_price",
            Self::UnknownItemReference { .. } => "unknown_item_reference",
            Self::PetUnavailable(_) => "pet_unavailable",
            Self::DuplicatePet(_) => "duplicate_pet",
            Self::TotalOverflow => "total_overflow",
            Self::UnknownCustomer(_) => "unknown_customer",
            Self::InvalidContact(_) => "invalid_contact",
            Self::InvariantViolation(_) => "invariant_violation",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{ids::RecordId, sale::ItemKind};
    use crate::errors::DomainError;

    #[test]
    fn unknown_reference_message_names_kind_and_id() {
        let error = DomainError::UnknownItemReference {
            index: 1,
            kind: ItemKind::Product,
            reference: RecordId::from("product:099"),
        };

        assert_eq!(error.to_string(), "sale item 1 references unknown product `product:099`");
        assert_eq!(error.code(), "unknown_item_reference");
    }

    #[test]
    fn unknown_customer_has_stable_code() {
        let error = DomainError::UnknownCustomer(RecordId::from("customer:404"));
        assert_eq!(error.code(), "unknown_customer");
        assert!(error.to_string().contains("customer:404"));
    }
}
