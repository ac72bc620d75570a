use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::RecordId;
use crate::errors::DomainError;

const MIN_PHONE_DIGITS: usize = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default)]
    pub transaction_ids: Vec<RecordId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn record_transaction(&mut self, sale_id: RecordId, at: DateTime<Utc>) {
        self.transaction_ids.push(sale_id);
        self.updated_at = at;
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
}

impl NewCustomer {
    /// Phone numbers need at least ten digits once punctuation is stripped;
    /// email addresses need a local part and a dotted domain.
    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(phone) = &self.phone_number {
            let digits = phone.chars().filter(char::is_ascii_digit).count();
            if digits < MIN_PHONE_DIGITS {
                return Err(DomainError::InvalidContact(format!(
                    "phone_number must have at least {MIN_PHONE_DIGITS} digits"
                )));
            }
        }
        if let Some(email) = &self.email_address {
            if !is_email_address(email) {
                return Err(DomainError::InvalidContact(format!(
                    "email_address `{email}` is not a valid email address"
                )));
            }
        }
        Ok(())
    }

    pub fn into_customer(self, id: RecordId, now: DateTime<Utc>) -> Customer {
        Customer {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            phone_number: self.phone_number,
            email_address: self.email_address,
            transaction_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

fn is_email_address(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    let labels_ok = domain.split('.').all(|label| !label.is_empty());
    !local.is_empty()
        && domain.contains('.')
        && labels_ok
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
}
