use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Record kinds held by the catalog. Each kind owns its own id sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Pet,
    Product,
    Customer,
    Service,
    Sale,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] =
        [Self::Pet, Self::Product, Self::Customer, Self::Service, Self::Sale];

    pub fn prefix(self) -> &'static str {
        match self {
            Self::Pet => "pet",
            Self::Product => "product",
            Self::Customer => "customer",
            Self::Service => "service",
            Self::Sale => "sale",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// `{prefix}:{sequence}` identifier, sequence zero-padded to three digits.
/// Ids order by prefix, then by numeric sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(kind: EntityKind, sequence: u64) -> Self {
        Self(format!("{}:{sequence:03}", kind.prefix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric sequence of this id if it belongs to `kind`.
    pub fn sequence_for(&self, kind: EntityKind) -> Option<u64> {
        let digits = self.0.strip_prefix(kind.prefix())?.strip_prefix(':')?;
        if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    fn sort_key(&self) -> (&str, Option<u64>, &str) {
        let raw = self.0.as_str();
        match raw.split_once(':') {
            Some((prefix, digits)) if digits.bytes().all(|byte| byte.is_ascii_digit()) => {
                (prefix, digits.parse().ok(), raw)
            }
            Some((prefix, _)) => (prefix, None, raw),
            None => (raw, None, raw),
        }
    }
}

impl Ord for RecordId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for RecordId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{EntityKind, RecordId};

    #[test]
    fn pads_sequence_to_three_digits() {
        assert_eq!(RecordId::new(EntityKind::Pet, 6).as_str(), "pet:006");
        assert_eq!(RecordId::new(EntityKind::Sale, 42).as_str(), "sale:042");
        assert_eq!(RecordId::new(EntityKind::Product, 1234).as_str(), "product:1234");
    }

    #[test]
    fn sequence_is_only_read_for_matching_kind() {
        let id = RecordId::from("customer:012");

        assert_eq!(id.sequence_for(EntityKind::Customer), Some(12));
        assert_eq!(id.sequence_for(EntityKind::Pet), None);
        assert_eq!(RecordId::from("customer:").sequence_for(EntityKind::Customer), None);
        assert_eq!(RecordId::from("customer:1a").sequence_for(EntityKind::Customer), None);
    }

    #[test]
    fn ids_order_by_numeric_sequence() {
        let mut ids = vec![
            RecordId::from("pet:1000"),
            RecordId::from("pet:999"),
            RecordId::from("customer:002"),
            RecordId::from("pet:006"),
        ];
        ids.sort();

        let ordered: Vec<_> = ids.iter().map(RecordId::as_str).collect();
        assert_eq!(ordered, vec!["customer:002", "pet:006", "pet:999", "pet:1000"]);
        assert!(RecordId::new(EntityKind::Sale, 1000) > RecordId::new(EntityKind::Sale, 999));
    }
}
