use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::RecordId;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PetStatus {
    #[default]
    Available,
    Sold,
    InCare,
}

impl PetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Sold => "sold",
            Self::InCare => "in-care",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub species: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_months: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    pub status: PetStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<RecordId>,
    pub image_id: String,
}

impl Pet {
    pub fn is_available(&self) -> bool {
        self.status == PetStatus::Available
    }

    /// Moves the pet to `status`. The owner is only replaced when one is given.
    pub fn set_status(&mut self, status: PetStatus, owner_id: Option<RecordId>) {
        self.status = status;
        if let Some(owner_id) = owner_id {
            self.owner_id = Some(owner_id);
        }
    }
}

/// Pet payload accepted on creation; the id is assigned by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewPet {
    #[serde(rename = "type")]
    pub species: String,
    #[serde(default)]
    pub breed: Option<String>,
    pub name: String,
    #[serde(default)]
    pub age_months: Option<u32>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub status: PetStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub owner_id: Option<RecordId>,
    pub image_id: String,
}

impl NewPet {
    pub fn into_pet(self, id: RecordId, created_at: DateTime<Utc>) -> Pet {
        Pet {
            id,
            species: self.species,
            breed: self.breed,
            name: self.name,
            age_months: self.age_months,
            gender: self.gender,
            price: self.price,
            status: self.status,
            tags: self.tags,
            created_at: Some(created_at),
            owner_id: self.owner_id,
            image_id: self.image_id,
        }
    }
}
