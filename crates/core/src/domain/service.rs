use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::RecordId;

pub const SERVICE_GROOMING: &str = "grooming";
pub const SERVICE_VET_CHECKUP: &str = "vet_checkup";
pub const SERVICE_TRAINING: &str = "training";
pub const SERVICE_BOARDING: &str = "boarding";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: RecordId,
    #[serde(rename = "type")]
    pub service_type: String,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub duration_minutes: u32,
    pub image_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewService {
    #[serde(rename = "type")]
    pub service_type: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub duration_minutes: u32,
    pub image_id: String,
}

impl NewService {
    pub fn into_service(self, id: RecordId) -> Service {
        Service {
            id,
            service_type: self.service_type,
            name: self.name,
            description: self.description,
            price: self.price,
            duration_minutes: self.duration_minutes,
            image_id: self.image_id,
        }
    }
}
