//! Seed records loaded into the catalog at startup.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use petstore_core::sales::sale_total;
use petstore_core::{
    Customer, EntityKind, Gender, ItemKind, PaymentMethod, Pet, PetStatus, Product, RecordId,
    Sale, SaleItem, Service,
};

#[derive(Clone, Debug, Default)]
pub struct SeedDataset {
    pub pets: Vec<Pet>,
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    pub services: Vec<Service>,
    pub sales: Vec<Sale>,
}

impl SeedDataset {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Small shop: five pets (two already sold), five products, two customers
    /// each with one purchase, and the four standard services.
    pub fn sample() -> Self {
        let now = Utc::now();
        Self {
            pets: sample_pets(now),
            products: sample_products(),
            customers: sample_customers(now),
            services: sample_services(),
            sales: sample_sales(now),
        }
    }
}

fn id(kind: EntityKind, sequence: u64) -> RecordId {
    RecordId::new(kind, sequence)
}

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

struct PetSeed {
    name: &'static str,
    species: &'static str,
    breed: &'static str,
    age_months: u32,
    gender: Gender,
    price_cents: i64,
    image_id: &'static str,
    owner: Option<u64>,
}

fn sample_pets(now: DateTime<Utc>) -> Vec<Pet> {
    let seeds = [
        PetSeed {
            name: "Buddy",
            species: "dog",
            breed: "Golden Retriever",
            age_months: 5,
            gender: Gender::Male,
            price_cents: 80_000,
            image_id: "golden-retriever",
            owner: Some(1),
        },
        PetSeed {
            name: "Whiskers",
            species: "cat",
            breed: "Siamese",
            age_months: 12,
            gender: Gender::Female,
            price_cents: 30_000,
            image_id: "siamese-cat",
            owner: None,
        },
        PetSeed {
            name: "Sunny",
            species: "bird",
            breed: "Sun Conure",
            age_months: 24,
            gender: Gender::Male,
            price_cents: 45_000,
            image_id: "parrot",
            owner: None,
        },
        PetSeed {
            name: "Roscoe",
            species: "dog",
            breed: "Labrador",
            age_months: 6,
            gender: Gender::Male,
            price_cents: 75_000,
            image_id: "labrador",
            owner: None,
        },
        PetSeed {
            name: "Mittens",
            species: "cat",
            breed: "Persian",
            age_months: 36,
            gender: Gender::Female,
            price_cents: 50_000,
            image_id: "persian-cat",
            owner: Some(2),
        },
    ];

    seeds
        .into_iter()
        .zip(1..)
        .map(|(seed, sequence)| Pet {
            id: id(EntityKind::Pet, sequence),
            species: seed.species.to_string(),
            breed: Some(seed.breed.to_string()),
            name: seed.name.to_string(),
            age_months: Some(seed.age_months),
            gender: Some(seed.gender),
            price: Some(money(seed.price_cents)),
            status: if seed.owner.is_some() { PetStatus::Sold } else { PetStatus::Available },
            tags: vec![seed.species.to_string(), seed.breed.to_string()],
            created_at: Some(now),
            owner_id: seed.owner.map(|owner| id(EntityKind::Customer, owner)),
            image_id: seed.image_id.to_string(),
        })
        .collect()
}

fn sample_products() -> Vec<Product> {
    let rows: [(&str, &str, &str, i64, u32, &str, &str); 5] = [
        ("Premium Dog Food", "food", "Royal Canin", 4_599, 50, "dog-food", "DF-PREM-20"),
        ("Laser Pointer", "toy", "PetSafe", 999, 100, "cat-toy", "PETS-0002"),
        ("Leather Leash", "accessory", "Gentle Leader", 2_550, 75, "dog-leash", "DL-LTHR-01"),
        ("Cat Tree", "accessory", "Go Pet Club", 12_000, 20, "cat-tree", "CT-DLX-05"),
        ("Fish Oil Supplement", "health", "Nordic Naturals", 1_999, 60, "dog-food", "NORD-0005"),
    ];

    rows.into_iter()
        .zip(1..)
        .map(|((name, category, brand, cents, in_stock, image_id, sku), sequence)| Product {
            id: id(EntityKind::Product, sequence),
            name: name.to_string(),
            category: category.to_string(),
            brand: Some(brand.to_string()),
            price: money(cents),
            cost: None,
            sku: sku.to_string(),
            in_stock,
            tags: vec![category.to_string(), brand.to_string()],
            image_id: image_id.to_string(),
        })
        .collect()
}

fn sample_customers(now: DateTime<Utc>) -> Vec<Customer> {
    let rows = [
        ("John", "Smith", "+1-555-123-4567", "john.smith@email.com"),
        ("Sarah", "Johnson", "+1-555-987-6543", "sarah.j@email.com"),
    ];

    rows.into_iter()
        .zip(1..)
        .map(|((first_name, last_name, phone, email), sequence)| Customer {
            id: id(EntityKind::Customer, sequence),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            phone_number: Some(phone.to_string()),
            email_address: Some(email.to_string()),
            transaction_ids: vec![id(EntityKind::Sale, sequence)],
            created_at: now,
            updated_at: now,
        })
        .collect()
}

fn sample_services() -> Vec<Service> {
    let rows = [
        (
            "grooming",
            "Full Groom Package",
            "Includes bath, haircut, nail trim, and ear cleaning.",
            7_500,
            120,
            "grooming",
        ),
        (
            "vet_checkup",
            "Annual Wellness Exam",
            "Comprehensive health check-up with our certified veterinarian.",
            15_000,
            45,
            "vet-checkup",
        ),
        (
            "training",
            "Puppy Obedience Class",
            "6-week course covering basic commands and socialization.",
            25_000,
            60,
            "training",
        ),
        (
            "boarding",
            "Luxury Pet Boarding",
            "Overnight stay in a comfortable, safe environment. Price per night.",
            5_000,
            1_440,
            "boarding",
        ),
    ];

    rows.into_iter()
        .zip(1..)
        .map(|((service_type, name, description, cents, duration_minutes, image_id), sequence)| {
            Service {
                id: id(EntityKind::Service, sequence),
                service_type: service_type.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                price: money(cents),
                duration_minutes,
                image_id: image_id.to_string(),
            }
        })
        .collect()
}

fn sample_sales(now: DateTime<Utc>) -> Vec<Sale> {
    let line = |reference: RecordId, kind: ItemKind, cents: i64, quantity: u32| SaleItem {
        reference,
        kind,
        price: money(cents),
        quantity,
    };

    let baskets = [
        vec![
            line(id(EntityKind::Pet, 1), ItemKind::Pet, 80_000, 1),
            line(id(EntityKind::Product, 1), ItemKind::Product, 4_599, 2),
        ],
        vec![
            line(id(EntityKind::Product, 4), ItemKind::Product, 12_000, 1),
            line(id(EntityKind::Product, 2), ItemKind::Product, 999, 3),
        ],
    ];

    baskets
        .into_iter()
        .zip(1..)
        .map(|(items, sequence)| Sale {
            id: id(EntityKind::Sale, sequence),
            customer_id: id(EntityKind::Customer, sequence),
            total: sale_total(&items).unwrap_or_default(),
            items,
            tax: None,
            payment_method: PaymentMethod::Card,
            timestamp: now,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::SeedDataset;

    #[test]
    fn sample_sale_totals_match_their_items() {
        let seed = SeedDataset::sample();
        let totals: Vec<_> = seed.sales.iter().map(|sale| sale.total).collect();

        assert_eq!(totals, vec![Decimal::new(89_198, 2), Decimal::new(14_997, 2)]);
    }

    #[test]
    fn sold_pets_belong_to_the_customer_who_bought_them() {
        let seed = SeedDataset::sample();

        for sale in &seed.sales {
            for pet_id in sale.pet_ids() {
                let pet = seed.pets.iter().find(|pet| &pet.id == pet_id).expect("seeded pet");
                assert!(!pet.is_available());
                assert_eq!(pet.owner_id.as_ref(), Some(&sale.customer_id));
            }
        }
        assert_eq!(seed.pets.iter().filter(|pet| pet.is_available()).count(), 3);
    }

    #[test]
    fn customer_histories_point_at_existing_sales() {
        let seed = SeedDataset::sample();

        for customer in &seed.customers {
            for sale_id in &customer.transaction_ids {
                let sale = seed.sales.iter().find(|sale| &sale.id == sale_id).expect("sale");
                assert_eq!(sale.customer_id, customer.id);
            }
        }
    }
}
