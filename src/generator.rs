//! Single-record generation for customers and orders.

use chrono::NaiveDate;
use rand::Rng;
use thiserror::Error;

use crate::config::DEFAULT_COUPON_PROBABILITY;
use crate::fake::{email_for_tax_id, round_cents, FakeData};
use crate::model::{Customer, Order, COUNTRY};

const MIN_AGE: u32 = 18;
const MAX_AGE: u32 = 90;
/// Registration and order dates fall within this many years before the reference date
const HISTORY_YEARS: u32 = 2;

/// Why a single record could not be built
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerateError {
    #[error("cannot go back {years} years from {date}")]
    DateOutOfRange { date: NaiveDate, years: u32 },
    #[error("no customer tax ids to reference")]
    NoCustomers,
}

/// Builds one candidate record at a time.
///
/// Holds only the settings shared by every record; randomness is passed in
/// on each call.
#[derive(Debug, Clone)]
pub struct RecordGenerator {
    reference_date: NaiveDate,
    coupon_probability: f64,
}

impl RecordGenerator {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self {
            reference_date,
            coupon_probability: DEFAULT_COUPON_PROBABILITY,
        }
    }

    pub fn with_coupon_probability(mut self, probability: f64) -> Self {
        self.coupon_probability = probability;
        self
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    pub fn customer<R: Rng>(&self, rng: &mut R) -> Result<Customer, GenerateError> {
        let mut fake = FakeData::new(rng);
        let id = fake.uuid();
        let name = fake.full_name();
        let birth_date = fake.date_of_birth(self.reference_date, MIN_AGE, MAX_AGE)?;
        let tax_id = fake.tax_id();
        let postal_code = fake.postal_code();
        let city = fake.city();
        let state = fake.state();
        let gender = fake.gender();
        let phone = fake.phone();
        let registration_date = fake.recent_date(self.reference_date, HISTORY_YEARS)?;
        let email = email_for_tax_id(&tax_id);

        Ok(Customer {
            id,
            name,
            birth_date,
            tax_id,
            postal_code,
            city,
            state,
            country: COUNTRY.to_string(),
            gender,
            phone,
            email,
            registration_date,
        })
    }

    /// Build an order referencing one of `tax_ids`, chosen uniformly
    pub fn order<R: Rng>(&self, rng: &mut R, tax_ids: &[String]) -> Result<Order, GenerateError> {
        if tax_ids.is_empty() {
            return Err(GenerateError::NoCustomers);
        }
        let mut fake = FakeData::new(rng);
        let tax_id = fake.pick(tax_ids).clone();

        let order_value = fake.price(50.0, 2000.0);
        let (discount_value, coupon) = if fake.bool_with_probability(self.coupon_probability) {
            let discount = round_cents(order_value * fake.fraction(0.05, 0.2)).max(0.01);
            (discount, Some(fake.coupon()))
        } else {
            (0.0, None)
        };

        Ok(Order {
            id: fake.uuid(),
            tax_id,
            order_value,
            freight_value: fake.price(5.0, 100.0),
            discount_value,
            coupon,
            delivery_street: fake.street(),
            delivery_number: fake.building_number(),
            delivery_neighborhood: fake.neighborhood().to_string(),
            delivery_city: fake.city(),
            delivery_state: fake.state(),
            delivery_country: COUNTRY.to_string(),
            status: fake.order_status(),
            order_date: fake.recent_date(self.reference_date, HISTORY_YEARS)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::is_valid_tax_id;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn generator() -> RecordGenerator {
        RecordGenerator::new(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap())
    }

    #[test]
    fn test_customer_fields() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let customer = generator().customer(&mut rng).unwrap();
        assert_eq!(customer.country, "Brazil");
        assert!(is_valid_tax_id(&customer.tax_id));
        assert_eq!(customer.email, email_for_tax_id(&customer.tax_id));
        assert_eq!(customer.state.len(), 2);
        assert!(!customer.name.is_empty());
        assert!(customer.registration_date <= generator().reference_date());
    }

    #[test]
    fn test_order_references_known_tax_id() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let tax_ids = vec!["111.444.777-35".to_string(), "529.982.247-25".to_string()];
        for _ in 0..50 {
            let order = generator().order(&mut rng, &tax_ids).unwrap();
            assert!(tax_ids.contains(&order.tax_id));
        }
    }

    #[test]
    fn test_order_without_customers_fails() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert_eq!(
            generator().order(&mut rng, &[]).unwrap_err(),
            GenerateError::NoCustomers
        );
    }

    #[test]
    fn test_discount_follows_coupon() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let tax_ids = vec!["529.982.247-25".to_string()];
        let gen = generator();
        let mut with_coupon = 0;
        for _ in 0..500 {
            let order = gen.order(&mut rng, &tax_ids).unwrap();
            match order.coupon {
                Some(_) => {
                    with_coupon += 1;
                    assert!(order.discount_value > 0.0);
                    assert!(order.discount_value < order.order_value);
                }
                None => assert_eq!(order.discount_value, 0.0),
            }
            assert!((50.0..=2000.0).contains(&order.order_value));
            assert!((5.0..=100.0).contains(&order.freight_value));
        }
        assert!(with_coupon > 0);
    }

    #[test]
    fn test_zero_coupon_probability() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let tax_ids = vec!["529.982.247-25".to_string()];
        let gen = generator().with_coupon_probability(0.0);
        for _ in 0..100 {
            assert!(gen.order(&mut rng, &tax_ids).unwrap().coupon.is_none());
        }
    }

    #[test]
    fn test_same_seed_same_records() {
        let gen = generator();
        let mut a = ChaCha8Rng::seed_from_u64(11);
        let mut b = ChaCha8Rng::seed_from_u64(11);
        assert_eq!(gen.customer(&mut a).unwrap(), gen.customer(&mut b).unwrap());
    }
}
