//! Fake data helpers for pt-BR customer and order fields.
//!
//! Every helper draws from the caller's random source, so the same seed
//! always yields the same values.

use chrono::{Duration, Months, NaiveDate};
use fake::faker::address::raw::{BuildingNumber, CityName, PostCode, StateAbbr, StreetName};
use fake::faker::name::raw::Name;
use fake::faker::phone_number::raw::CellNumber;
use fake::locales::PT_BR;
use fake::Fake;
use rand::Rng;
use uuid::{Builder, Uuid};

use crate::generator::GenerateError;
use crate::model::{Gender, OrderStatus, COUPON_PREFIX, EMAIL_DOMAIN};

/// Neighborhood names for delivery addresses
const NEIGHBORHOODS: &[&str] = &[
    "Centro",
    "Jardim América",
    "Vila Mariana",
    "Boa Vista",
    "Santa Cecília",
    "Copacabana",
    "Savassi",
    "Moinhos de Vento",
    "Batel",
    "Pituba",
    "Aldeota",
    "Boa Viagem",
    "Asa Sul",
    "Jardim Botânico",
    "Liberdade",
    "Tatuapé",
    "Lourdes",
    "Trindade",
    "Cidade Nova",
    "São José",
];

const COUPON_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Fake data generator borrowing the caller's RNG
pub struct FakeData<'r, R: Rng> {
    rng: &'r mut R,
}

impl<'r, R: Rng> FakeData<'r, R> {
    pub fn new(rng: &'r mut R) -> Self {
        Self { rng }
    }

    /// Generate a full name
    pub fn full_name(&mut self) -> String {
        Name(PT_BR).fake_with_rng(&mut *self.rng)
    }

    pub fn city(&mut self) -> String {
        CityName(PT_BR).fake_with_rng(&mut *self.rng)
    }

    pub fn street(&mut self) -> String {
        StreetName(PT_BR).fake_with_rng(&mut *self.rng)
    }

    pub fn building_number(&mut self) -> String {
        BuildingNumber(PT_BR).fake_with_rng(&mut *self.rng)
    }

    pub fn neighborhood(&mut self) -> &'static str {
        *self.pick(NEIGHBORHOODS)
    }

    /// Federative unit abbreviation
    pub fn state(&mut self) -> String {
        StateAbbr(PT_BR).fake_with_rng(&mut *self.rng)
    }

    pub fn gender(&mut self) -> Gender {
        if self.rng.random_bool(0.5) {
            Gender::Male
        } else {
            Gender::Female
        }
    }

    pub fn order_status(&mut self) -> OrderStatus {
        *self.pick(&OrderStatus::ALL)
    }

    /// Version-4 UUID built from the seeded source
    pub fn uuid(&mut self) -> Uuid {
        Builder::from_random_bytes(self.rng.random()).into_uuid()
    }

    /// Tax id (CPF) formatted `###.###.###-##` with valid check digits
    pub fn tax_id(&mut self) -> String {
        let mut digits = [0_u8; 11];
        for digit in digits.iter_mut().take(9) {
            *digit = self.rng.random_range(0..=9);
        }
        digits[9] = cpf_check_digit(&digits[..9]);
        digits[10] = cpf_check_digit(&digits[..10]);

        let d: Vec<char> = digits.iter().map(|d| char::from(b'0' + d)).collect();
        format!(
            "{}{}{}.{}{}{}.{}{}{}-{}{}",
            d[0], d[1], d[2], d[3], d[4], d[5], d[6], d[7], d[8], d[9], d[10]
        )
    }

    /// Postal code (CEP) formatted `#####-###`
    pub fn postal_code(&mut self) -> String {
        PostCode(PT_BR).fake_with_rng(&mut *self.rng)
    }

    /// Mobile number formatted `(##) 9####-####`
    pub fn phone(&mut self) -> String {
        CellNumber(PT_BR).fake_with_rng(&mut *self.rng)
    }

    /// Coupon code: fixed prefix plus 8 uppercase alphanumerics
    pub fn coupon(&mut self) -> String {
        let code: String = (0..8)
            .map(|_| COUPON_CHARSET[self.rng.random_range(0..COUPON_CHARSET.len())] as char)
            .collect();
        format!("{}{}", COUPON_PREFIX, code)
    }

    /// Generate a price rounded to cents
    pub fn price(&mut self, min: f64, max: f64) -> f64 {
        round_cents(self.rng.random_range(min..max))
    }

    /// Generate a fraction in `[min, max)`
    pub fn fraction(&mut self, min: f64, max: f64) -> f64 {
        self.rng.random_range(min..max)
    }

    /// Generate a boolean with given probability of true
    pub fn bool_with_probability(&mut self, probability: f64) -> bool {
        self.rng.random::<f64>() < probability
    }

    /// Uniform day in `[start, end]`
    pub fn date_between(&mut self, start: NaiveDate, end: NaiveDate) -> NaiveDate {
        let span = (end - start).num_days().max(0);
        start + Duration::days(self.rng.random_range(0..=span))
    }

    /// Birth date for someone aged `min_age..=max_age` on `today`
    pub fn date_of_birth(
        &mut self,
        today: NaiveDate,
        min_age: u32,
        max_age: u32,
    ) -> Result<NaiveDate, GenerateError> {
        let latest = years_before(today, min_age)?;
        // one day after the (max_age + 1)th birthday keeps the age at max_age
        let earliest = years_before(today, max_age + 1)? + Duration::days(1);
        Ok(self.date_between(earliest, latest))
    }

    /// Day within the `years` preceding `today`, `today` included
    pub fn recent_date(&mut self, today: NaiveDate, years: u32) -> Result<NaiveDate, GenerateError> {
        let start = years_before(today, years)?;
        Ok(self.date_between(start, today))
    }

    /// Pick a random element from a slice
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.rng.random_range(0..items.len())]
    }
}

/// Email derived from the tax id digits
pub fn email_for_tax_id(tax_id: &str) -> String {
    let digits: String = tax_id.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("{}@{}", digits, EMAIL_DOMAIN)
}

/// Check that a formatted tax id carries valid CPF check digits
pub fn is_valid_tax_id(tax_id: &str) -> bool {
    let digits: Vec<u8> = tax_id
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect();
    digits.len() == 11
        && cpf_check_digit(&digits[..9]) == digits[9]
        && cpf_check_digit(&digits[..10]) == digits[10]
}

fn cpf_check_digit(digits: &[u8]) -> u8 {
    let mut sum = 0_u32;
    let mut weight = digits.len() as u32 + 1;
    for digit in digits {
        sum += (*digit as u32) * weight;
        weight = weight.saturating_sub(1);
    }
    let remainder = sum % 11;
    if remainder < 2 {
        0
    } else {
        (11 - remainder) as u8
    }
}

fn years_before(date: NaiveDate, years: u32) -> Result<NaiveDate, GenerateError> {
    date.checked_sub_months(Months::new(years * 12))
        .ok_or(GenerateError::DateOutOfRange { date, years })
}

pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
