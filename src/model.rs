//! Customer and order records and their SQL representation.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// Country written on every customer and delivery address
pub const COUNTRY: &str = "Brazil";

/// Domain used for the tax-id derived email addresses
pub const EMAIL_DOMAIN: &str = "exemplo.com.br";

/// Fixed tag every coupon code starts with
pub const COUPON_PREFIX: &str = "CUPOM";

/// SQL value representation
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Text(String),
    Decimal(f64),
    Date(NaiveDate),
    Uuid(Uuid),
}

impl SqlValue {
    /// Format as a DuckDB literal
    pub fn to_sql(&self) -> String {
        match self {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Text(s) => format!("'{}'", s.replace('\'', "''")),
            SqlValue::Decimal(n) => format!("{:.2}", n),
            SqlValue::Date(d) => format!("DATE '{}'", d.format("%Y-%m-%d")),
            SqlValue::Uuid(u) => format!("'{}'::UUID", u),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<Option<&str>> for SqlValue {
    fn from(s: Option<&str>) -> Self {
        s.map_or(SqlValue::Null, SqlValue::from)
    }
}

/// A record that can be written to one of the relations.
pub trait Record {
    /// Target relation
    const TABLE: &'static str;
    /// Column names in relation order
    const COLUMNS: &'static [&'static str];
    /// Columns carrying a uniqueness constraint, primary key first
    const UNIQUE_COLUMNS: &'static [&'static str];

    /// Values in `COLUMNS` order
    fn values(&self) -> Vec<SqlValue>;

    /// Values of the unique columns in `UNIQUE_COLUMNS` order
    fn unique_keys(&self) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl Gender {
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered customer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub id: Uuid,
    pub name: String,
    pub birth_date: NaiveDate,
    pub tax_id: String,
    pub postal_code: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub gender: Gender,
    pub phone: String,
    pub email: String,
    pub registration_date: NaiveDate,
}

impl Record for Customer {
    const TABLE: &'static str = "customers";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "birth_date",
        "tax_id",
        "postal_code",
        "city",
        "state",
        "country",
        "gender",
        "phone",
        "email",
        "registration_date",
    ];
    const UNIQUE_COLUMNS: &'static [&'static str] = &["id", "tax_id", "email"];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Uuid(self.id),
            self.name.as_str().into(),
            SqlValue::Date(self.birth_date),
            self.tax_id.as_str().into(),
            self.postal_code.as_str().into(),
            self.city.as_str().into(),
            self.state.as_str().into(),
            self.country.as_str().into(),
            self.gender.code().into(),
            self.phone.as_str().into(),
            self.email.as_str().into(),
            SqlValue::Date(self.registration_date),
        ]
    }

    fn unique_keys(&self) -> Vec<String> {
        vec![self.id.to_string(), self.tax_id.clone(), self.email.clone()]
    }
}

/// An order placed by a customer, joined on tax id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: Uuid,
    pub tax_id: String,
    pub order_value: f64,
    pub freight_value: f64,
    pub discount_value: f64,
    pub coupon: Option<String>,
    pub delivery_street: String,
    pub delivery_number: String,
    pub delivery_neighborhood: String,
    pub delivery_city: String,
    pub delivery_state: String,
    pub delivery_country: String,
    pub status: OrderStatus,
    pub order_date: NaiveDate,
}

impl Record for Order {
    const TABLE: &'static str = "orders";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "tax_id",
        "order_value",
        "freight_value",
        "discount_value",
        "coupon",
        "delivery_street",
        "delivery_number",
        "delivery_neighborhood",
        "delivery_city",
        "delivery_state",
        "delivery_country",
        "status",
        "order_date",
    ];
    const UNIQUE_COLUMNS: &'static [&'static str] = &["id"];

    fn values(&self) -> Vec<SqlValue> {
        vec![
            SqlValue::Uuid(self.id),
            self.tax_id.as_str().into(),
            SqlValue::Decimal(self.order_value),
            SqlValue::Decimal(self.freight_value),
            SqlValue::Decimal(self.discount_value),
            self.coupon.as_deref().into(),
            self.delivery_street.as_str().into(),
            self.delivery_number.as_str().into(),
            self.delivery_neighborhood.as_str().into(),
            self.delivery_city.as_str().into(),
            self.delivery_state.as_str().into(),
            self.delivery_country.as_str().into(),
            self.status.as_str().into(),
            SqlValue::Date(self.order_date),
        ]
    }

    fn unique_keys(&self) -> Vec<String> {
        vec![self.id.to_string()]
    }
}
