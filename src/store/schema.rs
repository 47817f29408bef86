//! Relation definitions and lifecycle.

use anyhow::Result;

use super::Store;

pub const CUSTOMERS_DDL: &str = "CREATE TABLE IF NOT EXISTS customers (
    id UUID PRIMARY KEY,
    name VARCHAR,
    birth_date DATE,
    tax_id VARCHAR(14) UNIQUE,
    postal_code VARCHAR(9),
    city VARCHAR(100),
    state VARCHAR(2),
    country VARCHAR(50),
    gender CHAR(1),
    phone VARCHAR(20),
    email VARCHAR(100) UNIQUE,
    registration_date DATE
);";

pub const ORDERS_DDL: &str = "CREATE TABLE IF NOT EXISTS orders (
    id UUID PRIMARY KEY,
    tax_id VARCHAR(14),
    order_value DECIMAL(10,2),
    freight_value DECIMAL(10,2),
    discount_value DECIMAL(10,2),
    coupon VARCHAR(50),
    delivery_street VARCHAR(100),
    delivery_number VARCHAR(10),
    delivery_neighborhood VARCHAR(100),
    delivery_city VARCHAR(100),
    delivery_state CHAR(2),
    delivery_country VARCHAR(50),
    status VARCHAR(30),
    order_date DATE,
    FOREIGN KEY (tax_id) REFERENCES customers(tax_id)
);";

/// Both CREATE TABLE statements, customers first
pub fn schema_ddl() -> String {
    format!("{}\n\n{}\n", CUSTOMERS_DDL, ORDERS_DDL)
}

/// Create both relations if they are missing. Existing relations are left alone.
pub fn ensure_schema(store: &Store) -> Result<()> {
    store.execute_batch(CUSTOMERS_DDL)?;
    store.execute_batch(ORDERS_DDL)?;
    Ok(())
}

/// Delete every row, orders before the customers they reference
pub fn purge(store: &Store) -> Result<()> {
    store.execute_batch("DELETE FROM orders;")?;
    store.execute_batch("DELETE FROM customers;")?;
    Ok(())
}
