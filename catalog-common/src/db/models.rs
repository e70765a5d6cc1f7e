//! Database models

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub purchase_price: Option<f64>,
    pub wholesale_price: Option<f64>,
    pub unit_price: Option<f64>,
    pub category_id: Option<i64>,
}

impl NewProduct {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Insert a product and return its id. New products start unverified.
pub async fn insert_product(pool: &SqlitePool, product: &NewProduct) -> Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO products (name, purchase_price, wholesale_price, unit_price, category_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&product.name)
    .bind(product.purchase_price)
    .bind(product.wholesale_price)
    .bind(product.unit_price)
    .bind(product.category_id)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Insert a category and return its id
pub async fn insert_category(pool: &SqlitePool, name: &str) -> Result<i64> {
    let result = sqlx::query("INSERT INTO categories (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?;

    Ok(result.last_insert_rowid())
}
