use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::policy::Privacy;

/// Marketplace listing. Ownership is not a column here: the creating
/// admin's `products` list is the only back-reference.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image: String,
    pub price: f64,
    pub quantity: i32,
    pub privacy: Privacy,
    pub saved_by: Vec<Uuid>,
}

const PRODUCT_COLUMNS: &str = "id, name, description, image, price, quantity, privacy, saved_by";

impl Product {
    pub async fn list_public(db: &PgPool) -> anyhow::Result<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE privacy = 'public'"
        ))
        .fetch_all(db)
        .await?;
        Ok(products)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(product)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        db: &PgPool,
        name: &str,
        description: &str,
        image: &str,
        price: f64,
        quantity: i32,
        privacy: Privacy,
    ) -> anyhow::Result<Product> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO products (name, description, image, price, quantity, privacy)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(name)
        .bind(description)
        .bind(image)
        .bind(price)
        .bind(quantity)
        .bind(privacy)
        .fetch_one(db)
        .await?;
        Ok(product)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        db: &PgPool,
        id: Uuid,
        name: &str,
        description: &str,
        image: &str,
        price: f64,
        quantity: i32,
        privacy: Privacy,
    ) -> anyhow::Result<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE products
             SET name = $2, description = $3, image = $4, price = $5, quantity = $6, privacy = $7
             WHERE id = $1
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(image)
        .bind(price)
        .bind(quantity)
        .bind(privacy)
        .fetch_optional(db)
        .await?;
        Ok(product)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
