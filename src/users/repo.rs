use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::auth::token::Role;

/// Canonical account record. Admins and farmers share the table; the
/// `products` list only ever grows for the admin account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub profile_picture: Option<String>,
    /// Ids of forum topics this user created. Appended outside the create
    /// transaction, so reads must tolerate dangling ids.
    pub articles: Vec<Uuid>,
    /// Ids of products created by the admin account.
    pub products: Vec<Uuid>,
}

const USER_COLUMNS: &str =
    "id, fullname, email, role, password_hash, profile_picture, articles, products";

impl User {
    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn admin_exists(db: &PgPool) -> anyhow::Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE role = 'admin')")
                .fetch_one(db)
                .await?;
        Ok(exists)
    }

    pub async fn create(
        db: &PgPool,
        fullname: &str,
        email: &str,
        role: Role,
        password_hash: &str,
    ) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (fullname, email, role, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(fullname)
        .bind(email)
        .bind(role)
        .bind(password_hash)
        .fetch_one(db)
        .await?;
        Ok(user)
    }

    pub async fn set_profile_picture(
        db: &PgPool,
        id: Uuid,
        key: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET profile_picture = $2 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(key)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn push_article(db: &PgPool, id: Uuid, topic_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET articles = array_append(articles, $2) WHERE id = $1")
            .bind(id)
            .bind(topic_id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn pull_article(db: &PgPool, id: Uuid, topic_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET articles = array_remove(articles, $2) WHERE id = $1")
            .bind(id)
            .bind(topic_id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn push_product(db: &PgPool, id: Uuid, product_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET products = array_append(products, $2) WHERE id = $1")
            .bind(id)
            .bind(product_id)
            .execute(db)
            .await?;
        Ok(())
    }

    pub async fn pull_product(db: &PgPool, id: Uuid, product_id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET products = array_remove(products, $2) WHERE id = $1")
            .bind(id)
            .bind(product_id)
            .execute(db)
            .await?;
        Ok(())
    }
}
