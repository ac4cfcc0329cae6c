use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::policy::Privacy;

/// A comment lives embedded in its topic's `comments` JSONB column, so
/// deleting a topic removes its comments with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub message: String,
    pub created_by: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub comments: Json<Vec<Comment>>,
    pub created_by: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub time_of_creation: OffsetDateTime,
    pub privacy: Privacy,
}

const TOPIC_COLUMNS: &str =
    "id, title, description, comments, created_by, time_of_creation, privacy";

impl Topic {
    pub async fn list_public(db: &PgPool) -> anyhow::Result<Vec<Topic>> {
        let topics = sqlx::query_as::<_, Topic>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics WHERE privacy = 'public'
             ORDER BY time_of_creation DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(topics)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<Topic>> {
        let topics = sqlx::query_as::<_, Topic>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics ORDER BY time_of_creation DESC"
        ))
        .fetch_all(db)
        .await?;
        Ok(topics)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Topic>> {
        let topic = sqlx::query_as::<_, Topic>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(topic)
    }

    /// Fetch the topics referenced by a user's `articles` list. Dangling
    /// ids simply match nothing, which is how stale list entries get
    /// filtered out.
    pub async fn list_by_ids(db: &PgPool, ids: &[Uuid]) -> anyhow::Result<Vec<Topic>> {
        let topics = sqlx::query_as::<_, Topic>(&format!(
            "SELECT {TOPIC_COLUMNS} FROM topics WHERE id = ANY($1)
             ORDER BY time_of_creation DESC"
        ))
        .bind(ids)
        .fetch_all(db)
        .await?;
        Ok(topics)
    }

    pub async fn create(
        db: &PgPool,
        title: &str,
        description: &str,
        privacy: Privacy,
        created_by: Uuid,
    ) -> anyhow::Result<Topic> {
        let topic = sqlx::query_as::<_, Topic>(&format!(
            "INSERT INTO topics (title, description, privacy, created_by)
             VALUES ($1, $2, $3, $4)
             RETURNING {TOPIC_COLUMNS}"
        ))
        .bind(title)
        .bind(description)
        .bind(privacy)
        .bind(created_by)
        .fetch_one(db)
        .await?;
        Ok(topic)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        title: &str,
        description: &str,
        privacy: Privacy,
    ) -> anyhow::Result<Option<Topic>> {
        let topic = sqlx::query_as::<_, Topic>(&format!(
            "UPDATE topics SET title = $2, description = $3, privacy = $4
             WHERE id = $1
             RETURNING {TOPIC_COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(privacy)
        .fetch_optional(db)
        .await?;
        Ok(topic)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM topics WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Write back the full embedded comment list, mirroring how the
    /// original saved the whole document after a push.
    pub async fn save_comments(
        db: &PgPool,
        id: Uuid,
        comments: &[Comment],
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE topics SET comments = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(comments))
            .execute(db)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::token::Role, users::repo::User};
    use sqlx::postgres::PgPoolOptions;

    async fn test_db() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a test database");
        let db = PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("connect to test database");
        sqlx::migrate!("./migrations")
            .run(&db)
            .await
            .expect("migrate test database");
        db
    }

    #[tokio::test]
    #[ignore = "needs a running Postgres behind DATABASE_URL"]
    async fn topic_round_trip_keeps_the_creator_list_consistent() {
        let db = test_db().await;
        let email = format!("{}@farm.example", Uuid::new_v4());
        let user = User::create(&db, "List Checker", &email, Role::Farmer, "hash")
            .await
            .expect("create user");

        let topic = Topic::create(
            &db,
            "Egg prices",
            "Where does everyone sell eggs these days",
            Privacy::Public,
            user.id,
        )
        .await
        .expect("create topic");
        User::push_article(&db, user.id, topic.id)
            .await
            .expect("push article");

        // The id appears exactly once in the creator's list and resolves
        // to exactly one topic.
        let user = User::find_by_id(&db, user.id)
            .await
            .expect("query")
            .expect("user exists");
        assert_eq!(user.articles.iter().filter(|id| **id == topic.id).count(), 1);
        let listed = Topic::list_by_ids(&db, &user.articles)
            .await
            .expect("list by ids");
        assert_eq!(listed.iter().filter(|t| t.id == topic.id).count(), 1);

        // Between the row delete and the list pull the id dangles; the
        // listing already filters it.
        assert!(Topic::delete(&db, topic.id).await.expect("delete"));
        let stale = Topic::list_by_ids(&db, &user.articles)
            .await
            .expect("list with dangling id");
        assert!(stale.iter().all(|t| t.id != topic.id));

        User::pull_article(&db, user.id, topic.id)
            .await
            .expect("pull article");
        let user = User::find_by_id(&db, user.id)
            .await
            .expect("query")
            .expect("user exists");
        assert!(!user.articles.contains(&topic.id));
        assert!(Topic::find_by_id(&db, topic.id)
            .await
            .expect("query")
            .is_none());
    }
}
