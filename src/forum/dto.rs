use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{Comment, Topic};
use crate::policy::Privacy;

#[derive(Debug, Deserialize)]
pub struct CreateTopicRequest {
    pub title: String,
    pub description: String,
    pub privacy: String,
}

#[derive(Debug, Deserialize)]
pub struct EditTopicRequest {
    pub title: String,
    pub description: String,
    pub privacy: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TopicsResponse {
    pub success: bool,
    pub topics: Vec<Topic>,
}

/// GET /get/:id payload: the topic enriched with the creator's fullname,
/// fetched separately.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDetails {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub comments: Json<Vec<Comment>>,
    pub fullname: String,
    #[serde(with = "time::serde::rfc3339")]
    pub time_of_creation: OffsetDateTime,
    pub privacy: Privacy,
}

#[derive(Debug, Serialize)]
pub struct TopicDetailsResponse {
    pub success: bool,
    pub post: TopicDetails,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedTopicResponse {
    pub success: bool,
    pub new_topic: Topic,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedTopicResponse {
    pub success: bool,
    pub updated_topic: Topic,
}

#[derive(Debug, Serialize)]
pub struct DeletedTopicResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTopicsResponse {
    pub success: bool,
    pub user_topics: Vec<Topic>,
}

#[derive(Debug, Serialize)]
pub struct CommentResponse {
    pub success: bool,
    pub comment: Comment,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub success: bool,
    pub matching_topics: Vec<Topic>,
}
