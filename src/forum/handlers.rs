use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::gate::AuthedUser,
    error::ApiError,
    policy::{can_mutate_topic, can_read_topic, Privacy},
    state::AppState,
    users::repo::User,
    validate::{is_clean_text, require},
};

use super::{
    dto::{
        CommentResponse, CreateCommentRequest, CreateTopicRequest, CreatedTopicResponse,
        DeletedTopicResponse, EditTopicRequest, SearchResponse, TopicDetails,
        TopicDetailsResponse, TopicsResponse, UpdatedTopicResponse, UserTopicsResponse,
    },
    repo::{Comment, Topic},
    search::matching_topics,
};

pub fn forum_routes() -> Router<AppState> {
    Router::new()
        .route("/get", get(get_all_topics))
        .route("/get/:id", get(get_topic))
        .route("/getOfAPerson/:id", get(get_topics_of_person))
        .route("/create", post(create_topic))
        .route("/edit/:id", patch(edit_topic))
        .route("/delete/:id", delete(delete_topic))
        .route("/createComment/:id", post(create_comment))
        .route("/getResults/:query", get(search_topics))
}

fn parse_privacy(raw: &str) -> Result<Privacy, ApiError> {
    raw.parse::<Privacy>().map_err(|()| {
        ApiError::Validation(r#"Privacy must be either "private" or "public""#.into())
    })
}

/// Public topic listing — the one forum read that runs without the gate.
#[instrument(skip(state))]
pub async fn get_all_topics(
    State(state): State<AppState>,
) -> Result<Json<TopicsResponse>, ApiError> {
    let topics = Topic::list_public(&state.db).await?;
    Ok(Json(TopicsResponse {
        success: true,
        topics,
    }))
}

#[instrument(skip(state))]
pub async fn get_topic(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<TopicDetailsResponse>, ApiError> {
    let topic = Topic::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("No such post exists".into()))?;

    if !can_read_topic(topic.privacy, topic.created_by, &identity) {
        warn!(topic_id = %id, caller = %identity.sub, "private topic read denied");
        return Err(ApiError::Forbidden(
            "Unauthorized access to private topic".into(),
        ));
    }

    let creator = User::find_by_id(&state.db, topic.created_by)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(TopicDetailsResponse {
        success: true,
        post: TopicDetails {
            id: topic.id,
            title: topic.title,
            description: topic.description,
            comments: topic.comments,
            fullname: creator.fullname,
            time_of_creation: topic.time_of_creation,
            privacy: topic.privacy,
        },
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_topic(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    Json(payload): Json<CreateTopicRequest>,
) -> Result<(StatusCode, Json<CreatedTopicResponse>), ApiError> {
    require(
        payload.title.len() >= 5 && is_clean_text(&payload.title),
        "Title must be at least 5 characters of letters, numbers and basic punctuation",
    )?;
    require(
        payload.description.len() >= 11 && is_clean_text(&payload.description),
        "Description must be at least 11 characters of letters, numbers and basic punctuation",
    )?;
    let privacy = parse_privacy(&payload.privacy)?;

    let user = User::find_by_id(&state.db, identity.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let topic = Topic::create(
        &state.db,
        &payload.title,
        &payload.description,
        privacy,
        user.id,
    )
    .await?;
    // Second write, not transactional with the create; stale list entries
    // are filtered on read.
    User::push_article(&state.db, user.id, topic.id).await?;

    info!(topic_id = %topic.id, user_id = %user.id, "topic created");
    Ok((
        StatusCode::CREATED,
        Json(CreatedTopicResponse {
            success: true,
            new_topic: topic,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn edit_topic(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<EditTopicRequest>,
) -> Result<Json<UpdatedTopicResponse>, ApiError> {
    require(
        payload.title.len() >= 2 && is_clean_text(&payload.title),
        "Title must be at least 2 characters of letters, numbers and basic punctuation",
    )?;
    require(
        payload.description.len() >= 10 && is_clean_text(&payload.description),
        "Description must be at least 10 characters of letters, numbers and basic punctuation",
    )?;
    let privacy = parse_privacy(&payload.privacy)?;

    let existing = Topic::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Topic not found".into()))?;

    if !can_mutate_topic(existing.created_by, &identity) {
        return Err(ApiError::Forbidden("Permission denied".into()));
    }

    let updated = Topic::update(&state.db, id, &payload.title, &payload.description, privacy)
        .await?
        .ok_or_else(|| ApiError::NotFound("Topic not found".into()))?;

    info!(topic_id = %id, caller = %identity.sub, "topic updated");
    Ok(Json(UpdatedTopicResponse {
        success: true,
        updated_topic: updated,
    }))
}

#[instrument(skip(state))]
pub async fn delete_topic(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletedTopicResponse>, ApiError> {
    User::find_by_id(&state.db, identity.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let topic = Topic::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Topic not found".into()))?;

    if !can_mutate_topic(topic.created_by, &identity) {
        return Err(ApiError::Forbidden(
            "Permission denied. You are not the creator of this topic.".into(),
        ));
    }

    Topic::delete(&state.db, id).await?;
    // Pull the id from the creator's list, which may not be the caller
    // when an admin deletes someone else's topic.
    User::pull_article(&state.db, topic.created_by, id).await?;

    info!(topic_id = %id, caller = %identity.sub, "topic deleted");
    Ok(Json(DeletedTopicResponse {
        success: true,
        message: "Topic deleted successfully".into(),
    }))
}

/// Topics of the calling user, resolved through their `articles` list.
/// The path id is accepted for frontend compatibility but the verified
/// identity decides whose topics come back.
#[instrument(skip(state))]
pub async fn get_topics_of_person(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    Path(_id): Path<Uuid>,
) -> Result<Json<UserTopicsResponse>, ApiError> {
    let user = User::find_by_id(&state.db, identity.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let user_topics = Topic::list_by_ids(&state.db, &user.articles).await?;
    Ok(Json(UserTopicsResponse {
        success: true,
        user_topics,
    }))
}

#[instrument(skip(state, payload))]
pub async fn create_comment(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    require(
        payload.message.len() >= 2 && is_clean_text(&payload.message),
        "Message must be at least 2 characters of letters, numbers and basic punctuation",
    )?;

    let user = User::find_by_id(&state.db, identity.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let topic = Topic::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Topic not found".into()))?;

    let comment = Comment {
        id: Uuid::new_v4(),
        message: payload.message,
        created_by: user.id,
        created_at: OffsetDateTime::now_utc(),
    };

    let mut comments = topic.comments.0;
    comments.push(comment.clone());
    Topic::save_comments(&state.db, topic.id, &comments).await?;

    info!(topic_id = %topic.id, user_id = %user.id, "comment added");
    Ok((
        StatusCode::CREATED,
        Json(CommentResponse {
            success: true,
            comment,
        }),
    ))
}

/// Keyword search over every topic title; runs without the gate, like the
/// public listing.
#[instrument(skip(state))]
pub async fn search_topics(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Result<Json<SearchResponse>, ApiError> {
    require(!query.trim().is_empty(), "Query is required")?;

    let all_topics = Topic::list_all(&state.db).await?;
    let matching = matching_topics(&query, all_topics);
    Ok(Json(SearchResponse {
        success: true,
        matching_topics: matching,
    }))
}
