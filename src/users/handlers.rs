use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::gate::AuthedUser,
    error::ApiError,
    state::AppState,
    users::repo::User,
};

const PICTURE_URL_TTL_SECS: u64 = 30 * 60;
const MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/getUserData", get(get_user_data))
        .route(
            "/updateProfilePicture",
            post(update_profile_picture).layer(DefaultBodyLimit::max(MAX_PICTURE_BYTES)),
        )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataResponse {
    pub success: bool,
    pub user: User,
    /// Short-lived read URL for the stored profile picture, when one exists.
    pub profile_picture_url: Option<String>,
}

#[instrument(skip(state))]
pub async fn get_user_data(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
) -> Result<Json<UserDataResponse>, ApiError> {
    let user = User::find_by_id(&state.db, identity.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("No such user exists".into()))?;

    let profile_picture_url = match &user.profile_picture {
        Some(key) => Some(state.storage.presigned_url(key, PICTURE_URL_TTL_SECS).await?),
        None => None,
    };

    Ok(Json(UserDataResponse {
        success: true,
        user,
        profile_picture_url,
    }))
}

#[instrument(skip(state, multipart))]
pub async fn update_profile_picture(
    State(state): State<AppState>,
    AuthedUser(identity): AuthedUser,
    multipart: Multipart,
) -> Result<Json<UserDataResponse>, ApiError> {
    let (data, content_type, filename) = read_upload(multipart).await?;

    let existing = User::find_by_id(&state.db, identity.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("No such user exists".into()))?;

    // Replace semantics: the previous picture object goes away first.
    if let Some(old_key) = &existing.profile_picture {
        if let Err(e) = state.storage.delete(old_key).await {
            warn!(error = %e, key = %old_key, "could not delete previous profile picture");
        }
    }

    let key = picture_key(identity.sub, filename.as_deref(), &content_type);
    state.storage.put(&key, data, &content_type).await?;

    let user = User::set_profile_picture(&state.db, identity.sub, &key)
        .await?
        .ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!("profile picture update matched no user"))
        })?;
    let profile_picture_url = Some(state.storage.presigned_url(&key, PICTURE_URL_TTL_SECS).await?);

    info!(user_id = %user.id, key = %key, "profile picture updated");
    Ok(Json(UserDataResponse {
        success: true,
        user,
        profile_picture_url,
    }))
}

/// Pulls the `file` field out of the multipart body. A stream error is a
/// broken upload, not an absent field, and reports as such.
async fn read_upload(
    mut multipart: Multipart,
) -> Result<(Bytes, String, Option<String>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("Broken file upload: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().map(str::to_owned);
            let content_type = field
                .content_type()
                .map(str::to_owned)
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(format!("Broken file upload: {e}")))?;
            return Ok((data, content_type, filename));
        }
    }
    Err(ApiError::Validation("File is required".into()))
}

/// Object key for a fresh upload. The extension comes from the original
/// filename when present, the MIME type otherwise.
fn picture_key(user_id: Uuid, filename: Option<&str>, content_type: &str) -> String {
    let ext = filename
        .and_then(|name| name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase()))
        .filter(|e| !e.is_empty())
        .or_else(|| ext_from_mime(content_type).map(str::to_owned))
        .unwrap_or_else(|| "bin".into());
    format!("profile-pictures/{}/{}.{}", user_id, Uuid::new_v4(), ext)
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, extract::FromRequest};

    const BOUNDARY: &str = "upload-test-boundary";

    async fn multipart_from(body: &str) -> Multipart {
        let req = axum::http::Request::builder()
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body.to_owned()))
            .expect("request");
        Multipart::from_request(req, &()).await.expect("extractor")
    }

    #[tokio::test]
    async fn read_upload_returns_the_file_field() {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"; filename=\"me.png\"\r\n\
             Content-Type: image/png\r\n\r\n\
             fake-bytes\r\n\
             --{BOUNDARY}--\r\n"
        );
        let (data, content_type, filename) =
            read_upload(multipart_from(&body).await).await.expect("upload");
        assert_eq!(&data[..], b"fake-bytes");
        assert_eq!(content_type, "image/png");
        assert_eq!(filename.as_deref(), Some("me.png"));
    }

    #[tokio::test]
    async fn read_upload_without_a_file_field_asks_for_one() {
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"other\"\r\n\r\n\
             value\r\n\
             --{BOUNDARY}--\r\n"
        );
        let err = read_upload(multipart_from(&body).await).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m == "File is required"));
    }

    #[tokio::test]
    async fn read_upload_reports_a_truncated_body_as_broken() {
        // Opens the file part but ends mid-stream, before any closing
        // boundary.
        let body = format!(
            "--{BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"file\"\r\n\r\n\
             half-of-the-da"
        );
        let err = read_upload(multipart_from(&body).await).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(m) if m.starts_with("Broken file upload")));
    }

    #[test]
    fn picture_key_prefers_the_filename_extension() {
        let user = Uuid::new_v4();
        let key = picture_key(user, Some("me.PNG"), "application/octet-stream");
        assert!(key.starts_with(&format!("profile-pictures/{user}/")));
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn picture_key_falls_back_to_mime_then_bin() {
        let user = Uuid::new_v4();
        let key = picture_key(user, None, "image/webp");
        assert!(key.ends_with(".webp"));
        let key = picture_key(user, None, "application/x-unknown");
        assert!(key.ends_with(".bin"));
    }

    #[test]
    fn ext_from_mime_covers_the_allowed_image_types() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("text/plain"), None);
    }

    #[tokio::test]
    async fn fake_storage_presigns_a_url_containing_the_key() {
        let state = crate::state::AppState::fake();
        let url = state
            .storage
            .presigned_url("profile-pictures/a/b.png", 60)
            .await
            .unwrap();
        assert!(url.contains("profile-pictures/a/b.png"));
    }
}
