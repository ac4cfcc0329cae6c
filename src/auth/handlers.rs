use axum::{
    extract::{FromRef, State},
    http::{header::SET_COOKIE, HeaderName, StatusCode},
    response::AppendHeaders,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
        gate::ACCESS_TOKEN_COOKIE,
        password::{hash_password, verify_password},
        token::{Identity, Role, TokenCodec},
    },
    error::ApiError,
    state::AppState,
    users::repo::User,
    validate::{is_strong_password, is_valid_email, require},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    require(
        payload.fullname.trim().len() >= 4,
        "Fullname must be at least 4 characters long",
    )?;
    require(is_valid_email(&payload.email), "Invalid email address")?;
    let role = Role::parse(&payload.role).ok_or_else(|| ApiError::Validation("Invalid role".into()))?;
    require(
        is_strong_password(&payload.password),
        "Password must be at least 7 characters long and contain at least one lowercase letter, one uppercase letter, and two digits",
    )?;

    // Only one admin account can ever self-register.
    if role == Role::Admin && User::admin_exists(&state.db).await? {
        warn!(email = %payload.email, "second admin registration rejected");
        return Err(ApiError::Forbidden(
            "You are not authorized to register as admin".into(),
        ));
    }

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        return Err(ApiError::Validation("Email already registered".into()));
    }

    let hash = hash_password(&payload.password)?;
    let user = User::create(&state.db, &payload.fullname, &payload.email, role, &hash).await?;

    info!(user_id = %user.id, role = ?user.role, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            user,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(AppendHeaders<[(HeaderName, String); 1]>, Json<LoginResponse>), ApiError> {
    require(is_valid_email(&payload.email), "Invalid email address")?;
    require(!payload.password.is_empty(), "Password is required")?;

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login with unknown email");
            ApiError::Unauthorized("Incorrect login credentials".into())
        })?;

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(ApiError::Unauthorized("Incorrect login credentials".into()));
    }

    let identity = Identity {
        sub: user.id,
        username: user.fullname.clone(),
        role: user.role,
    };
    let token = TokenCodec::from_ref(&state).issue(&identity)?;
    let cookie = format!("{ACCESS_TOKEN_COOKIE}={token}; Path=/; Secure");

    info!(user_id = %user.id, "user logged in");
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(LoginResponse {
            success: true,
            message: "Successfully Logged in".into(),
            user,
        }),
    ))
}
