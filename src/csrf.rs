use axum::{
    extract::Request,
    http::{header::SET_COOKIE, Method},
    middleware::Next,
    response::{AppendHeaders, Response},
    Json,
};
use rand::{distributions::Alphanumeric, Rng};
use serde::Serialize;

use crate::{auth::gate::cookie_value, error::ApiError};

pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_HEADER: &str = "csrf-token";

const TOKEN_LEN: usize = 32;

pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn tokens_match(cookie: Option<&str>, header: Option<&str>) -> bool {
    match (cookie, header) {
        (Some(c), Some(h)) => !c.is_empty() && c == h,
        _ => false,
    }
}

/// Double-submit check on every state-changing request: the `csrf-token`
/// header must equal the `csrf_token` cookie issued by `/api/csrf-token`.
/// Mismatch is its own 403, distinct from the access-control errors.
pub async fn require_csrf(req: Request, next: Next) -> Result<Response, ApiError> {
    match *req.method() {
        Method::GET | Method::HEAD | Method::OPTIONS => return Ok(next.run(req).await),
        _ => {}
    }

    let cookie = cookie_value(req.headers(), CSRF_COOKIE);
    let header = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    if !tokens_match(cookie.as_deref(), header.as_deref()) {
        return Err(ApiError::CsrfMismatch);
    }
    Ok(next.run(req).await)
}

#[derive(Debug, Serialize)]
pub struct CsrfTokenResponse {
    #[serde(rename = "csrfToken")]
    pub csrf_token: String,
}

/// GET /api/csrf-token — hands the frontend a fresh token, both as the
/// HttpOnly cookie the middleware will compare against and in the body so
/// the client can echo it back in the `csrf-token` header.
pub async fn issue_csrf_token() -> (
    AppendHeaders<[(axum::http::HeaderName, String); 1]>,
    Json<CsrfTokenResponse>,
) {
    let token = generate_token();
    let cookie = format!("{CSRF_COOKIE}={token}; HttpOnly; Path=/; SameSite=Strict");
    (
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(CsrfTokenResponse { csrf_token: token }),
    )
}
