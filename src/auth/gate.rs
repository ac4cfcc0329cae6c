use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap},
};

use super::token::{Identity, Role, TokenCodec};
use crate::error::ApiError;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// The one account allowed through the admin gate. This is a literal
/// identity check, not a role check: the backend recognizes a single
/// super-admin by name.
pub const SUPER_ADMIN_NAME: &str = "AdminLia";

pub fn is_super_admin(identity: &Identity) -> bool {
    identity.username == SUPER_ADMIN_NAME && identity.role == Role::Admin
}

/// Pulls a cookie value out of the `Cookie` header, the same way the
/// frontend sends it: `k1=v1; k2=v2`.
pub(crate) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

fn extract_identity<S>(parts: &Parts, state: &S) -> Result<Identity, ApiError>
where
    S: Send + Sync,
    TokenCodec: FromRef<S>,
{
    let token = cookie_value(&parts.headers, ACCESS_TOKEN_COOKIE)
        .ok_or_else(|| ApiError::Unauthorized("You are not authorized".into()))?;
    let codec = TokenCodec::from_ref(state);
    codec.verify(&token)
}

/// Verified-user gate: any valid identity token passes. Short-circuits
/// the request with `Unauthorized`/`InvalidToken` before the handler runs.
pub struct AuthedUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
    TokenCodec: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = extract_identity(parts, state)?;
        Ok(AuthedUser(identity))
    }
}

/// Admin gate: same extraction and verification as `AuthedUser`, then the
/// hardcoded super-admin identity match. Anything else is `Forbidden`,
/// even a token whose role alone is "admin".
pub struct AdminUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    TokenCodec: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = extract_identity(parts, state)?;
        if !is_super_admin(&identity) {
            return Err(ApiError::Forbidden(
                "You are not authorized to access this resource".into(),
            ));
        }
        Ok(AdminUser(identity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn parts_with_cookie(cookie: Option<&str>) -> Parts {
        let mut builder = axum::http::Request::builder().uri("/");
        if let Some(c) = cookie {
            builder = builder.header("cookie", c);
        }
        let (parts, ()) = builder.body(()).expect("request").into_parts();
        parts
    }

    fn identity(username: &str, role: Role) -> Identity {
        Identity {
            sub: Uuid::new_v4(),
            username: username.into(),
            role,
        }
    }

    #[test]
    fn cookie_value_parses_multi_cookie_header() {
        let parts = parts_with_cookie(Some("theme=dark; access_token=abc.def.ghi; lang=en"));
        assert_eq!(
            cookie_value(&parts.headers, ACCESS_TOKEN_COOKIE).as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(cookie_value(&parts.headers, "lang").as_deref(), Some("en"));
        assert_eq!(cookie_value(&parts.headers, "missing"), None);
    }

    #[tokio::test]
    async fn authed_gate_rejects_missing_cookie_as_unauthorized() {
        let codec = TokenCodec::new("dev-secret");
        let mut parts = parts_with_cookie(None);
        let err = AuthedUser::from_request_parts(&mut parts, &codec)
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        let mut parts = parts_with_cookie(Some("theme=dark"));
        let err = AuthedUser::from_request_parts(&mut parts, &codec)
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn authed_gate_rejects_bad_token_as_invalid() {
        let codec = TokenCodec::new("dev-secret");
        let mut parts = parts_with_cookie(Some("access_token=garbage"));
        let err = AuthedUser::from_request_parts(&mut parts, &codec)
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken(_)));
    }

    #[tokio::test]
    async fn authed_gate_passes_valid_token_through() {
        let codec = TokenCodec::new("dev-secret");
        let id = identity("Someone", Role::Farmer);
        let token = codec.issue(&id).expect("sign");
        let mut parts = parts_with_cookie(Some(&format!("access_token={token}")));
        let AuthedUser(decoded) = AuthedUser::from_request_parts(&mut parts, &codec)
            .await
            .expect("gate should pass");
        assert_eq!(decoded, id);
    }

    #[tokio::test]
    async fn admin_gate_accepts_only_the_exact_identity_pair() {
        let codec = TokenCodec::new("dev-secret");

        let token = codec
            .issue(&identity(SUPER_ADMIN_NAME, Role::Admin))
            .expect("sign");
        let mut parts = parts_with_cookie(Some(&format!("access_token={token}")));
        assert!(AdminUser::from_request_parts(&mut parts, &codec)
            .await
            .is_ok());

        // Role admin under a different name is not enough.
        let token = codec
            .issue(&identity("OtherAdmin", Role::Admin))
            .expect("sign");
        let mut parts = parts_with_cookie(Some(&format!("access_token={token}")));
        let err = AdminUser::from_request_parts(&mut parts, &codec)
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        // The right name with the wrong role fails too.
        let token = codec
            .issue(&identity(SUPER_ADMIN_NAME, Role::Farmer))
            .expect("sign");
        let mut parts = parts_with_cookie(Some(&format!("access_token={token}")));
        let err = AdminUser::from_request_parts(&mut parts, &codec)
            .await
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
