use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Account role. A single `users` table carries both variants; the
/// `products` list is only ever populated for admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    Admin,
    Farmer,
}

impl Role {
    pub fn parse(s: &str) -> Option<Role> {
        match s.to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "farmer" => Some(Role::Farmer),
            _ => None,
        }
    }
}

/// Decoded payload of a signed identity token. Created at login, carried
/// in the `access_token` cookie, never persisted server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User id the token asserts.
    pub sub: Uuid,
    /// Display name (`fullname` at login time).
    pub username: String,
    pub role: Role,
}

/// Signs and verifies identity tokens with the process-wide secret.
/// Tokens carry no expiry; a cookie lives until the client drops it.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl FromRef<AppState> for TokenCodec {
    fn from_ref(state: &AppState) -> Self {
        TokenCodec::new(&state.config.jwt_secret)
    }
}

impl TokenCodec {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(&self, identity: &Identity) -> anyhow::Result<String> {
        let token = encode(&Header::default(), identity, &self.encoding)?;
        debug!(user_id = %identity.sub, "identity token signed");
        Ok(token)
    }

    /// Any failure (bad signature, wrong secret, malformed payload)
    /// collapses into `InvalidToken`.
    pub fn verify(&self, token: &str) -> Result<Identity, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        let data = decode::<Identity>(token, &self.decoding, &validation)
            .map_err(|_| ApiError::InvalidToken("Invalid token".into()))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            sub: Uuid::new_v4(),
            username: "Lia Farmer".into(),
            role,
        }
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let codec = TokenCodec::new("dev-secret");
        let id = identity(Role::Farmer);
        let token = codec.issue(&id).expect("sign");
        let decoded = codec.verify(&token).expect("verify");
        assert_eq!(decoded, id);
    }

    #[test]
    fn verify_rejects_token_signed_with_other_secret() {
        let signer = TokenCodec::new("secret-a");
        let verifier = TokenCodec::new("secret-b");
        let token = signer.issue(&identity(Role::Admin)).expect("sign");
        let err = verifier.verify(&token).unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken(_)));
    }

    #[test]
    fn verify_rejects_malformed_token() {
        let codec = TokenCodec::new("dev-secret");
        for garbage in ["", "not-a-jwt", "a.b", "a.b.c.d"] {
            let err = codec.verify(garbage).unwrap_err();
            assert!(matches!(err, ApiError::InvalidToken(_)));
        }
    }

    #[test]
    fn verify_rejects_tampered_payload() {
        let codec = TokenCodec::new("dev-secret");
        let token = codec.issue(&identity(Role::Farmer)).expect("sign");
        let mut parts: Vec<String> = token.split('.').map(str::to_owned).collect();
        // Corrupt the payload segment without re-signing.
        let replacement = if parts[1].starts_with('A') { "B" } else { "A" };
        parts[1].replace_range(0..1, replacement);
        let tampered = parts.join(".");
        let err = codec.verify(&tampered).unwrap_err();
        assert!(matches!(err, ApiError::InvalidToken(_)));
    }

    #[test]
    fn role_parse_is_case_insensitive_and_closed() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("Admin"), Some(Role::Admin));
        assert_eq!(Role::parse("FARMER"), Some(Role::Farmer));
        assert_eq!(Role::parse("buyer"), None);
    }
}
