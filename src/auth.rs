use axum::{
    extract::{FromRef, FromRequestParts, Request},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    models::User,
    repository::{ROLE_ADMIN, RepositoryState},
};

/// Name of the cookie browsers may carry the token in.
pub const TOKEN_COOKIE: &str = "token";

/// Claims
///
/// Payload of every issued token. The role is signed into the token, so the
/// admin guard does not need a database round trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject: the user's id.
    pub sub: Uuid,
    pub name: String,
    pub role: String,
    /// Issued at (unix seconds).
    pub iat: usize,
    /// Expiration (unix seconds). Checked on every decode.
    pub exp: usize,
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub name: String,
    /// Role claim from the token (or the stored role for the local bypass).
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

/// issue_token
///
/// Signs an HS256 token for `user` valid for `ttl`.
pub fn issue_token(user: &User, secret: &str, ttl: chrono::Duration) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user.id,
        name: user.name.clone(),
        role: user.role.clone(),
        iat: now.timestamp().max(0) as usize,
        exp: (now + ttl).timestamp().max(0) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!("failed to sign token: {:?}", e);
        ApiError::Internal("could not issue token".to_string())
    })
}

/// decode_token
///
/// Verifies signature and expiry and returns the claims.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
}

/// Reads the token from `Authorization: Bearer`, falling back to the `token` cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == TOKEN_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// hash_password
///
/// bcrypt is CPU bound, so it runs on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| {
            tracing::error!("bcrypt hash failed: {:?}", e);
            ApiError::Internal("could not hash password".to_string())
        })
}

/// verify_password
///
/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("verification task failed: {e}")))?;

    Ok(verified.unwrap_or_else(|e| {
        tracing::warn!("stored password hash is unreadable: {:?}", e);
        false
    }))
}

/// validate_name
///
/// Returns the trimmed name: 2 to 20 characters of ASCII letters, digits, `_`
/// or CJK ideographs (U+4E00..=U+9FA5).
pub fn validate_name(name: &str) -> Result<String, ApiError> {
    let name = name.trim();
    let len = name.chars().count();
    if !(2..=20).contains(&len) {
        return Err(ApiError::bad_request("name must be 2-20 characters long"));
    }
    let allowed =
        |c: char| c.is_ascii_alphanumeric() || c == '_' || ('\u{4e00}'..='\u{9fa5}').contains(&c);
    if !name.chars().all(allowed) {
        return Err(ApiError::bad_request(
            "name may only contain letters, digits, '_' and Chinese characters",
        ));
    }
    Ok(name.to_string())
}

pub fn validate_password(password: &str) -> Result<(), ApiError> {
    let len = password.chars().count();
    if !(6..=50).contains(&len) {
        return Err(ApiError::bad_request("password must be 6-50 characters long"));
    }
    Ok(())
}

/// AuthUser Extractor Implementation
///
/// 1. Local bypass: in `Env::Local` an `x-user-id` header naming an existing user
///    authenticates the request with the stored role.
/// 2. Token: bearer header or `token` cookie, decoded and expiry-checked.
/// 3. DB lookup: the subject must still exist, so deleted users lose access
///    immediately.
///
/// Rejection: `ApiError::Unauthorized` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let bypass_id = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| Uuid::parse_str(value).ok());
            if let Some(user_id) = bypass_id {
                if let Some(user) = repo.get_user(user_id).await? {
                    return Ok(AuthUser {
                        id: user.id,
                        name: user.name,
                        role: user.role,
                    });
                }
            }
        }

        let token = token_from_headers(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))?;

        let claims = decode_token(&token, &config.jwt_secret).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => ApiError::Unauthorized("token expired".to_string()),
            _ => ApiError::Unauthorized("invalid token".to_string()),
        })?;

        let user = repo
            .get_user(claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("user no longer exists".to_string()))?;

        Ok(AuthUser {
            id: user.id,
            name: user.name,
            role: claims.role,
        })
    }
}

/// auth_middleware
///
/// Guards the authenticated routes: the `AuthUser` extractor rejects with 401
/// before the handler runs.
pub async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// admin_middleware
///
/// Guards `/api/admin`: 401 without an identity, 403 when the role is not admin.
pub async fn admin_middleware(
    auth_user: AuthUser,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !auth_user.is_admin() {
        tracing::warn!(user_id = %auth_user.id, "non-admin request to admin route");
        return Err(ApiError::Forbidden("admin access required".to_string()));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(role: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "alice".to_string(),
            role: role.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_carries_role_claim() {
        let admin = user(ROLE_ADMIN);
        let token = issue_token(&admin, "secret", chrono::Duration::hours(1)).unwrap();
        let claims = decode_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, admin.id);
        assert_eq!(claims.role, "admin");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_with_wrong_secret_is_rejected() {
        let token = issue_token(&user("user"), "secret", chrono::Duration::hours(1)).unwrap();
        assert!(decode_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token(&user("user"), "secret", chrono::Duration::hours(-2)).unwrap();
        let err = decode_token(&token, "secret").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        headers.insert(header::COOKIE, HeaderValue::from_static("token=xyz"));
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc"));
    }

    #[test]
    fn token_cookie_is_used_as_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; token=xyz; lang=en"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("xyz"));
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn names_follow_charset_and_length_rules() {
        assert_eq!(validate_name("  bob_1 ").unwrap(), "bob_1");
        assert_eq!(validate_name("张三").unwrap(), "张三");
        assert!(validate_name("a").is_err());
        assert!(validate_name("has space").is_err());
        assert!(validate_name("emoji🙂").is_err());
        assert!(validate_name(&"x".repeat(21)).is_err());
    }

    #[test]
    fn passwords_are_length_checked() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert!(validate_password(&"p".repeat(51)).is_err());
    }

    #[tokio::test]
    async fn hashed_password_verifies() {
        let hash = hash_password("hunter22".to_string(), 4).await.unwrap();
        assert!(verify_password("hunter22".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".to_string(), hash).await.unwrap());
        assert!(!verify_password("x".to_string(), "not-a-hash".to_string()).await.unwrap());
    }
}
