pub mod claims;
pub mod extractors;
pub mod guards;
pub mod middleware;

pub use claims::{AuthUser, Claims};

use chrono::{Duration, Utc};
use db::models::user::UserRole;
use jsonwebtoken::{EncodingKey, Header, encode};
use util::config;

/// Issues a signed token and its expiry timestamp (RFC 3339).
///
/// Tokens are normally minted by the external identity service; this helper
/// exists for tooling and tests that need to act as a given user.
pub fn generate_jwt(
    user_id: &str,
    role: UserRole,
) -> Result<(String, String), jsonwebtoken::errors::Error> {
    let minutes = i64::try_from(config::jwt_duration_minutes()).unwrap_or(i64::MAX / 60_000);
    let expiry = Utc::now() + Duration::minutes(minutes);

    let claims = Claims {
        sub: user_id.to_owned(),
        exp: expiry.timestamp() as usize,
        role,
        username: None,
        email: None,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config::jwt_secret().as_bytes()),
    )?;

    Ok((token, expiry.to_rfc3339()))
}
