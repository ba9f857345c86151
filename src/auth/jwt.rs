use crate::models::Claims;
use jsonwebtoken::{DecodingKey, Validation, decode};

/// Tokens are issued by the external identity service; this side only
/// verifies them.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}
