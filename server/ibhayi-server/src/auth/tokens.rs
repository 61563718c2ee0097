//! JWT issue/decode (HS256).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// JWT claims carried by every authenticated request.
///
/// `pharmacist_id` / `customer_id` are populated based on the account role so
/// handlers never have to re-resolve the domain row from the user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User account id
    pub sub: String,
    pub role: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pharmacist_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pharmacy_id: Option<Uuid>,
    pub iat: i64,
    pub exp: i64,
}

/// Issue a signed token for an authenticated principal.
pub fn issue_token(
    secret: &str,
    ttl_hours: i64,
    user_id: Uuid,
    role: &str,
    email: &str,
    pharmacist_id: Option<Uuid>,
    customer_id: Option<Uuid>,
    pharmacy_id: Option<Uuid>,
) -> Result<String, ApiError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        email: email.to_string(),
        pharmacist_id,
        customer_id,
        pharmacy_id,
        iat: now.timestamp(),
        exp: (now + Duration::hours(ttl_hours)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))
}

/// Decode and validate a token, returning its claims.
pub fn decode_token(secret: &str, token: &str) -> Result<Claims, ApiError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| ApiError::authentication(format!("Invalid or expired token: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_decode_round_trip() {
        let user_id = Uuid::new_v4();
        let pharmacist_id = Uuid::new_v4();
        let pharmacy_id = Uuid::new_v4();

        let token = issue_token(
            "test-secret",
            8,
            user_id,
            "pharmacist",
            "t.nkosi@ibhayipharmacy.co.za",
            Some(pharmacist_id),
            None,
            Some(pharmacy_id),
        )
        .unwrap();

        let claims = decode_token("test-secret", &token).unwrap();
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, "pharmacist");
        assert_eq!(claims.pharmacist_id, Some(pharmacist_id));
        assert_eq!(claims.pharmacy_id, Some(pharmacy_id));
        assert!(claims.customer_id.is_none());
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(
            "secret-a",
            8,
            Uuid::new_v4(),
            "manager",
            "admin@ibhayipharmacy.co.za",
            None,
            None,
            None,
        )
        .unwrap();

        assert!(decode_token("secret-b", &token).is_err());
    }
}
