//! Authentication context extraction middleware
//!
//! This module provides automatic extraction of authentication context from JWT
//! tokens, so handlers receive a typed principal instead of parsing headers.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::auth::tokens;
use crate::error::ApiError;

/// Account roles recognised by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Manager,
    Pharmacist,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Pharmacist => "pharmacist",
            Role::Customer => "customer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manager" => Ok(Role::Manager),
            "pharmacist" => Ok(Role::Pharmacist),
            "customer" => Ok(Role::Customer),
            other => Err(ApiError::authentication(format!(
                "Unknown account role: {}",
                other
            ))),
        }
    }
}

/// Authentication context extracted from the JWT bearer token.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role: Role,
    pub email: String,
    pub pharmacist_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub pharmacy_id: Option<Uuid>,
}

impl AuthContext {
    /// Build a context from decoded claims.
    pub fn from_claims(claims: tokens::Claims) -> Result<Self, ApiError> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::authentication("Invalid user ID in token"))?;
        let role = claims.role.parse()?;

        Ok(Self {
            user_id,
            role,
            email: claims.email,
            pharmacist_id: claims.pharmacist_id,
            customer_id: claims.customer_id,
            pharmacy_id: claims.pharmacy_id,
        })
    }

    /// Require the manager role.
    pub fn require_manager(&self) -> Result<(), ApiError> {
        self.require_role(Role::Manager)
    }

    /// Require the pharmacist role, returning the pharmacist row id.
    pub fn require_pharmacist(&self) -> Result<Uuid, ApiError> {
        self.require_role(Role::Pharmacist)?;
        self.pharmacist_id
            .ok_or_else(|| ApiError::authorization("Token is missing the pharmacist identity"))
    }

    /// Require the customer role, returning the customer row id.
    pub fn require_customer(&self) -> Result<Uuid, ApiError> {
        self.require_role(Role::Customer)?;
        self.customer_id
            .ok_or_else(|| ApiError::authorization("Token is missing the customer identity"))
    }

    fn require_role(&self, role: Role) -> Result<(), ApiError> {
        if self.role != role {
            return Err(ApiError::authorization(format!(
                "This operation requires the {} role",
                role
            )));
        }
        Ok(())
    }
}

/// Extract and validate the bearer token from the Authorization header
fn extract_token(parts: &Parts) -> Result<String, ApiError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::authentication("Missing Authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| {
            ApiError::authentication(
                "Invalid Authorization header format. Expected: Bearer <token>",
            )
        })
        .map(|s| s.to_string())
}

fn jwt_secret() -> String {
    std::env::var("JWT_SECRET").unwrap_or_else(|_| "change-me-in-production".to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts)?;
        let claims = tokens::decode_token(&jwt_secret(), &token)?;
        AuthContext::from_claims(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_for(role: &str, customer_id: Option<Uuid>) -> tokens::Claims {
        tokens::Claims {
            sub: Uuid::new_v4().to_string(),
            role: role.to_string(),
            email: "user@example.com".to_string(),
            pharmacist_id: None,
            customer_id,
            pharmacy_id: None,
            iat: 0,
            exp: i64::MAX,
        }
    }

    #[test]
    fn role_parse_round_trip() {
        for role in [Role::Manager, Role::Pharmacist, Role::Customer] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn customer_guard_requires_customer_identity() {
        let customer_id = Uuid::new_v4();
        let ctx = AuthContext::from_claims(claims_for("customer", Some(customer_id))).unwrap();
        assert_eq!(ctx.require_customer().unwrap(), customer_id);
        assert!(ctx.require_manager().is_err());

        // Customer token without the customer row id is unusable
        let ctx = AuthContext::from_claims(claims_for("customer", None)).unwrap();
        assert!(ctx.require_customer().is_err());
    }

    #[test]
    fn manager_guard_rejects_other_roles() {
        let ctx = AuthContext::from_claims(claims_for("manager", None)).unwrap();
        assert!(ctx.require_manager().is_ok());
        assert!(ctx.require_pharmacist().is_err());
    }
}
