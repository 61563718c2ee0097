//! Authentication primitives: Argon2id password hashing and JWT tokens.

pub mod password;
pub mod tokens;

pub use password::{hash_password, validate_password_strength, verify_password};
pub use tokens::{decode_token, issue_token, Claims};
