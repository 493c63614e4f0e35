//! `carshop-auth`: users and the authentication boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. Token issuance
//! and production-grade password hashing are provided by external collaborators
//! through the [`JwtValidator`] and [`PasswordHasher`] seams.

pub mod claims;
pub mod jwt;
pub mod password;
pub mod user;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use password::{PasswordHasher, SaltedSha256Hasher};
pub use user::{ChangePassword, RegisterUser, User};
