//! `lostfound-auth`: authentication/authorization boundary.
//!
//! Token issuance and verification, the role gate, user accounts and password
//! hashing. Decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{AuthzError, require_permission, require_role};
pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use password::{Argon2Hasher, PasswordError, PasswordHasher};
pub use argon2::Params as Argon2Params;
pub use permissions::{Permission, permissions_for_role};
pub use principal::Subject;
pub use roles::Role;
pub use token::{DEFAULT_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS, TokenError, TokenService, TokenVerifier};
pub use user::{NewAccount, UserAccount, UserProfile, normalize_email, validate_email, validate_password};
