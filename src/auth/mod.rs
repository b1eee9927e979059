/// Authentication module
///
/// Password hashing, token issuing and verification, and the auth service
/// that ties them to the credential store.

mod claims;
pub mod domain;
pub mod jwt;
pub mod password;
mod service;

pub use claims::{Claims, Identity};
pub use jwt::{
    generate_access_token, generate_refresh_token, validate_access_token, validate_refresh_token,
    TokenKind,
};
pub use password::{hash_password, verify_password};
pub use service::AuthService;
