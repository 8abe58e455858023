//! Identity domain types for copper-lantern.
//!
//! This crate provides:
//! - The authenticated user's profile (`UserInfo`)
//! - The token triple acquired from the identity provider (`TokenSet`)
//! - The pairing of both that defines "logged in" (`Session`)
//! - Identity-token claims decoding (`decode_identity_claims`)
//!
//! # Session Model
//!
//! A session exists if and only if both an access token and a user record
//! are held; one without the other is treated as logged out. Token sets are
//! replaced wholesale on every acquisition and never partially mutated.
//!
//! # Example
//!
//! ```
//! use copper_lantern_identity::{Session, TokenSet, UserInfo};
//!
//! let user = UserInfo::new("auth0|123456".to_string())
//!     .with_email(Some("alice@example.com".to_string()));
//! let tokens = TokenSet::new("access".to_string(), "id".to_string())
//!     .with_refresh_token(Some("refresh".to_string()));
//!
//! let session = Session::new(tokens, user);
//! assert_eq!(session.user().subject(), "auth0|123456");
//! assert_eq!(session.tokens().refresh_token(), Some("refresh"));
//! ```

pub mod claims;
pub mod token;
pub mod user;

// Re-export main types at crate root
pub use claims::{ClaimsError, decode_identity_claims};
pub use token::{Session, TokenSet};
pub use user::UserInfo;
