//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Token minting (login service, gateway-cli):
//!     subject/email/role/kind → codec.rs (sign HS512) → opaque bearer token
//!
//! Request authentication (middleware/auth.rs):
//!     Authorization: Bearer <token>
//!     → codec.rs (verify signature, structure, expiry)
//!     → AuthClaims → identity headers for downstream
//! ```
//!
//! # Design Decisions
//! - Tokens are self-contained; validation is pure and synchronous
//! - The shared secret never appears inside a token
//! - Expiry is enforced with zero leeway (a past exp always fails)

pub mod claims;
pub mod codec;

pub use claims::{AuthClaims, TokenKind};
pub use codec::{AuthError, TokenCodec};
