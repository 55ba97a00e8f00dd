//! Per-visitor data kept in the session.
//!
//! The backend owns products, orders and accounts. What the storefront keeps
//! is the visitor's cart, loyalty discount and, once logged in, their bearer
//! token and profile.

pub mod session;

pub use session::{CurrentUser, OrderConfirmation, SignedIn, keys as session_keys};
