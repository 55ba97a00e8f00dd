//! Business logic for storefront.
//!
//! # Services
//!
//! - `cart` - Session-backed cart and loyalty discount
//! - `checkout` - Checkout validation and order payloads for both flows
//! - `custom_order` - Custom order form and reference image encoding
//! - `account` - Login and registration forms
//! - `loyalty` - Loyalty enrollment form
//! - `admin` - Back-office product, quote, category and status forms
//!
//! Services never talk to the backend themselves; route handlers pass what
//! they build to [`crate::api::BackendClient`].

pub mod account;
pub mod admin;
pub mod cart;
pub mod checkout;
pub mod custom_order;
pub mod loyalty;

pub use cart::{CartSession, CartSnapshot};
