//! Core types for the Origami storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod discount;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use discount::{DiscountRate, DiscountRateError};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{Price, PriceError, round_money};
pub use status::*;
