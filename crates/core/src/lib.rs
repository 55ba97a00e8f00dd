//! Origami Core - Domain types for the Origami storefront.
//!
//! This crate provides the types shared by the storefront server, the CLI and
//! the integration tests:
//! - identifiers and order numbers returned by the shop backend
//! - email shape checks used by the checkout forms
//! - prices, discount rates, order statuses and payment methods
//! - the [`Cart`] model and its discounted total
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no session storage. The storefront decides where a cart lives;
//! this crate decides what a cart means.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, and statuses
//! - [`cart`] - Cart lines, merge-on-add, and total computation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartLine, CartTotals, MAX_LINE_QUANTITY, NewCartLine};
pub use types::*;
