//! Session-related types.
//!
//! Types stored in the session for authentication state.

use origami_core::{PaymentMethod, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::{AuthToken, UserProfile};

/// Session-stored user identity, copied from `/auth/me` at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<UserProfile> for CurrentUser {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            username: profile.username,
            email: profile.email,
            is_admin: profile.is_admin,
        }
    }
}

/// A logged-in visitor: the bearer token and who it belongs to.
///
/// Stored under one key so the token and profile are always replaced together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedIn {
    pub token: AuthToken,
    pub user: CurrentUser,
}

/// What the confirmation page shows after a successful checkout.
///
/// The cart is cleared before the redirect, so the total is captured here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    /// When the receipt carried one
    pub order_number: Option<String>,
    pub payment_method: PaymentMethod,
    pub message: Option<String>,
    pub address: String,
    pub email: String,
    pub total: Decimal,
}

/// Session keys.
pub mod keys {
    /// Key for the logged-in visitor ([`super::SignedIn`]).
    pub const SIGNED_IN: &str = "signed_in";

    /// Key for the visitor's cart (`origami_core::Cart`).
    pub const CART: &str = "cart";

    /// Key for the loyalty discount rate (`origami_core::DiscountRate`).
    pub const LOYALTY_DISCOUNT: &str = "loyalty_discount";

    /// Key for the last placed order ([`super::OrderConfirmation`]).
    pub const LAST_ORDER: &str = "last_order";
}
