//! Session-backed cart.
//!
//! The cart and the loyalty discount are stored as two session values so a
//! change of discount never rewrites the cart. Every mutation loads the cart,
//! applies the change to the [`Cart`] model and writes it back.

use axum::{extract::FromRequestParts, http::StatusCode, http::request::Parts};
use origami_core::{Cart, CartTotals, DiscountRate};
use tower_sessions::Session;

use crate::models::session_keys;

/// The visitor's cart and discount, as read from the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartSnapshot {
    pub cart: Cart,
    pub discount: DiscountRate,
}

impl CartSnapshot {
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        self.cart.totals(self.discount)
    }
}

/// Handle on the cart stored in the visitor's session.
#[derive(Debug, Clone)]
pub struct CartSession {
    session: Session,
}

impl CartSession {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }

    /// The stored cart, empty when the visitor has none.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn cart(&self) -> Result<Cart, tower_sessions::session::Error> {
        Ok(self
            .session
            .get::<Cart>(session_keys::CART)
            .await?
            .unwrap_or_default())
    }

    /// The visitor's loyalty discount, zero when none was granted.
    ///
    /// A stored value that no longer parses is treated as no discount.
    pub async fn discount(&self) -> DiscountRate {
        match self
            .session
            .get::<DiscountRate>(session_keys::LOYALTY_DISCOUNT)
            .await
        {
            Ok(rate) => rate.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable loyalty discount");
                DiscountRate::ZERO
            }
        }
    }

    /// Cart and discount together.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn snapshot(&self) -> Result<CartSnapshot, tower_sessions::session::Error> {
        Ok(CartSnapshot {
            cart: self.cart().await?,
            discount: self.discount().await,
        })
    }

    /// Apply `change` to the stored cart and save it.
    ///
    /// Returns the updated cart and whatever `change` returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read or written.
    pub async fn update<R>(
        &self,
        change: impl FnOnce(&mut Cart) -> R,
    ) -> Result<(Cart, R), tower_sessions::session::Error> {
        let mut cart = self.cart().await?;
        let result = change(&mut cart);
        self.session.insert(session_keys::CART, &cart).await?;
        Ok((cart, result))
    }

    /// Empty the cart after an order went through.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn clear(&self) -> Result<(), tower_sessions::session::Error> {
        self.session.remove::<Cart>(session_keys::CART).await?;
        Ok(())
    }

    /// Grant a loyalty discount; cart totals reflect it immediately.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub async fn set_discount(&self, rate: DiscountRate) -> Result<(), tower_sessions::session::Error> {
        self.session
            .insert(session_keys::LOYALTY_DISCOUNT, rate)
            .await
    }
}

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(Self::new)
            .ok_or((
                StatusCode::INTERNAL_SERVER_ERROR,
                "session layer is not installed",
            ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use origami_core::{NewCartLine, Price, ProductId};
    use rust_decimal::Decimal;
    use tower_sessions::MemoryStore;

    use super::*;

    fn cart_session() -> CartSession {
        let store = Arc::new(MemoryStore::default());
        CartSession::new(Session::new(None, store, None))
    }

    fn grulla() -> NewCartLine {
        NewCartLine {
            product_id: ProductId::new(1),
            name: "Grulla".to_string(),
            unit_price: Price::new(Decimal::new(1250, 2)),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn empty_session_has_empty_cart_and_no_discount() {
        let carts = cart_session();
        let snapshot = carts.snapshot().await.unwrap();
        assert!(snapshot.cart.is_empty());
        assert!(snapshot.discount.is_zero());
    }

    #[tokio::test]
    async fn updates_are_persisted() {
        let carts = cart_session();
        carts.update(|cart| cart.add(grulla(), 1)).await.unwrap();
        let (cart, ()) = carts.update(|cart| cart.add(grulla(), 2)).await.unwrap();
        assert_eq!(cart.item_count(), 3);
        assert_eq!(carts.cart().await.unwrap().lines().len(), 1);
    }

    #[tokio::test]
    async fn discount_applies_to_stored_cart() {
        let carts = cart_session();
        carts.update(|cart| cart.add(grulla(), 2)).await.unwrap();
        carts
            .set_discount(DiscountRate::from_str("0.10").unwrap())
            .await
            .unwrap();

        let totals = carts.snapshot().await.unwrap().totals();
        assert_eq!(totals.raw, Decimal::new(2500, 2));
        assert_eq!(totals.total, Decimal::new(2250, 2));
    }

    #[tokio::test]
    async fn clear_keeps_discount() {
        let carts = cart_session();
        carts.update(|cart| cart.add(grulla(), 1)).await.unwrap();
        carts
            .set_discount(DiscountRate::from_str("0.10").unwrap())
            .await
            .unwrap();
        carts.clear().await.unwrap();

        let snapshot = carts.snapshot().await.unwrap();
        assert!(snapshot.cart.is_empty());
        assert!(!snapshot.discount.is_zero());
    }
}
