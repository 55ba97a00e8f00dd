//! Shopping cart model.
//!
//! A cart is an ordered list of lines, one per product. Adding a product that
//! is already present increases its quantity instead of appending a second
//! line, and no line ever holds less than one unit. Totals are computed with
//! decimal arithmetic:
//!
//! ```text
//! raw_total = Σ(unit_price × quantity)
//! total     = round2(raw_total × (1 − discount_rate))
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DiscountRate, Price, ProductId, round_money};

/// Most units of one product a line can hold.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// A product snapshot taken when it is put into the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub image_url: Option<String>,
}

/// One product in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub quantity: u32,
}

impl CartLine {
    /// `unit_price × quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.amount() * Decimal::from(self.quantity)
    }
}

/// Totals derived from a cart and a discount rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    /// Undiscounted sum of the lines.
    pub raw: Decimal,
    /// Amount taken off by the discount, `raw - total`.
    pub savings: Decimal,
    /// What the customer pays.
    pub total: Decimal,
}

/// The shopping cart.
///
/// The serialized form is the list of lines. Deserializing re-applies the
/// merge and minimum quantity rules, so a hand-edited or stale session can
/// never produce an invalid cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add `quantity` units of a product.
    ///
    /// If the product is already in the cart its quantity grows and its
    /// position is kept; otherwise a new line is appended. A quantity of
    /// zero counts as one, and a line never exceeds [`MAX_LINE_QUANTITY`].
    pub fn add(&mut self, product: NewCartLine, quantity: u32) {
        let quantity = quantity.clamp(1, MAX_LINE_QUANTITY);
        if let Some(line) = self.line_mut(product.product_id) {
            line.quantity = line
                .quantity
                .saturating_add(quantity)
                .min(MAX_LINE_QUANTITY);
            return;
        }
        self.lines.push(CartLine {
            product_id: product.product_id,
            name: product.name,
            unit_price: product.unit_price,
            image_url: product.image_url,
            quantity,
        });
    }

    /// Set the quantity of a line, kept within `1..=MAX_LINE_QUANTITY`.
    ///
    /// Returns `false` when the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> bool {
        match self.line_mut(product_id) {
            Some(line) => {
                line.quantity = quantity.clamp(1, MAX_LINE_QUANTITY);
                true
            }
            None => false,
        }
    }

    /// Remove a product. Returns whether it was in the cart.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.product_id != product_id);
        self.lines.len() != before
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for a product, if present.
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    /// Undiscounted sum of the lines.
    #[must_use]
    pub fn raw_total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Discounted total rounded to cents.
    #[must_use]
    pub fn total(&self, rate: DiscountRate) -> Decimal {
        round_money(self.raw_total() * rate.multiplier())
    }

    /// Raw total, savings and final total in one pass.
    #[must_use]
    pub fn totals(&self, rate: DiscountRate) -> CartTotals {
        let raw = self.raw_total();
        let total = round_money(raw * rate.multiplier());
        CartTotals {
            raw,
            savings: raw - total,
            total,
        }
    }
}

impl From<Vec<CartLine>> for Cart {
    fn from(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            let quantity = line.quantity;
            cart.add(
                NewCartLine {
                    product_id: line.product_id,
                    name: line.name,
                    unit_price: line.unit_price,
                    image_url: line.image_url,
                },
                quantity,
            );
        }
        cart
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod property_tests {
    use std::collections::HashSet;

    use proptest::prelude::*;
    use rust_decimal::RoundingStrategy;

    use super::*;

    #[derive(Debug, Clone)]
    enum Op {
        Add(i64, u32),
        SetQuantity(i64, u32),
        Remove(i64),
    }

    fn quantity() -> impl Strategy<Value = u32> {
        prop_oneof![0u32..5, 995u32..1005, any::<u32>()]
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (1i64..=4, quantity()).prop_map(|(id, qty)| Op::Add(id, qty)),
            2 => (1i64..=5, quantity()).prop_map(|(id, qty)| Op::SetQuantity(id, qty)),
            1 => (1i64..=5).prop_map(Op::Remove),
        ]
    }

    fn product(id: i64, cents: &[i64]) -> NewCartLine {
        NewCartLine {
            product_id: ProductId::new(id),
            name: format!("Figura {id}"),
            unit_price: Price::new(Decimal::new(cents[usize::try_from(id - 1).unwrap()], 2)),
            image_url: None,
        }
    }

    /// Plain list of `(id, quantity)` kept alongside the cart.
    fn apply(model: &mut Vec<(i64, u32)>, op: &Op) {
        match *op {
            Op::Add(id, qty) => {
                let qty = qty.clamp(1, MAX_LINE_QUANTITY);
                match model.iter_mut().find(|(line_id, _)| *line_id == id) {
                    Some((_, current)) => {
                        let sum = u64::from(*current) + u64::from(qty);
                        *current = u32::try_from(sum.min(u64::from(MAX_LINE_QUANTITY))).unwrap();
                    }
                    None => model.push((id, qty)),
                }
            }
            Op::SetQuantity(id, qty) => {
                if let Some((_, current)) = model.iter_mut().find(|(line_id, _)| *line_id == id) {
                    *current = qty.clamp(1, MAX_LINE_QUANTITY);
                }
            }
            Op::Remove(id) => model.retain(|(line_id, _)| *line_id != id),
        }
    }

    proptest! {
        #[test]
        fn test_cart_matches_model(
            cents in proptest::collection::vec(1i64..100_000, 4),
            ops in proptest::collection::vec(op(), 0..40),
            percent in 0i64..=100,
        ) {
            let mut cart = Cart::new();
            let mut model = Vec::new();

            for op in &ops {
                match *op {
                    Op::Add(id, qty) => cart.add(product(id, &cents), qty),
                    Op::SetQuantity(id, qty) => {
                        let present = cart.line(ProductId::new(id)).is_some();
                        prop_assert_eq!(cart.set_quantity(ProductId::new(id), qty), present);
                    }
                    Op::Remove(id) => {
                        let present = cart.line(ProductId::new(id)).is_some();
                        prop_assert_eq!(cart.remove(ProductId::new(id)), present);
                    }
                }
                apply(&mut model, op);

                let ids: HashSet<_> = cart.lines().iter().map(|line| line.product_id).collect();
                prop_assert_eq!(ids.len(), cart.lines().len());
                for line in cart.lines() {
                    prop_assert!((1..=MAX_LINE_QUANTITY).contains(&line.quantity));
                }
                let lines: Vec<_> = cart
                    .lines()
                    .iter()
                    .map(|line| (line.product_id.as_i64(), line.quantity))
                    .collect();
                prop_assert_eq!(&lines, &model);
            }

            let raw_cents: i64 = model
                .iter()
                .map(|&(id, qty)| cents[usize::try_from(id - 1).unwrap()] * i64::from(qty))
                .sum();
            let raw = Decimal::new(raw_cents, 2);
            let rate = Decimal::new(percent, 2);
            let expected = (raw - raw * rate)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

            let discount = DiscountRate::new(rate).unwrap();
            prop_assert_eq!(cart.raw_total(), raw);
            prop_assert_eq!(cart.total(discount), expected);
            let totals = cart.totals(discount);
            prop_assert_eq!(totals.raw - totals.savings, totals.total);
        }

        #[test]
        fn test_deserialize_restores_invariants(
            lines in proptest::collection::vec((1i64..=4, any::<u32>()), 0..20),
        ) {
            let json: Vec<_> = lines
                .iter()
                .map(|&(id, qty)| serde_json::json!({
                    "product_id": id,
                    "name": format!("Figura {id}"),
                    "unit_price": "1.00",
                    "quantity": qty,
                }))
                .collect();
            let cart: Cart = serde_json::from_value(serde_json::Value::Array(json)).unwrap();

            let mut model = Vec::new();
            for &(id, qty) in &lines {
                apply(&mut model, &Op::Add(id, qty));
            }
            let restored: Vec<_> = cart
                .lines()
                .iter()
                .map(|line| (line.product_id.as_i64(), line.quantity))
                .collect();
            prop_assert_eq!(restored, model);
        }
    }
}
