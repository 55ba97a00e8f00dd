//! Display data for templates.
//!
//! Templates never format money or read session types directly; handlers
//! convert into these structs first.

use axum::{extract::FromRequestParts, http::request::Parts};
use origami_core::{Cart, DiscountRate, MAX_LINE_QUANTITY, OrderStatus};
use rust_decimal::Decimal;
use tower_sessions::Session;

use crate::api::{Order, Product};
use crate::middleware::{CspNonce, is_htmx};
use crate::models::{CurrentUser, SignedIn, session_keys};
use crate::services::CartSnapshot;

/// `$` with thousands separators and two decimals, halves rounded away from zero.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    let rounded = origami_core::round_money(amount);
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents}")
}

// =============================================================================
// Page chrome
// =============================================================================

/// What every full page needs for its header: the CSP nonce, who is logged
/// in and how many items are in the cart.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub nonce: String,
    pub user: Option<CurrentUser>,
    pub cart_count: u64,
    pub htmx: bool,
}

impl PageContext {
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|user| user.is_admin)
    }

    #[must_use]
    pub fn username(&self) -> &str {
        self.user.as_ref().map_or("", |user| user.username.as_str())
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let CspNonce(nonce) = CspNonce::from_request_parts(parts, state).await?;
        let htmx = is_htmx(&parts.headers);

        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self {
                nonce,
                htmx,
                ..Self::default()
            });
        };

        let user = session
            .get::<SignedIn>(session_keys::SIGNED_IN)
            .await
            .ok()
            .flatten()
            .map(|signed_in| signed_in.user);
        let cart_count = session
            .get::<Cart>(session_keys::CART)
            .await
            .ok()
            .flatten()
            .map_or(0, |cart| cart.item_count());

        Ok(Self {
            nonce,
            user,
            cart_count,
            htmx,
        })
    }
}

// =============================================================================
// Catalogue
// =============================================================================

/// A product card.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: String,
    pub image_url: Option<String>,
    pub category: String,
    pub stock: i64,
    pub in_stock: bool,
    pub details: Vec<(&'static str, String)>,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        let details = [
            ("Color", &product.color),
            ("Tamaño", &product.size),
            ("Material", &product.material),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.clone().map(|value| (label, value)))
        .collect();

        Self {
            id: product.id.as_i64(),
            name: product.name.clone(),
            description: product.description.clone().unwrap_or_default(),
            price: format_money(product.price.amount()),
            image_url: product.imagen_url.clone(),
            category: product.category.clone().unwrap_or_default(),
            stock: product.stock,
            in_stock: product.in_stock(),
            details,
        }
    }
}

// =============================================================================
// Cart
// =============================================================================

/// Cart line display data.
#[derive(Debug, Clone)]
pub struct CartLineView {
    pub product_id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub quantity: u32,
    /// Quantity posted by the "−" button
    pub decrement: u32,
    /// Quantity posted by the "+" button
    pub increment: u32,
    pub at_max: bool,
    pub unit_price: String,
    pub line_total: String,
}

/// Cart display data.
#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub item_count: u64,
    pub raw_total: String,
    pub savings: String,
    pub total: String,
    /// `10%` when a loyalty discount applies
    pub discount: Option<String>,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl From<&CartSnapshot> for CartView {
    fn from(snapshot: &CartSnapshot) -> Self {
        Self::new(&snapshot.cart, snapshot.discount)
    }
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, discount: DiscountRate) -> Self {
        let totals = cart.totals(discount);
        Self {
            lines: cart
                .lines()
                .iter()
                .map(|line| CartLineView {
                    product_id: line.product_id.as_i64(),
                    name: line.name.clone(),
                    image_url: line.image_url.clone(),
                    quantity: line.quantity,
                    decrement: line.quantity.saturating_sub(1).max(1),
                    increment: line.quantity.saturating_add(1).min(MAX_LINE_QUANTITY),
                    at_max: line.quantity >= MAX_LINE_QUANTITY,
                    unit_price: format_money(line.unit_price.amount()),
                    line_total: format_money(line.line_total()),
                })
                .collect(),
            item_count: cart.item_count(),
            raw_total: format_money(totals.raw),
            savings: format_money(totals.savings),
            total: format_money(totals.total),
            discount: (!discount.is_zero()).then(|| discount.to_string()),
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Order line display data.
#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub name: String,
    pub quantity: u32,
    pub unit_price: String,
}

/// Order display data, for the customer's list and the back-office.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub number: String,
    /// Status as the backend spells it, for the status select
    pub status: String,
    pub status_label: String,
    pub total: Option<String>,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub address: String,
    pub payment: String,
    pub created_at: String,
    pub lines: Vec<OrderLineView>,
    pub is_custom: bool,
    pub description: String,
    pub reference_image: Option<String>,
    pub custom_name: String,
    pub custom_price: String,
    pub seller_comment: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        let payment = order
            .metodo_pago
            .as_deref()
            .map(|raw| {
                raw.parse::<origami_core::PaymentMethod>()
                    .map_or_else(|_| raw.to_string(), |method| method.label().to_string())
            })
            .unwrap_or_default();

        Self {
            number: order.id.to_string(),
            status: order.status().map_or_else(String::new, |s| s.label().to_string()),
            status_label: order.status_label(),
            total: order.total.map(|total| format_money(total.amount())),
            contact_name: order.contact_name().unwrap_or_default().to_string(),
            contact_email: order.contact_email().unwrap_or_default().to_string(),
            contact_phone: order.contact_phone().unwrap_or_default().to_string(),
            address: order.address.clone().unwrap_or_default(),
            payment,
            created_at: order
                .created_at
                .as_deref()
                .map(|raw| raw.split('T').next().unwrap_or(raw).to_string())
                .unwrap_or_default(),
            lines: order
                .items
                .iter()
                .map(|line| OrderLineView {
                    name: line
                        .product_name
                        .clone()
                        .unwrap_or_else(|| "Producto".to_string()),
                    quantity: line.quantity,
                    unit_price: line
                        .unit_price
                        .map(|price| format_money(price.amount()))
                        .unwrap_or_default(),
                })
                .collect(),
            is_custom: order.is_custom(),
            description: order.description.clone().unwrap_or_default(),
            reference_image: order
                .imagen_referencia
                .clone()
                .filter(|image| !image.is_empty()),
            custom_name: order.nombre_personalizado.clone().unwrap_or_default(),
            custom_price: order
                .precio_personalizado
                .map(|price| price.amount().normalize().to_string())
                .unwrap_or_default(),
            seller_comment: order.comentario_vendedor.clone().unwrap_or_default(),
        }
    }
}

/// Status choices for the back-office select, `(label, selected)`.
#[must_use]
pub fn status_options(current: &str) -> Vec<(&'static str, bool)> {
    OrderStatus::ALL
        .iter()
        .map(|status| (status.label(), status.label() == current))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use origami_core::{NewCartLine, Price, ProductId};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(1250, 2)), "$12.50");
        assert_eq!(format_money(Decimal::new(45000, 0)), "$45,000.00");
        assert_eq!(format_money(Decimal::new(1_234_567_891, 3)), "$1,234,567.89");
        assert_eq!(format_money(Decimal::new(29_691, 3)), "$29.69");
        assert_eq!(format_money(Decimal::new(5, 3)), "$0.01");
        assert_eq!(format_money(Decimal::ZERO), "$0.00");
        assert_eq!(format_money(Decimal::new(-300, 2)), "-$3.00");
    }

    #[test]
    fn cart_view_shows_discount() {
        let mut cart = Cart::new();
        cart.add(
            NewCartLine {
                product_id: ProductId::new(1),
                name: "Grulla".to_string(),
                unit_price: Price::new(Decimal::new(1250, 2)),
                image_url: None,
            },
            2,
        );
        let rate: DiscountRate = "0.1".parse().unwrap();
        let view = CartView::new(&cart, rate);
        assert_eq!(view.raw_total, "$25.00");
        assert_eq!(view.savings, "$2.50");
        assert_eq!(view.total, "$22.50");
        assert_eq!(view.discount.as_deref(), Some("10%"));
        assert_eq!(view.lines[0].line_total, "$25.00");

        let view = CartView::new(&cart, DiscountRate::ZERO);
        assert!(view.discount.is_none());
    }

    #[test]
    fn cart_view_step_buttons_stay_in_range() {
        let mut cart = Cart::new();
        cart.add(
            NewCartLine {
                product_id: ProductId::new(1),
                name: "Grulla".to_string(),
                unit_price: Price::new(Decimal::new(1250, 2)),
                image_url: None,
            },
            1,
        );
        let view = CartView::new(&cart, DiscountRate::ZERO);
        assert_eq!(view.lines[0].decrement, 1);
        assert_eq!(view.lines[0].increment, 2);
        assert!(!view.lines[0].at_max);

        cart.set_quantity(ProductId::new(1), u32::MAX);
        let view = CartView::new(&cart, DiscountRate::ZERO);
        assert_eq!(view.lines[0].quantity, MAX_LINE_QUANTITY);
        assert_eq!(view.lines[0].increment, MAX_LINE_QUANTITY);
        assert_eq!(view.lines[0].decrement, MAX_LINE_QUANTITY - 1);
        assert!(view.lines[0].at_max);
    }

    #[test]
    fn order_view_merges_contact_shapes() {
        let order: Order = serde_json::from_value(json!({
            "id": "GUEST-7F3A",
            "estado": "en_proceso",
            "total": 25.0,
            "contacto_email": "luis@correo.com",
            "metodo_pago": "contraentrega",
            "created_at": "2026-09-01T10:30:00",
            "items": [{"producto_nombre": "Grulla", "cantidad": 2, "precio_unitario": 12.5}]
        }))
        .unwrap();
        let view = OrderView::from(&order);
        assert_eq!(view.number, "GUEST-7F3A");
        assert_eq!(view.status, "En Proceso");
        assert_eq!(view.contact_email, "luis@correo.com");
        assert_eq!(view.payment, "Contraentrega");
        assert_eq!(view.created_at, "2026-09-01");
        assert_eq!(view.lines[0].unit_price, "$12.50");
        assert_eq!(view.total.as_deref(), Some("$25.00"));
    }

    #[test]
    fn status_options_mark_current() {
        let options = status_options("Enviado");
        assert_eq!(options.len(), 5);
        assert!(options.iter().any(|(label, selected)| *label == "Enviado" && *selected));
        assert_eq!(options.iter().filter(|(_, selected)| *selected).count(), 1);
    }
}
