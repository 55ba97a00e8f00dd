//! Checkout validation and order payloads.
//!
//! Both flows validate the form in a fixed order and stop at the first
//! problem, so the visitor always sees a single message. Nothing is sent to
//! the backend until the form is valid.

use origami_core::{Cart, DiscountRate, Email, PaymentMethod};
use serde::Deserialize;
use thiserror::Error;

use crate::api::{ContactPayload, GuestInfo, GuestOrderItem, GuestOrderRequest, OrderItem, OrderRequest};

/// Minimum digits in a guest's phone number.
pub const MIN_PHONE_DIGITS: usize = 10;

/// Why a checkout form was refused. The message is shown as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Nombre completo y correo son obligatorios")]
    MissingContact,
    #[error("Todos los campos son obligatorios")]
    MissingGuestFields,
    #[error("Email inválido")]
    InvalidEmail,
    #[error("La dirección de envío es obligatoria")]
    MissingAddress,
    #[error("Número de teléfono inválido (mínimo 10 dígitos)")]
    InvalidPhone,
    #[error("Selecciona un método de pago válido")]
    InvalidPaymentMethod,
    #[error("Tu carrito está vacío")]
    EmptyCart,
}

/// Checkout form for a logged-in customer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub direccion: String,
    #[serde(default)]
    pub metodo_pago: String,
}

/// Checkout form for a guest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuestCheckoutForm {
    #[serde(default)]
    pub nombre_completo: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub telefono: String,
    #[serde(default)]
    pub direccion: String,
    #[serde(default)]
    pub metodo_pago: String,
}

/// An empty selection means the default method.
fn payment_method(raw: &str) -> Result<PaymentMethod, CheckoutError> {
    if raw.trim().is_empty() {
        return Ok(PaymentMethod::default());
    }
    raw.parse().map_err(|_| CheckoutError::InvalidPaymentMethod)
}

fn ensure_not_empty(cart: &Cart) -> Result<(), CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    Ok(())
}

/// Count the digits in a phone number, ignoring spaces and punctuation.
#[must_use]
pub fn phone_digits(phone: &str) -> usize {
    phone.chars().filter(char::is_ascii_digit).count()
}

impl CheckoutForm {
    /// Prefill the contact fields from the logged-in profile.
    #[must_use]
    pub fn for_user(username: &str, email: &str) -> Self {
        Self {
            nombre: username.to_string(),
            email: email.to_string(),
            ..Self::default()
        }
    }

    /// Validate the form and build the body of `POST /pedidos`.
    ///
    /// # Errors
    ///
    /// Returns the first [`CheckoutError`] in form order.
    pub fn to_order(&self, cart: &Cart) -> Result<OrderRequest, CheckoutError> {
        ensure_not_empty(cart)?;

        let name = self.nombre.trim();
        let email = self.email.trim();
        if name.is_empty() || email.is_empty() {
            return Err(CheckoutError::MissingContact);
        }
        let email = Email::parse(email).map_err(|_| CheckoutError::InvalidEmail)?;
        let address = self.direccion.trim();
        if address.is_empty() {
            return Err(CheckoutError::MissingAddress);
        }
        let metodo_pago = payment_method(&self.metodo_pago)?;

        Ok(OrderRequest {
            contact: ContactPayload {
                name: name.to_string(),
                email: email.into_inner(),
                phone: self.telefono.trim().to_string(),
            },
            items: cart
                .lines()
                .iter()
                .map(|line| OrderItem {
                    producto_id: line.product_id,
                    cantidad: line.quantity,
                })
                .collect(),
            address: address.to_string(),
            metodo_pago,
        })
    }
}

impl GuestCheckoutForm {
    /// Validate the form and build the body of `POST /pedidos/guest`.
    ///
    /// The total is the discounted cart total, as the customer saw it.
    ///
    /// # Errors
    ///
    /// Returns the first [`CheckoutError`] in form order.
    pub fn to_order(
        &self,
        cart: &Cart,
        discount: DiscountRate,
    ) -> Result<GuestOrderRequest, CheckoutError> {
        ensure_not_empty(cart)?;

        let name = self.nombre_completo.trim();
        let email = self.email.trim();
        let phone = self.telefono.trim();
        let address = self.direccion.trim();
        if [name, email, phone, address].iter().any(|field| field.is_empty()) {
            return Err(CheckoutError::MissingGuestFields);
        }
        let email = Email::parse(email).map_err(|_| CheckoutError::InvalidEmail)?;
        if phone_digits(phone) < MIN_PHONE_DIGITS {
            return Err(CheckoutError::InvalidPhone);
        }
        let metodo_pago = payment_method(&self.metodo_pago)?;

        Ok(GuestOrderRequest {
            guest_info: GuestInfo {
                nombre_completo: name.to_string(),
                email: email.into_inner(),
                whatsapp: phone.to_string(),
                direccion: address.to_string(),
                metodo_pago,
            },
            items: cart
                .lines()
                .iter()
                .map(|line| GuestOrderItem {
                    producto_id: line.product_id,
                    nombre: line.name.clone(),
                    precio: line.unit_price.amount(),
                    cantidad: line.quantity,
                })
                .collect(),
            total: cart.total(discount),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::str::FromStr;

    use origami_core::{NewCartLine, Price, ProductId};
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;

    fn cart() -> Cart {
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
        cart.add(
            NewCartLine {
                product_id: ProductId::new(2),
                name: "Rana saltarina".to_string(),
                unit_price: Price::new(Decimal::new(799, 2)),
                image_url: None,
            },
            1,
        );
        cart
    }

    fn checkout_form() -> CheckoutForm {
        CheckoutForm {
            nombre: "Ana Gómez".to_string(),
            email: "ana@papel.co".to_string(),
            telefono: String::new(),
            direccion: "  Calle 10 # 4-21 ".to_string(),
            metodo_pago: "contraentrega".to_string(),
        }
    }

    fn guest_form() -> GuestCheckoutForm {
        GuestCheckoutForm {
            nombre_completo: "Luis Pérez".to_string(),
            email: "luis@correo.com".to_string(),
            telefono: "+57 300 123 4567".to_string(),
            direccion: "Carrera 7 # 12-30".to_string(),
            metodo_pago: String::new(),
        }
    }

    #[test]
    fn authenticated_payload_shape() {
        let order = checkout_form().to_order(&cart()).unwrap();
        assert_eq!(
            serde_json::to_value(&order).unwrap(),
            json!({
                "contacto": {"nombre": "Ana Gómez", "email": "ana@papel.co", "telefono": ""},
                "items": [
                    {"producto_id": 1, "cantidad": 2},
                    {"producto_id": 2, "cantidad": 1}
                ],
                "direccion": "Calle 10 # 4-21",
                "metodo_pago": "contraentrega"
            })
        );
    }

    #[test]
    fn authenticated_validation_order() {
        let mut form = checkout_form();
        form.nombre = String::new();
        form.email = "not-an-email".to_string();
        assert_eq!(form.to_order(&cart()), Err(CheckoutError::MissingContact));

        form.nombre = "Ana".to_string();
        assert_eq!(form.to_order(&cart()), Err(CheckoutError::InvalidEmail));

        form.email = "ana@papel.co".to_string();
        form.direccion = "   ".to_string();
        assert_eq!(form.to_order(&cart()), Err(CheckoutError::MissingAddress));
    }

    #[test]
    fn authenticated_messages() {
        assert_eq!(
            CheckoutError::MissingContact.to_string(),
            "Nombre completo y correo son obligatorios"
        );
        assert_eq!(
            CheckoutError::MissingAddress.to_string(),
            "La dirección de envío es obligatoria"
        );
    }

    #[test]
    fn guest_payload_shape() {
        let rate = DiscountRate::from_str("0.10").unwrap();
        let order = guest_form().to_order(&cart(), rate).unwrap();
        let value = serde_json::to_value(&order).unwrap();

        assert_eq!(
            value["guestInfo"],
            json!({
                "nombreCompleto": "Luis Pérez",
                "email": "luis@correo.com",
                "whatsapp": "+57 300 123 4567",
                "direccion": "Carrera 7 # 12-30",
                "metodoPago": "nequi"
            })
        );
        assert_eq!(
            value["items"][1],
            json!({"producto_id": 2, "nombre": "Rana saltarina", "precio": 7.99, "cantidad": 1})
        );
        // (25.00 + 7.99) * 0.9 = 29.691
        assert_eq!(value["total"], json!(29.69));
        assert_eq!(order.total, Decimal::new(2969, 2));
    }

    #[test]
    fn guest_validation_order() {
        let mut form = guest_form();
        form.direccion = String::new();
        form.email = "bad".to_string();
        assert_eq!(
            form.to_order(&cart(), DiscountRate::ZERO),
            Err(CheckoutError::MissingGuestFields)
        );

        form.direccion = "Carrera 7".to_string();
        assert_eq!(
            form.to_order(&cart(), DiscountRate::ZERO),
            Err(CheckoutError::InvalidEmail)
        );

        form.email = "luis@correo.com".to_string();
        form.telefono = "300-123-456".to_string();
        let err = form.to_order(&cart(), DiscountRate::ZERO).unwrap_err();
        assert_eq!(err.to_string(), "Número de teléfono inválido (mínimo 10 dígitos)");
    }

    #[test]
    fn phone_digits_ignores_punctuation() {
        assert_eq!(phone_digits("(300) 123-4567"), 10);
        assert_eq!(phone_digits("+57 305 4081669"), 12);
        assert_eq!(phone_digits("sin número"), 0);
    }

    #[test]
    fn empty_cart_is_refused() {
        assert_eq!(
            checkout_form().to_order(&Cart::new()),
            Err(CheckoutError::EmptyCart)
        );
        assert_eq!(
            guest_form().to_order(&Cart::new(), DiscountRate::ZERO),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn unknown_payment_method_is_refused() {
        let mut form = checkout_form();
        form.metodo_pago = "bitcoin".to_string();
        assert_eq!(
            form.to_order(&cart()),
            Err(CheckoutError::InvalidPaymentMethod)
        );
    }
}
