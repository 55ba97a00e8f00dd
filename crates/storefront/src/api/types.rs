//! Request and response bodies exchanged with the shop backend.
//!
//! Field names on the wire are Spanish; Rust names are English with serde
//! renames. Money goes out as JSON numbers and comes back as numbers, but is
//! held as `Decimal` in between.

use origami_core::{
    CategoryId, MembershipId, OrderKind, OrderNumber, OrderStatus, PaymentMethod, Price,
    ProductId, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Auth
// =============================================================================

/// Body of a successful `/auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Body sent to `/auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// The authenticated user, from `/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

// =============================================================================
// Catalogue
// =============================================================================

/// A product as listed by `/productos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(rename = "precio")]
    pub price: Price,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(rename = "tamano", default)]
    pub size: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub imagen_url: Option<String>,
    #[serde(rename = "activo", default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub stock: i64,
    #[serde(rename = "categoria", default)]
    pub category: Option<String>,
}

const fn default_active() -> bool {
    true
}

impl Product {
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Body sent to create or update a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDraft {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "precio", with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub color: Option<String>,
    #[serde(rename = "tamano")]
    pub size: Option<String>,
    pub material: Option<String>,
    pub imagen_url: Option<String>,
    #[serde(rename = "activo")]
    pub active: bool,
    pub stock: i64,
    #[serde(rename = "categoria")]
    pub category: Option<String>,
}

impl From<&Product> for ProductDraft {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price.amount(),
            color: product.color.clone(),
            size: product.size.clone(),
            material: product.material.clone(),
            imagen_url: product.imagen_url.clone(),
            active: product.active,
            stock: product.stock,
            category: product.category.clone(),
        }
    }
}

/// Either a bare list of products or a paged envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ProductListing {
    Bare(Vec<Product>),
    Paged {
        data: Vec<Product>,
        #[serde(default)]
        total: Option<u64>,
    },
}

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub slug: String,
    #[serde(rename = "nombre")]
    pub name: String,
}

/// Body sent to create a category.
#[derive(Debug, Clone, Serialize)]
pub struct NewCategory {
    pub slug: String,
    #[serde(rename = "nombre")]
    pub name: String,
}

// =============================================================================
// Orders
// =============================================================================

/// Contact details as sent with standard and custom orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
}

/// One line of an authenticated order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderItem {
    pub producto_id: ProductId,
    pub cantidad: u32,
}

/// Body of `POST /pedidos`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderRequest {
    #[serde(rename = "contacto")]
    pub contact: ContactPayload,
    pub items: Vec<OrderItem>,
    #[serde(rename = "direccion")]
    pub address: String,
    pub metodo_pago: PaymentMethod,
}

/// Contact block of an outgoing order. The phone is always present, empty
/// when the customer left it blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactPayload {
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(rename = "telefono")]
    pub phone: String,
}

/// Customer block of a guest order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestInfo {
    pub nombre_completo: String,
    pub email: String,
    pub whatsapp: String,
    pub direccion: String,
    pub metodo_pago: PaymentMethod,
}

/// One line of a guest order, with the name and price the customer saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuestOrderItem {
    pub producto_id: ProductId,
    pub nombre: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub precio: Decimal,
    pub cantidad: u32,
}

/// Body of `POST /pedidos/guest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuestOrderRequest {
    #[serde(rename = "guestInfo")]
    pub guest_info: GuestInfo,
    pub items: Vec<GuestOrderItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
}

/// Body of `POST /pedidos/personalizado`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomOrderRequest {
    #[serde(rename = "descripcion")]
    pub description: String,
    /// Reference image as a `data:` URL
    pub imagen_referencia: Option<String>,
    #[serde(rename = "contacto")]
    pub contact: ContactPayload,
}

/// What the backend answers after creating an order.
///
/// Each endpoint names the id differently, so all spellings are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderReceipt {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    order_id: Option<OrderNumber>,
    #[serde(default)]
    pedido_id: Option<OrderNumber>,
    #[serde(default)]
    id: Option<OrderNumber>,
    #[serde(default)]
    pub message: Option<String>,
}

impl OrderReceipt {
    /// The order number, whichever field carried it.
    #[must_use]
    pub fn order_number(&self) -> Option<&OrderNumber> {
        self.order_id
            .as_ref()
            .or(self.pedido_id.as_ref())
            .or(self.id.as_ref())
    }
}

/// A line of a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderLine {
    #[serde(rename = "producto_nombre", default)]
    pub product_name: Option<String>,
    #[serde(rename = "cantidad", default = "default_quantity")]
    pub quantity: u32,
    #[serde(rename = "precio_unitario", default)]
    pub unit_price: Option<Price>,
}

const fn default_quantity() -> u32 {
    1
}

/// A placed order.
///
/// The customer endpoint nests the contact under `contacto`, the admin
/// endpoint returns flat `contacto_*` columns; both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Order {
    pub id: OrderNumber,
    #[serde(rename = "estado", default)]
    status: Option<String>,
    #[serde(rename = "tipo", default)]
    kind: Option<OrderKind>,
    #[serde(default)]
    pub total: Option<Price>,
    #[serde(rename = "contacto", default)]
    contact: Option<Contact>,
    #[serde(default)]
    contacto_nombre: Option<String>,
    #[serde(default)]
    contacto_email: Option<String>,
    #[serde(default)]
    contacto_telefono: Option<String>,
    #[serde(rename = "direccion", default)]
    pub address: Option<String>,
    #[serde(default)]
    pub metodo_pago: Option<String>,
    #[serde(rename = "descripcion", default)]
    pub description: Option<String>,
    #[serde(default)]
    pub imagen_referencia: Option<String>,
    #[serde(default)]
    pub nombre_personalizado: Option<String>,
    #[serde(default)]
    pub precio_personalizado: Option<Price>,
    #[serde(default)]
    pub comentario_vendedor: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
}

impl Order {
    /// Parsed status, `None` when the backend stored something unknown.
    #[must_use]
    pub fn status(&self) -> Option<OrderStatus> {
        match &self.status {
            Some(raw) => raw.parse().ok(),
            None => Some(OrderStatus::Pending),
        }
    }

    /// Status text for display, falling back to the raw value.
    #[must_use]
    pub fn status_label(&self) -> String {
        match (self.status(), &self.status) {
            (Some(status), _) => status.label().to_string(),
            (None, Some(raw)) => raw.clone(),
            (None, None) => OrderStatus::Pending.label().to_string(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> OrderKind {
        self.kind.unwrap_or_default()
    }

    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.kind() == OrderKind::Personalizado
    }

    #[must_use]
    pub fn contact_name(&self) -> Option<&str> {
        self.contact
            .as_ref()
            .map(|c| c.name.as_str())
            .or(self.contacto_nombre.as_deref())
    }

    #[must_use]
    pub fn contact_email(&self) -> Option<&str> {
        self.contact
            .as_ref()
            .map(|c| c.email.as_str())
            .or(self.contacto_email.as_deref())
    }

    #[must_use]
    pub fn contact_phone(&self) -> Option<&str> {
        self.contact
            .as_ref()
            .and_then(|c| c.phone.as_deref())
            .or(self.contacto_telefono.as_deref())
    }
}

/// Body of `PUT /pedidos/{id}/estado`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub estado: OrderStatus,
}

/// Body of `PATCH /pedidos/{id}/personalizado`, the seller's quote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CustomQuote {
    pub nombre_personalizado: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub precio_personalizado: Option<Decimal>,
    pub comentario_vendedor: Option<String>,
}

// =============================================================================
// Loyalty
// =============================================================================

/// Body of `POST /fidelizacion/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoyaltyEnrollment {
    pub correo: String,
    pub nombre_completo: String,
    pub fecha_nacimiento: String,
    pub redes: Option<Vec<String>>,
    pub direccion: Option<String>,
}

/// A loyalty programme member.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Membership {
    pub id: MembershipId,
    pub correo: String,
    pub nombre_completo: String,
    #[serde(default)]
    pub puntos: i64,
    #[serde(default)]
    pub tutoriales: Vec<String>,
    #[serde(default)]
    pub proximo_regalo: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn product_decodes_backend_shape() {
        let product: Product = serde_json::from_value(json!({
            "id": 3,
            "nombre": "Grulla",
            "descripcion": null,
            "precio": 12.5,
            "activo": true,
            "stock": 4,
            "categoria": "pliegues"
        }))
        .unwrap();
        assert_eq!(product.price.amount(), Decimal::new(125, 1));
        assert_eq!(product.category.as_deref(), Some("pliegues"));
        assert!(product.in_stock());
        assert!(product.imagen_url.is_none());
    }

    #[test]
    fn product_listing_accepts_both_shapes() {
        let bare: ProductListing =
            serde_json::from_value(json!([{"id": 1, "nombre": "Rana", "precio": 5}])).unwrap();
        assert!(matches!(bare, ProductListing::Bare(ref p) if p.len() == 1));

        let paged: ProductListing = serde_json::from_value(json!({
            "data": [{"id": 1, "nombre": "Rana", "precio": 5}],
            "total": 9
        }))
        .unwrap();
        assert!(matches!(paged, ProductListing::Paged { total: Some(9), .. }));
    }

    #[test]
    fn draft_sends_price_as_number() {
        let draft = ProductDraft {
            name: "Grulla".to_string(),
            description: None,
            price: Decimal::new(1250, 2),
            color: None,
            size: Some("M".to_string()),
            material: None,
            imagen_url: None,
            active: true,
            stock: 3,
            category: Some("3d".to_string()),
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["precio"], json!(12.5));
        assert_eq!(json["tamano"], "M");
        assert_eq!(json["categoria"], "3d");
    }

    #[test]
    fn order_accepts_nested_and_flat_contact() {
        let nested: Order = serde_json::from_value(json!({
            "id": 12,
            "estado": "pendiente",
            "contacto": {"nombre": "Ana", "email": "ana@papel.co", "telefono": null},
            "items": [],
            "tipo": "estandar"
        }))
        .unwrap();
        assert_eq!(nested.id.as_str(), "12");
        assert_eq!(nested.contact_email(), Some("ana@papel.co"));
        assert_eq!(nested.status_label(), "Pendiente");

        let flat: Order = serde_json::from_value(json!({
            "id": "CUSTOM-1A2B3C4D",
            "estado": "En Proceso",
            "tipo": "personalizado",
            "contacto_nombre": "Luis",
            "contacto_email": "luis@papel.co",
            "contacto_telefono": "3001234567",
            "descripcion": "Un dragón"
        }))
        .unwrap();
        assert!(flat.is_custom());
        assert_eq!(flat.contact_name(), Some("Luis"));
        assert_eq!(flat.contact_phone(), Some("3001234567"));
        assert_eq!(flat.status(), Some(OrderStatus::InProgress));
    }

    #[test]
    fn order_keeps_unknown_status_text() {
        let order: Order =
            serde_json::from_value(json!({"id": 1, "estado": "en revisión"})).unwrap();
        assert_eq!(order.status(), None);
        assert_eq!(order.status_label(), "en revisión");
    }

    #[test]
    fn receipt_reads_any_id_field() {
        let guest: OrderReceipt = serde_json::from_value(json!({
            "status": "success", "order_id": "GUEST-77", "message": "ok"
        }))
        .unwrap();
        assert_eq!(guest.order_number().unwrap().as_str(), "GUEST-77");

        let custom: OrderReceipt =
            serde_json::from_value(json!({"pedido_id": "CUSTOM-1"})).unwrap();
        assert_eq!(custom.order_number().unwrap().as_str(), "CUSTOM-1");

        let standard: OrderReceipt = serde_json::from_value(json!({"id": 77})).unwrap();
        assert_eq!(standard.order_number().unwrap().as_str(), "77");
    }

    #[test]
    fn quote_omits_nothing() {
        let quote = CustomQuote {
            precio_personalizado: Some(Decimal::new(4500, 2)),
            ..CustomQuote::default()
        };
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["precio_personalizado"], json!(45.0));
        assert!(json["nombre_personalizado"].is_null());
    }
}
