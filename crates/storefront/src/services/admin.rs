//! Back-office forms.
//!
//! Each form is deserialized as plain strings so that a bad number can be
//! reported next to the field instead of failing the whole request.

use origami_core::{OrderStatus, Price};
use serde::Deserialize;
use thiserror::Error;

use crate::api::{CustomQuote, NewCategory, Product, ProductDraft};

/// Allowed product name length, in characters.
pub const PRODUCT_NAME_LEN: std::ops::RangeInclusive<usize> = 3..=80;

/// Why a back-office form was refused. The message is shown as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminFormError {
    #[error("El nombre debe tener entre 3 y 80 caracteres")]
    NameLength,
    #[error("El precio debe ser un número mayor a 0")]
    InvalidPrice,
    #[error("El stock debe ser un número ≥ 0")]
    InvalidStock,
    #[error("Slug y nombre son obligatorios")]
    MissingCategoryFields,
    #[error("Estado inválido")]
    InvalidStatus,
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Create and edit product form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProductForm {
    pub nombre: String,
    pub descripcion: String,
    pub precio: String,
    pub color: String,
    pub tamano: String,
    pub material: String,
    pub imagen_url: String,
    pub stock: String,
    pub categoria: String,
    /// Checkbox, present only when ticked
    pub activo: Option<String>,
}

impl ProductForm {
    /// A blank form for a new, active product.
    #[must_use]
    pub fn new_product() -> Self {
        Self {
            stock: "0".to_string(),
            activo: Some("on".to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.activo.is_some()
    }

    /// Validate the form and build the product body.
    ///
    /// # Errors
    ///
    /// Returns the first [`AdminFormError`] in form order.
    pub fn to_draft(&self) -> Result<ProductDraft, AdminFormError> {
        let name = self.nombre.trim();
        if !PRODUCT_NAME_LEN.contains(&name.chars().count()) {
            return Err(AdminFormError::NameLength);
        }
        let price = Price::parse_positive(&self.precio).map_err(|_| AdminFormError::InvalidPrice)?;
        let stock: i64 = self
            .stock
            .trim()
            .parse()
            .map_err(|_| AdminFormError::InvalidStock)?;
        if stock < 0 {
            return Err(AdminFormError::InvalidStock);
        }

        Ok(ProductDraft {
            name: name.to_string(),
            description: optional(&self.descripcion),
            price: price.amount(),
            color: optional(&self.color),
            size: optional(&self.tamano),
            material: optional(&self.material),
            imagen_url: optional(&self.imagen_url),
            active: self.is_active(),
            stock,
            category: optional(&self.categoria),
        })
    }
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            nombre: product.name.clone(),
            descripcion: product.description.clone().unwrap_or_default(),
            precio: product.price.amount().normalize().to_string(),
            color: product.color.clone().unwrap_or_default(),
            tamano: product.size.clone().unwrap_or_default(),
            material: product.material.clone().unwrap_or_default(),
            imagen_url: product.imagen_url.clone().unwrap_or_default(),
            stock: product.stock.to_string(),
            categoria: product.category.clone().unwrap_or_default(),
            activo: product.active.then(|| "on".to_string()),
        }
    }
}

/// The seller's quote on a custom order.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct QuoteForm {
    pub nombre_personalizado: String,
    pub precio_personalizado: String,
    pub comentario_vendedor: String,
}

impl QuoteForm {
    /// Validate the form; blank fields are left unchanged on the order.
    ///
    /// # Errors
    ///
    /// Returns [`AdminFormError::InvalidPrice`] for a price that is given but
    /// not a positive number.
    pub fn to_quote(&self) -> Result<CustomQuote, AdminFormError> {
        let price = match optional(&self.precio_personalizado) {
            Some(raw) => Some(
                Price::parse_positive(&raw)
                    .map_err(|_| AdminFormError::InvalidPrice)?
                    .amount(),
            ),
            None => None,
        };
        Ok(CustomQuote {
            nombre_personalizado: optional(&self.nombre_personalizado),
            precio_personalizado: price,
            comentario_vendedor: optional(&self.comentario_vendedor),
        })
    }
}

/// New category form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub slug: String,
    pub nombre: String,
}

impl CategoryForm {
    /// Validate the form. The slug is lowercased with spaces turned into dashes.
    ///
    /// # Errors
    ///
    /// Returns [`AdminFormError::MissingCategoryFields`] when either field is blank.
    pub fn to_category(&self) -> Result<NewCategory, AdminFormError> {
        let slug = self
            .slug
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-");
        let name = self.nombre.trim();
        if slug.is_empty() || name.is_empty() {
            return Err(AdminFormError::MissingCategoryFields);
        }
        Ok(NewCategory {
            slug,
            name: name.to_string(),
        })
    }
}

/// Order status change.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusForm {
    pub estado: String,
}

impl StatusForm {
    /// # Errors
    ///
    /// Returns [`AdminFormError::InvalidStatus`] for an unknown status.
    pub fn status(&self) -> Result<OrderStatus, AdminFormError> {
        self.estado
            .parse()
            .map_err(|_| AdminFormError::InvalidStatus)
    }
}
