//! Custom order requests.
//!
//! A customer describes the piece they want, optionally attaches a reference
//! image, and leaves contact details. The image travels to the backend inline
//! as a `data:` URL.

use base64::{Engine, engine::general_purpose::STANDARD};
use origami_core::Email;
use thiserror::Error;

use crate::api::{ContactPayload, CustomOrderRequest};

/// Largest accepted reference image (5 MiB).
pub const MAX_REFERENCE_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Why a custom order was refused. The message is shown as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomOrderError {
    #[error("La descripción es obligatoria")]
    MissingDescription,
    #[error("Todos los datos de contacto son obligatorios")]
    MissingContact,
    #[error("El correo electrónico no es válido")]
    InvalidEmail,
    #[error("La imagen de referencia debe ser un archivo de imagen")]
    NotAnImage,
    #[error("La imagen de referencia no puede superar 5 MB")]
    ImageTooLarge,
}

/// An uploaded reference image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ReferenceImage {
    /// Check type and size.
    ///
    /// # Errors
    ///
    /// Returns [`CustomOrderError::NotAnImage`] for non-image types and
    /// [`CustomOrderError::ImageTooLarge`] above
    /// [`MAX_REFERENCE_IMAGE_BYTES`].
    pub fn new(content_type: &str, bytes: Vec<u8>) -> Result<Self, CustomOrderError> {
        let content_type = content_type.trim().to_ascii_lowercase();
        if !content_type.starts_with("image/") || content_type.contains([';', ',']) {
            return Err(CustomOrderError::NotAnImage);
        }
        if bytes.len() > MAX_REFERENCE_IMAGE_BYTES {
            return Err(CustomOrderError::ImageTooLarge);
        }
        Ok(Self {
            content_type,
            bytes,
        })
    }

    /// `data:<type>;base64,<payload>`
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.content_type,
            STANDARD.encode(&self.bytes)
        )
    }
}

/// The text fields of the custom order form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomOrderForm {
    pub descripcion: String,
    pub nombre: String,
    pub email: String,
    pub telefono: String,
}

impl CustomOrderForm {
    /// Set a field by its form name; unknown names are ignored.
    pub fn set(&mut self, name: &str, value: String) {
        match name {
            "descripcion" => self.descripcion = value,
            "nombre" => self.nombre = value,
            "email" => self.email = value,
            "telefono" => self.telefono = value,
            _ => {}
        }
    }

    /// Validate and build the body of `POST /pedidos/personalizado`.
    ///
    /// `image` is the outcome of reading the file input. Its error is only
    /// reported once the text fields are valid.
    ///
    /// # Errors
    ///
    /// Returns the first [`CustomOrderError`] in form order.
    pub fn to_request(
        &self,
        image: Result<Option<&ReferenceImage>, CustomOrderError>,
    ) -> Result<CustomOrderRequest, CustomOrderError> {
        let description = self.descripcion.trim();
        if description.is_empty() {
            return Err(CustomOrderError::MissingDescription);
        }
        let name = self.nombre.trim();
        let email = self.email.trim();
        let phone = self.telefono.trim();
        if name.is_empty() || email.is_empty() || phone.is_empty() {
            return Err(CustomOrderError::MissingContact);
        }
        let email = Email::parse_strict(email).map_err(|_| CustomOrderError::InvalidEmail)?;
        let image = image?;

        Ok(CustomOrderRequest {
            description: description.to_string(),
            imagen_referencia: image.map(ReferenceImage::to_data_url),
            contact: ContactPayload {
                name: name.to_string(),
                email: email.into_inner(),
                phone: phone.to_string(),
            },
        })
    }
}
