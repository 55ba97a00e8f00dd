//! Loyalty programme enrollment.

use origami_core::Email;
use serde::Deserialize;
use thiserror::Error;

use crate::api::LoyaltyEnrollment;

/// Why an enrollment form was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnrollmentError {
    #[error("Nombre completo y correo son obligatorios")]
    MissingFields,
    #[error("El correo electrónico no es válido")]
    InvalidEmail,
}

/// Enrollment form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnrollmentForm {
    pub nombre_completo: String,
    pub correo: String,
    /// `YYYY-MM-DD` from a date input, may be blank
    pub fecha_nacimiento: String,
    /// Comma-separated social handles
    pub redes: String,
    pub direccion: String,
}

impl EnrollmentForm {
    /// Prefill name and email from the logged-in profile.
    #[must_use]
    pub fn for_user(username: &str, email: &str) -> Self {
        Self {
            nombre_completo: username.to_string(),
            correo: email.to_string(),
            ..Self::default()
        }
    }

    /// Validate and build the body of `POST /fidelizacion/`.
    ///
    /// # Errors
    ///
    /// Returns the first [`EnrollmentError`] in form order.
    pub fn to_enrollment(&self) -> Result<LoyaltyEnrollment, EnrollmentError> {
        let name = self.nombre_completo.trim();
        let email = self.correo.trim();
        if name.is_empty() || email.is_empty() {
            return Err(EnrollmentError::MissingFields);
        }
        let email = Email::parse_strict(email).map_err(|_| EnrollmentError::InvalidEmail)?;

        let redes: Vec<String> = self
            .redes
            .split(',')
            .map(str::trim)
            .filter(|handle| !handle.is_empty())
            .map(str::to_string)
            .collect();
        let direccion = self.direccion.trim();

        Ok(LoyaltyEnrollment {
            correo: email.into_inner(),
            nombre_completo: name.to_string(),
            fecha_nacimiento: self.fecha_nacimiento.trim().to_string(),
            redes: (!redes.is_empty()).then_some(redes),
            direccion: (!direccion.is_empty()).then(|| direccion.to_string()),
        })
    }
}
