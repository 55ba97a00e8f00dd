//! Login and registration forms.

use serde::Deserialize;
use thiserror::Error;

use crate::api::RegisterRequest;

/// Shortest accepted password.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Why a login or registration form was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountFormError {
    #[error("Todos los campos son obligatorios.")]
    MissingFields,
    #[error("La contraseña debe tener al menos 6 caracteres.")]
    PasswordTooShort,
    #[error("Las contraseñas no coinciden.")]
    PasswordMismatch,
}

/// Login form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    /// The trimmed email and the password as typed.
    ///
    /// # Errors
    ///
    /// Returns [`AccountFormError::MissingFields`] when either is blank.
    pub fn credentials(&self) -> Result<(&str, &str), AccountFormError> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(AccountFormError::MissingFields);
        }
        Ok((email, &self.password))
    }
}

/// Registration form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
}

impl RegisterForm {
    /// Validate and build the body of `/auth/register`.
    ///
    /// # Errors
    ///
    /// Returns the first [`AccountFormError`] in form order.
    pub fn to_request(&self) -> Result<RegisterRequest, AccountFormError> {
        let username = self.username.trim();
        let email = self.email.trim();
        if username.is_empty() || email.is_empty() || self.password.is_empty() || self.confirm.is_empty() {
            return Err(AccountFormError::MissingFields);
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AccountFormError::PasswordTooShort);
        }
        if self.password != self.confirm {
            return Err(AccountFormError::PasswordMismatch);
        }
        Ok(RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}
