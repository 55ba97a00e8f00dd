//! Status enums for orders and payments.
//!
//! The backend stores order statuses as free text and the admin screens write
//! back the display labels, so parsing is lenient and serialization uses the
//! label.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when a status string matches no known variant.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

/// Order fulfilment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderStatus {
    #[default]
    Pending,
    InProgress,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Every status, in the order the admin select lists them.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::InProgress,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    /// Label shown to customers and sent back to the backend.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pending => "Pendiente",
            Self::InProgress => "En Proceso",
            Self::Shipped => "Enviado",
            Self::Delivered => "Entregado",
            Self::Cancelled => "Cancelado",
        }
    }

    /// Whether the order can still change.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Delivered | Self::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['_', '-'], " ");
        match key.as_str() {
            "pendiente" => Ok(Self::Pending),
            "en proceso" => Ok(Self::InProgress),
            "enviado" => Ok(Self::Shipped),
            "entregado" => Ok(Self::Delivered),
            "cancelado" => Ok(Self::Cancelled),
            _ => Err(UnknownVariant {
                kind: "order status",
                value: s.to_owned(),
            }),
        }
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Whether an order was placed from the catalogue or described by the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    #[default]
    #[serde(alias = "normal")]
    Estandar,
    Personalizado,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Estandar => write!(f, "estandar"),
            Self::Personalizado => write!(f, "personalizado"),
        }
    }
}

/// Payment methods offered at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Nequi,
    Contraentrega,
}

impl PaymentMethod {
    /// Every method, in the order the checkout form lists them.
    pub const ALL: [Self; 2] = [Self::Nequi, Self::Contraentrega];

    /// Wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Nequi => "nequi",
            Self::Contraentrega => "contraentrega",
        }
    }

    /// Human label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Nequi => "Transferencia Nequi",
            Self::Contraentrega => "Contraentrega",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "nequi" => Ok(Self::Nequi),
            "contraentrega" => Ok(Self::Contraentrega),
            _ => Err(UnknownVariant {
                kind: "payment method",
                value: s.to_owned(),
            }),
        }
    }
}
