use std::str::FromStr;

use serde::{Deserialize, Serialize};
use veilgate_core::AppError;

/// Resource kinds recognized by authorization policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Administrative user accounts.
    Users,
    /// Customer orders.
    Orders,
    /// Product catalog entries.
    Products,
    /// Billing profiles and payment data.
    Billing,
    /// Generated reports and exports.
    Reports,
    /// Tenant-wide configuration.
    Settings,
}

impl EntityKind {
    /// Returns a stable storage value for this entity kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Orders => "orders",
            Self::Products => "products",
            Self::Billing => "billing",
            Self::Reports => "reports",
            Self::Settings => "settings",
        }
    }

    /// Returns all known entity kinds.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[EntityKind] = &[
            EntityKind::Users,
            EntityKind::Orders,
            EntityKind::Products,
            EntityKind::Billing,
            EntityKind::Reports,
            EntityKind::Settings,
        ];

        ALL
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "users" => Ok(Self::Users),
            "orders" => Ok(Self::Orders),
            "products" => Ok(Self::Products),
            "billing" => Ok(Self::Billing),
            "reports" => Ok(Self::Reports),
            "settings" => Ok(Self::Settings),
            _ => Err(AppError::Validation(format!(
                "unknown entity kind '{value}'"
            ))),
        }
    }
}

/// Operations recognized by authorization policy, entity-independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Read an entity or field.
    View,
    /// Create a new record.
    Create,
    /// Update an existing record or field.
    Update,
    /// Delete a record.
    Delete,
    /// Export records out of the system.
    Export,
    /// Import records into the system.
    Import,
}

impl ActionKind {
    /// Returns a stable storage value for this action kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Export => "export",
            Self::Import => "import",
        }
    }

    /// Returns all known action kinds.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[ActionKind] = &[
            ActionKind::View,
            ActionKind::Create,
            ActionKind::Update,
            ActionKind::Delete,
            ActionKind::Export,
            ActionKind::Import,
        ];

        ALL
    }
}

impl FromStr for ActionKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "view" => Ok(Self::View),
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "export" => Ok(Self::Export),
            "import" => Ok(Self::Import),
            _ => Err(AppError::Validation(format!(
                "unknown action kind '{value}'"
            ))),
        }
    }
}

/// Display transform applied to a field value the caller may read.
///
/// Variants are declared from least to most restrictive; the derived
/// ordering is the restrictiveness ordering the resolver aggregates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskKind {
    /// Value is returned unchanged.
    None,
    /// Value is partially masked by a field-kind-specific strategy.
    Partial,
    /// Value is replaced by a deterministic checksum placeholder.
    Encrypted,
    /// Value is replaced by the literal redaction marker.
    Redacted,
    /// Value is replaced by a same-length mask run.
    Hidden,
}

impl MaskKind {
    /// Returns a stable storage value for this mask kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Partial => "partial",
            Self::Encrypted => "encrypted",
            Self::Redacted => "redacted",
            Self::Hidden => "hidden",
        }
    }

    /// Returns all known mask kinds, least restrictive first.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[MaskKind] = &[
            MaskKind::None,
            MaskKind::Partial,
            MaskKind::Encrypted,
            MaskKind::Redacted,
            MaskKind::Hidden,
        ];

        ALL
    }
}

impl FromStr for MaskKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Self::None),
            "partial" => Ok(Self::Partial),
            "encrypted" => Ok(Self::Encrypted),
            "redacted" => Ok(Self::Redacted),
            "hidden" => Ok(Self::Hidden),
            _ => Err(AppError::Validation(format!("unknown mask kind '{value}'"))),
        }
    }
}
