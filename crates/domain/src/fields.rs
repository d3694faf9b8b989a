use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use veilgate_core::{AppError, AppResult, NonEmptyString};

use crate::catalog::EntityKind;

/// Masking strategy applied to a field when its resolved mask is partial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Email address: local part reduced to its first character.
    Email,
    /// Phone number: last four digits kept visible.
    Phone,
    /// Payment card number: last four digits kept visible.
    CreditCard,
    /// Social security number: last four digits kept visible.
    Ssn,
    /// Postal address: house numbers and unit tokens obscured.
    Address,
    /// Personal name: each word reduced to its first character.
    Name,
    /// Monetary amount: integer digits obscured.
    Amount,
    /// Fallback strategy keyed on a visible prefix length.
    Generic,
}

impl FieldKind {
    /// Returns a stable storage value for this field kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Phone => "phone",
            Self::CreditCard => "credit_card",
            Self::Ssn => "ssn",
            Self::Address => "address",
            Self::Name => "name",
            Self::Amount => "amount",
            Self::Generic => "generic",
        }
    }

    /// Returns all known field kinds.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[FieldKind] = &[
            FieldKind::Email,
            FieldKind::Phone,
            FieldKind::CreditCard,
            FieldKind::Ssn,
            FieldKind::Address,
            FieldKind::Name,
            FieldKind::Amount,
            FieldKind::Generic,
        ];

        ALL
    }
}

impl FromStr for FieldKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "email" => Ok(Self::Email),
            "phone" => Ok(Self::Phone),
            "credit_card" => Ok(Self::CreditCard),
            "ssn" => Ok(Self::Ssn),
            "address" => Ok(Self::Address),
            "name" => Ok(Self::Name),
            "amount" => Ok(Self::Amount),
            "generic" => Ok(Self::Generic),
            _ => Err(AppError::Validation(format!(
                "unknown field kind '{value}'"
            ))),
        }
    }
}

/// Per-entity field classification table consulted when masking.
///
/// Unclassified fields fall back to [`FieldKind::Generic`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldClassifications {
    entries: HashMap<EntityKind, BTreeMap<String, FieldKind>>,
}

impl FieldClassifications {
    /// Returns the built-in classification table for the admin data model.
    #[must_use]
    pub fn standard() -> Self {
        const STANDARD: &[(EntityKind, &str, FieldKind)] = &[
            (EntityKind::Users, "email", FieldKind::Email),
            (EntityKind::Users, "phone", FieldKind::Phone),
            (EntityKind::Users, "name", FieldKind::Name),
            (EntityKind::Users, "full_name", FieldKind::Name),
            (EntityKind::Users, "ssn", FieldKind::Ssn),
            (EntityKind::Users, "address", FieldKind::Address),
            (EntityKind::Users, "salary", FieldKind::Amount),
            (EntityKind::Orders, "customer_name", FieldKind::Name),
            (EntityKind::Orders, "customer_email", FieldKind::Email),
            (EntityKind::Orders, "shipping_address", FieldKind::Address),
            (EntityKind::Orders, "total_amount", FieldKind::Amount),
            (EntityKind::Products, "price", FieldKind::Amount),
            (EntityKind::Products, "supplier_email", FieldKind::Email),
            (EntityKind::Billing, "card_number", FieldKind::CreditCard),
            (EntityKind::Billing, "credit_card", FieldKind::CreditCard),
            (EntityKind::Billing, "billing_address", FieldKind::Address),
            (EntityKind::Billing, "tax_id", FieldKind::Ssn),
            (EntityKind::Billing, "amount_due", FieldKind::Amount),
            (EntityKind::Reports, "owner_email", FieldKind::Email),
            (EntityKind::Settings, "support_email", FieldKind::Email),
            (EntityKind::Settings, "contact_phone", FieldKind::Phone),
        ];

        let mut table = Self::default();
        for (entity, field, kind) in STANDARD {
            table
                .entries
                .entry(*entity)
                .or_default()
                .insert((*field).to_owned(), *kind);
        }

        table
    }

    /// Registers a classification, replacing any previous kind for the field.
    pub fn classify(
        &mut self,
        entity: EntityKind,
        field: impl Into<String>,
        kind: FieldKind,
    ) -> AppResult<()> {
        let field = NonEmptyString::new(field)?;
        self.entries
            .entry(entity)
            .or_default()
            .insert(String::from(field), kind);

        Ok(())
    }

    /// Returns the masking strategy for an entity field.
    #[must_use]
    pub fn kind_for(&self, entity: EntityKind, field: &str) -> FieldKind {
        self.entries
            .get(&entity)
            .and_then(|fields| fields.get(field))
            .copied()
            .unwrap_or(FieldKind::Generic)
    }
}
