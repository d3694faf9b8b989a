use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use veilgate_domain::{ActionKind, EntityKind, MaskKind, UserPermissionContext};

/// Outcome of one permission resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    /// The query is allowed with the given display mask.
    Granted {
        /// Least restrictive mask among all matching permissions.
        mask: MaskKind,
    },
    /// The query is refused.
    Denied {
        /// Machine-readable denial reason.
        reason: DenialReason,
    },
}

impl AccessDecision {
    /// Returns whether the query was allowed.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }

    /// Returns the resolved mask for an allowed query.
    #[must_use]
    pub fn mask(&self) -> Option<MaskKind> {
        match self {
            Self::Granted { mask } => Some(*mask),
            Self::Denied { .. } => None,
        }
    }

    /// Returns the denial reason for a refused query.
    #[must_use]
    pub fn denial_reason(&self) -> Option<DenialReason> {
        match self {
            Self::Granted { .. } => None,
            Self::Denied { reason } => Some(*reason),
        }
    }
}

/// Machine-readable reasons an authorization query is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    /// The permission context holds no roles.
    NoRolesAssigned,
    /// No permission tuple matched the queried entity, action and field.
    NoMatchingPermission,
    /// No permission context was supplied.
    NotAuthenticated,
    /// The context lacks the entity-level grant for the operation.
    InsufficientPermission {
        /// Operation that was refused.
        action: ActionKind,
        /// Entity the operation targeted.
        entity: EntityKind,
    },
}

impl Display for DenialReason {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRolesAssigned => write!(formatter, "No roles assigned to user"),
            Self::NoMatchingPermission => write!(formatter, "No matching permission found"),
            Self::NotAuthenticated => write!(formatter, "User not authenticated"),
            Self::InsufficientPermission { action, entity } => write!(
                formatter,
                "Insufficient permissions for {} on {}",
                action.as_str(),
                entity.as_str()
            ),
        }
    }
}

/// Read/write verdict resolved for a single field.
///
/// The default value denies both directions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPermission {
    can_read: bool,
    can_write: bool,
    read_mask: Option<MaskKind>,
}

impl FieldPermission {
    /// Creates a field verdict.
    #[must_use]
    pub fn new(can_read: bool, can_write: bool, read_mask: Option<MaskKind>) -> Self {
        Self {
            can_read,
            can_write,
            read_mask,
        }
    }

    /// Returns whether the field may be read.
    #[must_use]
    pub fn can_read(&self) -> bool {
        self.can_read
    }

    /// Returns whether the field may be written.
    #[must_use]
    pub fn can_write(&self) -> bool {
        self.can_write
    }

    /// Returns the display mask for readable fields.
    #[must_use]
    pub fn read_mask(&self) -> Option<MaskKind> {
        self.read_mask
    }
}

/// Resolves whether the context allows an action on an entity field.
///
/// Every permission of every role is considered; among the matching ones
/// the least restrictive mask wins, since roles are additive capabilities.
/// A [`MaskKind::None`] match short-circuits, nothing being less
/// restrictive. Pure and idempotent for any well-formed input.
#[must_use]
pub fn check_permission(
    context: &UserPermissionContext,
    entity: EntityKind,
    action: ActionKind,
    field: &str,
) -> AccessDecision {
    if context.roles().is_empty() {
        return AccessDecision::Denied {
            reason: DenialReason::NoRolesAssigned,
        };
    }

    let mut least_restrictive: Option<MaskKind> = None;
    for role in context.roles() {
        for permission in role.permissions() {
            if !permission.matches(entity, action, field) {
                continue;
            }

            if permission.mask() == MaskKind::None {
                return AccessDecision::Granted {
                    mask: MaskKind::None,
                };
            }

            least_restrictive = Some(match least_restrictive {
                Some(current) => current.min(permission.mask()),
                None => permission.mask(),
            });
        }
    }

    match least_restrictive {
        Some(mask) => AccessDecision::Granted { mask },
        None => AccessDecision::Denied {
            reason: DenialReason::NoMatchingPermission,
        },
    }
}

/// Returns whether the context allows the action on any field of the entity.
#[must_use]
pub fn can_perform_action(
    context: &UserPermissionContext,
    entity: EntityKind,
    action: ActionKind,
) -> bool {
    check_permission(context, entity, action, "*").is_allowed()
}

/// Resolves the read/write matrix for a set of fields in one call.
///
/// Read access and mask come from a view check, write access from an
/// independent update check.
#[must_use]
pub fn field_permissions(
    context: &UserPermissionContext,
    entity: EntityKind,
    fields: &[String],
) -> BTreeMap<String, FieldPermission> {
    let mut matrix = BTreeMap::new();

    for field in fields {
        let read = check_permission(context, entity, ActionKind::View, field);
        let write = check_permission(context, entity, ActionKind::Update, field);
        matrix.insert(
            field.clone(),
            FieldPermission::new(read.is_allowed(), write.is_allowed(), read.mask()),
        );
    }

    matrix
}
