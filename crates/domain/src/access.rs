use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use veilgate_core::{AppError, AppResult, NonEmptyString};

use crate::catalog::{ActionKind, EntityKind, MaskKind};

/// Field scope of a permission: one named field, or every field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSelector {
    /// Matches every field of the entity.
    All,
    /// Matches exactly one named field.
    Named(NonEmptyString),
}

impl FieldSelector {
    /// Creates a selector for one named field.
    pub fn named(field: impl Into<String>) -> AppResult<Self> {
        Ok(Self::Named(NonEmptyString::new(field)?))
    }

    /// Returns the stable storage value, `"*"` for the wildcard.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => "*",
            Self::Named(name) => name.as_str(),
        }
    }

    /// Returns whether this selector covers the queried field name.
    ///
    /// A query of `"*"` asks for any-field access and is covered by every
    /// selector, mirroring the wildcard on the permission side.
    #[must_use]
    pub fn matches_field(&self, field: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => field == "*" || name.as_str() == field,
        }
    }
}

impl FromStr for FieldSelector {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value == "*" {
            return Ok(Self::All);
        }

        Self::named(value)
    }
}

/// A single capability granted by a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    entity: EntityKind,
    field: FieldSelector,
    action: ActionKind,
    mask: MaskKind,
}

impl Permission {
    /// Creates a permission tuple.
    #[must_use]
    pub fn new(
        entity: EntityKind,
        field: FieldSelector,
        action: ActionKind,
        mask: MaskKind,
    ) -> Self {
        Self {
            entity,
            field,
            action,
            mask,
        }
    }

    /// Returns the entity this permission applies to.
    #[must_use]
    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    /// Returns the field scope of this permission.
    #[must_use]
    pub fn field(&self) -> &FieldSelector {
        &self.field
    }

    /// Returns the action this permission allows.
    #[must_use]
    pub fn action(&self) -> ActionKind {
        self.action
    }

    /// Returns the display mask granted for matching reads.
    #[must_use]
    pub fn mask(&self) -> MaskKind {
        self.mask
    }

    /// Returns whether this permission matches the queried tuple.
    #[must_use]
    pub fn matches(&self, entity: EntityKind, action: ActionKind, field: &str) -> bool {
        self.entity == entity && self.action == action && self.field.matches_field(field)
    }
}

/// A named bundle of permissions assignable to users.
///
/// Roles are flat: there is no inheritance between them, and a user's
/// effective capability is the union of all assigned roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: NonEmptyString,
    name: NonEmptyString,
    permissions: Vec<Permission>,
}

impl Role {
    /// Creates a role, rejecting duplicate `(entity, field, action)` tuples.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        permissions: Vec<Permission>,
    ) -> AppResult<Self> {
        let id = NonEmptyString::new(id)?;
        let name = NonEmptyString::new(name)?;

        let mut seen = HashSet::new();
        for permission in &permissions {
            let key = (
                permission.entity(),
                permission.field().as_str().to_owned(),
                permission.action(),
            );
            if !seen.insert(key) {
                return Err(AppError::Validation(format!(
                    "role '{}' grants field '{}' twice for action '{}' on entity '{}'",
                    id.as_str(),
                    permission.field().as_str(),
                    permission.action().as_str(),
                    permission.entity().as_str()
                )));
            }
        }

        Ok(Self {
            id,
            name,
            permissions,
        })
    }

    /// Returns the stable role identifier.
    #[must_use]
    pub fn id(&self) -> &NonEmptyString {
        &self.id
    }

    /// Returns the human-readable role name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the permissions granted by this role.
    #[must_use]
    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }
}

/// Immutable per-request snapshot of a user's effective roles.
///
/// Built once per authorization episode and queried repeatedly; never
/// mutated after construction. Role and permission data can change between
/// requests, so a context must not be reused across them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissionContext {
    user_id: NonEmptyString,
    roles: Vec<Role>,
}

impl UserPermissionContext {
    /// Creates a context snapshot, deduplicating roles by identifier.
    pub fn new(user_id: impl Into<String>, roles: Vec<Role>) -> AppResult<Self> {
        let user_id = NonEmptyString::new(user_id)?;

        let mut seen = HashSet::new();
        let mut deduplicated = Vec::with_capacity(roles.len());
        for role in roles {
            if seen.insert(role.id().as_str().to_owned()) {
                deduplicated.push(role);
            }
        }

        Ok(Self {
            user_id,
            roles: deduplicated,
        })
    }

    /// Returns the user this context was resolved for.
    #[must_use]
    pub fn user_id(&self) -> &NonEmptyString {
        &self.user_id
    }

    /// Returns the effective roles, primary first.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Returns the identifiers of every effective role.
    #[must_use]
    pub fn role_ids(&self) -> Vec<&str> {
        self.roles.iter().map(|role| role.id().as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{FieldSelector, Permission, Role, UserPermissionContext};
    use crate::catalog::{ActionKind, EntityKind, MaskKind};

    fn view_permission(field: FieldSelector, mask: MaskKind) -> Permission {
        Permission::new(EntityKind::Users, field, ActionKind::View, mask)
    }

    #[test]
    fn wildcard_selector_covers_named_field() {
        let permission = view_permission(FieldSelector::All, MaskKind::None);
        assert!(permission.matches(EntityKind::Users, ActionKind::View, "email"));
    }

    #[test]
    fn named_selector_covers_wildcard_query() {
        let selector = FieldSelector::from_str("email");
        assert!(selector.is_ok());
        let permission = view_permission(
            selector.unwrap_or(FieldSelector::All),
            MaskKind::Partial,
        );
        assert!(permission.matches(EntityKind::Users, ActionKind::View, "*"));
        assert!(!permission.matches(EntityKind::Users, ActionKind::View, "phone"));
    }

    #[test]
    fn selector_parses_wildcard_token() {
        let selector = FieldSelector::from_str("*");
        assert_eq!(selector.unwrap_or_else(|_| unreachable!()), FieldSelector::All);
    }

    #[test]
    fn role_rejects_duplicate_permission_tuple() {
        let first = view_permission(FieldSelector::All, MaskKind::None);
        let second = view_permission(FieldSelector::All, MaskKind::Hidden);

        let result = Role::new("admin", "Administrator", vec![first, second]);
        assert!(result.is_err());
    }

    #[test]
    fn role_allows_same_field_for_different_actions() {
        let view = view_permission(FieldSelector::All, MaskKind::None);
        let update = Permission::new(
            EntityKind::Users,
            FieldSelector::All,
            ActionKind::Update,
            MaskKind::None,
        );

        let result = Role::new("editor", "Editor", vec![view, update]);
        assert!(result.is_ok());
    }

    #[test]
    fn context_deduplicates_roles_by_id() {
        let role = Role::new("viewer", "Viewer", Vec::new());
        assert!(role.is_ok());
        let role = role.unwrap_or_else(|_| unreachable!());

        let context = UserPermissionContext::new("user-1", vec![role.clone(), role]);
        assert!(context.is_ok());
        assert_eq!(context.unwrap_or_else(|_| unreachable!()).roles().len(), 1);
    }
}
