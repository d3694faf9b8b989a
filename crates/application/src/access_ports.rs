use async_trait::async_trait;
use veilgate_core::{AppResult, TenantId};
use veilgate_domain::{ActionKind, EntityKind, UserPermissionContext};

/// Port for loading a user's effective permission context.
#[async_trait]
pub trait PermissionContextProvider: Send + Sync {
    /// Resolves the per-request role snapshot for a user in a tenant.
    async fn load_context(
        &self,
        tenant_id: TenantId,
        user_id: &str,
    ) -> AppResult<UserPermissionContext>;
}

/// Port for instance-level permission grants.
///
/// Grants here override entity-wide role permissions for one concrete
/// resource, matched against the user id or any of the user's role ids.
#[async_trait]
pub trait ResourcePermissionStore: Send + Sync {
    /// Returns whether an active grant covers the resource for the user or
    /// any of their roles.
    async fn has_active_grant(
        &self,
        tenant_id: TenantId,
        resource_type: EntityKind,
        resource_id: &str,
        action: ActionKind,
        user_id: &str,
        role_ids: &[&str],
    ) -> AppResult<bool>;
}
