use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use veilgate_application::PermissionContextProvider;
use veilgate_core::{AppError, AppResult, TenantId};
use veilgate_domain::{Role, UserPermissionContext};

/// Primary and additional role assignments for one user.
#[derive(Debug, Clone)]
pub struct UserRoleBinding {
    primary_role_id: String,
    additional_role_ids: Vec<String>,
}

impl UserRoleBinding {
    /// Creates a binding from a primary role id and extra role ids.
    #[must_use]
    pub fn new(primary_role_id: impl Into<String>, additional_role_ids: Vec<String>) -> Self {
        Self {
            primary_role_id: primary_role_id.into(),
            additional_role_ids,
        }
    }

    /// Role id every load resolves first.
    #[must_use]
    pub fn primary_role_id(&self) -> &str {
        &self.primary_role_id
    }

    /// Role ids resolved after the primary one.
    #[must_use]
    pub fn additional_role_ids(&self) -> &[String] {
        &self.additional_role_ids
    }

    fn role_ids(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary_role_id.as_str())
            .chain(self.additional_role_ids.iter().map(String::as_str))
    }
}

/// In-memory role directory backing the permission context port.
#[derive(Debug, Default)]
pub struct InMemoryRoleDirectory {
    roles: RwLock<HashMap<(TenantId, String), Role>>,
    bindings: RwLock<HashMap<(TenantId, String), UserRoleBinding>>,
}

impl InMemoryRoleDirectory {
    /// Creates an empty role directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roles: RwLock::new(HashMap::new()),
            bindings: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a role definition for a tenant.
    pub async fn register_role(&self, tenant_id: TenantId, role: Role) -> AppResult<()> {
        let key = (tenant_id, role.id().as_str().to_owned());
        let mut roles = self.roles.write().await;

        if roles.contains_key(&key) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists for tenant '{}'",
                key.1, key.0
            )));
        }

        roles.insert(key, role);
        Ok(())
    }

    /// Binds a user to roles, replacing any previous binding.
    pub async fn assign_user(
        &self,
        tenant_id: TenantId,
        user_id: impl Into<String>,
        binding: UserRoleBinding,
    ) {
        self.bindings
            .write()
            .await
            .insert((tenant_id, user_id.into()), binding);
    }
}

#[async_trait]
impl PermissionContextProvider for InMemoryRoleDirectory {
    async fn load_context(
        &self,
        tenant_id: TenantId,
        user_id: &str,
    ) -> AppResult<UserPermissionContext> {
        let bindings = self.bindings.read().await;
        let Some(binding) = bindings.get(&(tenant_id, user_id.to_owned())) else {
            return UserPermissionContext::new(user_id, Vec::new());
        };

        let roles = self.roles.read().await;
        let mut resolved = Vec::with_capacity(1 + binding.additional_role_ids.len());
        for role_id in binding.role_ids() {
            let role = roles
                .get(&(tenant_id, role_id.to_owned()))
                .cloned()
                .ok_or_else(|| {
                    AppError::NotFound(format!(
                        "role '{role_id}' does not exist for tenant '{tenant_id}'"
                    ))
                })?;
            resolved.push(role);
        }

        UserPermissionContext::new(user_id, resolved)
    }
}
