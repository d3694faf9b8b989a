use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use veilgate_application::ResourcePermissionStore;
use veilgate_core::{AppResult, TenantId};
use veilgate_domain::{ActionKind, EntityKind};

/// Identity a resource grant is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GranteeKind {
    /// Grant addressed to one user id.
    User(String),
    /// Grant addressed to every holder of a role.
    Role(String),
}

#[derive(Debug, Clone)]
struct ResourceGrant {
    grantee: GranteeKind,
    expires_at: Option<DateTime<Utc>>,
}

impl ResourceGrant {
    fn matches(&self, now: DateTime<Utc>, user_id: &str, role_ids: &[&str]) -> bool {
        let active = self
            .expires_at
            .map(|expires_at| expires_at > now)
            .unwrap_or(true);

        active
            && match &self.grantee {
                GranteeKind::User(id) => id == user_id,
                GranteeKind::Role(id) => role_ids.contains(&id.as_str()),
            }
    }
}

/// In-memory store of per-resource permission grants.
#[derive(Debug, Default)]
pub struct InMemoryResourcePermissionStore {
    grants: RwLock<HashMap<(TenantId, EntityKind, String, ActionKind), Vec<ResourceGrant>>>,
}

impl InMemoryResourcePermissionStore {
    /// Creates an empty grant store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grants: RwLock::new(HashMap::new()),
        }
    }

    /// Grants a user or role access to one resource instance.
    ///
    /// A grant with an expiry stops matching once the expiry passes.
    pub async fn grant_access(
        &self,
        tenant_id: TenantId,
        resource_type: EntityKind,
        resource_id: impl Into<String>,
        action: ActionKind,
        grantee: GranteeKind,
        expires_at: Option<DateTime<Utc>>,
    ) {
        self.grants
            .write()
            .await
            .entry((tenant_id, resource_type, resource_id.into(), action))
            .or_default()
            .push(ResourceGrant {
                grantee,
                expires_at,
            });
    }
}

#[async_trait]
impl ResourcePermissionStore for InMemoryResourcePermissionStore {
    async fn has_active_grant(
        &self,
        tenant_id: TenantId,
        resource_type: EntityKind,
        resource_id: &str,
        action: ActionKind,
        user_id: &str,
        role_ids: &[&str],
    ) -> AppResult<bool> {
        let grants = self.grants.read().await;
        let Some(entries) =
            grants.get(&(tenant_id, resource_type, resource_id.to_owned(), action))
        else {
            return Ok(false);
        };

        let now = Utc::now();
        Ok(entries
            .iter()
            .any(|entry| entry.matches(now, user_id, role_ids)))
    }
}
