use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;
use veilgate_core::{AppError, AppResult, TenantId};
use veilgate_domain::{
    ActionKind, EntityKind, FieldClassifications, MaskKind, MaskingConfig, UserPermissionContext,
    apply_mask, should_hide_field,
};

use crate::access_ports::{PermissionContextProvider, ResourcePermissionStore};
use crate::resolver::{self, AccessDecision, DenialReason, FieldPermission};

mod objects;
mod resources;

#[cfg(test)]
mod tests;

/// How the facade renders fields whose resolved mask hides content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenFieldPolicy {
    /// Keep the key and emit the masked placeholder.
    #[default]
    MaskInPlace,
    /// Drop the key from the output object.
    Remove,
}

/// Application service orchestrating permission resolution and masking
/// over whole data objects.
///
/// The service holds no mutable state; every decision is a function of the
/// supplied permission context and the two injected ports.
#[derive(Clone)]
pub struct AccessControlService {
    contexts: Arc<dyn PermissionContextProvider>,
    resource_grants: Arc<dyn ResourcePermissionStore>,
    classifications: FieldClassifications,
    masking: MaskingConfig,
    hidden_fields: HiddenFieldPolicy,
}

impl AccessControlService {
    /// Creates a service with the standard classification table and
    /// default masking options.
    #[must_use]
    pub fn new(
        contexts: Arc<dyn PermissionContextProvider>,
        resource_grants: Arc<dyn ResourcePermissionStore>,
    ) -> Self {
        Self {
            contexts,
            resource_grants,
            classifications: FieldClassifications::standard(),
            masking: MaskingConfig::default(),
            hidden_fields: HiddenFieldPolicy::default(),
        }
    }

    /// Replaces the field classification table.
    #[must_use]
    pub fn with_classifications(mut self, classifications: FieldClassifications) -> Self {
        self.classifications = classifications;
        self
    }

    /// Replaces the masking options.
    #[must_use]
    pub fn with_masking_config(mut self, masking: MaskingConfig) -> Self {
        self.masking = masking;
        self
    }

    /// Replaces the hidden-field rendering policy.
    #[must_use]
    pub fn with_hidden_field_policy(mut self, policy: HiddenFieldPolicy) -> Self {
        self.hidden_fields = policy;
        self
    }

    /// Loads the per-request permission context for a user.
    ///
    /// The snapshot must not be reused across requests, since role and
    /// permission data can change between them.
    pub async fn context_for_user(
        &self,
        tenant_id: TenantId,
        user_id: &str,
    ) -> AppResult<UserPermissionContext> {
        self.contexts.load_context(tenant_id, user_id).await
    }
}
