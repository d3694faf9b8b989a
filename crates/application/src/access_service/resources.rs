use super::*;

impl AccessControlService {
    /// Coarse whole-operation gate.
    ///
    /// A missing context is reported as unauthenticated; an authenticated
    /// context without the entity-level grant is reported as insufficient.
    #[must_use]
    pub fn authorize_api_access(
        &self,
        context: Option<&UserPermissionContext>,
        entity: EntityKind,
        action: ActionKind,
    ) -> AccessDecision {
        let Some(context) = context else {
            return AccessDecision::Denied {
                reason: DenialReason::NotAuthenticated,
            };
        };

        match resolver::check_permission(context, entity, action, "*") {
            AccessDecision::Granted { mask } => AccessDecision::Granted { mask },
            AccessDecision::Denied { .. } => AccessDecision::Denied {
                reason: DenialReason::InsufficientPermission { action, entity },
            },
        }
    }

    /// Ensures the caller may perform the operation, mapping denials onto
    /// application errors.
    pub fn require_api_access(
        &self,
        context: Option<&UserPermissionContext>,
        entity: EntityKind,
        action: ActionKind,
    ) -> AppResult<()> {
        match self.authorize_api_access(context, entity, action) {
            AccessDecision::Granted { .. } => Ok(()),
            AccessDecision::Denied {
                reason: reason @ DenialReason::NotAuthenticated,
            } => Err(AppError::Unauthorized(reason.to_string())),
            AccessDecision::Denied { reason } => Err(AppError::Forbidden(reason.to_string())),
        }
    }

    /// Returns whether the context may act on one concrete resource.
    ///
    /// The entity-level grant is consulted first; without it, an active
    /// instance-level grant for the user or any of their roles decides.
    /// Store failures resolve to deny.
    pub async fn check_resource_permission(
        &self,
        tenant_id: TenantId,
        context: &UserPermissionContext,
        resource_type: EntityKind,
        resource_id: &str,
        action: ActionKind,
    ) -> bool {
        if resolver::can_perform_action(context, resource_type, action) {
            return true;
        }

        let role_ids = context.role_ids();
        match self
            .resource_grants
            .has_active_grant(
                tenant_id,
                resource_type,
                resource_id,
                action,
                context.user_id().as_str(),
                &role_ids,
            )
            .await
        {
            Ok(granted) => granted,
            Err(error) => {
                warn!(
                    tenant_id = %tenant_id,
                    resource_type = resource_type.as_str(),
                    resource_id = resource_id,
                    action = action.as_str(),
                    "resource permission lookup failed, denying access: {error}"
                );
                false
            }
        }
    }
}
