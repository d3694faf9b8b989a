use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use veilgate_core::{AppError, AppResult, TenantId};
use veilgate_domain::{
    ActionKind, EntityKind, FieldSelector, MaskKind, Permission, Role, UserPermissionContext,
};

use crate::access_ports::{PermissionContextProvider, ResourcePermissionStore};
use crate::resolver::DenialReason;

use super::{AccessControlService, HiddenFieldPolicy};

#[derive(Default)]
struct FakeContextProvider {
    contexts: HashMap<(TenantId, String), UserPermissionContext>,
    fail: bool,
}

#[async_trait]
impl PermissionContextProvider for FakeContextProvider {
    async fn load_context(
        &self,
        tenant_id: TenantId,
        user_id: &str,
    ) -> AppResult<UserPermissionContext> {
        if self.fail {
            return Err(AppError::Internal("context store offline".to_owned()));
        }

        self.contexts
            .get(&(tenant_id, user_id.to_owned()))
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("no context for user '{user_id}'")))
    }
}

#[derive(Default)]
struct FakeResourceStore {
    grants: HashSet<(TenantId, EntityKind, String, ActionKind, String)>,
    fail: bool,
    lookups: Mutex<usize>,
}

#[async_trait]
impl ResourcePermissionStore for FakeResourceStore {
    async fn has_active_grant(
        &self,
        tenant_id: TenantId,
        resource_type: EntityKind,
        resource_id: &str,
        action: ActionKind,
        user_id: &str,
        role_ids: &[&str],
    ) -> AppResult<bool> {
        *self.lookups.lock().await += 1;

        if self.fail {
            return Err(AppError::Internal("grant store offline".to_owned()));
        }

        let mut grantees = vec![user_id];
        grantees.extend_from_slice(role_ids);
        Ok(grantees.iter().any(|grantee| {
            self.grants.contains(&(
                tenant_id,
                resource_type,
                resource_id.to_owned(),
                action,
                (*grantee).to_owned(),
            ))
        }))
    }
}

fn permission(entity: EntityKind, field: &str, action: ActionKind, mask: MaskKind) -> Permission {
    let selector = FieldSelector::from_str(field).unwrap_or_else(|_| unreachable!());
    Permission::new(entity, selector, action, mask)
}

fn role(id: &str, permissions: Vec<Permission>) -> Role {
    Role::new(id, id, permissions).unwrap_or_else(|_| unreachable!())
}

fn context_with(roles: Vec<Role>) -> UserPermissionContext {
    UserPermissionContext::new("user-1", roles).unwrap_or_else(|_| unreachable!())
}

fn build_service() -> AccessControlService {
    AccessControlService::new(
        Arc::new(FakeContextProvider::default()),
        Arc::new(FakeResourceStore::default()),
    )
}

#[test]
fn masked_object_strips_unreadable_fields() {
    let service = build_service();
    let context = context_with(vec![role(
        "support",
        vec![
            permission(EntityKind::Users, "email", ActionKind::View, MaskKind::Partial),
            permission(EntityKind::Users, "name", ActionKind::View, MaskKind::None),
        ],
    )]);
    let data = json!({
        "email": "john.doe@example.com",
        "name": "John Doe",
        "ssn": "123-45-6789",
    });

    let masked = service.authorize_and_mask_object(&context, EntityKind::Users, &data);
    assert!(masked.is_ok());
    assert_eq!(
        masked.unwrap_or(Value::Null),
        json!({
            "email": "j***@example.com",
            "name": "John Doe",
        })
    );
}

#[test]
fn unmasked_values_keep_their_json_type() {
    let service = build_service();
    let context = context_with(vec![role(
        "order-viewer",
        vec![permission(EntityKind::Orders, "*", ActionKind::View, MaskKind::None)],
    )]);
    let data = json!({"total_amount": 19.99, "paid": true});

    let masked = service.authorize_and_mask_object(&context, EntityKind::Orders, &data);
    assert_eq!(
        masked.unwrap_or(Value::Null),
        json!({"total_amount": 19.99, "paid": true})
    );
}

#[test]
fn masked_numbers_become_display_strings() {
    let service = build_service();
    let context = context_with(vec![role(
        "analyst",
        vec![permission(
            EntityKind::Orders,
            "total_amount",
            ActionKind::View,
            MaskKind::Partial,
        )],
    )]);
    let data = json!({"total_amount": 1234.56});

    let masked = service.authorize_and_mask_object(&context, EntityKind::Orders, &data);
    assert_eq!(
        masked.unwrap_or(Value::Null),
        json!({"total_amount": "****.56"})
    );
}

#[test]
fn null_values_mask_to_empty_strings() {
    let service = build_service();
    let context = context_with(vec![role(
        "support",
        vec![permission(EntityKind::Users, "email", ActionKind::View, MaskKind::Partial)],
    )]);
    let data = json!({"email": null});

    let masked = service.authorize_and_mask_object(&context, EntityKind::Users, &data);
    assert_eq!(masked.unwrap_or(Value::Null), json!({"email": ""}));
}

#[test]
fn default_policy_keeps_hidden_placeholder() {
    let service = build_service();
    let context = context_with(vec![role(
        "auditor",
        vec![permission(EntityKind::Users, "ssn", ActionKind::View, MaskKind::Hidden)],
    )]);
    let data = json!({"ssn": "123-45-6789"});

    let masked = service.authorize_and_mask_object(&context, EntityKind::Users, &data);
    assert_eq!(masked.unwrap_or(Value::Null), json!({"ssn": "***********"}));
}

#[test]
fn remove_policy_drops_hidden_fields() {
    let service = build_service().with_hidden_field_policy(HiddenFieldPolicy::Remove);
    let context = context_with(vec![role(
        "auditor",
        vec![
            permission(EntityKind::Users, "ssn", ActionKind::View, MaskKind::Hidden),
            permission(EntityKind::Users, "name", ActionKind::View, MaskKind::None),
        ],
    )]);
    let data = json!({"ssn": "123-45-6789", "name": "John Doe"});

    let masked = service.authorize_and_mask_object(&context, EntityKind::Users, &data);
    assert_eq!(masked.unwrap_or(Value::Null), json!({"name": "John Doe"}));
}

#[test]
fn record_list_masking_uses_union_of_keys() {
    let service = build_service();
    let context = context_with(vec![role(
        "support",
        vec![permission(EntityKind::Users, "name", ActionKind::View, MaskKind::None)],
    )]);
    let items = vec![
        json!({"name": "Ada"}),
        json!({"name": "Brian", "ssn": "123-45-6789"}),
    ];

    let masked = service.authorize_and_mask_records(&context, EntityKind::Users, &items);
    assert!(masked.is_ok());
    assert_eq!(
        masked.unwrap_or_default(),
        vec![json!({"name": "Ada"}), json!({"name": "Brian"})]
    );
}

#[test]
fn object_masking_is_idempotent() {
    let service = build_service();
    let context = context_with(vec![role(
        "support",
        vec![
            permission(EntityKind::Users, "id", ActionKind::View, MaskKind::None),
            permission(EntityKind::Users, "email", ActionKind::View, MaskKind::Partial),
            permission(EntityKind::Users, "name", ActionKind::View, MaskKind::Partial),
            permission(EntityKind::Users, "notes", ActionKind::View, MaskKind::Partial),
            permission(EntityKind::Users, "ssn", ActionKind::View, MaskKind::Hidden),
        ],
    )]);
    let data = json!({
        "id": "user-42",
        "email": "john.doe@example.com",
        "name": "John Michael Doe",
        "notes": "escalated twice in march",
        "ssn": "123-45-6789",
    });

    let once = service.authorize_and_mask_object(&context, EntityKind::Users, &data);
    assert!(once.is_ok());
    let once = once.unwrap_or(Value::Null);

    let twice = service.authorize_and_mask_object(&context, EntityKind::Users, &once);
    assert_eq!(twice.unwrap_or(Value::Null), once);
}

#[test]
fn non_object_payload_is_rejected() {
    let service = build_service();
    let context = context_with(Vec::new());

    let result = service.authorize_and_mask_object(&context, EntityKind::Users, &json!([1, 2]));
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[test]
fn api_access_requires_context() {
    let service = build_service();

    let decision = service.authorize_api_access(None, EntityKind::Users, ActionKind::View);
    assert_eq!(
        decision.denial_reason(),
        Some(DenialReason::NotAuthenticated)
    );
    assert_eq!(
        decision
            .denial_reason()
            .map(|reason| reason.to_string())
            .unwrap_or_default(),
        "User not authenticated"
    );
}

#[test]
fn api_access_reports_insufficient_permission() {
    let service = build_service();
    let context = context_with(Vec::new());

    let decision =
        service.authorize_api_access(Some(&context), EntityKind::Users, ActionKind::View);
    assert_eq!(
        decision
            .denial_reason()
            .map(|reason| reason.to_string())
            .unwrap_or_default(),
        "Insufficient permissions for view on users"
    );
}

#[test]
fn api_access_allows_entity_level_grant() {
    let service = build_service();
    let context = context_with(vec![role(
        "viewer",
        vec![permission(EntityKind::Users, "*", ActionKind::View, MaskKind::Partial)],
    )]);

    let decision =
        service.authorize_api_access(Some(&context), EntityKind::Users, ActionKind::View);
    assert!(decision.is_allowed());
}

#[test]
fn require_api_access_maps_denials_to_errors() {
    let service = build_service();
    let context = context_with(Vec::new());

    let unauthenticated = service.require_api_access(None, EntityKind::Users, ActionKind::View);
    assert!(matches!(unauthenticated, Err(AppError::Unauthorized(_))));

    let forbidden =
        service.require_api_access(Some(&context), EntityKind::Users, ActionKind::View);
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn resource_check_skips_store_when_entity_grant_suffices() {
    let store = Arc::new(FakeResourceStore::default());
    let service =
        AccessControlService::new(Arc::new(FakeContextProvider::default()), store.clone());
    let context = context_with(vec![role(
        "order-admin",
        vec![permission(EntityKind::Orders, "*", ActionKind::Delete, MaskKind::None)],
    )]);
    let tenant_id = TenantId::new();

    let allowed = service
        .check_resource_permission(
            tenant_id,
            &context,
            EntityKind::Orders,
            "order-7",
            ActionKind::Delete,
        )
        .await;

    assert!(allowed);
    assert_eq!(*store.lookups.lock().await, 0);
}

#[tokio::test]
async fn resource_check_falls_back_to_instance_grant() {
    let tenant_id = TenantId::new();
    let store = Arc::new(FakeResourceStore {
        grants: HashSet::from([(
            tenant_id,
            EntityKind::Orders,
            "order-7".to_owned(),
            ActionKind::Delete,
            "user-1".to_owned(),
        )]),
        ..FakeResourceStore::default()
    });
    let service =
        AccessControlService::new(Arc::new(FakeContextProvider::default()), store.clone());
    let context = context_with(Vec::new());

    let allowed = service
        .check_resource_permission(
            tenant_id,
            &context,
            EntityKind::Orders,
            "order-7",
            ActionKind::Delete,
        )
        .await;
    assert!(allowed);

    let other_resource = service
        .check_resource_permission(
            tenant_id,
            &context,
            EntityKind::Orders,
            "order-8",
            ActionKind::Delete,
        )
        .await;
    assert!(!other_resource);
}

#[tokio::test]
async fn resource_check_matches_role_grantees() {
    let tenant_id = TenantId::new();
    let store = Arc::new(FakeResourceStore {
        grants: HashSet::from([(
            tenant_id,
            EntityKind::Reports,
            "report-3".to_owned(),
            ActionKind::Export,
            "finance".to_owned(),
        )]),
        ..FakeResourceStore::default()
    });
    let service =
        AccessControlService::new(Arc::new(FakeContextProvider::default()), store.clone());
    let context = context_with(vec![role("finance", Vec::new())]);

    let allowed = service
        .check_resource_permission(
            tenant_id,
            &context,
            EntityKind::Reports,
            "report-3",
            ActionKind::Export,
        )
        .await;
    assert!(allowed);
}

#[tokio::test]
async fn resource_store_failure_denies_access() {
    let store = Arc::new(FakeResourceStore {
        fail: true,
        ..FakeResourceStore::default()
    });
    let service =
        AccessControlService::new(Arc::new(FakeContextProvider::default()), store.clone());
    let context = context_with(Vec::new());

    let allowed = service
        .check_resource_permission(
            TenantId::new(),
            &context,
            EntityKind::Orders,
            "order-7",
            ActionKind::Delete,
        )
        .await;
    assert!(!allowed);
}

#[test]
fn enforce_writable_fields_rejects_unwritable_key() {
    let service = build_service();
    let context = context_with(vec![role(
        "editor",
        vec![permission(EntityKind::Users, "name", ActionKind::Update, MaskKind::None)],
    )]);

    let accepted =
        service.enforce_writable_fields(&context, EntityKind::Users, &json!({"name": "Ada"}));
    assert!(accepted.is_ok());

    let rejected = service.enforce_writable_fields(
        &context,
        EntityKind::Users,
        &json!({"name": "Ada", "email": "ada@example.com"}),
    );
    assert!(matches!(rejected, Err(AppError::Forbidden(_))));
}

#[test]
fn remove_hidden_fields_strips_hiding_masks() {
    let service = build_service();
    let context = context_with(vec![role(
        "auditor",
        vec![
            permission(EntityKind::Users, "ssn", ActionKind::View, MaskKind::Hidden),
            permission(EntityKind::Users, "notes", ActionKind::View, MaskKind::Redacted),
            permission(EntityKind::Users, "name", ActionKind::View, MaskKind::None),
        ],
    )]);
    let data = json!({"ssn": "123-45-6789", "notes": "vip", "name": "John Doe"});

    let stripped = service.remove_hidden_fields(&context, EntityKind::Users, &data);
    assert_eq!(
        stripped.unwrap_or(Value::Null),
        json!({"name": "John Doe"})
    );
}

#[tokio::test]
async fn context_for_user_loads_snapshot() {
    let tenant_id = TenantId::new();
    let context = context_with(vec![role("viewer", Vec::new())]);
    let provider = FakeContextProvider {
        contexts: HashMap::from([((tenant_id, "user-1".to_owned()), context)]),
        fail: false,
    };
    let service =
        AccessControlService::new(Arc::new(provider), Arc::new(FakeResourceStore::default()));

    let loaded = service.context_for_user(tenant_id, "user-1").await;
    assert!(loaded.is_ok());
    assert_eq!(loaded.unwrap_or_else(|_| unreachable!()).roles().len(), 1);
}

#[tokio::test]
async fn context_load_failure_propagates() {
    let provider = FakeContextProvider {
        contexts: HashMap::new(),
        fail: true,
    };
    let service =
        AccessControlService::new(Arc::new(provider), Arc::new(FakeResourceStore::default()));

    let loaded = service.context_for_user(TenantId::new(), "user-1").await;
    assert!(matches!(loaded, Err(AppError::Internal(_))));
}
