//! Application services and ports for authorization decisions.

#![forbid(unsafe_code)]

mod access_ports;
mod access_service;
mod resolver;

pub use access_ports::{PermissionContextProvider, ResourcePermissionStore};
pub use access_service::{AccessControlService, HiddenFieldPolicy};
pub use resolver::{
    AccessDecision, DenialReason, FieldPermission, can_perform_action, check_permission,
    field_permissions,
};
