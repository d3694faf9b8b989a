//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_resource_permission_store;
mod in_memory_role_directory;

pub use in_memory_resource_permission_store::{GranteeKind, InMemoryResourcePermissionStore};
pub use in_memory_role_directory::{InMemoryRoleDirectory, UserRoleBinding};
