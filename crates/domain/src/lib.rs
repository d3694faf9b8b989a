//! Domain model for authorization resolution and field masking.

#![forbid(unsafe_code)]

mod access;
mod catalog;
mod fields;
mod masking;

pub use access::{FieldSelector, Permission, Role, UserPermissionContext};
pub use catalog::{ActionKind, EntityKind, MaskKind};
pub use fields::{FieldClassifications, FieldKind};
pub use masking::{MaskingConfig, apply_mask, should_hide_field};
