//! Security layer seam.
//!
//! Authentication lives outside this crate. Services receive the caller's
//! [`SecurityContext`] per call and ask it for the owner scope and for access
//! decisions.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::extension::ExtensionPoint;

/// Owner scope of an extension instance (for example one customer).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionOwner {
    pub owner_entity_type: String,
    pub owner_entity_id: String,
}

impl ExtensionOwner {
    pub fn new(owner_entity_type: impl Into<String>, owner_entity_id: impl Into<String>) -> Self {
        Self {
            owner_entity_type: owner_entity_type.into(),
            owner_entity_id: owner_entity_id.into(),
        }
    }
}

pub trait SecurityContext: Send + Sync {
    /// Tenant boundary used to scope uniqueness and listing.
    fn space_identity(&self) -> String;

    /// Owner the caller acts for on this extension point, if any.
    fn extension_owner(&self, point: &ExtensionPoint) -> Option<ExtensionOwner>;

    fn is_extension_authorized(&self, point: &ExtensionPoint) -> bool;

    fn is_lov_authorized(&self, _lov_name: &str) -> bool {
        true
    }
}

/// Fixed security context, built per request or per test.
#[derive(Debug, Clone)]
pub struct StaticSecurityContext {
    space: String,
    owner: Option<ExtensionOwner>,
    /// `None` allows every extension point
    extensions: Option<HashSet<String>>,
    denied_lovs: HashSet<String>,
}

impl StaticSecurityContext {
    pub fn new(space: impl Into<String>) -> Self {
        Self {
            space: space.into(),
            owner: None,
            extensions: None,
            denied_lovs: HashSet::new(),
        }
    }

    pub fn owned_by(mut self, owner_entity_type: impl Into<String>, owner_entity_id: impl Into<String>) -> Self {
        self.owner = Some(ExtensionOwner::new(owner_entity_type, owner_entity_id));
        self
    }

    /// Restrict access to the named extension points.
    pub fn allow_extensions<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn deny_lov(mut self, lov_name: impl Into<String>) -> Self {
        self.denied_lovs.insert(lov_name.into());
        self
    }
}

impl SecurityContext for StaticSecurityContext {
    fn space_identity(&self) -> String {
        self.space.clone()
    }

    fn extension_owner(&self, _point: &ExtensionPoint) -> Option<ExtensionOwner> {
        self.owner.clone()
    }

    fn is_extension_authorized(&self, point: &ExtensionPoint) -> bool {
        self.extensions
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&point.name))
    }

    fn is_lov_authorized(&self, lov_name: &str) -> bool {
        !self.denied_lovs.contains(lov_name)
    }
}
