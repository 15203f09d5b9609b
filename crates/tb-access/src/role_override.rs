//! Role-based bypass layered over a capability check.
//!
//! The core check knows nothing about role names. Deployments that treat a
//! role (usually `"Admin"`) as all-powerful wrap the check here instead of
//! OR-ing the role test at every call site.

use std::fmt;
use std::sync::Arc;

use tb_common::{AuthenticatedUser, PermissionAction};
use tracing::trace;

use crate::capability::{CapabilityCheck, CapabilityResult};

type RolePredicate = dyn Fn(&AuthenticatedUser) -> bool + Send + Sync;

/// Predicate deciding which users bypass capability checks.
#[derive(Clone)]
pub struct RoleOverride {
    label: String,
    predicate: Arc<RolePredicate>,
}

impl RoleOverride {
    pub fn new<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&AuthenticatedUser) -> bool + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Bypass for users whose role name equals `name` exactly.
    pub fn role_named(name: impl Into<String>) -> Self {
        let name = name.into();
        let expected = name.clone();
        Self::new(format!("role == {name}"), move |user| {
            user.role_name() == Some(expected.as_str())
        })
    }

    pub fn matches(&self, user: Option<&AuthenticatedUser>) -> bool {
        user.is_some_and(|u| (self.predicate)(u))
    }

    /// Decorate `inner` for `user`. The predicate is evaluated once, here.
    pub fn wrap<C: CapabilityCheck>(&self, inner: C, user: Option<&AuthenticatedUser>) -> WithRoleOverride<C> {
        let bypass = self.matches(user);
        if bypass {
            trace!(rule = %self.label, "Role override active");
        }
        WithRoleOverride { inner, bypass }
    }
}

impl fmt::Debug for RoleOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoleOverride")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

/// A capability check with a role bypass applied.
#[derive(Debug, Clone)]
pub struct WithRoleOverride<C> {
    inner: C,
    bypass: bool,
}

impl<C> WithRoleOverride<C> {
    /// No bypass; behaves exactly like `inner`.
    pub fn passthrough(inner: C) -> Self {
        Self { inner, bypass: false }
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C: CapabilityCheck> CapabilityCheck for WithRoleOverride<C> {
    fn check(&self, module: &str, action: PermissionAction) -> CapabilityResult {
        if self.bypass {
            return CapabilityResult::granted();
        }
        self.inner.check(module, action)
    }
}
