//! Module permission resolution for Tablero.
//!
//! Combines the logged-in user's role permissions with the module catalog
//! served by the backend and answers "may this user perform action X on
//! module Y".
//!
//! - [`SessionStore`]: the current session, written only by login/logout
//! - [`CatalogGate`]: issues the catalog request only for users who can read
//!   at least one module, and folds a 403 into an empty catalog
//! - [`CatalogCache`]: cached catalog with stale-while-revalidate refresh
//! - [`AccessSnapshot`]: pure derivation of module maps and capability flags
//! - [`RoleOverride`]: role-name bypass applied as a decorator
//! - [`AccessResolver`]: memoized composition of all of the above

pub mod capability;
pub mod catalog;
pub mod error;
pub mod gate;
pub mod module_map;
pub mod resolver;
pub mod role_override;
pub mod session;
pub mod snapshot;

pub use capability::{
    CapabilityCheck, CapabilityResult, DenyReason, ModuleCapabilities, PermissionDecision,
};
pub use catalog::{CatalogCache, CatalogSnapshot};
pub use error::{AccessError, FetchError, Result};
pub use gate::{has_module_access, CatalogGate, GateOutcome, ModuleSource, RetryPolicy};
pub use module_map::ModuleNameMap;
pub use resolver::AccessResolver;
pub use role_override::{RoleOverride, WithRoleOverride};
pub use session::{Session, SessionStore};
pub use snapshot::{check_capability, AccessSnapshot};
