//! DRS Versions - snapshot history and rollback planning
//!
//! Every migration brackets its destructive phase with snapshots of both
//! tenants. The newest snapshot doubles as the baseline the safety gate
//! compares fresh fetches against, and any stored snapshot can be turned
//! into a rollback plan for the target tenant.
//!
//! # Example
//!
//! ```rust,ignore
//! use drs_versions::{VersionConfig, VersionManager, VersionType};
//!
//! let versions = VersionManager::new(&VersionConfig::new(), "parsing-rules")?;
//! let id = versions.create_version_snapshot(&teama, &teamb, VersionType::PRE_MIGRATION)?;
//!
//! let baseline = versions.get_current_version().map(|v| v.teama_count());
//! let plan = versions.create_rollback_plan(&id);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod manager;
pub mod rollback;
pub mod snapshot;

pub use config::VersionConfig;
pub use error::{VersionError, VersionResult};
pub use manager::VersionManager;
pub use rollback::{RollbackPlan, RollbackSummary};
pub use snapshot::{
    is_valid_version_id, version_id_at, TenantState, VersionPointer, VersionSnapshot,
    VersionSummary, VersionType, VERSION_PREFIX,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with version history
    pub use crate::{RollbackPlan, VersionConfig, VersionManager, VersionSnapshot, VersionType};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
