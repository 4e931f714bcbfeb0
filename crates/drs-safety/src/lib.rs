//! DRS Safety - trust gate for delete-and-recreate migrations
//!
//! Most resource-kinds are synchronized by deleting everything of that kind
//! in the target tenant and recreating it from the source. A source fetch
//! that silently returns nothing would therefore wipe the target. This crate
//! decides when a fetch, or a planned mass deletion, is trustworthy enough
//! to act on.
//!
//! # Decision points
//!
//! ```text
//! fetch TeamA ──► check_teama_fetch_safety ──► (snapshot) ──► check_mass_deletion_safety ──► delete all / create all
//!                   │  error? zero? drop > 50%?                 │  source collapse? drop > 70%?
//!                   └─ unsafe ⇒ abort                            └─ unsafe ⇒ abort
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use drs_safety::{SafetyConfig, SafetyManager};
//!
//! let safety = SafetyManager::new(&SafetyConfig::new(), "parsing-rules")?;
//! let verdict = safety.check_teama_fetch_safety(&fetched, None, Some(previous_count));
//! if !verdict.is_safe() {
//!     return Err(format!("blocked: {}", verdict.reason()).into());
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod ledger;
pub mod manager;
pub mod result;
pub mod thresholds;

pub use config::SafetyConfig;
pub use error::{ApiError, ErrorClass, FetchFailure, SafetyError, SafetyResult};
pub use ledger::ZeroResultLedger;
pub use manager::SafetyManager;
pub use result::{Details, MigrationScenario, SafetyCheckResult};
pub use thresholds::{drop_percentage, SafetyThresholds};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the safety gate
    pub use crate::{
        ApiError, FetchFailure, SafetyCheckResult, SafetyConfig, SafetyManager, SafetyThresholds,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
