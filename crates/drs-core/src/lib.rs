//! DRS Core - gated delete-and-recreate migrations
//!
//! Ties the pieces together for one resource-kind:
//! - **Service contract**: what an adapter must provide to reach both tenants
//! - **Migrator**: fetch gate, snapshots, deletion gate, delete/create with
//!   verification, rollback
//! - **Configuration**: defaults, TOML file and environment
//! - **Logging**: subscriber setup for binaries
//!
//! # Example
//!
//! ```rust,ignore
//! use drs_core::{DrConfig, Migrator};
//!
//! let config = DrConfig::load(None)?;
//! drs_core::logging::init(&config.logging);
//!
//! let migrator = Migrator::new(ParsingRulesService::new(client_a, client_b), &config)?;
//! match migrator.migrate() {
//!     Ok(report) => println!("{report}"),
//!     Err(e) if e.is_safety_block() => eprintln!("blocked: {e}"),
//!     Err(e) => return Err(e.into()),
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod compare;
pub mod config;
pub mod error;
pub mod logging;
pub mod migrator;
pub mod report;
pub mod service;

pub use compare::{resources_equal, ResourceDifference, TenantComparison, VOLATILE_FIELDS};
pub use config::{ConfigError, ConfigResult, DrConfig, LogFormat, LoggingConfig};
pub use error::{MigrationError, MigrationResult};
pub use migrator::Migrator;
pub use report::{DryRunReport, MigrationReport, RollbackReport};
pub use service::{sort_for_creation, sort_for_deletion, CreateOutcome, ResourceService};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for writing adapters and running migrations
    pub use crate::{
        CreateOutcome, DrConfig, MigrationError, MigrationReport, Migrator, ResourceService,
    };
    pub use drs_safety::ApiError;
    pub use drs_store::Resource;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
