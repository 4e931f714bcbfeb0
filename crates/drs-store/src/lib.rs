//! DRS Store - snapshot primitives shared by the safety and version layers
//!
//! Everything the upper layers persist is a small, pretty-printed JSON
//! document living under a per-resource-kind directory. This crate owns:
//! - **Resources**: opaque JSON objects fetched from a tenant, plus the
//!   best-effort identifier probe (`name` → `id` → `title` → content hash)
//! - **Clocks**: injectable wall-clock sources so retention and time windows
//!   can be driven deterministically
//! - **Timestamps**: the ISO-8601 format written into every file
//! - **Files**: missing-tolerant reads and temp-file-plus-rename writes
//! - **Kinds**: validated per-resource-kind directories under a storage root
//!
//! # Example
//!
//! ```rust,ignore
//! use drs_store::{json_file, resource_identifier, Resource};
//!
//! let resource: Resource = serde_json::from_str(r#"{"name": "nginx-logs"}"#)?;
//! assert_eq!(resource_identifier(&resource), "nginx-logs");
//!
//! json_file::write_pretty(&dir.join("current.json"), &pointer)?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod clock;
pub mod error;
pub mod json_file;
pub mod kind;
pub mod resource;
pub mod timestamp;

pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{StoreError, StoreResult};
pub use kind::{is_valid_kind, kind_dir};
pub use resource::{resource_identifier, resource_identifiers, Resource};
pub use timestamp::{format_iso, parse_iso};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the store primitives
    pub use crate::clock::{Clock, ManualClock, SharedClock, SystemClock};
    pub use crate::error::{StoreError, StoreResult};
    pub use crate::json_file;
    pub use crate::resource::{resource_identifier, Resource};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
