//! Zero-result ledger
//!
//! Records each time the source returned nothing after previously having
//! resources. Only the safety manager reads or writes it.

use chrono::Duration;
use drs_store::{format_iso, json_file, parse_iso, SharedClock, StoreResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Ledger file name inside the per-kind safety directory
pub const LEDGER_FILE: &str = "zero_results.json";

/// Entries older than this are pruned on every write
pub const LEDGER_RETENTION_DAYS: i64 = 7;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    zero_results: Vec<String>,
}

/// Per-kind zero-result history
#[derive(Debug, Clone)]
pub struct ZeroResultLedger {
    path: PathBuf,
    window: Duration,
    clock: SharedClock,
}

impl ZeroResultLedger {
    /// Open ledger stored in `dir`
    #[must_use]
    pub fn new(dir: &Path, window_hours: u32, clock: SharedClock) -> Self {
        Self {
            path: dir.join(LEDGER_FILE),
            window: Duration::hours(i64::from(window_hours)),
            clock,
        }
    }

    /// Ledger file location
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries inside the trailing window
    ///
    /// Unreadable ledgers count as zero; unparseable entries are skipped.
    #[must_use]
    pub fn recent_count(&self) -> usize {
        let ledger = match json_file::read::<LedgerFile>(&self.path) {
            Ok(ledger) => ledger.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Failed to read zero results history: {}", e);
                return 0;
            }
        };

        let cutoff = self.clock.now() - self.window;
        ledger
            .zero_results
            .iter()
            .filter_map(|raw| parse_iso(raw))
            .filter(|at| *at > cutoff)
            .count()
    }

    /// Append an entry for now and prune entries past retention
    ///
    /// Unparseable entries are dropped during pruning.
    ///
    /// # Errors
    /// Returns the store error when the existing ledger is unreadable or the
    /// rewrite fails; nothing is recorded in that case.
    pub fn record(&self) -> StoreResult<()> {
        let mut ledger = json_file::read::<LedgerFile>(&self.path)?.unwrap_or_default();

        let now = self.clock.now();
        ledger.zero_results.push(format_iso(now));

        let cutoff = now - Duration::days(LEDGER_RETENTION_DAYS);
        ledger
            .zero_results
            .retain(|raw| parse_iso(raw).is_some_and(|at| at > cutoff));

        json_file::write_pretty(&self.path, &ledger)
    }

    /// Raw stored entries, oldest first (empty when missing or unreadable)
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        json_file::read::<LedgerFile>(&self.path)
            .ok()
            .flatten()
            .map(|ledger| ledger.zero_results)
            .unwrap_or_default()
    }
}
