//! Page name generation
//!
//! Every page file needs a name no other page in the table has used.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

use crate::error::Result;

/// Produces unique file names for new pages
pub trait PageNameGenerator: Send + Sync {
    fn next_name(&self) -> String;
}

/// Random v4 UUIDs (default)
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidNames;

impl PageNameGenerator for UuidNames {
    fn next_name(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Monotonic names: `page_000001`, `page_000002`, ...
///
/// Names sort in creation order, which makes scans return pages in the
/// order they were created.
#[derive(Debug)]
pub struct SequentialNames {
    /// Next ID to hand out (atomic, lock-free)
    next_id: AtomicU64,
}

impl SequentialNames {
    /// Start from `page_000001`
    ///
    /// Meant for empty directories; use [`SequentialNames::resume`] for an
    /// existing table. A table skips names that are already taken on disk,
    /// but each skip costs a failed create.
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
        }
    }

    /// Continue after the highest sequential page already in `dir`
    ///
    /// A missing directory counts as empty.
    pub fn resume(dir: &Path) -> Result<Self> {
        let mut max_id = 0;

        if dir.exists() {
            for entry in fs::read_dir(dir)? {
                let entry = entry?;
                if let Some(id) = Self::parse_id(&entry.path()) {
                    max_id = max_id.max(id);
                }
            }
        }

        Ok(Self {
            next_id: AtomicU64::new(max_id + 1),
        })
    }

    /// Parse page ID from filename
    /// "page_000042" → Some(42)
    fn parse_id(path: &Path) -> Option<u64> {
        let name = path.file_name()?.to_string_lossy();
        let id_str = name.strip_prefix("page_")?;
        id_str.parse().ok()
    }
}

impl Default for SequentialNames {
    fn default() -> Self {
        Self::new()
    }
}

impl PageNameGenerator for SequentialNames {
    fn next_name(&self) -> String {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("page_{:06}", id)
    }
}
