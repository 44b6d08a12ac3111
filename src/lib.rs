//! # pagestore
//!
//! An embedded, file-backed object store with:
//! - Typed records packed into fixed-capacity page files
//! - Best-fit page selection through a free-space min-heap
//! - Predicate scans with offset/limit windowing
//! - Delete-by-predicate with in-place page compaction
//! - Single-writer/multi-reader locking per table
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Table<T>                             │
//! │        insert / scan / scan_func / delete  (RwLock)          │
//! └──────────────┬───────────────────────────────┬──────────────┘
//!                │ insert                        │ scan / delete
//!                ▼                               │ (walk directory)
//!       ┌─────────────────┐                      │
//!       │  FreeSpaceMap   │                      │
//!       │  (min-heap by   │                      │
//!       │   free slots)   │                      │
//!       └────────┬────────┘                      │
//!                ▼                               ▼
//!       ┌─────────────────────────────────────────────────┐
//!       │   Page files: [count: u32 LE][rec][rec]...      │
//!       │   {data_dir}/{type_tag}/{page name}             │
//!       └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use pagestore::{Table, TableConfig};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! let config = TableConfig::builder()
//!     .data_dir("./data")
//!     .type_tag("users")
//!     .items_per_page(4)
//!     .build();
//!
//! let users = Table::<User>::open(config)?;
//! users.insert(&User { name: "ada".into(), age: 36 })?;
//!
//! let adults = users.scan_func(10, 0, |u| u.age >= 18)?;
//! users.delete(|u| u.name == "ada")?;
//! # Ok::<(), pagestore::StoreError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod sink;
pub mod fsm;
pub mod page;
pub mod table;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, ResultExt, StoreError};
pub use config::{SyncStrategy, TableConfig};
pub use codec::{BincodeCodec, Codec};
pub use sink::{LogSink, NoopSink, TracingSink};
pub use table::{PageNameGenerator, SequentialNames, Table, UuidNames};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of pagestore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
