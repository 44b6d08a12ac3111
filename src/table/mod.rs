//! Table Module
//!
//! The collection-level API over one record type's pages.
//!
//! ## Responsibilities
//! - Discover existing pages on startup and index the ones with room
//! - Route each insert to the fullest page that still has a free slot
//! - Scan and filter every page with offset/limit windowing
//! - Delete by predicate, compacting each affected page in place
//!
//! ## Directory Layout
//! ```text
//! {data_dir}/
//!   └── {type_tag}/          one directory per table
//!         ├── {page name}    one file per page
//!         └── {page name}
//! ```
//!
//! ## Concurrency
//! One reader/writer lock per table, held for the whole operation:
//! `insert`/`delete` take it exclusively, `scan`/`scan_func` share it.

mod naming;
#[allow(clippy::module_inception)]
mod table;

pub use naming::{PageNameGenerator, SequentialNames, UuidNames};
pub use table::Table;
