//! Configuration for pagestore tables
//!
//! Centralized configuration with sensible defaults.

use std::path::{Component, Path, PathBuf};

use crate::error::{Result, StoreError};

/// Configuration for a single table
#[derive(Debug, Clone)]
pub struct TableConfig {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory shared by all tables
    /// Internal structure:
    ///   {data_dir}/
    ///     └── {type_tag}/
    ///           ├── 3f0c...e1    (page file)
    ///           └── 9a41...07    (page file)
    pub data_dir: PathBuf,

    /// Directory name for this table's record type
    pub type_tag: String,

    // -------------------------------------------------------------------------
    // Page Configuration
    // -------------------------------------------------------------------------
    /// Max number of records stored in one page file
    pub items_per_page: u32,

    /// Sync strategy: whether page writes are fsynced
    pub sync_strategy: SyncStrategy,
}

/// Page sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Leave flushing to the OS (fastest, no durability guarantee on crash)
    Never,

    /// fsync a page before the operation that wrote it returns
    EveryWrite,

    /// fsync a written page when its handle is closed
    OnClose,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            type_tag: "records".to_string(),
            items_per_page: 64,
            sync_strategy: SyncStrategy::Never,
        }
    }
}

impl TableConfig {
    /// Create a new config builder
    pub fn builder() -> TableConfigBuilder {
        TableConfigBuilder::default()
    }

    /// Directory holding this table's page files
    pub fn table_dir(&self) -> PathBuf {
        self.data_dir.join(&self.type_tag)
    }

    /// Reject configurations a table cannot be opened with
    pub fn validate(&self) -> Result<()> {
        if self.items_per_page == 0 {
            return Err(StoreError::Config(
                "items_per_page must be greater than zero".to_string(),
            ));
        }

        if self.type_tag.is_empty() {
            return Err(StoreError::Config("type_tag must not be empty".to_string()));
        }

        // The tag must name exactly one directory below data_dir
        let mut components = Path::new(&self.type_tag).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(StoreError::Config(format!(
                "type_tag must be a single directory name, got {:?}",
                self.type_tag
            ))),
        }
    }
}

/// Builder for TableConfig
#[derive(Default)]
pub struct TableConfigBuilder {
    config: TableConfig,
}

impl TableConfigBuilder {
    /// Set the data directory (root for all tables)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the record type tag (table subdirectory name)
    pub fn type_tag(mut self, tag: impl Into<String>) -> Self {
        self.config.type_tag = tag.into();
        self
    }

    /// Set the page capacity
    pub fn items_per_page(mut self, count: u32) -> Self {
        self.config.items_per_page = count;
        self
    }

    /// Set the page sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    pub fn build(self) -> TableConfig {
        self.config
    }
}
