//! Error types for pagestore
//!
//! Provides a unified error type for all recoverable failures. Errors are
//! wrapped with the name of each operation they pass through, so a failure
//! deep inside a page read surfaces as a readable causal chain:
//!
//! ```text
//! table::scan: page::read_all_items: Serialization error: io error: unexpected end of file
//! ```
//!
//! Broken internal invariants (e.g. the free-space map handing out a slot it
//! does not have) are not represented here. Those panic.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for pagestore operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Page Errors
    // -------------------------------------------------------------------------
    #[error("Page corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Operation Context
    // -------------------------------------------------------------------------
    #[error("{op}: {source}")]
    Context {
        op: &'static str,
        source: Box<StoreError>,
    },
}

impl StoreError {
    /// Wrap this error with the name of the operation it propagated through
    pub fn context(self, op: &'static str) -> Self {
        StoreError::Context {
            op,
            source: Box::new(self),
        }
    }

    /// The innermost error, with all operation context stripped
    pub fn root_cause(&self) -> &StoreError {
        let mut current = self;
        while let StoreError::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// Operation names from outermost to innermost
    pub fn op_chain(&self) -> Vec<&'static str> {
        let mut ops = Vec::new();
        let mut current = self;
        while let StoreError::Context { op, source } = current {
            ops.push(*op);
            current = source;
        }
        ops
    }

    /// True if the root cause is a malformed page or undecodable record
    pub fn is_corruption(&self) -> bool {
        matches!(
            self.root_cause(),
            StoreError::Corruption(_) | StoreError::Codec(_) | StoreError::Serialization(_)
        )
    }
}

/// Adds operation-name wrapping to any result that can fail with a StoreError
pub trait ResultExt<T> {
    fn context(self, op: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<StoreError>,
{
    fn context(self, op: &'static str) -> Result<T> {
        self.map_err(|e| e.into().context(op))
    }
}
