//! Log sink
//!
//! Tables report what they do through an injected [`LogSink`] rather than a
//! process-wide logger, so they can run silently in tests or be observed by
//! a recording sink. Nothing a sink does affects correctness.

use std::fmt;

/// Receives informational messages with structured fields
pub trait LogSink: Send + Sync {
    fn info(&self, message: &str, fields: &[(&str, &dyn fmt::Display)]);
}

/// Forwards messages to `tracing` at INFO level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn info(&self, message: &str, fields: &[(&str, &dyn fmt::Display)]) {
        tracing::info!(target: "pagestore", fields = %Fields(fields), "{}", message);
    }
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn info(&self, _message: &str, _fields: &[(&str, &dyn fmt::Display)]) {}
}

/// Renders fields as `key=value key=value`
struct Fields<'a>(&'a [(&'a str, &'a dyn fmt::Display)]);

impl fmt::Display for Fields<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}
