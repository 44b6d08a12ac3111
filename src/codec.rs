//! Record codec
//!
//! Pages store records back to back with no framing of their own, so the
//! codec must be self-delimiting: `decode` has to consume exactly one record
//! and report a clean end of stream when the reader is exhausted at a record
//! boundary.

use std::io::{BufRead, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Encodes and decodes one record type to and from a byte stream
pub trait Codec<T>: Clone + Send + Sync + 'static {
    /// Append the encoding of `item` to `writer`
    fn encode<W: Write>(&self, item: &T, writer: &mut W) -> Result<()>;

    /// Decode the next record.
    ///
    /// Returns:
    /// - `Ok(Some(item))`: a full record was read
    /// - `Ok(None)`: the reader was already at end of stream
    /// - `Err(_)`: the data ended mid-record or is malformed
    fn decode<R: BufRead>(&self, reader: &mut R) -> Result<Option<T>>;
}

/// Default codec: serde + bincode
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl<T> Codec<T> for BincodeCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode<W: Write>(&self, item: &T, writer: &mut W) -> Result<()> {
        bincode::serialize_into(writer, item)?;
        Ok(())
    }

    fn decode<R: BufRead>(&self, reader: &mut R) -> Result<Option<T>> {
        // Nothing buffered and nothing left to read: clean end of stream
        if reader.fill_buf()?.is_empty() {
            return Ok(None);
        }

        let item = bincode::deserialize_from(reader)?;
        Ok(Some(item))
    }
}
