//! Page file handle
//!
//! Opens page files and reads, appends, and rewrites their records.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use crate::codec::Codec;
use crate::config::SyncStrategy;
use crate::error::{Result, ResultExt, StoreError};

use super::HEADER_SIZE;

/// An open page file holding records of type `T`
///
/// Every method that reads or writes seeks first, so the handle's file
/// position carries no meaning between calls.
pub struct Page<T, C> {
    /// Path of the page file
    path: PathBuf,
    /// Open read/write handle
    file: File,
    /// Record codec
    codec: C,
    /// When to fsync
    sync_strategy: SyncStrategy,
    /// Written since the last fsync
    dirty: bool,
    _record: PhantomData<fn() -> T>,
}

impl<T, C> Page<T, C>
where
    C: Codec<T>,
{
    /// Create a new, empty page file
    ///
    /// Fails if a file already exists at `path`.
    pub fn create(path: &Path, codec: C, sync_strategy: SyncStrategy) -> Result<Self> {
        const OP: &str = "page::create";

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .context(OP)?;

        let mut page = Self::from_file(path, file, codec, sync_strategy);
        page.write_count(0).context(OP)?;
        page.sync_if_needed().context(OP)?;

        tracing::debug!("Created page {}", path.display());
        Ok(page)
    }

    /// Open an existing page file without touching its contents
    pub fn open(path: &Path, codec: C, sync_strategy: SyncStrategy) -> Result<Self> {
        const OP: &str = "page::open";

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .context(OP)?;

        tracing::trace!("Opened page {}", path.display());
        Ok(Self::from_file(path, file, codec, sync_strategy))
    }

    /// Read the record count from the header
    pub fn read_count(&mut self) -> Result<u32> {
        const OP: &str = "page::read_count";

        self.file.seek(SeekFrom::Start(0)).context(OP)?;

        let mut header = [0u8; HEADER_SIZE as usize];
        if let Err(e) = self.file.read_exact(&mut header) {
            if e.kind() == ErrorKind::UnexpectedEof {
                return Err(StoreError::Corruption(format!(
                    "page {} is shorter than its {}-byte header",
                    self.path.display(),
                    HEADER_SIZE
                ))
                .context(OP));
            }
            return Err(StoreError::from(e).context(OP));
        }

        Ok(u32::from_le_bytes(header))
    }

    /// Decode every record in the page, in append order
    ///
    /// Reads until the payload runs out. The header count is not consulted.
    pub fn read_all_items(&mut self) -> Result<Vec<T>> {
        const OP: &str = "page::read_all_items";

        self.file.seek(SeekFrom::Start(HEADER_SIZE)).context(OP)?;

        let mut reader = BufReader::new(&mut self.file);
        let mut items = Vec::new();

        while let Some(item) = self.codec.decode(&mut reader).context(OP)? {
            items.push(item);
        }

        Ok(items)
    }

    /// Append one record
    ///
    /// Bumps the header count, then appends the encoded record. The two
    /// writes are not atomic.
    pub fn insert_item(&mut self, item: &T) -> Result<()> {
        const OP: &str = "page::insert_item";

        // Encode up front so a codec failure leaves the file untouched
        let mut payload = Vec::new();
        self.codec.encode(item, &mut payload).context(OP)?;

        self.increment_count().context(OP)?;
        self.append(&payload).context(OP)?;
        self.sync_if_needed().context(OP)?;

        Ok(())
    }

    /// Replace the page's contents with `items`
    ///
    /// Used for compaction: truncate, then re-append survivors in order.
    pub fn rewrite(&mut self, items: &[T]) -> Result<()> {
        const OP: &str = "page::rewrite";

        let count = u32::try_from(items.len()).map_err(|_| {
            StoreError::Corruption(format!("{} records do not fit a page header", items.len()))
                .context(OP)
        })?;

        let mut payload = Vec::new();
        for item in items {
            self.codec.encode(item, &mut payload).context(OP)?;
        }

        self.truncate().context(OP)?;
        self.write_count(count).context(OP)?;
        self.append(&payload).context(OP)?;
        self.sync_if_needed().context(OP)?;

        Ok(())
    }

    /// Reset the page to zero records
    pub fn truncate(&mut self) -> Result<()> {
        const OP: &str = "page::truncate";

        self.file.set_len(0).context(OP)?;
        self.dirty = true;
        self.write_count(0).context(OP)?;
        self.sync_if_needed().context(OP)?;

        tracing::debug!("Truncated page {}", self.path.display());
        Ok(())
    }

    /// Close the handle and remove the page file
    pub fn delete(self) -> Result<()> {
        const OP: &str = "page::delete";

        let Page { path, file, .. } = self;
        drop(file);

        fs::remove_file(&path).context(OP)?;

        tracing::debug!("Deleted page {}", path.display());
        Ok(())
    }

    /// Release the handle
    ///
    /// Under [`SyncStrategy::OnClose`], unsynced writes are flushed to disk first.
    pub fn close(self) -> Result<()> {
        const OP: &str = "page::close";

        if self.sync_strategy == SyncStrategy::OnClose && self.dirty {
            self.file.sync_all().context(OP)?;
        }

        tracing::trace!("Closed page {}", self.path.display());
        Ok(())
    }

    /// File name of the page (its unique id)
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Full path of the page file
    pub fn path(&self) -> &Path {
        &self.path
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn from_file(path: &Path, file: File, codec: C, sync_strategy: SyncStrategy) -> Self {
        Self {
            path: path.to_path_buf(),
            file,
            codec,
            sync_strategy,
            dirty: false,
            _record: PhantomData,
        }
    }

    fn write_count(&mut self, count: u32) -> Result<()> {
        const OP: &str = "page::write_count";

        self.file.seek(SeekFrom::Start(0)).context(OP)?;
        self.file.write_all(&count.to_le_bytes()).context(OP)?;
        self.dirty = true;

        Ok(())
    }

    fn increment_count(&mut self) -> Result<()> {
        const OP: &str = "page::increment_count";

        let count = self.read_count().context(OP)?;
        let next = count.checked_add(1).ok_or_else(|| {
            StoreError::Corruption(format!("record count overflow in {}", self.path.display()))
                .context(OP)
        })?;
        self.write_count(next).context(OP)
    }

    fn append(&mut self, payload: &[u8]) -> Result<()> {
        const OP: &str = "page::append";

        self.file.seek(SeekFrom::End(0)).context(OP)?;
        self.file.write_all(payload).context(OP)?;
        self.dirty = true;

        Ok(())
    }

    fn sync_if_needed(&mut self) -> Result<()> {
        if self.sync_strategy == SyncStrategy::EveryWrite && self.dirty {
            self.file.sync_all()?;
            self.dirty = false;
        }
        Ok(())
    }
}

impl<T, C> fmt::Debug for Page<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("path", &self.path)
            .field("dirty", &self.dirty)
            .finish()
    }
}
