//! Table implementation
//!
//! Coordinates page files, the free-space map, and the table lock.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::codec::{BincodeCodec, Codec};
use crate::config::{SyncStrategy, TableConfig};
use crate::error::{Result, ResultExt, StoreError};
use crate::fsm::{FreeSpaceMap, Reservation};
use crate::page::Page;
use crate::sink::{LogSink, TracingSink};

use super::naming::{PageNameGenerator, UuidNames};

/// A durable collection of `T` records spread over fixed-capacity pages
///
/// ## Concurrency:
/// - `free_space`: the table lock. Writers (`insert`, `delete`) hold it
///   exclusively; readers (`scan`, `scan_func`, `count`) share it and never
///   touch the map behind it
/// - All methods use `&self`; share a table across threads with `Arc`
///
/// Only one `Table` should be open per directory. Nothing guards against two
/// instances, in this process or another, writing the same pages.
pub struct Table<T, C = BincodeCodec> {
    /// Directory holding this table's pages
    dir: PathBuf,

    /// Max records per page
    items_per_page: u32,

    /// Passed to every page this table opens
    sync_strategy: SyncStrategy,

    /// Record codec (cloned into each page)
    codec: C,

    /// Names new page files
    names: Box<dyn PageNameGenerator>,

    /// Receives informational messages
    sink: Arc<dyn LogSink>,

    /// Pages with free slots, behind the table lock
    free_space: RwLock<FreeSpaceMap<Page<T, C>>>,
}

impl<T> Table<T>
where
    BincodeCodec: Codec<T>,
{
    /// Open a table with the default codec, UUID page names, and a tracing sink
    pub fn open(config: TableConfig) -> Result<Self> {
        Self::open_with(config, BincodeCodec, UuidNames, Arc::new(TracingSink))
    }

    /// Open a table with the default codec and UUID page names
    pub fn new(config: TableConfig, sink: Arc<dyn LogSink>) -> Result<Self> {
        Self::open_with(config, BincodeCodec, UuidNames, sink)
    }
}

impl<T, C> Table<T, C>
where
    C: Codec<T>,
{
    /// Open or create a table
    ///
    /// On startup:
    /// 1. Validate the config and create the table directory if needed
    /// 2. Open every existing page and read its header
    /// 3. Index each page with `count < items_per_page`; close the full ones
    pub fn open_with(
        config: TableConfig,
        codec: C,
        names: impl PageNameGenerator + 'static,
        sink: Arc<dyn LogSink>,
    ) -> Result<Self> {
        const OP: &str = "table::open";

        config.validate().context(OP)?;

        let dir = config.table_dir();
        fs::create_dir_all(&dir).context(OP)?;

        let items_per_page = config.items_per_page;
        let mut free_space = FreeSpaceMap::new();

        for path in list_pages(&dir).context(OP)? {
            let mut page = Page::open(&path, codec.clone(), config.sync_strategy).context(OP)?;
            let count = page.read_count().context(OP)?;

            sink.info("init: read page count", &[("page", &page.name()), ("count", &count)]);

            if count < items_per_page {
                free_space.push(page, items_per_page - count);
            } else {
                page.close().context(OP)?;
            }
        }

        sink.info(
            "init: table ready",
            &[
                ("dir", &dir.display()),
                ("indexed_pages", &free_space.len()),
                ("free_slots", &free_space.total_free()),
            ],
        );

        Ok(Self {
            dir,
            items_per_page,
            sync_strategy: config.sync_strategy,
            codec,
            names: Box::new(names),
            sink,
            free_space: RwLock::new(free_space),
        })
    }

    /// Store one record
    ///
    /// Steps:
    /// 1. Acquire the table lock exclusively
    /// 2. Reserve a slot in the fullest page with room
    /// 3. If no page has room, create one
    /// 4. Append the record to the chosen page
    /// 5. If the append failed, recount the page so its free slots match
    ///    its header again
    pub fn insert(&self, item: &T) -> Result<()> {
        const OP: &str = "table::insert";

        let mut free_space = self.free_space.write();

        let (result, refile) = match free_space.pop() {
            Some(Reservation::Partial(page)) => match page.insert_item(item) {
                Ok(()) => {
                    self.sink.info("insert: appended to page", &[("page", &page.name())]);
                    (Ok(()), None)
                }
                Err(e) => {
                    let count = page.read_count().ok();
                    (Err(e), Some(Refile::Recount(page.path().to_path_buf(), count)))
                }
            },
            Some(Reservation::Last(mut page)) => match page.insert_item(item) {
                Ok(()) => {
                    self.sink.info("insert: page is now full", &[("page", &page.name())]);
                    (page.close(), None)
                }
                Err(e) => match page.read_count() {
                    Ok(count) if count < self.items_per_page => {
                        (Err(e), Some(Refile::Push(page, self.items_per_page - count)))
                    }
                    _ => {
                        discard(page);
                        (Err(e), None)
                    }
                },
            },
            None => match self.insert_into_new_page(item) {
                Ok((page, free)) => (Ok(()), Some(Refile::Push(page, free))),
                Err(e) => (Err(e), None),
            },
        };

        let refiled = match refile {
            Some(refile) => self.refile(&mut free_space, refile),
            None => Ok(()),
        };

        result.context(OP)?;
        refiled.context(OP)
    }

    /// Up to `limit` records, after skipping the first `offset`
    pub fn scan(&self, limit: usize, offset: usize) -> Result<Vec<T>> {
        self.scan_func(limit, offset, |_| true).context("table::scan")
    }

    /// Up to `limit` records matching `pred`, after skipping the first
    /// `offset` matches
    ///
    /// `offset` counts matches exactly: `scan_func(n, 0, pred)` starts at
    /// the first match, `scan_func(n, 1, pred)` at the second.
    ///
    /// Pages are visited in file-name order; records within a page come back
    /// in insertion order. The skip and limit counters run across pages.
    pub fn scan_func<F>(&self, limit: usize, offset: usize, mut pred: F) -> Result<Vec<T>>
    where
        F: FnMut(&T) -> bool,
    {
        const OP: &str = "table::scan_func";

        let _guard = self.free_space.read();

        let mut items = Vec::with_capacity(limit.min(self.items_per_page as usize));
        let mut skipped = 0usize;

        for path in list_pages(&self.dir).context(OP)? {
            if items.len() >= limit {
                break;
            }

            for item in self.read_page(&path).context(OP)? {
                if !pred(&item) {
                    continue;
                }
                if skipped < offset {
                    skipped += 1;
                    continue;
                }
                if items.len() >= limit {
                    break;
                }
                items.push(item);
            }
        }

        Ok(items)
    }

    /// Remove every record matching `pred`, returning how many were removed
    ///
    /// Each page that loses records is truncated and rewritten with its
    /// survivors in their original order, then put back in the free-space map
    /// with its new free slot count. Pages with nothing to remove are left
    /// untouched on disk. A failure partway leaves earlier pages rewritten.
    pub fn delete<F>(&self, mut pred: F) -> Result<usize>
    where
        F: FnMut(&T) -> bool,
    {
        const OP: &str = "table::delete";

        let mut free_space = self.free_space.write();
        let mut removed = 0;

        for path in list_pages(&self.dir).context(OP)? {
            let mut page = self.open_page(&path).context(OP)?;
            let mut items = page.read_all_items().context(OP)?;

            let before = items.len();
            items.retain(|item| !pred(item));

            if items.len() == before {
                self.sink.info("delete: page unchanged", &[("page", &page.name())]);
                page.close().context(OP)?;
                continue;
            }

            page.rewrite(&items).context(OP)?;
            removed += before - items.len();

            // The map's handle for this page, if any, has a stale free count
            if let Some((stale, _)) = free_space.remove(|p| p.path() == path.as_path()) {
                stale.close().context(OP)?;
            }

            let count = u32::try_from(items.len()).unwrap_or(u32::MAX);
            let free = self.items_per_page.saturating_sub(count);

            self.sink.info(
                "delete: page compacted",
                &[("page", &page.name()), ("remaining", &count), ("free", &free)],
            );

            if free > 0 {
                free_space.push(page, free);
            } else {
                page.close().context(OP)?;
            }
        }

        Ok(removed)
    }

    /// Total number of records in the table
    pub fn count(&self) -> Result<usize> {
        const OP: &str = "table::count";

        let _guard = self.free_space.read();

        let mut total = 0;
        for path in list_pages(&self.dir).context(OP)? {
            total += self.read_page(&path).context(OP)?.len();
        }

        Ok(total)
    }

    /// Close every indexed page
    pub fn close(self) -> Result<()> {
        const OP: &str = "table::close";

        for (page, _) in self.free_space.into_inner().into_pages() {
            page.close().context(OP)?;
        }

        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the table directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get the page capacity
    pub fn items_per_page(&self) -> u32 {
        self.items_per_page
    }

    /// File names of all pages, sorted
    pub fn page_names(&self) -> Result<Vec<String>> {
        let _guard = self.free_space.read();

        let names = list_pages(&self.dir)
            .context("table::page_names")?
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();

        Ok(names)
    }

    /// Number of pages in the free-space map
    pub fn indexed_pages(&self) -> usize {
        self.free_space.read().len()
    }

    /// Free slots across all indexed pages
    pub fn free_slots(&self) -> u64 {
        self.free_space.read().total_free()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Path for a new page, from the name generator
    fn new_page_name(&self) -> PathBuf {
        self.dir.join(self.names.next_name())
    }

    /// Create a page under the next free name
    ///
    /// Names already taken on disk are skipped, so a generator that restarts
    /// its sequence still finds room.
    fn create_page(&self) -> Result<Page<T, C>> {
        let mut attempts_left = None;

        loop {
            let path = self.new_page_name();

            match Page::create(&path, self.codec.clone(), self.sync_strategy) {
                Err(e) if is_already_exists(&e) => {
                    // Each collision is an existing file, so a generator of
                    // distinct names gets through in at most that many tries
                    let left = match attempts_left {
                        Some(left) => left,
                        None => list_pages(&self.dir)?.len(),
                    };
                    if left == 0 {
                        return Err(e);
                    }
                    attempts_left = Some(left - 1);

                    tracing::debug!("Page name {} already taken, trying the next one", path.display());
                }
                result => return result,
            }
        }
    }

    /// Apply a free-space change left over from an insert
    fn refile(&self, free_space: &mut FreeSpaceMap<Page<T, C>>, refile: Refile<T, C>) -> Result<()> {
        match refile {
            Refile::Push(page, free) if free > 0 => free_space.push(page, free),
            Refile::Push(page, _) => page.close()?,
            Refile::Recount(path, Some(count)) if count < self.items_per_page => {
                let free = self.items_per_page - count;
                free_space.update(|p| p.path() == path.as_path(), free);
                tracing::warn!("Insert into {} failed; page keeps {} free slots", path.display(), free);
            }
            Refile::Recount(path, _) => {
                // Full, or the header is unreadable: stop offering the page
                if let Some((page, _)) = free_space.remove(|p| p.path() == path.as_path()) {
                    discard(page);
                }
                tracing::warn!("Insert into {} failed; page dropped from free space map", path.display());
            }
        }

        Ok(())
    }

    /// Create a page holding just `item`, with its remaining free slots
    fn insert_into_new_page(&self, item: &T) -> Result<(Page<T, C>, u32)> {
        let mut page = self.create_page()?;

        // Don't leave an unusable page behind
        if let Err(e) = page.insert_item(item) {
            let name = page.name();
            if let Err(cleanup) = page.delete() {
                tracing::warn!("Failed to remove page {} after failed insert: {}", name, cleanup);
            }
            return Err(e);
        }

        let free = self.items_per_page - 1;
        self.sink.info(
            "insert: appended to new page",
            &[("page", &page.name()), ("free", &free)],
        );

        Ok((page, free))
    }

    fn open_page(&self, path: &Path) -> Result<Page<T, C>> {
        Page::open(path, self.codec.clone(), self.sync_strategy)
    }

    /// Open, fully read, and close one page
    fn read_page(&self, path: &Path) -> Result<Vec<T>> {
        let mut page = self.open_page(path)?;
        let items = page.read_all_items()?;
        page.close()?;
        Ok(items)
    }
}

/// Free-space map change to apply once a slot reservation is released
enum Refile<T, C> {
    /// Track a page that is not in the map
    Push(Page<T, C>, u32),

    /// Re-derive the free slots of a mapped page from its record count
    Recount(PathBuf, Option<u32>),
}

/// Close a page on an error path, logging instead of failing
fn discard<T, C: Codec<T>>(page: Page<T, C>) {
    let name = page.name();
    if let Err(e) = page.close() {
        tracing::warn!("Failed to close page {}: {}", name, e);
    }
}

fn is_already_exists(err: &StoreError) -> bool {
    matches!(err.root_cause(), StoreError::Io(e) if e.kind() == ErrorKind::AlreadyExists)
}

/// Page files in `dir`, sorted by file name
fn list_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pages = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            pages.push(entry.path());
        }
    }

    pages.sort();
    Ok(pages)
}
