//! Open files and the process-wide registry of open locations.
//!
//! A [`StoreFile`] owns a pager and a cache of decoded nodes. Opening a
//! location that is already open returns the shared handle, which is how
//! external links into `mem://` files resolve inside one process.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, Mutex, PoisonError, RwLock, Weak};

use rustc_hash::FxHashMap;
use sydata_result::{Error, Result};
use tracing::{debug, trace};

use crate::constants::{MEM_LOCATION_PREFIX, ROOT_NODE_PKEY};
use crate::group::Group;
use crate::node::{Link, Node, NodeKind};
use crate::pager::{BatchGet, BatchPut, Blob, DynPager, GetResult, MemPager, RedbPager};
use crate::types::PhysicalKey;

/// Process-unique identity of an open file.
pub type FileId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    ReadWrite,
}

static NEXT_FILE_ID: AtomicU64 = AtomicU64::new(1);

type Registry = FxHashMap<String, (FileId, Weak<FileInner>)>;

static OPEN_FILES: LazyLock<Mutex<Registry>> = LazyLock::new(|| Mutex::new(Registry::default()));

fn lookup(location: &str) -> Option<StoreFile> {
    let reg = OPEN_FILES.lock().unwrap_or_else(PoisonError::into_inner);
    reg.get(location)
        .and_then(|(_, weak)| weak.upgrade())
        .map(|inner| StoreFile { inner })
}

fn unregister(location: &str, id: FileId) {
    let mut reg = OPEN_FILES.lock().unwrap_or_else(PoisonError::into_inner);
    if reg.get(location).is_some_and(|(held, _)| *held == id) {
        reg.remove(location);
    }
}

/// Absolute UTF-8 location string for a filesystem path.
pub fn path_location(path: &Path) -> Result<String> {
    let abs = std::path::absolute(path)?;
    abs.to_str().map(str::to_owned).ok_or_else(|| {
        Error::InvalidArgumentError(format!("file path {} is not valid UTF-8", abs.display()))
    })
}

struct FileInner {
    id: FileId,
    location: String,
    writable: bool,
    pager: RwLock<Option<Arc<DynPager>>>,
    nodes: RwLock<FxHashMap<PhysicalKey, Arc<Node>>>,
}

impl Drop for FileInner {
    fn drop(&mut self) {
        unregister(&self.location, self.id);
    }
}

/// Shared handle to an open file.
#[derive(Clone)]
pub struct StoreFile {
    inner: Arc<FileInner>,
}

impl fmt::Debug for StoreFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreFile")
            .field("id", &self.inner.id)
            .field("location", &self.inner.location)
            .field("writable", &self.inner.writable)
            .field("open", &self.is_open())
            .finish()
    }
}

impl StoreFile {
    /// Open the in-memory file `mem://<name>`, creating it if needed.
    pub fn in_memory(name: &str) -> Result<Self> {
        let location = format!("{MEM_LOCATION_PREFIX}{name}");
        if let Some(file) = lookup(&location) {
            return Ok(file);
        }
        Self::register(location, Arc::new(MemPager::new()), true)
    }

    /// Create a file at `path`, truncating any existing content.
    pub fn create(path: &Path) -> Result<Self> {
        let location = path_location(path)?;
        if lookup(&location).is_some() {
            return Err(Error::InvalidArgumentError(format!(
                "cannot truncate '{location}' while it is open"
            )));
        }
        let pager = RedbPager::create_truncate(path)?;
        debug!(location = %location, "created file");
        Self::register(location, Arc::new(pager), true)
    }

    /// Open the file at `path`. `ReadWrite` creates a missing file.
    pub fn open(path: &Path, mode: AccessMode) -> Result<Self> {
        let location = path_location(path)?;
        if let Some(file) = lookup(&location) {
            if mode == AccessMode::ReadWrite && !file.is_writable() {
                return Err(Error::ModeViolation(format!(
                    "'{location}' is already open read-only"
                )));
            }
            return Ok(file);
        }
        if mode == AccessMode::Read && !path.exists() {
            return Err(Error::not_found(format!("file '{location}'")));
        }
        let pager = RedbPager::open(path)?;
        debug!(location = %location, ?mode, "opened file");
        Self::register(location, Arc::new(pager), mode == AccessMode::ReadWrite)
    }

    /// Open by location string: `mem://name` or a filesystem path.
    pub fn open_location(location: &str, mode: AccessMode) -> Result<Self> {
        match location.strip_prefix(MEM_LOCATION_PREFIX) {
            Some(name) => match (lookup(location), mode) {
                (Some(file), _) => Ok(file),
                (None, AccessMode::ReadWrite) => Self::in_memory(name),
                (None, AccessMode::Read) => Err(Error::not_found(format!("file '{location}'"))),
            },
            None => Self::open(Path::new(location), mode),
        }
    }

    /// Register a file over an existing pager under `location`.
    pub fn with_pager(
        location: impl Into<String>,
        pager: Arc<DynPager>,
        writable: bool,
    ) -> Result<Self> {
        let location = location.into();
        if lookup(&location).is_some() {
            return Err(Error::InvalidArgumentError(format!(
                "'{location}' is already open"
            )));
        }
        Self::register(location, pager, writable)
    }

    fn register(location: String, pager: Arc<DynPager>, writable: bool) -> Result<Self> {
        let file = StoreFile {
            inner: Arc::new(FileInner {
                id: NEXT_FILE_ID.fetch_add(1, Ordering::Relaxed),
                location,
                writable,
                pager: RwLock::new(Some(pager)),
                nodes: RwLock::new(FxHashMap::default()),
            }),
        };
        file.ensure_root()?;
        let mut reg = OPEN_FILES.lock().unwrap_or_else(PoisonError::into_inner);
        reg.insert(
            file.inner.location.clone(),
            (file.inner.id, Arc::downgrade(&file.inner)),
        );
        Ok(file)
    }

    fn ensure_root(&self) -> Result<()> {
        if self.try_load_node(ROOT_NODE_PKEY)?.is_some() {
            return Ok(());
        }
        if !self.inner.writable {
            return Err(Error::Codec(format!(
                "'{}' has no root group",
                self.inner.location
            )));
        }
        self.store_node(ROOT_NODE_PKEY, Node::empty_group())
    }

    /// The open file registered under `location`, if any.
    pub fn find_open(location: &str) -> Option<StoreFile> {
        lookup(location)
    }

    pub fn id(&self) -> FileId {
        self.inner.id
    }

    pub fn location(&self) -> &str {
        &self.inner.location
    }

    pub fn is_writable(&self) -> bool {
        self.inner.writable
    }

    pub fn is_open(&self) -> bool {
        self.inner
            .pager
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn same_file(&self, other: &StoreFile) -> bool {
        self.inner.id == other.inner.id
    }

    pub fn root(&self) -> Result<Group> {
        self.pager()?;
        Ok(Group::new(self.clone(), ROOT_NODE_PKEY, "/".to_string()))
    }

    /// Release the pager. Every handle sharing this file sees it closed.
    pub fn close(&self) -> Result<()> {
        let pager = self
            .inner
            .pager
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        self.inner
            .nodes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        unregister(&self.inner.location, self.inner.id);
        if pager.is_some() {
            debug!(location = %self.inner.location, "closed file");
        }
        Ok(())
    }

    /// Resolve an external link target location to an open file, opening
    /// file-backed targets read-only on demand.
    pub(crate) fn resolve_external(location: &str) -> Result<StoreFile> {
        if let Some(file) = lookup(location) {
            return Ok(file);
        }
        Self::open_location(location, AccessMode::Read)
    }

    /// Walk an absolute path from the root, following links.
    pub(crate) fn resolve_path(&self, path: &str) -> Result<(StoreFile, PhysicalKey)> {
        let mut file = self.clone();
        let mut pk = ROOT_NODE_PKEY;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let node = file.load_node(pk)?;
            let link = node
                .children()?
                .get(segment)
                .cloned()
                .ok_or_else(|| Error::not_found(format!("'{path}' in '{}'", file.location())))?;
            match link {
                Link::Hard(child) => pk = child,
                Link::External { file: target, path } => {
                    let target = StoreFile::resolve_external(&target)?;
                    let (f, k) = target.resolve_path(&path)?;
                    file = f;
                    pk = k;
                }
            }
        }
        Ok((file, pk))
    }

    // ---- node and blob I/O --------------------------------------------------

    pub(crate) fn pager(&self) -> Result<Arc<DynPager>> {
        self.inner
            .pager
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| {
                Error::InvalidArgumentError(format!("'{}' is closed", self.inner.location))
            })
    }

    pub(crate) fn ensure_writable(&self, operation: &str) -> Result<()> {
        if self.inner.writable {
            Ok(())
        } else {
            Err(Error::mode_violation(operation, "read-only"))
        }
    }

    pub(crate) fn alloc(&self, n: usize) -> Result<Vec<PhysicalKey>> {
        self.pager()?.alloc_many(n)
    }

    pub(crate) fn get_blob(&self, pk: PhysicalKey) -> Result<Blob> {
        let results = self.pager()?.batch_get(&[BatchGet::Raw { key: pk }])?;
        match results.into_iter().next() {
            Some(GetResult::Raw { bytes, .. }) => Ok(bytes),
            _ => Err(Error::Internal(format!(
                "missing blob {pk} in '{}'",
                self.inner.location
            ))),
        }
    }

    pub(crate) fn put_blob(&self, pk: PhysicalKey, bytes: Vec<u8>) -> Result<()> {
        self.ensure_writable("write")?;
        self.pager()?
            .batch_put(&[BatchPut::Raw { key: pk, bytes }])
    }

    fn try_load_node(&self, pk: PhysicalKey) -> Result<Option<Arc<Node>>> {
        {
            let cache = self.inner.nodes.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(node) = cache.get(&pk) {
                return Ok(Some(Arc::clone(node)));
            }
        }
        let results = self.pager()?.batch_get(&[BatchGet::Raw { key: pk }])?;
        let Some(GetResult::Raw { bytes, .. }) = results.into_iter().next() else {
            return Ok(None);
        };
        let node = Arc::new(Node::decode(&bytes)?);
        trace!(location = %self.inner.location, pk, "loaded node");
        self.inner
            .nodes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pk, Arc::clone(&node));
        Ok(Some(node))
    }

    pub(crate) fn load_node(&self, pk: PhysicalKey) -> Result<Arc<Node>> {
        self.try_load_node(pk)?.ok_or_else(|| {
            Error::Internal(format!("missing node {pk} in '{}'", self.inner.location))
        })
    }

    pub(crate) fn store_node(&self, pk: PhysicalKey, node: Node) -> Result<()> {
        self.put_blob(pk, node.encode())?;
        self.inner
            .nodes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pk, Arc::new(node));
        Ok(())
    }

    /// Load, modify and store one node.
    pub(crate) fn update_node<R>(
        &self,
        pk: PhysicalKey,
        f: impl FnOnce(&mut Node) -> Result<R>,
    ) -> Result<R> {
        self.ensure_writable("modify")?;
        let mut node = (*self.load_node(pk)?).clone();
        let out = f(&mut node)?;
        self.store_node(pk, node)?;
        Ok(out)
    }

    /// Drop one hard link to `pk`, freeing the node and what it owns when no
    /// links remain.
    pub(crate) fn release(&self, pk: PhysicalKey) -> Result<()> {
        let node = self.load_node(pk)?;
        if node.links > 1 {
            return self.update_node(pk, |n| {
                n.links -= 1;
                Ok(())
            });
        }
        let mut freed = vec![pk];
        match &node.kind {
            NodeKind::Dataset(info) => freed.push(info.payload_pk),
            NodeKind::Group { children } => {
                for link in children.values() {
                    if let Link::Hard(child) = link {
                        self.release(*child)?;
                    }
                }
            }
        }
        self.pager()?.free_many(&freed)?;
        let mut cache = self.inner.nodes.write().unwrap_or_else(PoisonError::into_inner);
        for key in &freed {
            cache.remove(key);
        }
        Ok(())
    }
}
