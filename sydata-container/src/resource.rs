//! URL-addressed containers with scoped writeback.
//!
//! `file:///abs/path.sy?mode=w&link=true` or `mem://name?mode=r`. `mode=w`
//! truncates an on-disk file, `mode=a` opens it for writing as is. The root
//! group of the file records the container type and a format version, so a
//! file opened for reading needs no type from the caller.

use std::ops::{Deref, DerefMut};
use std::path::Path;
use std::sync::Arc;

use sydata_result::{Error, Result};
use sydata_storage::constants::MEM_LOCATION_PREFIX;
use sydata_storage::file::path_location;
use sydata_storage::{AccessMode, AttrValue, Attributes, Group, StoreFile};
use sydata_table::reserved::{TYPE_KEY, VERSION_KEY};
use sydata_types::TypeTag;
use tracing::{debug, warn};
use url::Url;

use crate::container::Container;
use crate::factory::{from_datasource, list_from_datasource};
use crate::group_source::GroupSource;
use crate::list::ListMode;
use crate::source::SourceRef;

/// Highest file format version this crate reads.
pub const FORMAT_VERSION: i64 = 1;

/// Parsed resource URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceUrl {
    location: String,
    mode: AccessMode,
    truncate: bool,
    can_link: bool,
}

fn invalid(url: &str, why: impl std::fmt::Display) -> Error {
    Error::InvalidArgumentError(format!("bad resource url '{url}': {why}"))
}

impl ResourceUrl {
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input).map_err(|e| invalid(input, e))?;
        let location = match url.scheme() {
            "file" => {
                let path = url
                    .to_file_path()
                    .map_err(|()| invalid(input, "not a local file path"))?;
                path_location(&path)?
            }
            "mem" => match url.host_str() {
                Some(name) if !name.is_empty() => {
                    format!("{MEM_LOCATION_PREFIX}{name}{}", url.path())
                }
                _ => return Err(invalid(input, "missing memory file name")),
            },
            other => return Err(invalid(input, format!("unsupported scheme '{other}'"))),
        };

        let mut mode = AccessMode::Read;
        let mut truncate = false;
        let mut can_link = false;
        for (key, value) in url.query_pairs() {
            match (key.as_ref(), value.as_ref()) {
                ("mode", "r") => (mode, truncate) = (AccessMode::Read, false),
                ("mode", "w") => (mode, truncate) = (AccessMode::ReadWrite, true),
                ("mode", "a") => (mode, truncate) = (AccessMode::ReadWrite, false),
                ("link", "true" | "1") => can_link = true,
                ("link", "false" | "0") => can_link = false,
                (key, value) => return Err(invalid(input, format!("option {key}={value}"))),
            }
        }
        Ok(Self {
            location,
            mode,
            truncate,
            can_link,
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Whether opening replaces an on-disk file. Memory files are never
    /// truncated.
    pub fn truncates(&self) -> bool {
        self.truncate
    }

    pub fn can_link(&self) -> bool {
        self.can_link
    }

    pub fn is_writable(&self) -> bool {
        self.mode == AccessMode::ReadWrite
    }

    /// Open the file. Returns whether the caller owns it: a file that was
    /// already open is shared and left open.
    pub fn open_file(&self) -> Result<(StoreFile, bool)> {
        if let Some(file) = StoreFile::find_open(&self.location) {
            if self.is_writable() && !file.is_writable() {
                return Err(Error::ModeViolation(format!(
                    "'{}' is already open read-only",
                    self.location
                )));
            }
            debug!(location = %self.location, "sharing open file");
            return Ok((file, false));
        }
        let file = if self.truncate && !self.location.starts_with(MEM_LOCATION_PREFIX) {
            StoreFile::create(Path::new(&self.location))?
        } else {
            StoreFile::open_location(&self.location, self.mode)?
        };
        Ok((file, true))
    }
}

fn stored_type(root: &Group) -> Result<Option<TypeTag>> {
    if let Some(AttrValue::Int(version)) = root.attr(VERSION_KEY)? {
        if version > FORMAT_VERSION {
            return Err(Error::UnsupportedType(format!(
                "file format version {version}, newest readable is {FORMAT_VERSION}"
            )));
        }
    }
    match root.attr(TYPE_KEY)? {
        Some(value) => match value.as_bytes() {
            Some(bytes) => Ok(Some(String::from_utf8_lossy(bytes).parse()?)),
            None => Err(Error::ConsistencyError(format!(
                "type header of '{}' is not text",
                root.file().location()
            ))),
        },
        None => Ok(None),
    }
}

/// Type of the container at `root`, recording it when `write` is set.
fn resolve_type(root: &Group, requested: Option<&TypeTag>, write: bool) -> Result<TypeTag> {
    let stored = stored_type(root)?;
    let tag = match (requested, stored) {
        (Some(req), Some(stored)) => {
            let fresh = write && root.is_empty()?;
            if !fresh && !req.accepts(&stored) {
                return Err(Error::content_type_mismatch(req, &stored));
            }
            if write { req.clone() } else { stored }
        }
        (Some(req), None) => req.clone(),
        (None, Some(stored)) => stored,
        (None, None) => {
            return Err(Error::InvalidArgumentError(format!(
                "'{}' records no container type and none was given",
                root.file().location()
            )));
        }
    };
    if write {
        root.set_attr(TYPE_KEY, tag.expand().to_string().as_str().into())?;
        root.set_attr(VERSION_KEY, AttrValue::Int(FORMAT_VERSION))?;
    }
    Ok(tag)
}

fn build(source: &SourceRef, tag: &TypeTag, managed: bool) -> Result<Container> {
    match (managed, tag.resolve()) {
        (true, TypeTag::List(inner)) => {
            let mode = if source.can_write() && source.size()? == 0 {
                ListMode::WriteThrough
            } else {
                ListMode::ReadThrough
            };
            debug!(source = %source.identity(), %mode, "managed list");
            Ok(list_from_datasource(source.clone(), inner.as_ref().clone(), mode)?.into())
        }
        _ => from_datasource(source.clone(), tag),
    }
}

/// Open the container at `url`.
///
/// `tag` may be omitted when the file records its type. With `managed`, a
/// list is write-through over a writable empty file and read-through
/// otherwise; without, it is a normal bound list.
pub fn from_url(url: &str, tag: Option<&TypeTag>, managed: bool) -> Result<ScopedContainer> {
    let parsed = ResourceUrl::parse(url)?;
    let (file, owned) = parsed.open_file()?;
    let source: SourceRef = Arc::new(GroupSource::root(
        &file,
        parsed.is_writable(),
        parsed.can_link(),
        owned,
    )?);
    let built = file
        .root()
        .and_then(|root| resolve_type(&root, tag, source.can_write()))
        .and_then(|tag| build(&source, &tag, managed));
    match built {
        Ok(container) => Ok(ScopedContainer {
            container,
            source,
            done: false,
        }),
        Err(err) => {
            if let Err(close_err) = source.close() {
                warn!(url, error = %close_err, "close after failed open");
            }
            Err(err)
        }
    }
}

/// Run `f` on the container at `url`, then write back and close.
///
/// When `f` fails the container is closed without writeback.
pub fn with_url<T>(
    url: &str,
    tag: Option<&TypeTag>,
    managed: bool,
    f: impl FnOnce(&mut Container) -> Result<T>,
) -> Result<T> {
    let mut scoped = from_url(url, tag, managed)?;
    match f(&mut scoped) {
        Ok(value) => {
            scoped.finish()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(close_err) = scoped.abandon() {
                warn!(url, error = %close_err, "close after failed scope");
            }
            Err(err)
        }
    }
}

/// Container bound to a URL-opened file.
///
/// Only `finish` writes back. Dropping the scope, including on an early
/// return, closes the file and discards pending changes.
#[derive(Debug)]
pub struct ScopedContainer {
    container: Container,
    source: SourceRef,
    done: bool,
}

impl ScopedContainer {
    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    fn write_back(&mut self) -> Result<()> {
        if self.source.can_write() {
            self.container.writeback(&self.source, None)?;
        }
        Ok(())
    }

    /// Write back and close. The file is closed even when writeback fails.
    pub fn finish(mut self) -> Result<()> {
        self.done = true;
        let written = self.write_back();
        let closed = self.source.close();
        written.and(closed)
    }

    /// Close without writing back.
    pub fn abandon(mut self) -> Result<()> {
        self.done = true;
        self.source.close()
    }
}

impl Deref for ScopedContainer {
    type Target = Container;

    fn deref(&self) -> &Container {
        &self.container
    }
}

impl DerefMut for ScopedContainer {
    fn deref_mut(&mut self) -> &mut Container {
        &mut self.container
    }
}

impl Drop for ScopedContainer {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        debug!(source = %self.source.identity(), "scope dropped without finish, skipping writeback");
        if let Err(err) = self.source.close() {
            warn!(source = %self.source.identity(), error = %err, "close on drop failed");
        }
    }
}
