#![allow(dead_code)] // Each test file is its own crate and uses a subset.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use sydata_container::{Container, DataSource, GroupSource, List, SourceIdentity, SourceRef, Text};
use sydata_result::Result;
use sydata_storage::StoreFile;
use sydata_table::TableStore;
use sydata_types::TypeTag;

/// Wraps a datasource and counts child reads per key.
#[derive(Debug)]
pub struct CountingSource {
    inner: SourceRef,
    reads: Mutex<BTreeMap<String, usize>>,
}

impl CountingSource {
    pub fn wrap(inner: SourceRef) -> Arc<Self> {
        Arc::new(Self {
            inner,
            reads: Mutex::new(BTreeMap::new()),
        })
    }

    pub fn reads(&self, key: &str) -> usize {
        self.reads.lock().unwrap().get(key).copied().unwrap_or(0)
    }

    pub fn total_reads(&self) -> usize {
        self.reads.lock().unwrap().values().sum()
    }
}

impl DataSource for CountingSource {
    fn size(&self) -> Result<usize> {
        self.inner.size()
    }

    fn keys(&self) -> Result<Vec<String>> {
        self.inner.keys()
    }

    fn read_with_type(&self, key: &str, tag: &TypeTag) -> Result<SourceRef> {
        *self.reads.lock().unwrap().entry(key.to_string()).or_default() += 1;
        self.inner.read_with_type(key, tag)
    }

    fn write_with_type(&self, key: &str, tag: &TypeTag) -> Result<SourceRef> {
        self.inner.write_with_type(key, tag)
    }

    fn link(&self, key: &str, source: &dyn DataSource) -> Result<bool> {
        self.inner.link(key, source)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }

    fn read_text(&self) -> Result<String> {
        self.inner.read_text()
    }

    fn write_text(&self, text: &str) -> Result<()> {
        self.inner.write_text(text)
    }

    fn table_store(&self) -> Result<TableStore> {
        self.inner.table_store()
    }

    fn can_write(&self) -> bool {
        self.inner.can_write()
    }

    fn can_link(&self) -> bool {
        self.inner.can_link()
    }

    fn identity(&self) -> SourceIdentity {
        self.inner.identity()
    }

    fn child_identity(&self, key: &str) -> SourceIdentity {
        self.inner.child_identity(key)
    }

    fn close(&self) -> Result<()> {
        self.inner.close()
    }
}

/// Writable root source of the in-memory file `name`.
pub fn mem_root(name: &str, can_link: bool) -> (StoreFile, SourceRef) {
    let file = StoreFile::in_memory(name).unwrap();
    let source: SourceRef = Arc::new(GroupSource::root(&file, true, can_link, false).unwrap());
    (file, source)
}

/// Store a list of text values at `source`.
pub fn write_texts(source: &SourceRef, items: &[&str]) {
    let mut list = List::new(TypeTag::Text);
    for item in items {
        list.append(Text::from(*item)).unwrap();
    }
    list.writeback(source, None).unwrap();
}

pub fn text_of(value: &mut Container) -> String {
    value.as_text_mut().unwrap().get().unwrap().to_string()
}

pub fn texts(list: &mut List) -> Vec<String> {
    (0..list.len())
        .map(|i| text_of(&mut list.get(i).unwrap()))
        .collect()
}
