use std::collections::BTreeMap;

use arrow::array::Array;
use sydata_result::{Error, Result};
use tracing::trace;

use crate::attrs::Attributes;
use crate::dataset::Dataset;
use crate::external::ExternalTarget;
use crate::file::StoreFile;
use crate::filters::FilterPipeline;
use crate::node::{DatasetInfo, Link, Node, NodeKind, Shape};
use crate::serialization::{PrimType, serialize_array};
use crate::types::PhysicalKey;

/// What a group child resolves to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObjectKind {
    Group,
    Dataset,
}

/// Handle to a group node. Holds its file open.
#[derive(Clone, Debug)]
pub struct Group {
    file: StoreFile,
    pk: PhysicalKey,
    path: String,
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains('/') || name.contains('\0') || name == "." || name == ".." {
        return Err(Error::InvalidArgumentError(format!(
            "invalid object name {name:?}"
        )));
    }
    Ok(())
}

impl Group {
    pub(crate) fn new(file: StoreFile, pk: PhysicalKey, path: String) -> Self {
        Self { file, pk, path }
    }

    pub fn file(&self) -> &StoreFile {
        &self.file
    }

    /// Absolute path within its file.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Whether both handles name the same stored group.
    pub fn same_object(&self, other: &Group) -> bool {
        self.file.same_file(&other.file) && self.pk == other.pk
    }

    fn child_path(&self, name: &str) -> String {
        if self.path == "/" {
            format!("/{name}")
        } else {
            format!("{}/{name}", self.path)
        }
    }

    fn children(&self) -> Result<BTreeMap<String, Link>> {
        Ok(self.file.load_node(self.pk)?.children()?.clone())
    }

    /// Child names in lexicographic order.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.file.load_node(self.pk)?.children()?.keys().cloned().collect())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.file.load_node(self.pk)?.children()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn contains(&self, name: &str) -> Result<bool> {
        Ok(self.file.load_node(self.pk)?.children()?.contains_key(name))
    }

    /// The raw link stored under `name`.
    pub fn link_info(&self, name: &str) -> Result<Link> {
        self.children()?
            .remove(name)
            .ok_or_else(|| Error::not_found(format!("'{name}' in '{}'", self.path)))
    }

    /// Follow the link under `name` to its file and node.
    fn resolve(&self, name: &str) -> Result<(StoreFile, PhysicalKey, String)> {
        match self.link_info(name)? {
            Link::Hard(pk) => Ok((self.file.clone(), pk, self.child_path(name))),
            Link::External { file, path } => {
                trace!(name, file = %file, path = %path, "following external link");
                let target = StoreFile::resolve_external(&file)?;
                let (target, pk) = target.resolve_path(&path)?;
                Ok((target, pk, path))
            }
        }
    }

    pub fn kind(&self, name: &str) -> Result<ObjectKind> {
        let (file, pk, _) = self.resolve(name)?;
        if file.load_node(pk)?.is_group() {
            Ok(ObjectKind::Group)
        } else {
            Ok(ObjectKind::Dataset)
        }
    }

    pub fn group(&self, name: &str) -> Result<Group> {
        let (file, pk, path) = self.resolve(name)?;
        if !file.load_node(pk)?.is_group() {
            return Err(Error::InvalidArgumentError(format!("'{path}' is not a group")));
        }
        Ok(Group::new(file, pk, path))
    }

    pub fn dataset(&self, name: &str) -> Result<Dataset> {
        let (file, pk, path) = self.resolve(name)?;
        if file.load_node(pk)?.is_group() {
            return Err(Error::InvalidArgumentError(format!("'{path}' is not a dataset")));
        }
        Ok(Dataset::new(file, pk, path))
    }

    fn check_free_name(&self, name: &str) -> Result<()> {
        validate_name(name)?;
        if self.contains(name)? {
            return Err(Error::InvalidArgumentError(format!(
                "'{}' already exists",
                self.child_path(name)
            )));
        }
        Ok(())
    }

    fn insert_link(&self, name: &str, link: Link) -> Result<()> {
        self.file.update_node(self.pk, |node| {
            node.children_mut()?.insert(name.to_string(), link);
            Ok(())
        })
    }

    pub fn create_group(&self, name: &str) -> Result<Group> {
        self.file.ensure_writable("create_group")?;
        self.check_free_name(name)?;
        let pk = self.file.alloc(1)?[0];
        self.file.store_node(pk, Node::empty_group())?;
        self.insert_link(name, Link::Hard(pk))?;
        Ok(Group::new(self.file.clone(), pk, self.child_path(name)))
    }

    /// Open `name` as a group, creating it when absent.
    pub fn require_group(&self, name: &str) -> Result<Group> {
        if self.contains(name)? {
            self.group(name)
        } else {
            self.create_group(name)
        }
    }

    /// Store `array` as a new dataset.
    ///
    /// A `Scalar` dataset holds exactly one element.
    pub fn create_dataset(
        &self,
        name: &str,
        array: &dyn Array,
        shape: Shape,
        filters: FilterPipeline,
    ) -> Result<Dataset> {
        self.file.ensure_writable("create_dataset")?;
        self.check_free_name(name)?;
        if shape == Shape::Scalar && array.len() != 1 {
            return Err(Error::InvalidArgumentError(format!(
                "scalar dataset needs exactly one value, got {}",
                array.len()
            )));
        }

        let prim = PrimType::from_data_type(array.data_type())?;
        let raw = serialize_array(array)?;
        let stored = filters.encode(&raw, prim.element_width())?;

        let keys = self.file.alloc(2)?;
        let (payload_pk, node_pk) = (keys[0], keys[1]);
        let info = DatasetInfo {
            prim_code: prim.into(),
            len: array.len() as u64,
            shape,
            filters,
            payload_pk,
            raw_bytes: raw.len() as u64,
            stored_bytes: stored.len() as u64,
        };
        trace!(
            path = %self.child_path(name),
            raw = info.raw_bytes,
            stored = info.stored_bytes,
            "created dataset"
        );
        self.file.put_blob(payload_pk, stored)?;
        self.file.store_node(
            node_pk,
            Node {
                links: 1,
                attrs: BTreeMap::new(),
                kind: NodeKind::Dataset(info),
            },
        )?;
        self.insert_link(name, Link::Hard(node_pk))?;
        Ok(Dataset::new(self.file.clone(), node_pk, self.child_path(name)))
    }

    /// Unlink `name`. Storage is freed once no hard link names it.
    pub fn remove(&self, name: &str) -> Result<()> {
        self.file.ensure_writable("remove")?;
        let link = self.file.update_node(self.pk, |node| {
            node.children_mut()?
                .remove(name)
                .ok_or_else(|| Error::not_found(format!("'{name}' in '{}'", self.path)))
        })?;
        if let Link::Hard(pk) = link {
            self.file.release(pk)?;
        }
        Ok(())
    }

    /// Add a second name for a dataset stored in this same file.
    pub fn link_hard(&self, name: &str, target: &Dataset) -> Result<()> {
        self.file.ensure_writable("link_hard")?;
        if !target.file().same_file(&self.file) {
            return Err(Error::InvalidArgumentError(
                "hard links cannot cross files".into(),
            ));
        }
        self.check_free_name(name)?;
        self.file.update_node(target.key(), |node| {
            node.links += 1;
            Ok(())
        })?;
        self.insert_link(name, Link::Hard(target.key()))
    }

    /// Name an object stored in another file.
    pub fn link_external(&self, name: &str, target: &ExternalTarget) -> Result<()> {
        self.file.ensure_writable("link_external")?;
        self.check_free_name(name)?;
        self.insert_link(
            name,
            Link::External {
                file: target.file().to_string(),
                path: target.path().to_string(),
            },
        )
    }
}

impl Attributes for Group {
    fn attr_owner(&self) -> (&StoreFile, PhysicalKey) {
        (&self.file, self.pk)
    }
}
