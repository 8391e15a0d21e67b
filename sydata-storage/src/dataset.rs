use arrow::array::ArrayRef;
use arrow::buffer::Buffer;
use arrow::datatypes::DataType;
use sydata_result::Result;
use tracing::trace;

use crate::attrs::Attributes;
use crate::file::StoreFile;
use crate::filters::{FilterPipeline, decode_payload};
use crate::node::{DatasetInfo, Shape};
use crate::serialization::{PrimType, deserialize_array};
use crate::types::PhysicalKey;

/// Handle to a dataset node. Holds its file open.
#[derive(Clone, Debug)]
pub struct Dataset {
    file: StoreFile,
    pk: PhysicalKey,
    path: String,
}

impl Dataset {
    pub(crate) fn new(file: StoreFile, pk: PhysicalKey, path: String) -> Self {
        Self { file, pk, path }
    }

    pub fn file(&self) -> &StoreFile {
        &self.file
    }

    pub(crate) fn key(&self) -> PhysicalKey {
        self.pk
    }

    /// Absolute path within its file.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    /// Whether both handles name the same stored object.
    pub fn same_object(&self, other: &Dataset) -> bool {
        self.file.same_file(&other.file) && self.pk == other.pk
    }

    fn info(&self) -> Result<DatasetInfo> {
        Ok(self.file.load_node(self.pk)?.dataset()?.clone())
    }

    /// Read and decode the whole payload. Scalars read as one element.
    pub fn read(&self) -> Result<ArrayRef> {
        let info = self.info()?;
        let blob = self.file.get_blob(info.payload_pk)?;
        let raw = decode_payload(&blob)?;
        trace!(path = %self.path, stored = info.stored_bytes, raw = raw.len(), "read dataset");
        deserialize_array(Buffer::from_vec(raw))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.info()?.len as usize)
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn shape(&self) -> Result<Shape> {
        Ok(self.info()?.shape)
    }

    pub fn is_scalar(&self) -> Result<bool> {
        Ok(self.shape()? == Shape::Scalar)
    }

    pub fn data_type(&self) -> Result<DataType> {
        Ok(PrimType::from_code(self.info()?.prim_code)?.data_type())
    }

    pub fn filters(&self) -> Result<FilterPipeline> {
        Ok(self.info()?.filters)
    }

    pub fn is_compressed(&self) -> Result<bool> {
        Ok(self.filters()?.is_compressed())
    }

    /// Bytes held by the pager for the payload, including its header.
    pub fn stored_bytes(&self) -> Result<u64> {
        Ok(self.info()?.stored_bytes)
    }

    /// Serialized size before filters.
    pub fn raw_bytes(&self) -> Result<u64> {
        Ok(self.info()?.raw_bytes)
    }
}

impl Attributes for Dataset {
    fn attr_owner(&self) -> (&StoreFile, PhysicalKey) {
        (&self.file, self.pk)
    }
}
