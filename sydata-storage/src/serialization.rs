//! Array persistence for fixed and variable width Arrow arrays stored as
//! dataset payloads.
//!
//! Arrays persist in a minimal header + raw buffers layout rather than Arrow
//! IPC: no schema framing, one contiguous region per array, and element
//! buffers laid out so the shuffle filter sees whole values.
//!
//! Header (24 bytes):
//!   bytes 0..=3  : MAGIC = b"ARR0"
//!   byte  4      : layout code (see `Layout`)
//!   byte  5      : type code (`PrimType`)
//!   bytes 6..=7  : reserved (0)
//!   bytes 8..=15 : len (u64) = logical array length
//!   bytes 16..=19: extra_a (u32) = layout-specific
//!   bytes 20..=23: extra_b (u32) = layout-specific
//!   bytes 24..   : payload
//!
//! Null bitmaps are not supported; arrays with nulls are rejected.

use std::convert::TryFrom;

use arrow::array::{Array, ArrayData, ArrayRef, make_array};
use arrow::buffer::Buffer;
use arrow::compute::concat;
use arrow::datatypes::DataType;
use num_enum::{IntoPrimitive, TryFromPrimitive};

use sydata_result::{Error, Result};

use crate::codecs::{read_u32_le, read_u64_le, write_u32_le, write_u64_le};

const MAGIC: [u8; 4] = *b"ARR0";
const HEADER_LEN: usize = 24;

/// On-disk layout selector.
///
/// - `Primitive`: extra_a = values byte length, payload = values buffer.
///   Booleans are bit-packed.
/// - `Varlen`: extra_a = offsets byte length, extra_b = values byte length,
///   payload = offsets buffer followed by values buffer.
#[repr(u8)]
enum Layout {
    Primitive = 0,
    Varlen = 2,
}

/// Stable on-disk primitive type codes. Do not reorder. Only append new
/// variants at the end with explicit numeric values.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
pub enum PrimType {
    UInt64 = 1,
    Int32 = 2,
    UInt32 = 3,
    Float32 = 4,
    Binary = 5,
    Int64 = 6,
    Int16 = 7,
    Int8 = 8,
    UInt16 = 9,
    UInt8 = 10,
    Float64 = 11,
    Utf8 = 12,
    LargeBinary = 13,
    LargeUtf8 = 14,
    Boolean = 15,
    Date32 = 16,
    Date64 = 17,
}

impl PrimType {
    pub fn from_data_type(dt: &DataType) -> Result<Self> {
        use DataType::*;
        let p = match dt {
            UInt64 => PrimType::UInt64,
            Int64 => PrimType::Int64,
            Int32 => PrimType::Int32,
            Int16 => PrimType::Int16,
            Int8 => PrimType::Int8,
            UInt32 => PrimType::UInt32,
            UInt16 => PrimType::UInt16,
            UInt8 => PrimType::UInt8,
            Float32 => PrimType::Float32,
            Float64 => PrimType::Float64,
            Binary => PrimType::Binary,
            Utf8 => PrimType::Utf8,
            LargeBinary => PrimType::LargeBinary,
            LargeUtf8 => PrimType::LargeUtf8,
            Boolean => PrimType::Boolean,
            Date32 => PrimType::Date32,
            Date64 => PrimType::Date64,
            other => {
                return Err(Error::InvalidArgumentError(format!(
                    "unsupported dataset type {other:?}"
                )));
            }
        };
        Ok(p)
    }

    pub fn from_code(code: u8) -> Result<Self> {
        PrimType::try_from(code).map_err(|_| Error::Codec(format!("unknown type code {code}")))
    }

    pub fn data_type(self) -> DataType {
        use DataType::*;
        match self {
            PrimType::UInt64 => UInt64,
            PrimType::Int64 => Int64,
            PrimType::Int32 => Int32,
            PrimType::Int16 => Int16,
            PrimType::Int8 => Int8,
            PrimType::UInt32 => UInt32,
            PrimType::UInt16 => UInt16,
            PrimType::UInt8 => UInt8,
            PrimType::Float32 => Float32,
            PrimType::Float64 => Float64,
            PrimType::Binary => Binary,
            PrimType::Utf8 => Utf8,
            PrimType::LargeBinary => LargeBinary,
            PrimType::LargeUtf8 => LargeUtf8,
            PrimType::Boolean => Boolean,
            PrimType::Date32 => Date32,
            PrimType::Date64 => Date64,
        }
    }

    /// Element width seen by the shuffle filter. Variable-length and
    /// bit-packed types shuffle as single bytes.
    pub fn element_width(self) -> usize {
        match self {
            PrimType::Int8 | PrimType::UInt8 | PrimType::Boolean => 1,
            PrimType::Int16 | PrimType::UInt16 => 2,
            PrimType::Int32 | PrimType::UInt32 | PrimType::Float32 | PrimType::Date32 => 4,
            PrimType::Int64 | PrimType::UInt64 | PrimType::Float64 | PrimType::Date64 => 8,
            PrimType::Binary | PrimType::Utf8 | PrimType::LargeBinary | PrimType::LargeUtf8 => 1,
        }
    }

    fn is_varlen(self) -> bool {
        matches!(
            self,
            PrimType::Binary | PrimType::Utf8 | PrimType::LargeBinary | PrimType::LargeUtf8
        )
    }
}

/// Serialize array buffers with a minimal header.
pub fn serialize_array(arr: &dyn Array) -> Result<Vec<u8>> {
    if arr.null_count() != 0 {
        return Err(Error::InvalidArgumentError(
            "null values cannot be stored in a dataset".into(),
        ));
    }
    let code = PrimType::from_data_type(arr.data_type())?;

    // Sliced arrays keep their parent's buffers; rebuild them tightly first.
    let compact;
    let arr = match compacted(arr)? {
        Some(c) => {
            compact = c;
            compact.as_ref()
        }
        None => arr,
    };

    if code.is_varlen() {
        serialize_varlen(arr, code)
    } else {
        serialize_primitive(arr, code)
    }
}

fn compacted(arr: &dyn Array) -> Result<Option<ArrayRef>> {
    let data = arr.to_data();
    // The slice size counts `len` offsets; the buffer holds `len + 1`.
    let trailing_offset = match data.data_type() {
        DataType::Utf8 | DataType::Binary => 4,
        DataType::LargeUtf8 | DataType::LargeBinary => 8,
        _ => 0,
    };
    let held: usize = data.buffers().iter().map(|b| b.len()).sum();
    if data.offset() != 0 || held != data.get_slice_memory_size()? + trailing_offset {
        return Ok(Some(concat(&[arr])?));
    }
    Ok(None)
}

fn write_header(out: &mut Vec<u8>, layout: Layout, code: PrimType, len: u64, a: u32, b: u32) {
    out.extend_from_slice(&MAGIC);
    out.push(layout as u8);
    out.push(u8::from(code));
    // 2 bytes padding reserved (e.g., future versioning).
    out.extend_from_slice(&[0u8; 2]);
    write_u64_le(out, len);
    write_u32_le(out, a);
    write_u32_le(out, b);
}

fn serialize_primitive(arr: &dyn Array, code: PrimType) -> Result<Vec<u8>> {
    let data = arr.to_data();
    let values = data
        .buffers()
        .first()
        .ok_or_else(|| Error::Internal("missing values buffer".into()))?;
    let values_bytes = values.as_slice();
    let values_len = u32::try_from(values_bytes.len())
        .map_err(|_| Error::InvalidArgumentError("values too large".into()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + values_bytes.len());
    write_header(
        &mut out,
        Layout::Primitive,
        code,
        data.len() as u64,
        values_len,
        0,
    );
    out.extend_from_slice(values_bytes);
    Ok(out)
}

fn serialize_varlen(arr: &dyn Array, code: PrimType) -> Result<Vec<u8>> {
    let data = arr.to_data();
    let offsets_buf = data
        .buffers()
        .first()
        .ok_or_else(|| Error::Internal("missing offsets buffer".into()))?;
    let values_buf = data
        .buffers()
        .get(1)
        .ok_or_else(|| Error::Internal("missing values buffer for varlen".into()))?;

    let offsets_bytes = offsets_buf.as_slice();
    let values_bytes = values_buf.as_slice();

    let offsets_len = u32::try_from(offsets_bytes.len())
        .map_err(|_| Error::InvalidArgumentError("offsets buffer too large".into()))?;
    let values_len = u32::try_from(values_bytes.len())
        .map_err(|_| Error::InvalidArgumentError("values buffer too large".into()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + offsets_bytes.len() + values_bytes.len());
    write_header(
        &mut out,
        Layout::Varlen,
        code,
        data.len() as u64,
        offsets_len,
        values_len,
    );
    out.extend_from_slice(offsets_bytes);
    out.extend_from_slice(values_bytes);
    Ok(out)
}

/// Rebuild an array from a serialized payload.
pub fn deserialize_array(whole: Buffer) -> Result<ArrayRef> {
    let raw = whole.as_slice();
    if raw.len() < HEADER_LEN || raw[0..4] != MAGIC {
        return Err(Error::Codec("bad array blob magic/size".into()));
    }

    let layout = raw[4];
    let p = PrimType::from_code(raw[5])?;

    let mut o = 8usize;
    let len = read_u64_le(raw, &mut o) as usize;
    let extra_a = read_u32_le(raw, &mut o) as usize;
    let extra_b = read_u32_le(raw, &mut o) as usize;

    let payload = whole.slice_with_length(o, whole.len() - o);

    let builder = match layout {
        x if x == Layout::Primitive as u8 => {
            if payload.len() != extra_a {
                return Err(Error::Codec("primitive payload length mismatch".into()));
            }
            ArrayData::builder(p.data_type()).len(len).add_buffer(payload)
        }
        x if x == Layout::Varlen as u8 => {
            if payload.len() != extra_a + extra_b {
                return Err(Error::Codec("varlen payload length mismatch".into()));
            }
            let offsets = payload.slice_with_length(0, extra_a);
            let values = payload.slice_with_length(extra_a, extra_b);
            ArrayData::builder(p.data_type())
                .len(len)
                .add_buffer(offsets)
                .add_buffer(values)
        }
        other => return Err(Error::Codec(format!("unknown layout {other}"))),
    };

    // Decompressed payloads land at arbitrary offsets.
    let data = builder.align_buffers(true).build()?;
    Ok(make_array(data))
}

/* ---- Compile-time pinning of on-disk codes -------------------------------
   Changing any discriminant silently would corrupt persistence. These const
   checks make such edits fail to compile immediately.
*/
#[allow(clippy::no_effect)]
const _: () = {
    // true -> 1, false -> 0; index out of bounds if false.
    ["code changed"][!(PrimType::UInt64 as u8 == 1) as usize];
    ["code changed"][!(PrimType::Int32 as u8 == 2) as usize];
    ["code changed"][!(PrimType::UInt32 as u8 == 3) as usize];
    ["code changed"][!(PrimType::Float32 as u8 == 4) as usize];
    ["code changed"][!(PrimType::Binary as u8 == 5) as usize];
    ["code changed"][!(PrimType::Int64 as u8 == 6) as usize];
    ["code changed"][!(PrimType::Int16 as u8 == 7) as usize];
    ["code changed"][!(PrimType::Int8 as u8 == 8) as usize];
    ["code changed"][!(PrimType::UInt16 as u8 == 9) as usize];
    ["code changed"][!(PrimType::UInt8 as u8 == 10) as usize];
    ["code changed"][!(PrimType::Float64 as u8 == 11) as usize];
    ["code changed"][!(PrimType::Utf8 as u8 == 12) as usize];
    ["code changed"][!(PrimType::LargeBinary as u8 == 13) as usize];
    ["code changed"][!(PrimType::LargeUtf8 as u8 == 14) as usize];
    ["code changed"][!(PrimType::Boolean as u8 == 15) as usize];
    ["code changed"][!(PrimType::Date32 as u8 == 16) as usize];
    ["code changed"][!(PrimType::Date64 as u8 == 17) as usize];
    ["layout changed"][!(Layout::Varlen as u8 == 2) as usize];
};

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{BooleanArray, Int64Array, StringArray};
    use std::sync::Arc;

    #[test]
    fn sliced_strings_are_compacted() {
        let arr = StringArray::from(vec!["alpha", "bravo", "charlie", "delta"]);
        let sliced = arr.slice(1, 2);
        let bytes = serialize_array(&sliced).unwrap();
        let back = deserialize_array(Buffer::from_vec(bytes)).unwrap();
        let back = back.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(back.iter().flatten().collect::<Vec<_>>(), vec!["bravo", "charlie"]);
    }

    #[test]
    fn unaligned_payload_still_decodes() {
        let arr = Int64Array::from(vec![1, -2, 3]);
        let mut bytes = vec![0u8];
        bytes.extend(serialize_array(&arr).unwrap());
        let buf = Buffer::from_vec(bytes);
        let shifted = buf.slice(1);
        let back = deserialize_array(shifted).unwrap();
        assert_eq!(back.as_ref(), &arr as &dyn Array);
    }

    #[test]
    fn booleans_with_offset_round_trip() {
        let arr: ArrayRef = Arc::new(BooleanArray::from(vec![true, false, true, true, false]));
        let sliced = arr.slice(3, 2);
        let back = deserialize_array(Buffer::from_vec(serialize_array(&sliced).unwrap())).unwrap();
        assert_eq!(back.as_ref(), sliced.as_ref());
    }

    #[test]
    fn nulls_are_rejected() {
        let arr = Int64Array::from(vec![Some(1), None]);
        assert!(matches!(
            serialize_array(&arr),
            Err(Error::InvalidArgumentError(_))
        ));
    }
}
