//! Type-preserving column encoding.
//!
//! Text columns are stored as byte strings tagged with `ENCODING=utf-8`.
//! Temporal columns (timestamps of any unit and zone, durations, dates) are
//! stored as `float64` ticks. Both record their original dtype in
//! `ENCODING_TYPE` so reads restore it exactly.

use arrow::array::{Array, ArrayRef, make_array};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use sydata_result::{Error, Result};

use crate::constants::UTF8_ENCODING;
use crate::dtype::{dtype_name, parse_dtype};

/// A column ready to be stored, plus the attributes describing it.
#[derive(Debug, Clone)]
pub struct EncodedColumn {
    pub array: ArrayRef,
    pub encoding: Option<&'static str>,
    pub encoding_type: Option<String>,
}

fn is_temporal(data_type: &DataType) -> bool {
    matches!(
        data_type,
        DataType::Timestamp(..) | DataType::Duration(_) | DataType::Date32 | DataType::Date64
    )
}

/// Integer type with the same layout as a temporal type.
fn physical_int(data_type: &DataType) -> DataType {
    match data_type {
        DataType::Date32 => DataType::Int32,
        _ => DataType::Int64,
    }
}

/// Relabel `array` without touching its buffers.
fn reinterpret(array: &dyn Array, to: DataType) -> Result<ArrayRef> {
    let data = array.to_data().into_builder().data_type(to).build()?;
    Ok(make_array(data))
}

/// Prepare `array` for storage.
pub fn encode_column(array: &dyn Array) -> Result<EncodedColumn> {
    let data_type = array.data_type();
    if data_type.is_nested() {
        return Err(Error::ConsistencyError(format!(
            "columns must be one-dimensional, got {data_type:?}"
        )));
    }

    match data_type {
        DataType::Utf8 | DataType::LargeUtf8 => {
            let binary = match data_type {
                DataType::Utf8 => DataType::Binary,
                _ => DataType::LargeBinary,
            };
            Ok(EncodedColumn {
                array: cast(array, &binary)?,
                encoding: Some(UTF8_ENCODING),
                encoding_type: Some(dtype_name(data_type)?),
            })
        }
        dt if is_temporal(dt) => {
            let ticks = reinterpret(array, physical_int(dt))?;
            Ok(EncodedColumn {
                array: cast(&ticks, &DataType::Float64)?,
                encoding: None,
                encoding_type: Some(dtype_name(dt)?),
            })
        }
        DataType::Boolean
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Float32
        | DataType::Float64
        | DataType::Binary
        | DataType::LargeBinary => Ok(EncodedColumn {
            array: make_array(array.to_data()),
            encoding: None,
            encoding_type: None,
        }),
        other => Err(Error::UnsupportedType(format!(
            "cannot store column of type {other:?}"
        ))),
    }
}

/// Restore a stored column given its `ENCODING` and `ENCODING_TYPE`.
pub fn decode_column(
    array: ArrayRef,
    encoding: Option<&str>,
    encoding_type: Option<&str>,
) -> Result<ArrayRef> {
    let target = encoding_type.map(parse_dtype).transpose()?;

    if let Some(encoding) = encoding {
        if encoding != UTF8_ENCODING {
            return Err(Error::UnsupportedType(format!(
                "unknown text encoding '{encoding}'"
            )));
        }
        let text = match (target, array.data_type()) {
            (Some(dt), _) => dt,
            (None, DataType::LargeBinary) => DataType::LargeUtf8,
            (None, _) => DataType::Utf8,
        };
        return Ok(cast(&array, &text)?);
    }

    match target {
        Some(dt) if is_temporal(&dt) => {
            let ticks = cast(&array, &physical_int(&dt))?;
            reinterpret(&ticks, dt)
        }
        Some(dt) if &dt != array.data_type() => Ok(cast(&array, &dt)?),
        _ => Ok(array),
    }
}
