//! Textual dtype names recorded in `ENCODING_TYPE`.
//!
//! | Arrow type                       | Name                   |
//! |----------------------------------|------------------------|
//! | `Utf8` / `LargeUtf8`             | `unicode` / `large_unicode` |
//! | `Timestamp(us, None)`            | `datetime64[us]`       |
//! | `Timestamp(us, Some("UTC"))`     | `datetime64[us, UTC]`  |
//! | `Duration(ns)`                   | `timedelta64[ns]`      |
//! | `Date32` / `Date64`              | `date32` / `date64`    |
//!
//! Primitive types use their lowercase Arrow names (`int64`, `float32`, ...).

use arrow::datatypes::{DataType, TimeUnit};
use sydata_result::{Error, Result};

fn unit_name(unit: &TimeUnit) -> &'static str {
    match unit {
        TimeUnit::Second => "s",
        TimeUnit::Millisecond => "ms",
        TimeUnit::Microsecond => "us",
        TimeUnit::Nanosecond => "ns",
    }
}

fn parse_unit(s: &str) -> Result<TimeUnit> {
    match s {
        "s" => Ok(TimeUnit::Second),
        "ms" => Ok(TimeUnit::Millisecond),
        "us" => Ok(TimeUnit::Microsecond),
        "ns" => Ok(TimeUnit::Nanosecond),
        other => Err(Error::InvalidArgumentError(format!(
            "unknown time unit '{other}'"
        ))),
    }
}

/// Name recorded for `data_type`.
pub fn dtype_name(data_type: &DataType) -> Result<String> {
    let name = match data_type {
        DataType::Boolean => "bool".to_string(),
        DataType::Int8 => "int8".to_string(),
        DataType::Int16 => "int16".to_string(),
        DataType::Int32 => "int32".to_string(),
        DataType::Int64 => "int64".to_string(),
        DataType::UInt8 => "uint8".to_string(),
        DataType::UInt16 => "uint16".to_string(),
        DataType::UInt32 => "uint32".to_string(),
        DataType::UInt64 => "uint64".to_string(),
        DataType::Float32 => "float32".to_string(),
        DataType::Float64 => "float64".to_string(),
        DataType::Utf8 => "unicode".to_string(),
        DataType::LargeUtf8 => "large_unicode".to_string(),
        DataType::Binary => "bytes".to_string(),
        DataType::LargeBinary => "large_bytes".to_string(),
        DataType::Date32 => "date32".to_string(),
        DataType::Date64 => "date64".to_string(),
        DataType::Timestamp(unit, None) => format!("datetime64[{}]", unit_name(unit)),
        DataType::Timestamp(unit, Some(tz)) => {
            format!("datetime64[{}, {tz}]", unit_name(unit))
        }
        DataType::Duration(unit) => format!("timedelta64[{}]", unit_name(unit)),
        other => {
            return Err(Error::UnsupportedType(format!(
                "no dtype name for {other:?}"
            )));
        }
    };
    Ok(name)
}

/// Inverse of [`dtype_name`].
pub fn parse_dtype(name: &str) -> Result<DataType> {
    let simple = match name {
        "bool" => Some(DataType::Boolean),
        "int8" => Some(DataType::Int8),
        "int16" => Some(DataType::Int16),
        "int32" => Some(DataType::Int32),
        "int64" => Some(DataType::Int64),
        "uint8" => Some(DataType::UInt8),
        "uint16" => Some(DataType::UInt16),
        "uint32" => Some(DataType::UInt32),
        "uint64" => Some(DataType::UInt64),
        "float32" => Some(DataType::Float32),
        "float64" => Some(DataType::Float64),
        "unicode" => Some(DataType::Utf8),
        "large_unicode" => Some(DataType::LargeUtf8),
        "bytes" => Some(DataType::Binary),
        "large_bytes" => Some(DataType::LargeBinary),
        "date32" => Some(DataType::Date32),
        "date64" => Some(DataType::Date64),
        _ => None,
    };
    if let Some(dt) = simple {
        return Ok(dt);
    }

    let bracketed = |prefix: &str| {
        name.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('['))
            .and_then(|rest| rest.strip_suffix(']'))
    };
    if let Some(inner) = bracketed("datetime64") {
        return match inner.split_once(',') {
            Some((unit, tz)) => Ok(DataType::Timestamp(
                parse_unit(unit.trim())?,
                Some(tz.trim().into()),
            )),
            None => Ok(DataType::Timestamp(parse_unit(inner)?, None)),
        };
    }
    if let Some(inner) = bracketed("timedelta64") {
        return Ok(DataType::Duration(parse_unit(inner)?));
    }
    Err(Error::InvalidArgumentError(format!("unknown dtype '{name}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        let types = [
            DataType::Boolean,
            DataType::UInt16,
            DataType::Float32,
            DataType::Utf8,
            DataType::LargeBinary,
            DataType::Date32,
            DataType::Date64,
            DataType::Timestamp(TimeUnit::Microsecond, None),
            DataType::Timestamp(TimeUnit::Nanosecond, Some("UTC".into())),
            DataType::Timestamp(TimeUnit::Second, Some("Europe/Stockholm".into())),
            DataType::Duration(TimeUnit::Millisecond),
        ];
        for dt in types {
            let name = dtype_name(&dt).unwrap();
            assert_eq!(parse_dtype(&name).unwrap(), dt, "{name}");
        }
    }

    #[test]
    fn temporal_names_are_readable() {
        assert_eq!(
            dtype_name(&DataType::Timestamp(TimeUnit::Microsecond, Some("UTC".into()))).unwrap(),
            "datetime64[us, UTC]"
        );
        assert_eq!(
            dtype_name(&DataType::Duration(TimeUnit::Microsecond)).unwrap(),
            "timedelta64[us]"
        );
    }

    #[test]
    fn unknown_names_are_rejected() {
        assert!(parse_dtype("complex128").is_err());
        assert!(parse_dtype("datetime64[fortnight]").is_err());
        assert!(parse_dtype("datetime64[us").is_err());
    }
}
