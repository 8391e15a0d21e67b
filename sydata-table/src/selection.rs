//! Row-subset reads.
//!
//! Every selection is resolved to a boolean mask over the column, which reads
//! rows in ascending order. Index lists that are not strictly increasing are
//! read as their sorted unique set and then re-arranged into the caller's
//! order. Slices with a negative step are read forward and reversed.

use arrow::array::{Array, ArrayRef, BooleanArray, UInt32Array};
use arrow::compute::{filter, take};
use sydata_result::{Error, Result};

/// Which rows of a column to read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowSelection {
    All,
    /// Row indices in output order; duplicates allowed.
    Indices(Vec<usize>),
    /// One flag per row.
    Mask(Vec<bool>),
    /// Python-style slice: negative bounds count from the end.
    Slice {
        start: Option<isize>,
        stop: Option<isize>,
        step: isize,
    },
}

impl RowSelection {
    /// `start..stop` with unit step.
    pub fn range(start: usize, stop: usize) -> Self {
        RowSelection::Slice {
            start: Some(start as isize),
            stop: Some(stop as isize),
            step: 1,
        }
    }

    /// Selected row positions, in output order.
    pub fn positions(&self, rows: usize) -> Result<Vec<usize>> {
        match self {
            RowSelection::All => Ok((0..rows).collect()),
            RowSelection::Indices(idx) => {
                check_bounds(idx, rows)?;
                Ok(idx.clone())
            }
            RowSelection::Mask(mask) => {
                check_mask(mask, rows)?;
                Ok(mask
                    .iter()
                    .enumerate()
                    .filter_map(|(i, keep)| keep.then_some(i))
                    .collect())
            }
            RowSelection::Slice { start, stop, step } => {
                slice_positions(*start, *stop, *step, rows)
            }
        }
    }
}

fn check_bounds(idx: &[usize], rows: usize) -> Result<()> {
    match idx.iter().find(|i| **i >= rows) {
        Some(i) => Err(Error::InvalidArgumentError(format!(
            "row {i} out of range for {rows} rows"
        ))),
        None => Ok(()),
    }
}

fn check_mask(mask: &[bool], rows: usize) -> Result<()> {
    if mask.len() != rows {
        return Err(Error::InvalidArgumentError(format!(
            "mask has {} entries for {rows} rows",
            mask.len()
        )));
    }
    Ok(())
}

fn slice_positions(
    start: Option<isize>,
    stop: Option<isize>,
    step: isize,
    rows: usize,
) -> Result<Vec<usize>> {
    if step == 0 {
        return Err(Error::InvalidArgumentError("slice step must not be zero".into()));
    }
    let len = rows as isize;
    let bound = |v: Option<isize>, default: isize, lo: isize, hi: isize| match v {
        None => default,
        Some(v) if v < 0 => (v + len).clamp(lo, hi),
        Some(v) => v.clamp(lo, hi),
    };
    let (start, stop) = if step > 0 {
        (bound(start, 0, 0, len), bound(stop, len, 0, len))
    } else {
        (bound(start, len - 1, -1, len - 1), bound(stop, -1, -1, len - 1))
    };

    let mut out = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        out.push(i as usize);
        i += step;
    }
    Ok(out)
}

fn mask_of(sorted_unique: &[usize], rows: usize) -> BooleanArray {
    let mut mask = vec![false; rows];
    for &i in sorted_unique {
        mask[i] = true;
    }
    BooleanArray::from(mask)
}

fn reorder(values: &ArrayRef, positions: impl Iterator<Item = usize>) -> Result<ArrayRef> {
    let indices = UInt32Array::from_iter_values(positions.map(|p| p as u32));
    Ok(take(values.as_ref(), &indices, None)?)
}

/// Read `selection` out of `column`.
pub fn select_rows(column: &ArrayRef, selection: &RowSelection) -> Result<ArrayRef> {
    let rows = column.len();
    match selection {
        RowSelection::All => Ok(column.clone()),
        RowSelection::Mask(mask) => {
            check_mask(mask, rows)?;
            Ok(filter(column.as_ref(), &BooleanArray::from(mask.clone()))?)
        }
        RowSelection::Indices(idx) => {
            check_bounds(idx, rows)?;
            let mut unique = idx.clone();
            unique.sort_unstable();
            unique.dedup();
            let read = filter(column.as_ref(), &mask_of(&unique, rows))?;
            if unique.len() == idx.len() && idx.windows(2).all(|w| w[0] < w[1]) {
                return Ok(read);
            }
            // Position of each requested row within the ascending read.
            let ranks = idx.iter().map(|i| unique.partition_point(|u| u < i));
            reorder(&read, ranks)
        }
        RowSelection::Slice { .. } => {
            let mut positions = selection.positions(rows)?;
            let reversed = positions.len() > 1 && positions[0] > positions[1];
            if reversed {
                positions.reverse();
            }
            let read = filter(column.as_ref(), &mask_of(&positions, rows))?;
            if reversed {
                let n = read.len();
                reorder(&read, (0..n).rev())
            } else {
                Ok(read)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{Int64Array, StringArray};

    use super::*;

    fn column() -> ArrayRef {
        Arc::new(Int64Array::from((0..10).map(|i| i * 10).collect::<Vec<i64>>()))
    }

    fn values(a: &ArrayRef) -> Vec<i64> {
        a.as_any()
            .downcast_ref::<Int64Array>()
            .unwrap()
            .values()
            .to_vec()
    }

    #[test]
    fn unordered_indices_come_back_in_request_order() {
        let out = select_rows(&column(), &RowSelection::Indices(vec![7, 2, 7, 0])).unwrap();
        assert_eq!(values(&out), vec![70, 20, 70, 0]);
    }

    #[test]
    fn increasing_indices_and_masks() {
        let out = select_rows(&column(), &RowSelection::Indices(vec![1, 3])).unwrap();
        assert_eq!(values(&out), vec![10, 30]);
        let mut mask = vec![false; 10];
        mask[9] = true;
        let out = select_rows(&column(), &RowSelection::Mask(mask)).unwrap();
        assert_eq!(values(&out), vec![90]);
    }

    #[test]
    fn slices_follow_python_rules() {
        let slice = |start, stop, step| RowSelection::Slice { start, stop, step };
        let c = column();
        assert_eq!(values(&select_rows(&c, &slice(Some(2), Some(8), 3)).unwrap()), vec![20, 50]);
        assert_eq!(values(&select_rows(&c, &slice(None, None, -3)).unwrap()), vec![90, 60, 30, 0]);
        assert_eq!(values(&select_rows(&c, &slice(Some(-2), None, 1)).unwrap()), vec![80, 90]);
        assert_eq!(values(&select_rows(&c, &slice(Some(3), Some(0), -1)).unwrap()), vec![30, 20, 10]);
        assert!(select_rows(&c, &slice(Some(5), Some(2), 1)).unwrap().is_empty());
        assert!(select_rows(&c, &slice(None, None, 0)).is_err());
    }

    #[test]
    fn out_of_range_requests_fail() {
        assert!(select_rows(&column(), &RowSelection::Indices(vec![10])).is_err());
        assert!(select_rows(&column(), &RowSelection::Mask(vec![true])).is_err());
    }

    #[test]
    fn works_for_text() {
        let c: ArrayRef = Arc::new(StringArray::from(vec!["a", "b", "c"]));
        let out = select_rows(&c, &RowSelection::Indices(vec![2, 0])).unwrap();
        let out = out.as_any().downcast_ref::<StringArray>().unwrap();
        assert_eq!(out.value(0), "c");
        assert_eq!(out.value(1), "a");
    }
}
