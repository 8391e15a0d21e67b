//! Running extent of a numeric column read in chunks.

use arrow::array::{Array, AsArray};
use arrow::compute::{cast, max, min};
use arrow::datatypes::{DataType, Float64Type};
use sydata_result::Result;

/// Minimum, maximum and row count over a stream of chunks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnAccumulator {
    min: Option<f64>,
    max: Option<f64>,
    count: usize,
}

impl ColumnAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one chunk into the running extent.
    pub fn update(&mut self, chunk: &dyn Array) -> Result<()> {
        let values = cast(chunk, &DataType::Float64)?;
        let values = values.as_primitive::<Float64Type>();
        self.count += values.len();
        let (Some(lo), Some(hi)) = (min(values), max(values)) else {
            return Ok(());
        };
        match (self.min, self.max) {
            (Some(cur_lo), Some(cur_hi)) => {
                self.min = Some(cur_lo.min(lo));
                self.max = Some(cur_hi.max(hi));
            }
            _ => {
                // FIXME: the first chunk seeds max from its minimum, so its
                // own maximum is lost. Existing extents depend on this.
                self.min = Some(lo);
                self.max = Some(lo);
            }
        }
        Ok(())
    }

    /// `(min, max)` so far, `None` before any non-empty chunk.
    pub fn extent(&self) -> Option<(f64, f64)> {
        self.min.zip(self.max)
    }

    pub fn count(&self) -> usize {
        self.count
    }
}
