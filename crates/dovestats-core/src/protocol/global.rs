//! Global (aggregate) export format.
//!
//! ```text
//! reset_timestamp last_update num_logins num_cmds ...
//! 1475224400 1475225300.331 12 340 ...
//! ```
//!
//! Line 1 holds whitespace-separated column names, line 2 the single data row.
//! Anything after the data row is ignored.

use std::sync::Arc;

use crate::error::{DoveStatsError, Result};

use super::record::{ColumnDescriptor, MeasurementRecord};
use super::{cut_row, parse_value, Step};

#[derive(Debug)]
pub struct GlobalDecoder {
    scope: String,
    columns: Option<Vec<Arc<ColumnDescriptor>>>,
    done: bool,
}

impl GlobalDecoder {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            columns: None,
            done: false,
        }
    }

    /// Feed one line with its terminator already stripped.
    ///
    /// `terminated` is false for a final line that ended without LF.
    pub fn feed_line(&mut self, line: &str, terminated: bool) -> Result<Step> {
        if self.done {
            return Ok(Step::Finished);
        }

        let Some(columns) = &self.columns else {
            let names: Vec<_> = line.split_whitespace().collect();
            if names.is_empty() {
                return Err(DoveStatsError::MalformedHeader(
                    "global header has no columns".into(),
                ));
            }
            self.columns = Some(
                names
                    .into_iter()
                    .map(|name| Arc::new(ColumnDescriptor::new(self.scope.as_str(), name)))
                    .collect(),
            );
            return Ok(Step::Records(Vec::new()));
        };

        // Single-row semantics: whatever this line holds, we are done after it.
        self.done = true;

        let values: Vec<_> = line.split_whitespace().collect();
        if values.is_empty() {
            return Ok(Step::Finished);
        }
        if !terminated && values.len() < columns.len() {
            return Err(cut_row(columns.len(), values.len()));
        }
        if values.len() != columns.len() {
            return Err(DoveStatsError::ColumnCountMismatch {
                expected: columns.len(),
                found: values.len(),
            });
        }

        let mut records = Vec::with_capacity(columns.len());
        for (column, raw) in columns.iter().zip(values) {
            records.push(MeasurementRecord {
                column: Arc::clone(column),
                label: None,
                value: parse_value(column, raw)?,
            });
        }
        Ok(Step::Records(records))
    }

    pub fn is_finished(&self) -> bool {
        self.done
    }

    /// Called at end of stream. A header without a data row is an empty export.
    pub fn finish(&self) -> Result<()> {
        if self.columns.is_none() {
            return Err(DoveStatsError::MalformedHeader("missing header line".into()));
        }
        Ok(())
    }
}
