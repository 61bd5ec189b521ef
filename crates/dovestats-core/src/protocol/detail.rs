//! Detail (per-identity) export format.
//!
//! ```text
//! user<TAB>num_logins<TAB>num_cmds
//! alice<TAB>3<TAB>120
//! bob<TAB>1<TAB>8
//! <blank line>
//! ```
//!
//! Field 0 of the header is the namespace qualifier, fields 1..N the column
//! names. Each data row is `<label><TAB>v1<TAB>...<TAB>vN`; rows run until a
//! blank line or end of stream.

use std::sync::Arc;

use crate::error::{DoveStatsError, Result};

use super::record::{ColumnDescriptor, MeasurementRecord, EMPTY_LABEL};
use super::{cut_row, parse_value, Step};

#[derive(Debug)]
pub struct DetailDecoder {
    scope: String,
    columns: Option<Vec<Arc<ColumnDescriptor>>>,
    done: bool,
}

impl DetailDecoder {
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
            self.columns = Some(self.parse_header(line)?);
            return Ok(Step::Records(Vec::new()));
        };

        if line.trim().is_empty() {
            self.done = true;
            return Ok(Step::Finished);
        }

        let fields: Vec<_> = line.split('\t').collect();
        if !terminated && fields.len() < columns.len() + 1 {
            return Err(cut_row(columns.len() + 1, fields.len()));
        }
        if fields.len() != columns.len() + 1 {
            return Err(DoveStatsError::ColumnCountMismatch {
                expected: columns.len() + 1,
                found: fields.len(),
            });
        }

        let (label, values) = match fields.split_first() {
            Some((label, values)) => (*label, values),
            None => return Err(DoveStatsError::Internal("empty row after split".into())),
        };
        let label: Arc<str> = Arc::from(if label.is_empty() { EMPTY_LABEL } else { label });

        let mut records = Vec::with_capacity(columns.len());
        for (column, raw) in columns.iter().zip(values) {
            records.push(MeasurementRecord {
                column: Arc::clone(column),
                label: Some(Arc::clone(&label)),
                value: parse_value(column, raw)?,
            });
        }
        Ok(Step::Records(records))
    }

    fn parse_header(&self, line: &str) -> Result<Vec<Arc<ColumnDescriptor>>> {
        let mut fields = line.split('\t');
        let qualifier = fields.next().unwrap_or_default();
        let names: Vec<_> = fields.collect();

        if names.is_empty() {
            return Err(DoveStatsError::MalformedHeader(format!(
                "detail header needs a qualifier and at least one column, got {line:?}"
            )));
        }
        if qualifier.is_empty() || names.iter().any(|n| n.is_empty()) {
            return Err(DoveStatsError::MalformedHeader(format!(
                "detail header has an empty field: {line:?}"
            )));
        }
        if qualifier != self.scope {
            tracing::debug!(
                scope = %self.scope,
                %qualifier,
                "export qualifier differs from requested scope"
            );
        }

        Ok(names
            .into_iter()
            .map(|name| Arc::new(ColumnDescriptor::new(qualifier, name)))
            .collect())
    }

    pub fn is_finished(&self) -> bool {
        self.done
    }

    /// Called at end of stream. Running out of rows without a blank line is fine.
    pub fn finish(&self) -> Result<()> {
        if self.columns.is_none() {
            return Err(DoveStatsError::MalformedHeader("missing header line".into()));
        }
        Ok(())
    }
}
