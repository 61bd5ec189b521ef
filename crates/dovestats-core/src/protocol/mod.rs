//! Dovecot stats `EXPORT` protocol.
//!
//! A request is a single line, `EXPORT<TAB><scope><LF>`. The answer comes in one
//! of two shapes depending on the scope:
//! - Global: whitespace-separated header plus one aggregate data row.
//! - Detail: tab-separated header plus one row per identity, ended by a blank
//!   line or end of stream.
//!
//! [`ExportDecoder`] is a push-style, line-at-a-time state machine so callers
//! can publish records while the response is still arriving. [`decode`] wraps
//! it as a lazy iterator over any [`BufRead`].
//!
//! All decoders are panic-free: malformed input is reported as
//! `DoveStatsError` and stops the decode call. Records already returned stay
//! returned.

pub mod detail;
pub mod global;
pub mod record;

use std::io::BufRead;

use crate::error::{DoveStatsError, Result};

pub use detail::DetailDecoder;
pub use global::GlobalDecoder;
pub use record::{ColumnDescriptor, MeasurementRecord, ScopeKind, EMPTY_LABEL};

/// Command token of the request line.
pub const EXPORT_COMMAND: &str = "EXPORT";

/// Build the request line for `scope`.
pub fn request_line(scope: &str) -> String {
    format!("{EXPORT_COMMAND}\t{scope}\n")
}

/// Outcome of feeding one line.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Records decoded from this line (empty for the header).
    Records(Vec<MeasurementRecord>),
    /// The export is complete; further input is not part of it.
    Finished,
}

/// Decoder for one `EXPORT` response, selected by [`ScopeKind`].
#[derive(Debug)]
pub enum ExportDecoder {
    Global(GlobalDecoder),
    Detail(DetailDecoder),
    /// A previous line failed; the decode call is over.
    Failed,
}

impl ExportDecoder {
    pub fn new(kind: ScopeKind, scope: &str) -> Self {
        match kind {
            ScopeKind::Global => ExportDecoder::Global(GlobalDecoder::new(scope)),
            ScopeKind::Detail => ExportDecoder::Detail(DetailDecoder::new(scope)),
        }
    }

    /// Feed one raw line as read from the stream, terminator included.
    ///
    /// A line that does not end in LF can only be the last one. It is decoded
    /// like any other line unless it is a data row with too few fields, which
    /// means the response was cut mid-row.
    pub fn feed(&mut self, raw: &str) -> Result<Step> {
        let (line, terminated) = split_terminator(raw);
        let result = match self {
            ExportDecoder::Global(d) => d.feed_line(line, terminated),
            ExportDecoder::Detail(d) => d.feed_line(line, terminated),
            ExportDecoder::Failed => Err(DoveStatsError::Internal(
                "decoder used after failure".into(),
            )),
        };
        if result.is_err() {
            *self = ExportDecoder::Failed;
        }
        result
    }

    /// Whether the export is complete and no more input should be read.
    pub fn is_finished(&self) -> bool {
        match self {
            ExportDecoder::Global(d) => d.is_finished(),
            ExportDecoder::Detail(d) => d.is_finished(),
            ExportDecoder::Failed => true,
        }
    }

    /// Signal end of stream.
    pub fn finish(&mut self) -> Result<()> {
        let result = match self {
            ExportDecoder::Global(d) => d.finish(),
            ExportDecoder::Detail(d) => d.finish(),
            ExportDecoder::Failed => Err(DoveStatsError::Internal(
                "decoder used after failure".into(),
            )),
        };
        if result.is_err() {
            *self = ExportDecoder::Failed;
        }
        result
    }
}

/// Strip LF (and a CR before it); report whether the terminator was present.
fn split_terminator(raw: &str) -> (&str, bool) {
    match raw.strip_suffix('\n') {
        Some(line) => (line.strip_suffix('\r').unwrap_or(line), true),
        None => (raw, false),
    }
}

/// Error for an unterminated final row narrower than the header.
pub(crate) fn cut_row(expected: usize, found: usize) -> DoveStatsError {
    DoveStatsError::UnexpectedEof(format!(
        "stream ended mid-row: {found} of {expected} fields received"
    ))
}

pub(crate) fn parse_value(column: &ColumnDescriptor, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|e| DoveStatsError::ValueParseFailure {
            column: column.column.clone(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

/// Decode an `EXPORT` response lazily from `reader`.
///
/// The iterator reads one line per step, yields at most one error and then
/// ends. It cannot be restarted; decode a fresh reader instead.
pub fn decode<R: BufRead>(reader: R, scope: &str, kind: ScopeKind) -> Records<R> {
    Records {
        reader,
        decoder: ExportDecoder::new(kind, scope),
        pending: Vec::new().into_iter(),
        line: String::new(),
        done: false,
    }
}

/// Lazy record stream returned by [`decode`].
pub struct Records<R> {
    reader: R,
    decoder: ExportDecoder,
    pending: std::vec::IntoIter<MeasurementRecord>,
    line: String,
    done: bool,
}

impl<R: BufRead> Records<R> {
    fn fail(&mut self, err: DoveStatsError) -> Option<Result<MeasurementRecord>> {
        self.done = true;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<MeasurementRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.next() {
                return Some(Ok(record));
            }
            if self.done {
                return None;
            }

            self.line.clear();
            let n = match self.reader.read_line(&mut self.line) {
                Ok(n) => n,
                Err(e) => return self.fail(DoveStatsError::transport("read failed", e)),
            };

            if n == 0 {
                self.done = true;
                return match self.decoder.finish() {
                    Ok(()) => None,
                    Err(e) => Some(Err(e)),
                };
            }

            match self.decoder.feed(&self.line) {
                Ok(Step::Records(records)) => {
                    self.pending = records.into_iter();
                    self.done = self.decoder.is_finished();
                }
                Ok(Step::Finished) => self.done = true,
                Err(e) => return self.fail(e),
            }
        }
    }
}

impl<R: BufRead> std::iter::FusedIterator for Records<R> {}
