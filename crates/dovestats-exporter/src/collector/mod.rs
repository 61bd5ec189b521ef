//! Scope collection cycle.
//!
//! For every configured scope, in order: connect to the stats socket, send
//! `EXPORT<TAB><scope>`, decode the response line by line and forward each
//! record to a [`MetricSink`] as soon as it is decoded, then report
//! `dovecot_up{scope}`. A failing scope is reported down and never stops the
//! scopes after it. Records forwarded before a failure stay published.

pub mod transport;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use dovestats_core::error::{DoveStatsError, Result};
use dovestats_core::protocol::{ExportDecoder, MeasurementRecord, ScopeKind, Step};

use crate::config::DovecotSection;
use crate::obs::ExporterMetrics;

/// Receiver of one collection cycle's output.
pub trait MetricSink {
    fn measurement(&mut self, record: MeasurementRecord);
    fn scope_health(&mut self, scope: &str, up: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Gauge,
    Untyped,
}

impl MetricType {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Untyped => "untyped",
        }
    }
}

/// Static description of a metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricDesc {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricType,
    pub labels: &'static [&'static str],
}

/// Per-scope health indicator.
pub const UP_DESC: MetricDesc = MetricDesc {
    name: "dovecot_up",
    help: "Whether scraping Dovecot's metrics was successful.",
    kind: MetricType::Gauge,
    labels: &["scope"],
};

/// A scope to query and the response format it answers with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub name: String,
    pub kind: ScopeKind,
}

impl Scope {
    pub fn new(name: impl Into<String>, kind: ScopeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

pub struct ScopeCollector {
    socket_path: PathBuf,
    scopes: Vec<Scope>,
    timeout: Duration,
    metrics: Arc<ExporterMetrics>,
}

impl ScopeCollector {
    pub fn new(
        socket_path: impl Into<PathBuf>,
        scopes: Vec<Scope>,
        timeout: Duration,
        metrics: Arc<ExporterMetrics>,
    ) -> Self {
        Self {
            socket_path: socket_path.into(),
            scopes,
            timeout,
            metrics,
        }
    }

    pub fn from_config(cfg: &DovecotSection, metrics: Arc<ExporterMetrics>) -> Self {
        let scopes = cfg
            .scopes
            .iter()
            .map(|s| Scope::new(s.name.clone(), s.resolved_kind()))
            .collect();
        Self::new(cfg.socket_path.clone(), scopes, cfg.timeout(), metrics)
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    /// Series advertised regardless of what the stats socket returns.
    pub fn describe(&self) -> &'static [MetricDesc] {
        &[UP_DESC]
    }

    /// Run one collection cycle over every configured scope.
    pub async fn collect<S: MetricSink + Send>(&self, sink: &mut S) {
        for scope in &self.scopes {
            let started = Instant::now();
            let result = self.collect_scope(scope, sink).await;
            let elapsed = started.elapsed();

            self.metrics
                .scope_duration
                .observe(&[("scope", scope.name.as_str())], elapsed);

            match result {
                Ok(records) => {
                    tracing::debug!(scope = %scope.name, records, ?elapsed, "scope collected");
                    sink.scope_health(&scope.name, true);
                }
                Err(e) => {
                    tracing::warn!(
                        scope = %scope.name,
                        kind = %e.kind(),
                        error = %e,
                        "failed to scrape stats socket"
                    );
                    self.metrics
                        .scope_errors
                        .inc(&[("scope", scope.name.as_str()), ("kind", e.kind().as_str())]);
                    sink.scope_health(&scope.name, false);
                }
            }
        }
    }

    /// Connect, request and decode one scope, bounded by the configured timeout.
    ///
    /// The socket lives inside the timed future and is closed on drop, whichever
    /// way the exchange ends.
    async fn collect_scope<S: MetricSink + Send>(
        &self,
        scope: &Scope,
        sink: &mut S,
    ) -> Result<usize> {
        let exchange = async {
            let mut stream = transport::connect(&self.socket_path).await?;
            let (rd, mut wr) = stream.split();
            transport::send_request(&mut wr, &scope.name).await?;
            collect_from_reader(BufReader::new(rd), scope, sink).await
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| DoveStatsError::Timeout(self.timeout))?
    }
}

/// Decode an `EXPORT` response from `reader`, forwarding records as they arrive.
///
/// Returns the number of records forwarded. On error, records forwarded before
/// the failing line have already reached `sink`.
pub async fn collect_from_reader<R, S>(mut reader: R, scope: &Scope, sink: &mut S) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    S: MetricSink + ?Sized,
{
    let mut decoder = ExportDecoder::new(scope.kind, &scope.name);
    let mut line = String::new();
    let mut forwarded = 0;

    loop {
        line.clear();
        let n = reader
            .read_line(&mut line)
            .await
            .map_err(|e| DoveStatsError::transport("read response", e))?;

        if n == 0 {
            decoder.finish()?;
            return Ok(forwarded);
        }

        match decoder.feed(&line)? {
            Step::Records(records) => {
                for record in records {
                    sink.measurement(record);
                    forwarded += 1;
                }
                if decoder.is_finished() {
                    return Ok(forwarded);
                }
            }
            Step::Finished => return Ok(forwarded),
        }
    }
}
