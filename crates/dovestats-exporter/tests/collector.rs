#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::UnixListener;

use dovestats_core::protocol::{MeasurementRecord, ScopeKind};
use dovestats_exporter::collector::transport::send_request;
use dovestats_exporter::collector::{collect_from_reader, MetricSink, Scope, ScopeCollector};
use dovestats_exporter::obs::ExporterMetrics;

#[derive(Default)]
struct RecordingSink {
    records: Vec<MeasurementRecord>,
    health: Vec<(String, bool)>,
}

impl MetricSink for RecordingSink {
    fn measurement(&mut self, record: MeasurementRecord) {
        self.records.push(record);
    }
    fn scope_health(&mut self, scope: &str, up: bool) {
        self.health.push((scope.to_string(), up));
    }
}

impl RecordingSink {
    fn labels(&self) -> Vec<(&str, &str, f64)> {
        self.records
            .iter()
            .map(|r| (r.column.column.as_str(), r.label().unwrap_or(""), r.value))
            .collect()
    }
}

#[derive(Clone, Copy)]
enum Reply {
    /// Write the text and close.
    Close(&'static str),
    /// Write the text and keep the connection open.
    Linger(&'static str),
}

/// Fake stats process: answers `EXPORT<TAB><scope>` from `replies`, records requests.
fn serve(path: &Path, replies: HashMap<&'static str, Reply>) -> Arc<Mutex<Vec<String>>> {
    let listener = UnixListener::bind(path).unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requests);

    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let replies = replies.clone();
            let seen = Arc::clone(&seen);
            tokio::spawn(async move {
                let (rd, mut wr) = stream.into_split();
                let mut line = String::new();
                BufReader::new(rd).read_line(&mut line).await.unwrap();
                seen.lock().unwrap().push(line.clone());

                let scope = line
                    .trim_end_matches('\n')
                    .split('\t')
                    .nth(1)
                    .unwrap_or("")
                    .to_string();
                match replies.get(scope.as_str()) {
                    Some(Reply::Close(text)) => {
                        wr.write_all(text.as_bytes()).await.unwrap();
                    }
                    Some(Reply::Linger(text)) => {
                        wr.write_all(text.as_bytes()).await.unwrap();
                        tokio::time::sleep(Duration::from_secs(30)).await;
                    }
                    None => tokio::time::sleep(Duration::from_secs(30)).await,
                }
            });
        }
    });

    requests
}

fn collector(
    path: PathBuf,
    scopes: &[(&str, ScopeKind)],
    timeout: Duration,
) -> (ScopeCollector, Arc<ExporterMetrics>) {
    let metrics = Arc::new(ExporterMetrics::default());
    let scopes = scopes.iter().map(|(n, k)| Scope::new(*n, *k)).collect();
    (ScopeCollector::new(path, scopes, timeout, Arc::clone(&metrics)), metrics)
}

#[tokio::test]
async fn failing_scope_does_not_block_the_next() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats");
    let requests = serve(
        &path,
        HashMap::from([
            ("broken", Reply::Close("broken\n")),
            ("user", Reply::Close("user\tnum_logins\tnum_cmds\nalice\t3\t120\n\t1\t2\n")),
        ]),
    );

    let (c, metrics) = collector(
        path,
        &[("broken", ScopeKind::Detail), ("user", ScopeKind::Detail)],
        Duration::from_secs(5),
    );
    let mut sink = RecordingSink::default();
    c.collect(&mut sink).await;

    assert_eq!(sink.health, [("broken".to_string(), false), ("user".to_string(), true)]);
    assert_eq!(
        sink.labels(),
        [
            ("num_logins", "alice", 3.0),
            ("num_cmds", "alice", 120.0),
            ("num_logins", "empty_user", 1.0),
            ("num_cmds", "empty_user", 2.0),
        ]
    );
    assert_eq!(
        metrics.scope_errors.get(&[("scope", "broken"), ("kind", "MALFORMED_HEADER")]),
        1
    );
    assert_eq!(metrics.scope_duration.count(&[("scope", "user")]), 1);
    assert_eq!(
        *requests.lock().unwrap(),
        ["EXPORT\tbroken\n".to_string(), "EXPORT\tuser\n".to_string()]
    );
}

#[tokio::test]
async fn records_before_a_bad_row_stay_published() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats");
    serve(
        &path,
        HashMap::from([("user", Reply::Close("user\tnum_logins\nalice\t3\nbob\tmany\n"))]),
    );

    let (c, metrics) = collector(path, &[("user", ScopeKind::Detail)], Duration::from_secs(5));
    let mut sink = RecordingSink::default();
    c.collect(&mut sink).await;

    assert_eq!(sink.labels(), [("num_logins", "alice", 3.0)]);
    assert_eq!(sink.health, [("user".to_string(), false)]);
    assert_eq!(
        metrics.scope_errors.get(&[("scope", "user"), ("kind", "VALUE_PARSE_FAILURE")]),
        1
    );
}

#[tokio::test]
async fn global_scope_completes_without_waiting_for_close() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats");
    serve(
        &path,
        HashMap::from([("global", Reply::Linger("num_logins num_cmds\n12 340\n"))]),
    );

    let (c, _) = collector(path, &[("global", ScopeKind::Global)], Duration::from_secs(5));
    let mut sink = RecordingSink::default();
    tokio::time::timeout(Duration::from_secs(2), c.collect(&mut sink))
        .await
        .expect("global export must finish after its data row");

    assert_eq!(sink.labels(), [("num_logins", "", 12.0), ("num_cmds", "", 340.0)]);
    assert_eq!(sink.health, [("global".to_string(), true)]);
}

#[tokio::test]
async fn stalled_socket_times_out_but_keeps_early_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stats");
    serve(
        &path,
        HashMap::from([("user", Reply::Linger("user\tnum_logins\nalice\t3\n"))]),
    );

    let (c, metrics) = collector(path, &[("user", ScopeKind::Detail)], Duration::from_millis(200));
    let mut sink = RecordingSink::default();
    c.collect(&mut sink).await;

    assert_eq!(sink.labels(), [("num_logins", "alice", 3.0)]);
    assert_eq!(sink.health, [("user".to_string(), false)]);
    assert_eq!(metrics.scope_errors.get(&[("scope", "user"), ("kind", "TIMEOUT")]), 1);
}

#[tokio::test]
async fn missing_socket_marks_every_scope_down() {
    let dir = tempfile::tempdir().unwrap();
    let (c, metrics) = collector(
        dir.path().join("absent"),
        &[("user", ScopeKind::Detail), ("global", ScopeKind::Global)],
        Duration::from_secs(1),
    );
    let mut sink = RecordingSink::default();
    c.collect(&mut sink).await;

    assert!(sink.records.is_empty());
    assert_eq!(sink.health, [("user".to_string(), false), ("global".to_string(), false)]);
    assert_eq!(
        metrics.scope_errors.get(&[("scope", "global"), ("kind", "TRANSPORT_UNAVAILABLE")]),
        1
    );
}

#[tokio::test]
async fn collect_from_reader_without_a_socket() {
    let input: &[u8] = b"a b\n1.5 2.5\n";
    let mut sink = RecordingSink::default();
    let n = collect_from_reader(input, &Scope::new("global", ScopeKind::Global), &mut sink)
        .await
        .unwrap();

    assert_eq!(n, 2);
    assert_eq!(sink.labels(), [("a", "", 1.5), ("b", "", 2.5)]);
    assert!(sink.health.is_empty());
}

#[tokio::test]
async fn collect_from_reader_rejects_cut_row() {
    let input: &[u8] = b"user\tsent\trecv\nalice\t1\t2\nbob\t3";
    let mut sink = RecordingSink::default();
    let err = collect_from_reader(input, &Scope::new("user", ScopeKind::Detail), &mut sink)
        .await
        .unwrap_err();

    assert_eq!(err.kind().as_str(), "UNEXPECTED_EOF");
    assert_eq!(sink.records.len(), 2);
}

/// Writer whose peer has gone away.
struct ClosedPeer;

impl AsyncWrite for ClosedPeer {
    fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer closed")))
    }
    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn request_write_failure_is_a_transport_error() {
    let err = send_request(&mut ClosedPeer, "user").await.unwrap_err();
    assert_eq!(err.kind().as_str(), "TRANSPORT_UNAVAILABLE");
}
