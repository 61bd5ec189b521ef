//! Prometheus text exposition.
//!
//! - `exposition`: per-scrape sink that renders Dovecot measurements and
//!   per-scope health in text format 0.0.4.
//! - `metrics`: long-lived counters/histograms about the exporter itself.

pub mod exposition;
pub mod metrics;

pub use exposition::Exposition;
pub use metrics::ExporterMetrics;

/// Escape a label value.
pub(crate) fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Map a name fragment onto `[a-zA-Z0-9_]`.
pub(crate) fn sanitize_fragment(input: &str) -> String {
    input
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
