//! Per-scrape exposition sink.
//!
//! Measurements arrive one record at a time and interleave across series
//! (a detail export walks row by row). The text format needs each family's
//! samples to be contiguous, so samples are grouped by family here and
//! families keep first-seen order.

use std::collections::HashMap;
use std::fmt::Write;

use dovestats_core::protocol::MeasurementRecord;

use super::{escape_label, sanitize_fragment};
use crate::collector::{MetricDesc, MetricSink, MetricType, UP_DESC};

/// Namespace prefix for every Dovecot measurement.
pub const NAMESPACE: &str = "dovecot";

const MEASUREMENT_HELP: &str = "Help text not provided by this exporter.";

struct Family {
    name: String,
    help: String,
    kind: MetricType,
    samples: Vec<String>,
}

#[derive(Default)]
pub struct Exposition {
    families: Vec<Family>,
    index: HashMap<String, usize>,
    measurements: usize,
}

impl Exposition {
    /// Start a scrape with the collector's advertised series.
    pub fn new(descs: &[MetricDesc]) -> Self {
        let mut this = Self::default();
        for d in descs {
            this.family(d.name, d.help, d.kind);
        }
        this
    }

    /// Number of measurement samples received (health samples excluded).
    pub fn measurement_count(&self) -> usize {
        self.measurements
    }

    fn family(&mut self, name: &str, help: &str, kind: MetricType) -> &mut Family {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                self.families.push(Family {
                    name: name.to_string(),
                    help: help.to_string(),
                    kind,
                    samples: Vec::new(),
                });
                let idx = self.families.len() - 1;
                self.index.insert(name.to_string(), idx);
                idx
            }
        };
        &mut self.families[idx]
    }

    /// Render all families seen so far.
    pub fn render(&self, out: &mut String) {
        for f in &self.families {
            let _ = writeln!(out, "# HELP {} {}", f.name, f.help);
            let _ = writeln!(out, "# TYPE {} {}", f.name, f.kind.as_str());
            for s in &f.samples {
                let _ = writeln!(out, "{s}");
            }
        }
    }
}

impl MetricSink for Exposition {
    fn measurement(&mut self, record: MeasurementRecord) {
        let namespace = sanitize_fragment(&record.column.namespace);
        let name = format!(
            "{NAMESPACE}_{namespace}_{}",
            sanitize_fragment(&record.column.column)
        );
        let sample = match record.label() {
            Some(label) => format!(
                "{name}{{{}=\"{}\"}} {}",
                label_name(&namespace),
                escape_label(label),
                format_value(record.value)
            ),
            None => format!("{name} {}", format_value(record.value)),
        };

        self.measurements += 1;
        self.family(&name, MEASUREMENT_HELP, MetricType::Untyped)
            .samples
            .push(sample);
    }

    fn scope_health(&mut self, scope: &str, up: bool) {
        let sample = format!(
            "{}{{scope=\"{}\"}} {}",
            UP_DESC.name,
            escape_label(scope),
            u8::from(up)
        );
        self.family(UP_DESC.name, UP_DESC.help, UP_DESC.kind)
            .samples
            .push(sample);
    }
}

fn label_name(sanitized: &str) -> String {
    match sanitized.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("_{sanitized}"),
        Some(_) => sanitized.to_string(),
        None => "label".to_string(),
    }
}

/// Float formatting per the text format (`NaN`, `+Inf`, `-Inf`).
pub fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v == f64::INFINITY {
        "+Inf".into()
    } else if v == f64::NEG_INFINITY {
        "-Inf".into()
    } else {
        v.to_string()
    }
}
