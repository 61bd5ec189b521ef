//! JSON test vector loader shared by the export decoder tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use serde::Deserialize;

use dovestats_core::protocol::ScopeKind;

#[derive(Debug, Deserialize)]
pub struct TestVector {
    pub description: String,
    pub scope: String,
    pub kind: String,
    /// Raw response text; `\t` and `\n` are ordinary JSON escapes.
    pub input: String,
    #[serde(default)]
    pub expect: Vec<ExpectRecord>,
    #[serde(default)]
    pub expect_error: Option<ExpectError>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectRecord {
    pub namespace: String,
    pub column: String,
    #[serde(default)]
    pub label: Option<String>,
    pub value: f64,
}

#[derive(Debug, Deserialize)]
pub struct ExpectError {
    pub code: String,
}

impl TestVector {
    pub fn scope_kind(&self) -> ScopeKind {
        match self.kind.as_str() {
            "global" => ScopeKind::Global,
            "detail" => ScopeKind::Detail,
            other => panic!("unsupported kind: {other}"),
        }
    }
}

pub fn load(name: &str) -> TestVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}
