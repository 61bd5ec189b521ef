//! Export decoder vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::io::Cursor;

use dovestats_core::protocol::decode;

mod vector_loader;
use vector_loader::load;

#[test]
fn export_vectors() {
    let files = [
        "global_two_columns.json",
        "global_header_only.json",
        "global_blank_data_row.json",
        "global_trailing_lines_ignored.json",
        "global_empty_header.json",
        "global_width_mismatch.json",
        "global_bad_value.json",
        "detail_users.json",
        "detail_blank_line_terminates.json",
        "detail_width_mismatch.json",
        "detail_short_header.json",
        "detail_bad_value_after_rows.json",
        "detail_crlf.json",
        "empty_stream.json",
        "cut_mid_row.json",
        "global_header_unterminated.json",
        "global_row_unterminated.json",
        "global_row_cut.json",
        "detail_row_unterminated.json",
        "detail_whitespace_line_terminates.json",
    ];

    for f in files {
        let v = load(f);
        let results: Vec<_> =
            decode(Cursor::new(v.input.as_bytes()), &v.scope, v.scope_kind()).collect();

        let (records, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.is_ok());
        let records: Vec<_> = records.into_iter().map(|r| r.unwrap()).collect();
        let errors: Vec<_> = errors.into_iter().map(|r| r.unwrap_err()).collect();

        match &v.expect_error {
            Some(err) => {
                assert_eq!(errors.len(), 1, "vector={}", v.description);
                assert_eq!(errors[0].kind().as_str(), err.code, "vector={}", v.description);
            }
            None => assert!(errors.is_empty(), "vector={} errors={errors:?}", v.description),
        }

        assert_eq!(records.len(), v.expect.len(), "vector={}", v.description);
        for (got, ex) in records.iter().zip(&v.expect) {
            assert_eq!(got.column.namespace, ex.namespace, "vector={}", v.description);
            assert_eq!(got.column.column, ex.column, "vector={}", v.description);
            assert_eq!(got.label(), ex.label.as_deref(), "vector={}", v.description);
            assert_eq!(got.value, ex.value, "vector={}", v.description);
        }
    }
}
