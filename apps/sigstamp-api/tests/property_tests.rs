//! Property-based tests for sigstamp-api
//!
//! Tests request parsing, id validation and URL building using proptest.

use axum::http::{header, HeaderMap, HeaderValue};
use proptest::prelude::*;
use sigstamp_api::handlers::signed_pdf_url;
use sigstamp_api::models::SignPdfRequest;
use sigstamp_api::source::{is_valid_pdf_id, FsDocumentSource};
use sigstamp_core::{content_digest, strip_data_uri, FieldKind};

// ============================================================
// PDF ID Validation
// ============================================================

fn valid_pdf_id() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,64}"
}

fn hostile_pdf_id() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z]{0,8}/[a-z]{1,8}",
        "\\.\\./[a-z]{1,16}",
        "[a-z]{1,8}\\.pdf",
        "[a-z]{1,8}\\\\[a-z]{1,8}",
        Just("".to_string()),
    ]
}

fn field_type() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("text"),
        Just("signature"),
        Just("image"),
        Just("date"),
        Just("radio"),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn valid_ids_resolve_inside_pdf_dir(id in valid_pdf_id()) {
        prop_assert!(is_valid_pdf_id(&id));
        let source = FsDocumentSource::new("/srv/pdfs");
        let path = source.path_for(&id).unwrap();
        prop_assert_eq!(path.parent().unwrap(), source.dir());
        prop_assert_eq!(path.file_name().unwrap().to_string_lossy(), format!("{}.pdf", id));
    }

    #[test]
    fn hostile_ids_are_rejected(id in hostile_pdf_id()) {
        let id_pattern = regex::Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
        prop_assert!(!id_pattern.is_match(&id));
        prop_assert!(!is_valid_pdf_id(&id));
        prop_assert!(FsDocumentSource::new("pdfs").path_for(&id).is_none());
    }

    // ============================================================
    // Sign Request Parsing
    // ============================================================

    #[test]
    fn sign_request_parses_editor_fields(
        kind in field_type(),
        page in -5i64..50,
        x in 0.0f64..1.0,
        y in 0.0f64..1.0,
        w in 0.0f64..1.0,
        h in 0.0f64..1.0,
    ) {
        let body = serde_json::json!({
            "pdfId": "sample-a4",
            "fields": [{
                "id": "f-1",
                "pdfId": "sample-a4",
                "pageIndex": page,
                "type": kind,
                "xPct": x, "yPct": y, "wPct": w, "hPct": h,
            }],
            "signatureImageBase64": "aGk=",
        });

        let req: SignPdfRequest = serde_json::from_value(body).unwrap();
        let fields = req.fields.unwrap();
        prop_assert_eq!(fields.len(), 1);
        prop_assert_eq!(fields[0].page_index, page);
        prop_assert_eq!(fields[0].kind.to_string(), kind);
        prop_assert_eq!(fields[0].kind == FieldKind::Signature, kind == "signature");
        prop_assert_eq!(fields[0].x_pct, x);
    }

    // ============================================================
    // Signature Data Tests
    // ============================================================

    #[test]
    fn data_url_prefix_is_stripped(
        subtype in prop_oneof![Just("png"), Just("jpeg"), Just("jpg")],
        data in "[A-Za-z0-9+/]{4,200}"
    ) {
        let data_url = format!("data:image/{};base64,{}", subtype, data);
        prop_assert_eq!(strip_data_uri(&data_url), data.as_str());
        prop_assert_eq!(strip_data_uri(&data), data.as_str());
    }

    // ============================================================
    // Signed URL Tests
    // ============================================================

    #[test]
    fn signed_url_ends_with_filename(
        host in "[a-z]{1,12}(\\.[a-z]{2,6})?(:[0-9]{2,5})?",
        millis in 0i64..4_000_000_000_000,
    ) {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_str(&host).unwrap());
        let filename = format!("signed-{}.pdf", millis);

        let url = signed_pdf_url(&headers, &filename);
        prop_assert_eq!(url, format!("http://{}/signed/{}", host, filename));
    }

    // ============================================================
    // Document Hash Tests
    // ============================================================

    #[test]
    fn digests_are_64_lowercase_hex(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let hash = content_digest(&bytes);
        prop_assert_eq!(hash.len(), 64);
        prop_assert!(hash.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
