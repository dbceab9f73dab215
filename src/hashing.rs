//! Document Fingerprints
//!
//! SHA-256 over the compact JSON of a decoded document. serde_json's default
//! `Map` is ordered by key, so the same document hashes the same regardless
//! of the key order or compression level in its blueprint string.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Fingerprint of a decoded blueprint document, lowercase hex.
pub fn document_fingerprint(document: &Value) -> String {
    // `Value`'s Display writes compact JSON and cannot fail.
    let json = document.to_string();
    hex::encode(Sha256::digest(json.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fingerprint_of_known_document() {
        // sha256 of the bytes `{"a":1}`
        assert_eq!(
            document_fingerprint(&json!({"a": 1})),
            hex::encode(Sha256::digest(br#"{"a":1}"#))
        );
    }

    #[test]
    fn test_fingerprint_ignores_key_order() {
        let a: Value = serde_json::from_str(
            r#"{"blueprint": {"label": "A", "entities": [{"name": "x", "position": {"x": 1, "y": 2}}]}}"#,
        )
        .unwrap();
        let b: Value = serde_json::from_str(
            r#"{"blueprint": {"entities": [{"position": {"y": 2, "x": 1}, "name": "x"}], "label": "A"}}"#,
        )
        .unwrap();
        assert_eq!(document_fingerprint(&a), document_fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_sensitive_to_content() {
        let a = json!({"blueprint": {"label": "A"}});
        let b = json!({"blueprint": {"label": "B"}});
        assert_ne!(document_fingerprint(&a), document_fingerprint(&b));
        assert_eq!(document_fingerprint(&a).len(), 64);
    }
}
