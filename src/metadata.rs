//! Token metadata URIs and documents.
//!
//! Metadata usually lives on content addressed or archive storage and
//! points at more of it from inside. Browsers and HTTP clients can't
//! fetch `ipfs://` or `ar://` directly, so those get routed through a
//! public gateway.

use serde_json::{Map, Value};

pub const IPFS_SCHEME: &str = "ipfs://";
pub const ARWEAVE_SCHEME: &str = "ar://";
pub const IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";
pub const ARWEAVE_GATEWAY: &str = "https://arweave.net/";

/// Nesting beyond this is left alone
pub const MAX_SANITIZE_DEPTH: usize = 32;

/// Keys that may hold an image reference, in order of preference
pub const IMAGE_KEYS: [&str; 4] = ["_image", "_image_url", "image", "image_url"];

/// Path fragment identifying the marketplace metadata endpoint. A token URI
/// pointing there gets looked up through the registry instead of fetched.
pub const REGISTRY_METADATA_PATH: &str = "opensea.io/api/v1/metadata";

/// An arbitrary metadata document, no schema is assumed
pub type MetadataDocument = Map<String, Value>;

pub fn ipfs_to_https(uri: &str) -> Option<String> {
    uri.strip_prefix(IPFS_SCHEME)
        .map(|path| format!("{IPFS_GATEWAY}{path}"))
}

pub fn arweave_to_https(uri: &str) -> Option<String> {
    uri.strip_prefix(ARWEAVE_SCHEME)
        .map(|path| format!("{ARWEAVE_GATEWAY}{path}"))
}

/// Makes a URI fetchable over HTTPS. Anything that is not `ipfs://` or
/// `ar://` is assumed fetchable already and returned as is.
pub fn normalize_uri(uri: &str) -> String {
    ipfs_to_https(uri)
        .or_else(|| arweave_to_https(uri))
        .unwrap_or_else(|| uri.to_string())
}

pub fn is_registry_metadata_uri(uri: &str) -> bool {
    uri.contains(REGISTRY_METADATA_PATH)
}

/// For every string value starting with `ipfs://` adds a sibling under the
/// same key prefixed with `_` holding the gateway URL. Non-empty nested
/// objects are treated the same way, arrays are not entered.
pub fn sanitize_document(doc: MetadataDocument) -> MetadataDocument {
    sanitize_at_depth(doc, 0)
}

fn sanitize_at_depth(mut doc: MetadataDocument, depth: usize) -> MetadataDocument {
    let mut additions = Vec::new();
    let keys: Vec<String> = doc.keys().cloned().collect();
    for key in keys {
        let value = match doc.get_mut(&key) {
            Some(value) => value,
            None => continue,
        };
        match value {
            Value::String(s) => {
                if let Some(url) = ipfs_to_https(s) {
                    additions.push((format!("_{key}"), Value::String(url)));
                }
            }
            Value::Object(nested) if !nested.is_empty() => {
                if depth + 1 >= MAX_SANITIZE_DEPTH {
                    warn!("Metadata nested deeper than {MAX_SANITIZE_DEPTH} levels, leaving {key} untouched");
                    continue;
                }
                let taken = std::mem::take(nested);
                *nested = sanitize_at_depth(taken, depth + 1);
            }
            _ => {}
        }
    }
    for (key, value) in additions {
        doc.insert(key, value);
    }
    doc
}

/// First non-empty image reference, normalized keys first
pub fn extract_image_preview(doc: Option<&MetadataDocument>) -> Option<&str> {
    let doc = doc?;
    IMAGE_KEYS.iter().find_map(|key| match doc.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> MetadataDocument {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn normalize() {
        assert_eq!(normalize_uri("ipfs://Qm123"), "https://ipfs.io/ipfs/Qm123");
        assert_eq!(normalize_uri("ar://abc"), "https://arweave.net/abc");
        assert_eq!(
            normalize_uri("https://example.com/1.json"),
            "https://example.com/1.json"
        );
        assert_eq!(normalize_uri(""), "");
    }

    #[test]
    fn normalize_is_idempotent() {
        for uri in ["ipfs://Qm123", "ar://abc", "https://x.io/a", "data:,hi"] {
            let once = normalize_uri(uri);
            assert_eq!(normalize_uri(&once), once);
        }
    }

    #[test]
    fn sanitize_recurses() {
        let out = sanitize_document(doc(json!({
            "a": "ipfs://X",
            "b": {"c": "ipfs://Y"},
            "d": ["ipfs://Z"],
            "e": {},
            "f": null,
            "g": "ar://W"
        })));
        assert_eq!(out["a"], json!("ipfs://X"));
        assert_eq!(out["_a"], json!("https://ipfs.io/ipfs/X"));
        assert_eq!(out["b"]["c"], json!("ipfs://Y"));
        assert_eq!(out["b"]["_c"], json!("https://ipfs.io/ipfs/Y"));
        assert_eq!(out["d"], json!(["ipfs://Z"]));
        assert_eq!(out["e"], json!({}));
        assert!(out.get("_g").is_none());
        assert_eq!(out.len(), 7);
    }

    #[test]
    fn sanitize_is_bounded() {
        use env_logger::{Builder, Env};
        let _ = Builder::from_env(Env::default().default_filter_or("warn")).try_init();
        let mut value = json!({"leaf": "ipfs://deep"});
        for _ in 0..(MAX_SANITIZE_DEPTH * 2) {
            value = json!({ "next": value });
        }
        // must return, and the deepest leaf stays as it was
        let out = sanitize_document(doc(value));
        let mut cursor = &Value::Object(out);
        while let Some(next) = cursor.get("next") {
            cursor = next;
        }
        assert_eq!(cursor["leaf"], json!("ipfs://deep"));
        assert!(cursor.get("_leaf").is_none());
    }

    #[test]
    fn shallow_nesting_is_sanitized() {
        let out = sanitize_document(doc(json!({"x": {"y": {"z": "ipfs://Q"}}})));
        assert_eq!(out["x"]["y"]["_z"], json!("https://ipfs.io/ipfs/Q"));
    }

    #[test]
    fn image_priority() {
        let d = doc(json!({"_image": "A", "image": "B"}));
        assert_eq!(extract_image_preview(Some(&d)), Some("A"));
        let d = doc(json!({"image_url": "C"}));
        assert_eq!(extract_image_preview(Some(&d)), Some("C"));
        let d = doc(json!({"_image": "", "image": "B"}));
        assert_eq!(extract_image_preview(Some(&d)), Some("B"));
        let d = doc(json!({}));
        assert_eq!(extract_image_preview(Some(&d)), None);
        assert_eq!(extract_image_preview(None), None);
    }

    #[test]
    fn image_after_sanitize() {
        let d = sanitize_document(doc(json!({"image": "ipfs://QmImg"})));
        assert_eq!(
            extract_image_preview(Some(&d)),
            Some("https://ipfs.io/ipfs/QmImg")
        );
    }

    #[test]
    fn registry_uri() {
        assert!(is_registry_metadata_uri(
            "https://api.opensea.io/api/v1/metadata/0xabc/1"
        ));
        assert!(!is_registry_metadata_uri("ipfs://Qm"));
    }
}
