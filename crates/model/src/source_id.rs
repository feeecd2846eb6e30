//! Deterministic source-id generation. Re-importing the same file must
//! converge on the same card identity, so the id is a pure function of the
//! normalized source path and the file's structured header. Byte-identical
//! input yields byte-identical output.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

const NO_PATH: &str = "__no_path__";
const NO_IDENTITY: &str = "__no_identity__";

/// Header keys that contribute to the fallback identity, in order.
const IDENTITY_KEYS: [&str; 6] = ["id", "source_id", "title", "name", "created", "modified"];

/// Produces a stable identifier of the form `<source_name>-<16 hex chars>`
/// from a source path and its structured header.
///
/// The path is trimmed, lowercased, and backslash-normalized, so the same
/// document addressed from Windows and POSIX paths converges. The header is
/// canonicalized with sorted keys before hashing, so key order never matters.
pub fn source_id(
    path: &str,
    header: &Map<String, Value>,
    source_name: &str,
    fallback_content: Option<&[u8]>,
) -> String {
    let normalized = normalize_path(path);
    let path_part = if normalized.is_empty() {
        NO_PATH.to_string()
    } else {
        normalized
    };

    let mut header_json = String::new();
    write_canonical(&Value::Object(header.clone()), &mut header_json);

    let composite = format!(
        "{}:{}:{}",
        path_part,
        header_json,
        fallback_identity(header, fallback_content)
    );
    format!("{}-{}", source_name, digest16(composite.as_bytes()))
}

/// A 16-hex-character digest of arbitrary content, used both for the
/// composite hash and for content-based fallback identity.
pub fn content_digest(content: &[u8]) -> String {
    digest16(content)
}

fn normalize_path(path: &str) -> String {
    path.trim().to_lowercase().replace('\\', "/")
}

fn fallback_identity(header: &Map<String, Value>, fallback_content: Option<&[u8]>) -> String {
    let mut parts: Vec<String> = IDENTITY_KEYS
        .iter()
        .filter_map(|key| header.get(*key).and_then(identity_part))
        .collect();

    if let Some(content) = fallback_content.filter(|c| !c.is_empty()) {
        parts.push(digest16(content));
    }

    if parts.is_empty() {
        NO_IDENTITY.to_string()
    } else {
        parts.join("|")
    }
}

fn identity_part(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Writes a deterministic JSON encoding of `value`: object keys are emitted
/// in sorted order regardless of the map's own iteration order, with no
/// whitespace. Scalar encoding defers to serde_json's `Display`.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String((*key).clone()).to_string());
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

fn digest16(input: &[u8]) -> String {
    let digest = Sha256::digest(input);
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn header(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("test header must be an object"),
        }
    }

    #[test]
    fn path_case_separators_and_key_order_do_not_matter() {
        let a = source_id(
            "/Users/A/Notes/foo.md",
            &header(json!({"title": "Foo", "created": "2024-01-01"})),
            "alto",
            None,
        );
        let b = source_id(
            "\\Users\\A\\Notes\\FOO.MD",
            &header(json!({"created": "2024-01-01", "title": "Foo"})),
            "alto",
            None,
        );
        assert_eq!(a, b);
        assert!(a.starts_with("alto-"));
        assert_eq!("alto-".len() + 16, a.len());
    }

    #[test]
    fn distinct_headers_produce_distinct_ids() {
        let path = "/notes/foo.md";
        let a = source_id(path, &header(json!({"title": "Foo"})), "alto", None);
        let b = source_id(path, &header(json!({"title": "Bar"})), "alto", None);
        assert_ne!(a, b);
    }

    #[test]
    fn empty_path_and_empty_header_still_produce_an_id() {
        let a = source_id("", &Map::new(), "alto", None);
        let b = source_id("   ", &Map::new(), "alto", None);
        // Both encode the missing path and missing identity the same way.
        assert_eq!(a, b);
    }

    #[test]
    fn fallback_content_distinguishes_headerless_sources() {
        let a = source_id("", &Map::new(), "alto", Some(b"alpha"));
        let b = source_id("", &Map::new(), "alto", Some(b"beta"));
        assert_ne!(a, b);
    }

    #[test]
    fn generation_is_deterministic() {
        let h = header(json!({"id": 7, "nested": {"z": 1, "a": [1, 2]}}));
        let first = source_id("/a/b.json", &h, "import", Some(b"body"));
        let second = source_id("/a/b.json", &h, "import", Some(b"body"));
        assert_eq!(first, second);
    }
}
