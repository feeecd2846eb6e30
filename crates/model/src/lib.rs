mod facet;
mod record;
mod source_id;

pub use facet::{builtin_catalog, Axis, DataType, Facet, SortOrder, TimeFormat};
pub use record::{CanonicalRecord, CardType, NodeType, SchemaError};
pub use source_id::{content_digest, source_id};

/// Property values are plain JSON values: a tagged sum over string, number,
/// boolean, null, array, and object. The EAV write-out dispatches on the tag.
pub type Value = serde_json::Value;
