// ── Record model ──
//
// Rows are schemaless at this layer: a `Record` is the backend's JSON map
// plus its id. Per-table structure lives in `crate::schema` descriptors.

pub mod entity_id;
pub mod record;

pub use entity_id::EntityId;
pub use record::{Fields, Record, display_value, parse_timestamp};
