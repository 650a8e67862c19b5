// ── Reactive record storage ──

mod collection;

pub(crate) use collection::RecordCollection;
pub use collection::Snapshot;
