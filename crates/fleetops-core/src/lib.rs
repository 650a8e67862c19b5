//! Descriptor-driven record management between `fleetops-api` and the shell.
//!
//! Every fleet screen is the same fetch → validate → mutate → refresh cycle
//! over one table. This crate writes that cycle once:
//!
//! - **[`Gateway`]**: the only component that touches persistence. The
//!   process bootstrap injects [`RestGateway`]; tests use an in-memory one.
//!
//! - **[`EntityDescriptor`]**: static description of one entity kind
//!   (table, editable fields and their kinds, ordering, embedded joins).
//!
//! - **[`Draft`]**: string-keyed working copy of a record's editable fields,
//!   coerced and validated on submission.
//!
//! - **[`ListController`]**: owns the collection one list screen shows,
//!   publishes `Arc` snapshots through a `watch` channel, and patches them
//!   after successful mutations.
//!
//! - **[`ActionDialog`]**: Add / Edit / View / Delete with single-flight
//!   submission; quick row actions live in [`actions`].
//!
//! - **[`Fleet`]**: process-owned facade holding the gateway, session and
//!   notifier.

pub mod actions;
pub mod config;
pub mod controller;
pub mod dialog;
pub mod error;
pub mod fleet;
pub mod form;
pub mod gateway;
pub mod model;
pub mod notify;
pub mod overview;
pub mod schema;
pub mod session;
pub mod stats;
pub mod store;
pub mod stream;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use actions::{AdjustDirection, QuickAction, StockAdjustment, WorkOrderStatus};
pub use config::{AuthCredentials, GatewayConfig, TlsVerification};
pub use controller::{ListController, ListPhase};
pub use dialog::{ActionDialog, DialogKind, DialogPhase, Outcome, RefreshPolicy};
pub use error::{CoreError, ValidationError};
pub use fleet::Fleet;
pub use form::{Draft, editable_fields};
pub use gateway::{Gateway, RestGateway};
pub use model::{EntityId, Fields, Record};
pub use notify::{Notifier, Toast, ToastKind, TracingNotifier};
pub use overview::{FleetAnalytics, FleetOverview};
pub use schema::{
    Choice, Column, EntityDescriptor, EntityKind, FieldKind, FieldSpec, ReferenceTarget,
};
pub use session::{Profile, Session};
pub use stats::Summary;
pub use store::Snapshot;
pub use stream::RecordStream;

// Query types callers need to narrow a controller.
pub use fleetops_api::{Filter, FilterOp, Order, Query};
