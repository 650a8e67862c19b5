// fleetops-api: Async Rust client for PostgREST-style table stores

pub mod auth;
pub mod client;
pub mod error;
pub mod query;
pub mod transport;

pub use auth::{AuthClient, AuthSession, AuthUser};
pub use client::{Row, TableClient};
pub use error::Error;
pub use query::{Filter, FilterOp, Order, Query};
pub use transport::{TlsMode, TransportConfig};
