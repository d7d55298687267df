// src/peer/mod.rs
// Message-correlation layer: pending-request table, identifier source and
// the connection-scoped peer that ties them to a transport.

pub mod errors;
pub mod pending;
pub mod request_id;

mod peer;

// Re-export specific items to simplify imports elsewhere
pub use errors::PeerError;
pub use peer::{HandlerError, NoopHandler, Peer, PeerHandler, Transport};
pub use pending::PendingRequestTable;
pub use request_id::IdSource;
