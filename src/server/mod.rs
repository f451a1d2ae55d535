//! Live session server
//!
//! One WebSocket endpoint (`/ws`) per client. Each connection owns a
//! [`session::SessionState`] and four cooperative tasks (receive, dispatch,
//! change watcher, outbound batcher) joined as a single unit.
//!
//! # Protocol
//!
//! Commands are single JSON objects, events are JSON arrays of objects:
//!
//! ```json
//! // Client -> Server
//! {"type": "repo-select", "repo": "/path/to/repo"}
//! {"type": "set-commit-a", "commit": "abc123"}
//! {"type": "get-diff", "paths": ["src/lib.rs"]}
//!
//! // Server -> Client
//! [{"type": "branches", "branches": [...]},
//!  {"type": "session-state", "state": {...}}]
//! ```

pub mod connection;
pub mod engine;
pub mod protocol;
pub mod registry;
pub mod session;

pub use connection::handle_connection;
pub use engine::{SessionEngine, DEBOUNCE_INTERVAL};
pub use protocol::{decode_client_message, ClientMessage, ServerMessage};
pub use registry::ConnectionRegistry;
pub use session::SessionState;
