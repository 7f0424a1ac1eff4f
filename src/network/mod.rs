//! Network Layer
//!
//! WebSocket server, wire protocol and per-match sessions.
//! This layer is **non-deterministic** - all scoring logic runs through `scoring/`.

pub mod protocol;
pub mod session;
pub mod server;

pub use protocol::{ClientMessage, ErrorCode, ServerError, ServerMessage, WriteRequest};
pub use session::{AppliedUpdate, MatchDetails, MatchSession, SessionError, SessionManager};
pub use server::{dispatch, GameServer, GameServerError, ServerConfig};
