//! # Cricket Scorer
//!
//! Ball-by-ball cricket scoring engine and match coordination server.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CRICKET SCORER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  └── hash.rs      - State hashing for verification           │
//! │                                                              │
//! │  scoring/         - Scoring engine (deterministic)           │
//! │  ├── delivery.rs  - Ball input and legal/illegal deliveries  │
//! │  ├── ledger.rs    - Batting and bowling figures              │
//! │  ├── partnership.rs - Pair at the crease                     │
//! │  ├── over.rs      - Strike rotation and over boundaries      │
//! │  ├── wicket.rs    - Dismissals and fall of wickets           │
//! │  ├── innings.rs   - Innings lifecycle                        │
//! │  ├── state.rs     - Match aggregate                          │
//! │  ├── result.rs    - Result calculation                       │
//! │  ├── scoreboard.rs- Read-only projections                    │
//! │  └── engine.rs    - Command application                      │
//! │                                                              │
//! │  network/         - Networking (non-deterministic)           │
//! │  ├── server.rs    - WebSocket server                         │
//! │  ├── protocol.rs  - Message types                            │
//! │  └── session.rs   - Match session management                 │
//! │                                                              │
//! │  replay/          - Transcripts and replay verification      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `scoring/` modules are deterministic:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - No I/O
//!
//! Given the same setup and the same accepted commands, a match always
//! reaches the same state and the same state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod network;
pub mod replay;
pub mod scoring;

// Re-export commonly used types
pub use crate::core::hash::StateHash;
pub use scoring::engine::{apply_command, ScoringCommand};
pub use scoring::error::{ScoringError, ScoringResult};
pub use scoring::scoreboard::Scoreboard;
pub use scoring::state::{MatchId, MatchSetup, MatchState};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
