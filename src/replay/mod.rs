//! Replay Module
//!
//! Command transcripts and verification by deterministic replay.
//!
//! A match is fully described by its setup and the ordered list of accepted
//! commands. Replaying them through the engine must reproduce the same state
//! hash the live session reported.

pub mod transcript;
pub mod verify;

pub use transcript::{MatchTranscript, TranscriptError, CHECKPOINT_INTERVAL, TRANSCRIPT_VERSION};
pub use verify::{replay_transcript, verify_transcript, VerificationError, VerificationResult};
