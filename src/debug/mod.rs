//! Interactive debugging: file discovery, fenced-patch extraction, gated
//! apply, and the session loop that ties them together.
//!
//! This is the only subsystem with real state and the only place a bug can
//! damage a user's files, so the pieces are deliberately small and separately
//! testable:
//!
//! - [`fences`] - lift fenced code blocks out of model output
//! - [`files`] - discover and load the files a conversation is about
//! - [`patch`] - backup-then-overwrite, confirmation-gated, never creative
//! - [`session`] - the bounded multi-turn loop over all of the above

pub mod fences;
pub mod files;
pub mod patch;
pub mod session;

pub use fences::{extract_blocks, language_for_path, CodeBlock};
pub use files::{load_references, scan_references, FileContext, FileEntry};
pub use patch::{apply_patch, PatchResult, BACKUP_SUFFIX};
pub use session::{
    ConversationTurn, DebugSession, Role, SessionOutcome, SessionState, Termination,
    DEFAULT_MAX_TURNS,
};
