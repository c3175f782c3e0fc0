//! localmind - a local-first personal assistant for the command line.
//!
//! Routes free-text requests to a local Ollama model under different modes
//! (planning, journaling, code review, system monitoring) and logs every
//! interaction to an append-only store. The interactive debugging session is
//! the heart of the crate: it discovers which files a conversation is about,
//! carries a bounded multi-turn dialogue, and applies model-proposed patches
//! to disk only behind an explicit confirmation gate with a backup.
//!
//! # Architecture
//!
//! - [`config`] - configuration loading and validation
//! - [`llm`] - the model client trait, the Ollama implementation, and a mock
//! - [`modes`] - one-shot prompt templates
//! - [`debug`] - the interactive debugging session (fences, files, patching,
//!   the session loop)
//! - [`agent`] - multi-step goal planning
//! - [`store`] - the append-only interaction log
//! - [`report`] - weekly summary rendering
//! - [`sysmon`] - read-only system health report
//! - [`error`] - crate-wide error types
//!
//! # Example
//!
//! ```rust,ignore
//! use localmind::debug::DebugSession;
//! use localmind::llm::OllamaClient;
//!
//! let client = OllamaClient::new("qwen-lite");
//! let session = DebugSession::new("/home/me/project", &client);
//! let outcome = session
//!     .run("app.py crashes on start", &mut stdin.lock(), &mut stdout)
//!     .await?;
//! println!("{} turns, {} patches", outcome.turns_taken, outcome.patches.len());
//! ```

pub mod agent;
pub mod config;
pub mod debug;
pub mod error;
pub mod llm;
pub mod modes;
pub mod report;
pub mod store;
pub mod sysmon;

// Re-export commonly used types
pub use error::{MindError, Result};

pub use config::Config;
pub use debug::{
    apply_patch, extract_blocks, scan_references, CodeBlock, DebugSession, FileContext,
    PatchResult, SessionOutcome, Termination,
};
pub use llm::{MockModelClient, ModelClient, ModelError, OllamaClient};
pub use modes::PromptMode;
pub use store::{LogRecord, LogStore};
