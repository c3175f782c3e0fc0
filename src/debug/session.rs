//! The interactive debug session loop.
//!
//! One session is a bounded conversation: resolve file references from the
//! problem statement, get an initial diagnosis, then relay user turns into
//! continuation prompts until the user quits, input ends, or the turn budget
//! runs out. When a response mentions a loaded file and carries a fenced
//! block, the session offers - never forces - a patch.
//!
//! # State machine
//!
//! ```text
//! Init -> AwaitingModel -> AwaitingUser -> (Applying) -> AwaitingUser
//!                 ^              |
//!                 +--------------+         any exit -> Terminated
//! ```
//!
//! The loop is driven through an injected reader and writer, so every
//! terminal path (quit, EOF, budget exhaustion, patch confirmation) is
//! testable with a scripted input and no live model.

use crate::debug::fences::{extract_blocks, language_for_path};
use crate::debug::files::{load_references, reload_file, FileContext};
use crate::debug::patch::{apply_patch, PatchResult};
use crate::error::Result;
use crate::llm::ModelClient;
use colored::Colorize;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::debug;

/// Default maximum counted user turns per session.
pub const DEFAULT_MAX_TURNS: u32 = 10;

/// How many trailing turns the continuation prompt carries.
pub const HISTORY_WINDOW: usize = 4;

/// Per-turn character budget inside the continuation prompt.
pub const TURN_CHAR_BUDGET: usize = 300;

/// Character budget for the patch preview.
pub const PREVIEW_CHAR_BUDGET: usize = 500;

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One exchange half. Append-only; never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Where the session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    AwaitingModel,
    AwaitingUser,
    Applying,
    Terminated,
}

/// Why the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The user typed `quit`.
    Quit,
    /// The input stream closed (implicit quit, not an error).
    EndOfInput,
    /// The counted-turn budget was exhausted.
    TurnBudget,
}

/// What a finished session hands back to its caller.
///
/// The caller owns persistence: one summary record goes to the log store,
/// never the full transcript.
#[derive(Debug)]
pub struct SessionOutcome {
    /// Counted user turns.
    pub turns_taken: u32,
    /// Last assistant response, if any.
    pub final_response: Option<String>,
    /// Every patch that was actually applied.
    pub patches: Vec<PatchResult>,
    /// Exit reason.
    pub termination: Termination,
}

impl SessionOutcome {
    /// The summary text the caller logs for this session.
    #[must_use]
    pub fn final_summary(&self) -> String {
        self.final_response
            .clone()
            .unwrap_or_else(|| "(session ended before any model response)".to_string())
    }
}

/// The interactive debugging session controller.
///
/// Owns the conversation turns, the loaded file context, the turn counter,
/// and the termination flag. Single-threaded and strictly sequential: every
/// turn blocks on user input, then on one (timeout-bounded) model call.
pub struct DebugSession<'a> {
    root: PathBuf,
    client: &'a dyn ModelClient,
    max_turns: u32,
    state: SessionState,
    turns: Vec<ConversationTurn>,
    files: FileContext,
    turn_count: u32,
    patches: Vec<PatchResult>,
}

impl<'a> DebugSession<'a> {
    /// Create a session rooted at `root`, talking to `client`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, client: &'a dyn ModelClient) -> Self {
        Self {
            root: root.into(),
            client,
            max_turns: DEFAULT_MAX_TURNS,
            state: SessionState::Init,
            turns: Vec::new(),
            files: FileContext::new(),
            turn_count: 0,
            patches: Vec::new(),
        }
    }

    /// Override the counted-turn budget.
    #[must_use]
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Current state (useful mid-run only from tests of internals).
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the session to termination.
    ///
    /// `input` supplies user lines; `out` receives everything the session
    /// prints. Model failures surface as inline sentinel text and the loop
    /// continues - only quit, end-of-input, or the turn budget end it.
    pub async fn run<R, W>(
        mut self,
        problem: &str,
        input: &mut R,
        out: &mut W,
    ) -> Result<SessionOutcome>
    where
        R: BufRead,
        W: Write,
    {
        writeln!(out, "\n{}", "=".repeat(70))?;
        writeln!(out, "{}", " INTERACTIVE DEBUG SESSION".bold())?;
        writeln!(out, "{}", "=".repeat(70))?;
        writeln!(out, "\nInitial problem: {problem}")?;

        self.files = load_references(&self.root, problem);
        for (name, entry) in self.files.iter() {
            writeln!(out, "Loaded {} ({} bytes)", name.cyan(), entry.bytes)?;
        }
        if !self.files.is_empty() {
            writeln!(out, "{} file(s) in context", self.files.len())?;
        }
        writeln!(
            out,
            "\nType 'quit' to end the session, or answer to continue.\n{}",
            "-".repeat(70)
        )?;

        let seed = build_seed_prompt(problem, &self.files);
        self.turns.push(ConversationTurn::user(problem));
        self.state = SessionState::AwaitingModel;
        let analysis = self.client.query(&seed).await;
        writeln!(out, "\n{analysis}")?;
        self.turns.push(ConversationTurn::assistant(analysis));

        let termination = loop {
            self.state = SessionState::AwaitingUser;
            write!(out, "\nYour response (or 'quit' to exit): ")?;
            out.flush()?;

            let line = match read_line(input)? {
                None => {
                    writeln!(out, "\n[Session ended]")?;
                    break Termination::EndOfInput;
                }
                Some(line) => line,
            };

            if line.eq_ignore_ascii_case("quit") {
                writeln!(out, "\nDebug session closed.")?;
                break Termination::Quit;
            }
            if line.is_empty() {
                // Re-prompt; not a counted turn, no model call.
                continue;
            }

            self.turns.push(ConversationTurn::user(&line));
            self.turn_count += 1;
            debug!("Turn {}/{}", self.turn_count, self.max_turns);

            let prompt = build_continuation_prompt(&self.turns, &line, &self.files);
            self.state = SessionState::AwaitingModel;
            let response = self.client.query(&prompt).await;
            writeln!(out, "\n{response}")?;
            self.turns.push(ConversationTurn::assistant(&response));

            self.maybe_offer_patch(&response, input, out)?;
            writeln!(out, "\n{}", "-".repeat(70))?;

            if self.turn_count >= self.max_turns {
                writeln!(out, "Turn limit reached. Session closing.")?;
                break Termination::TurnBudget;
            }
        };

        self.state = SessionState::Terminated;
        let final_response = self
            .turns
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
            .map(|t| t.content.clone());

        Ok(SessionOutcome {
            turns_taken: self.turn_count,
            final_response,
            patches: self.patches,
            termination,
        })
    }

    /// Offer a patch for the first loaded file mentioned in the response.
    ///
    /// First match wins; one offer per response. Extraction prefers the
    /// file's own language tag and falls back to any block. No usable block
    /// means no offer and no message.
    fn maybe_offer_patch<R, W>(&mut self, response: &str, input: &mut R, out: &mut W) -> Result<()>
    where
        R: BufRead,
        W: Write,
    {
        if !response.contains("```") {
            return Ok(());
        }
        let Some(name) = self
            .files
            .names()
            .find(|n| response.contains(*n))
            .map(str::to_string)
        else {
            return Ok(());
        };

        self.state = SessionState::Applying;

        let mut blocks = match language_for_path(&name) {
            Some(lang) => extract_blocks(response, Some(lang)),
            None => Vec::new(),
        };
        if blocks.is_empty() {
            blocks = extract_blocks(response, None);
        }
        let Some(block) = blocks.into_iter().next() else {
            return Ok(());
        };

        writeln!(out, "\n{}", "=".repeat(70))?;
        writeln!(out, "{}", " FIX AVAILABLE".bold().green())?;
        writeln!(out, "{}", "=".repeat(70))?;
        writeln!(out, "\nFile: {name}")?;
        writeln!(out, "Proposed content preview:\n")?;
        let (preview, clipped) = clip(&block.content, PREVIEW_CHAR_BUDGET);
        writeln!(out, "{preview}")?;
        if clipped {
            writeln!(out, "...[truncated]...")?;
        }
        write!(out, "\nApply this fix to the file? (yes/no): ")?;
        out.flush()?;

        let answer = read_line(input)?.unwrap_or_default();
        if matches!(answer.to_lowercase().as_str(), "yes" | "y") {
            match apply_patch(&self.root, &name, &block.content) {
                Ok(result) => {
                    if let Some(backup) = &result.backup_path {
                        writeln!(out, "Backup created: {}", backup.display())?;
                    }
                    writeln!(out, "{} {}", "Fixed:".green(), name)?;
                    self.patches.push(result);
                    reload_file(&mut self.files, &self.root, &name);
                }
                Err(e) => {
                    writeln!(out, "{} {e}", "Could not apply fix:".red())?;
                }
            }
        } else {
            writeln!(out, "Fix not applied. Continuing with session.")?;
        }
        Ok(())
    }
}

/// Read one trimmed line; `None` means the stream closed.
fn read_line<R: BufRead>(input: &mut R) -> std::io::Result<Option<String>> {
    let mut buf = String::new();
    if input.read_line(&mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(buf.trim().to_string()))
}

/// First `max_chars` characters plus whether anything was cut.
fn clip(s: &str, max_chars: usize) -> (String, bool) {
    if s.chars().count() <= max_chars {
        (s.to_string(), false)
    } else {
        (s.chars().take(max_chars).collect(), true)
    }
}

fn render_file_section(heading: &str, files: &FileContext) -> String {
    if files.is_empty() {
        return String::new();
    }
    let mut section = format!("\n\n{heading}\n{}\n", "-".repeat(50));
    for (name, entry) in files.iter() {
        let lang = language_for_path(name).unwrap_or("text");
        section.push_str(&format!("\n{name}:\n```{lang}\n{}\n```\n", entry.content));
    }
    section
}

/// Build the seed prompt for the initial diagnosis.
#[must_use]
pub fn build_seed_prompt(problem: &str, files: &FileContext) -> String {
    let file_context = render_file_section("FILE CONTENTS LOADED:", files);
    format!(
        "You are debugging this problem:\n\n{problem}{file_context}\n\n\
         STRATEGY:\n\
         1. Based on what you know, provide an initial diagnosis (what's likely wrong)\n\
         2. Ask 2-3 SPECIFIC questions to confirm and gather critical details\n\
         3. Based on common patterns with this type of issue, suggest likely solutions\n\
         4. Format as:\n\
         \x20  - ROOT CAUSE HYPOTHESIS (what you think it is)\n\
         \x20  - IMMEDIATE ACTION ITEMS (what the user should check or provide)\n\
         \x20  - PRELIMINARY FIX (if you can guess the solution, in the correct language block)\n\
         \x20  - CRITICAL QUESTIONS (numbered 1-3)\n\n\
         IMPORTANT: when showing fixed code, wrap it in the correct language \
         block (```python, ```javascript, ```cpp, ...) so it can be applied to \
         the file. Be ready to provide actual solutions once you have more \
         info. Don't be vague."
    )
}

/// Build a continuation prompt from the bounded history window.
///
/// Carries the last [`HISTORY_WINDOW`] turns, each clipped to
/// [`TURN_CHAR_BUDGET`] characters, plus the current file contents in full.
#[must_use]
pub fn build_continuation_prompt(
    turns: &[ConversationTurn],
    latest_input: &str,
    files: &FileContext,
) -> String {
    let start = turns.len().saturating_sub(HISTORY_WINDOW);
    let mut context = String::new();
    for turn in &turns[start..] {
        let speaker = match turn.role {
            Role::Assistant => "Assistant",
            Role::User => "User",
        };
        let (snippet, clipped) = clip(&turn.content, TURN_CHAR_BUDGET);
        let ellipsis = if clipped { "..." } else { "" };
        context.push_str(&format!("{speaker}: {snippet}{ellipsis}\n"));
    }

    let file_ref = render_file_section("FILE REFERENCES (for context):", files);
    format!(
        "Continue debugging and PROVIDE SOLUTIONS:\n\n\
         CONVERSATION SO FAR:\n{context}\n\
         USER'S NEW INPUT: {latest_input}{file_ref}\n\n\
         IMPORTANT: now that you have more information, provide CONCRETE solutions:\n\
         1. Diagnose the root cause based on all information\n\
         2. Provide a step-by-step FIX, not just an explanation\n\
         3. When showing fixed code, ALWAYS wrap it in a language-tagged \
         ``` block so it can be applied to the file\n\
         4. Explain WHY the fix works\n\
         5. List ways to prevent this in future\n\n\
         If you have enough info to solve it, SOLVE IT. Don't just ask more questions."
    )
}
