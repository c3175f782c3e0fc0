//! Fenced code block extraction.
//!
//! Model responses carry proposed fixes inside triple-backtick fences with
//! an optional language tag. The extractor is deliberately dumb: blocks come
//! back in document order, an unterminated fence yields nothing, and nothing
//! here ever errors.

use std::path::Path;

/// A fenced block lifted out of a model response. Ephemeral - never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    /// Language tag from the opening fence, if present.
    pub language: Option<String>,
    /// Raw block content, without the fence lines.
    pub content: String,
}

/// Extract fenced blocks from `text`, in document order.
///
/// With `language` given, only blocks whose opening tag matches it
/// (case-insensitive) are returned; untagged blocks are excluded. With
/// `None`, every block is returned regardless of tag. A fence that never
/// closes contributes nothing.
#[must_use]
pub fn extract_blocks(text: &str, language: Option<&str>) -> Vec<CodeBlock> {
    let mut blocks = Vec::new();
    let mut open_tag: Option<Option<String>> = None;
    let mut body: Vec<&str> = Vec::new();

    for line in text.lines() {
        let trimmed = line.trim_end();
        match &open_tag {
            None => {
                if let Some(rest) = trimmed.strip_prefix("```") {
                    let tag = rest.split_whitespace().next().map(str::to_string);
                    open_tag = Some(tag);
                    body.clear();
                }
            }
            Some(tag) => {
                if trimmed == "```" {
                    blocks.push(CodeBlock {
                        language: tag.clone(),
                        content: body.join("\n"),
                    });
                    open_tag = None;
                } else {
                    body.push(line);
                }
            }
        }
    }

    match language {
        Some(wanted) => blocks
            .into_iter()
            .filter(|b| {
                b.language
                    .as_deref()
                    .is_some_and(|tag| tag.eq_ignore_ascii_case(wanted))
            })
            .collect(),
        None => blocks,
    }
}

/// Map a file name to the fence tag a model would use for it.
#[must_use]
pub fn language_for_path(path: &str) -> Option<&'static str> {
    let ext = Path::new(path).extension()?.to_str()?;
    let lang = match ext {
        "py" => "python",
        "js" | "jsx" => "javascript",
        "ts" | "tsx" => "typescript",
        "rs" => "rust",
        "go" => "go",
        "c" | "h" => "c",
        "cpp" | "hpp" => "cpp",
        "java" => "java",
        "sh" | "bash" => "bash",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "kt" => "kotlin",
        "scala" => "scala",
        "cs" => "csharp",
        "html" => "html",
        "css" => "css",
        "sql" => "sql",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "xml" => "xml",
        "md" => "markdown",
        _ => return None,
    };
    Some(lang)
}
