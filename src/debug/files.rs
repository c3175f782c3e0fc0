//! File reference discovery for debug sessions.
//!
//! Free text mentions files by name; the scanner pulls out anything that
//! looks like a source path and the loader keeps whatever actually exists
//! under the working root. The split matters: scanning is a pure function
//! over strings, existence checking is the only part that touches disk.
//!
//! Suffix matching over prose is lossy by construction. False positives are
//! harmless (they fail the existence check); files mentioned without a
//! recognizable extension are an accepted miss.

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

/// Path-like tokens ending in a recognized source/config/markup suffix.
// Longer suffixes come before their prefixes (jsx before js) - the regex
// crate picks the first alternative that matches, not the longest.
const REFERENCE_PATTERN: &str = r"[\w./-]*\.(?:py|json|jsx|js|tsx|ts|toml|cpp|css|cs|c|hpp|html|h|java|sh|bash|rb|go|rs|php|swift|kt|scala|sql|yaml|yml|xml|md)";

fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(REFERENCE_PATTERN).expect("reference pattern is valid"))
}

/// One loaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Last-loaded text content.
    pub content: String,
    /// Byte length of that content.
    pub bytes: usize,
}

impl FileEntry {
    fn new(content: String) -> Self {
        let bytes = content.len();
        Self { content, bytes }
    }
}

/// The files a session currently has in working memory, in the order they
/// were first resolved. Entries are replaced wholesale, never merged.
#[derive(Debug, Clone, Default)]
pub struct FileContext {
    entries: Vec<(String, FileEntry)>,
}

impl FileContext {
    /// Empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry.
    pub fn insert(&mut self, name: impl Into<String>, entry: FileEntry) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = entry,
            None => self.entries.push((name, entry)),
        }
    }

    /// Look up an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FileEntry> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, e)| e)
    }

    /// Iterate entries in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileEntry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    /// File names in resolution order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Number of loaded files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no files are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Scan free text for path-like tokens, in order of first appearance.
///
/// Pure: no filesystem access. Leading `./` is stripped; duplicates are
/// dropped.
#[must_use]
pub fn scan_references(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for capture in reference_regex().find_iter(text) {
        let mut name = capture.as_str();
        while let Some(rest) = name.strip_prefix("./") {
            name = rest;
        }
        if name.is_empty() || seen.iter().any(|s| s == name) {
            continue;
        }
        seen.push(name.to_string());
    }
    seen
}

/// Resolve a relative reference against the working root.
///
/// Returns `None` for anything that would escape the root: absolute paths
/// and any `..` component.
#[must_use]
pub fn resolve_within_root(root: &Path, relative: &str) -> Option<PathBuf> {
    let rel = Path::new(relative);
    if rel.is_absolute() {
        return None;
    }
    for component in rel.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            _ => return None,
        }
    }
    Some(root.join(rel))
}

/// Load a referenced file if it exists under the root.
///
/// A missing file is `Ok(None)`, not an error - prose produces plenty of
/// tokens that merely look like paths. Unreadable files are also dropped.
#[must_use]
pub fn load_if_exists(root: &Path, relative: &str) -> Option<String> {
    let path = resolve_within_root(root, relative)?;
    if !path.is_file() {
        return None;
    }
    match fs::read_to_string(&path) {
        Ok(content) => Some(content),
        Err(e) => {
            debug!("Could not read {}: {}", path.display(), e);
            None
        }
    }
}

/// Scan `text` and load every referenced file that exists under `root`.
pub fn load_references(root: &Path, text: &str) -> FileContext {
    let mut context = FileContext::new();
    for name in scan_references(text) {
        if let Some(content) = load_if_exists(root, &name) {
            context.insert(name, FileEntry::new(content));
        }
    }
    context
}

/// Reload a single file into the context, replacing its entry wholesale.
///
/// If the file vanished from disk the stale entry is kept; the next patch
/// attempt will report the missing target.
pub fn reload_file(context: &mut FileContext, root: &Path, name: &str) {
    if let Some(content) = load_if_exists(root, name) {
        context.insert(name.to_string(), FileEntry::new(content));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_scan_finds_plain_and_nested_paths() {
        let refs = scan_references("the bug is in app.py and src/util/helpers.js somewhere");
        assert_eq!(refs, vec!["app.py".to_string(), "src/util/helpers.js".to_string()]);
    }

    #[test]
    fn test_scan_strips_leading_dot_slash() {
        let refs = scan_references("look at ./main.rs please");
        assert_eq!(refs, vec!["main.rs".to_string()]);
    }

    #[test]
    fn test_scan_dedups_preserving_order() {
        let refs = scan_references("app.py calls util.py which app.py imports");
        assert_eq!(refs, vec!["app.py".to_string(), "util.py".to_string()]);
    }

    #[test]
    fn test_scan_ignores_unrecognized_suffixes() {
        let refs = scan_references("see notes.docx and report.pdf");
        assert!(refs.is_empty());
    }

    #[test]
    fn test_scan_empty_text() {
        assert!(scan_references("").is_empty());
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let root = Path::new("/work");
        assert!(resolve_within_root(root, "../secrets.py").is_none());
        assert!(resolve_within_root(root, "a/../../b.py").is_none());
        assert!(resolve_within_root(root, "/etc/passwd.py").is_none());
        assert_eq!(
            resolve_within_root(root, "src/app.py"),
            Some(PathBuf::from("/work/src/app.py"))
        );
    }

    #[test]
    fn test_load_references_keeps_only_existing_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("real.py"), "print(1)").unwrap();

        let context = load_references(temp.path(), "compare real.py with imaginary.py");
        assert_eq!(context.len(), 1);
        assert_eq!(context.get("real.py").unwrap().content, "print(1)");
        assert!(context.get("imaginary.py").is_none());
    }

    #[test]
    fn test_entry_records_byte_length() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.py"), "abcd").unwrap();
        let context = load_references(temp.path(), "a.py");
        assert_eq!(context.get("a.py").unwrap().bytes, 4);
    }

    #[test]
    fn test_reload_replaces_wholesale() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("a.py");
        std::fs::write(&path, "old").unwrap();

        let mut context = load_references(temp.path(), "a.py");
        std::fs::write(&path, "new content").unwrap();
        reload_file(&mut context, temp.path(), "a.py");

        let entry = context.get("a.py").unwrap();
        assert_eq!(entry.content, "new content");
        assert_eq!(entry.bytes, 11);
    }

    #[test]
    fn test_context_insert_replaces_by_name() {
        let mut context = FileContext::new();
        context.insert("a.py", FileEntry::new("one".into()));
        context.insert("b.py", FileEntry::new("two".into()));
        context.insert("a.py", FileEntry::new("three".into()));

        assert_eq!(context.len(), 2);
        assert_eq!(context.get("a.py").unwrap().content, "three");
        // Order of first resolution is preserved
        let names: Vec<_> = context.names().collect();
        assert_eq!(names, vec!["a.py", "b.py"]);
    }
}
