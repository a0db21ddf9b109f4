//! # History Ledger
//!
//! Linear undo over serialized document snapshots.
//!
//! ## Design
//!
//! - Every entry is the full serialized document, never a live tree, so
//!   each undo step re-parses into an independent `Document`
//! - Pushing at cursor `i` discards everything after `i`, then appends
//! - Undo/redo only move the cursor; `peek_undo`/`peek_redo` read the
//!   neighbouring snapshot without moving it
//! - The oldest entries are dropped beyond `max_entries`
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut history = History::new(serialize(&doc));
//! history.push(serialize(&edited));
//!
//! if let Some(snapshot) = history.peek_undo() {
//!     doc = parse(snapshot)?;
//!     history.undo();
//! }
//! ```

/// One serialized document version
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub snapshot: String,

    /// Optional description of the edit that produced this version
    pub description: Option<String>,
}

/// Snapshot log with a cursor
#[derive(Debug, Clone)]
pub struct History {
    /// Versions, oldest first (never empty)
    entries: Vec<HistoryEntry>,

    /// Index of the live version
    cursor: usize,

    /// Maximum number of entries kept (0 = unlimited)
    max_entries: usize,
}

impl History {
    /// Start a history with the initial snapshot and the default limit (100)
    pub fn new(initial: impl Into<String>) -> Self {
        Self::with_max_entries(initial, 100)
    }

    /// Start a history with a custom entry limit
    pub fn with_max_entries(initial: impl Into<String>, max_entries: usize) -> Self {
        Self {
            entries: vec![HistoryEntry {
                snapshot: initial.into(),
                description: None,
            }],
            cursor: 0,
            max_entries,
        }
    }

    /// Record a new version after the cursor, discarding any redo branch
    pub fn push(&mut self, snapshot: impl Into<String>) {
        self.push_entry(HistoryEntry {
            snapshot: snapshot.into(),
            description: None,
        });
    }

    pub fn push_with_description(&mut self, snapshot: impl Into<String>, description: impl Into<String>) {
        self.push_entry(HistoryEntry {
            snapshot: snapshot.into(),
            description: Some(description.into()),
        });
    }

    fn push_entry(&mut self, entry: HistoryEntry) {
        self.entries.truncate(self.cursor + 1);
        self.entries.push(entry);
        self.cursor = self.entries.len() - 1;

        // Trim if exceeded max entries
        if self.max_entries > 0 && self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(..excess);
            self.cursor -= excess;
        }
    }

    /// Step back; returns the snapshot to re-parse, or `None` at the start
    pub fn undo(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(&self.entries[self.cursor].snapshot)
    }

    /// Step forward over an undone entry, if any survives
    pub fn redo(&mut self) -> Option<&str> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(&self.entries[self.cursor].snapshot)
    }

    /// Snapshot the next undo would restore
    pub fn peek_undo(&self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        Some(&self.entries[self.cursor - 1].snapshot)
    }

    /// Snapshot the next redo would restore
    pub fn peek_redo(&self) -> Option<&str> {
        self.entries.get(self.cursor + 1).map(|entry| entry.snapshot.as_str())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Snapshot at the cursor
    pub fn current(&self) -> &str {
        &self.entries[self.cursor].snapshot
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of stored versions (never zero)
    pub fn version_count(&self) -> usize {
        self.entries.len()
    }

    /// Description of the edit the next undo reverts
    pub fn undo_description(&self) -> Option<&str> {
        if !self.can_undo() {
            return None;
        }
        self.entries[self.cursor].description.as_deref()
    }

    /// Description of the edit the next redo reapplies
    pub fn redo_description(&self) -> Option<&str> {
        self.entries
            .get(self.cursor + 1)
            .and_then(|entry| entry.description.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_creation() {
        let history = History::new("<a/>");
        assert_eq!(history.version_count(), 1);
        assert_eq!(history.cursor(), 0);
        assert_eq!(history.current(), "<a/>");
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_at_start_is_noop() {
        let mut history = History::new("<a/>");
        assert_eq!(history.undo(), None);
        assert_eq!(history.cursor(), 0);
    }

    #[test]
    fn test_push_and_undo() {
        let mut history = History::new("v0");
        history.push("v1");
        history.push("v2");

        assert_eq!(history.cursor(), 2);
        assert_eq!(history.undo(), Some("v1"));
        assert_eq!(history.undo(), Some("v0"));
        assert_eq!(history.undo(), None);
        assert_eq!(history.current(), "v0");
    }

    #[test]
    fn test_push_truncates_branch() {
        let mut history = History::new("v0");
        history.push("v1");
        history.push("v2");
        history.undo();
        history.undo();

        history.push("w1");

        assert_eq!(history.version_count(), 2);
        assert_eq!(history.current(), "w1");
        assert!(!history.can_redo());
        assert_eq!(history.undo(), Some("v0"));
    }

    #[test]
    fn test_redo() {
        let mut history = History::new("v0");
        history.push("v1");
        history.undo();

        assert!(history.can_redo());
        assert_eq!(history.redo(), Some("v1"));
        assert_eq!(history.redo(), None);
    }

    #[test]
    fn test_descriptions() {
        let mut history = History::new("v0");
        history.push_with_description("v1", "Tag person");

        assert_eq!(history.undo_description(), Some("Tag person"));
        history.undo();
        assert_eq!(history.undo_description(), None);
        assert_eq!(history.redo_description(), Some("Tag person"));
    }

    #[test]
    fn test_max_entries_enforced() {
        let mut history = History::with_max_entries("v0", 2);
        for i in 1..=3 {
            history.push(format!("v{}", i));
        }

        assert_eq!(history.version_count(), 2);
        assert_eq!(history.current(), "v3");
        assert_eq!(history.undo(), Some("v2"));
        assert_eq!(history.undo(), None);
    }

    #[test]
    fn test_peek_leaves_cursor() {
        let mut history = History::new("v0");
        history.push("v1");
        history.push("v2");
        history.undo();

        assert_eq!(history.peek_undo(), Some("v0"));
        assert_eq!(history.peek_redo(), Some("v2"));
        assert_eq!(history.cursor(), 1);
        assert_eq!(history.current(), "v1");
    }

    #[test]
    fn test_peek_at_ends() {
        let mut history = History::new("v0");
        assert_eq!(history.peek_undo(), None);
        assert_eq!(history.peek_redo(), None);

        history.push("v1");
        assert_eq!(history.peek_undo(), Some("v0"));
        assert_eq!(history.peek_redo(), None);
    }
}
