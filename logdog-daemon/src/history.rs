//! Sliding window of recent watcher output lines.

use std::collections::VecDeque;

/// Separator placed between lines of an event's context.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Recent lines of one watcher's output plus a cursor to the line being
/// evaluated.
///
/// Lines after the cursor were read ahead as trailing context for an earlier
/// match; they are still evaluated in turn. The window grows until the cursor
/// reaches `max_before`, after which every [`advance`](Self::advance) drops
/// the oldest line, so at most `max_before` lines are retained between
/// evaluations.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    lines: VecDeque<String>,
    cursor: usize,
    max_before: usize,
}

impl HistoryWindow {
    pub fn new(max_before: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(max_before + 1),
            cursor: 0,
            max_before,
        }
    }

    /// `true` when every buffered line has been evaluated.
    pub fn needs_line(&self) -> bool {
        self.cursor >= self.lines.len()
    }

    pub fn push(&mut self, line: String) {
        self.lines.push_back(line);
    }

    /// The line under evaluation.
    pub fn current(&self) -> Option<&str> {
        self.lines.get(self.cursor).map(String::as_str)
    }

    /// Number of lines buffered after the current one.
    pub fn trailing(&self) -> usize {
        self.lines.len().saturating_sub(self.cursor + 1)
    }

    /// Up to `before` lines preceding the current line, the current line, and
    /// up to `after` buffered lines following it, joined by
    /// [`CONTEXT_SEPARATOR`].
    pub fn context(&self, before: usize, after: usize) -> String {
        let start = self.cursor.saturating_sub(before);
        let end = (self.cursor + after + 1).min(self.lines.len());
        self.lines
            .range(start..end.max(start))
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR)
    }

    /// Move past the current line.
    pub fn advance(&mut self) {
        if self.cursor >= self.max_before {
            self.lines.pop_front();
        } else {
            self.cursor += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
