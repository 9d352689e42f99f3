//! core-text: the line-buffer collaborator surface the control core edits
//! through. Storage is a plain line vector; the core only relies on the
//! operations exposed here, so a richer backend can replace this without
//! touching dispatch.

use std::path::PathBuf;

/// A `(line, column)` position; columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    pub const fn origin() -> Self {
        Self { line: 0, col: 0 }
    }
}

/// A cursor: a position plus an optional mark anchoring a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub pos: Position,
    pub mark: Option<Position>,
}

impl Cursor {
    pub const fn at(pos: Position) -> Self {
        Self { pos, mark: None }
    }
}

#[derive(Debug, Clone)]
pub struct Buffer {
    pub name: String,
    pub path: Option<PathBuf>,
    lines: Vec<String>,
    dirty: bool,
}

impl Buffer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: None,
            lines: vec![String::new()],
            dirty: false,
        }
    }

    pub fn from_str(name: impl Into<String>, text: &str) -> Self {
        let mut buf = Self::new(name);
        if !text.is_empty() {
            buf.lines = text.split('\n').map(str::to_string).collect();
        }
        buf
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line_len(&self, index: usize) -> usize {
        self.lines
            .get(index)
            .map(|l| l.chars().count())
            .unwrap_or(0)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn set_text(&mut self, text: &str) {
        self.lines = if text.is_empty() {
            vec![String::new()]
        } else {
            text.split('\n').map(str::to_string).collect()
        };
        self.dirty = true;
    }

    pub fn clear(&mut self) {
        self.lines = vec![String::new()];
        self.dirty = true;
    }

    /// Clamp a position to addressable text.
    pub fn clamp(&self, pos: Position) -> Position {
        let line = pos.line.min(self.line_count().saturating_sub(1));
        let col = pos.col.min(self.line_len(line));
        Position::new(line, col)
    }

    fn byte_offset(line: &str, col: usize) -> usize {
        line.char_indices()
            .nth(col)
            .map(|(i, _)| i)
            .unwrap_or(line.len())
    }

    /// Insert text at `pos`, splitting on embedded newlines. Returns the
    /// position immediately after the inserted text.
    pub fn insert(&mut self, pos: Position, text: &str) -> Position {
        let pos = self.clamp(pos);
        let mut cur = pos;
        for (i, seg) in text.split('\n').enumerate() {
            if i > 0 {
                cur = self.split_line(cur);
            }
            if !seg.is_empty() {
                let line = &mut self.lines[cur.line];
                let at = Self::byte_offset(line, cur.col);
                line.insert_str(at, seg);
                cur.col += seg.chars().count();
            }
        }
        self.dirty = true;
        cur
    }

    /// Break the line at `pos`, moving the tail onto a new following line.
    pub fn split_line(&mut self, pos: Position) -> Position {
        let pos = self.clamp(pos);
        let line = &mut self.lines[pos.line];
        let at = Self::byte_offset(line, pos.col);
        let tail = line.split_off(at);
        self.lines.insert(pos.line + 1, tail);
        self.dirty = true;
        Position::new(pos.line + 1, 0)
    }

    /// Delete the character before `pos`, joining lines at column zero.
    /// Returns the resulting position.
    pub fn delete_before(&mut self, pos: Position) -> Position {
        let pos = self.clamp(pos);
        if pos.col > 0 {
            let line = &mut self.lines[pos.line];
            let at = Self::byte_offset(line, pos.col - 1);
            line.remove(at);
            self.dirty = true;
            Position::new(pos.line, pos.col - 1)
        } else if pos.line > 0 {
            let tail = self.lines.remove(pos.line);
            let prev = &mut self.lines[pos.line - 1];
            let col = prev.chars().count();
            prev.push_str(&tail);
            self.dirty = true;
            Position::new(pos.line - 1, col)
        } else {
            pos
        }
    }

    /// Delete the character at `pos`, joining with the next line at EOL.
    pub fn delete_at(&mut self, pos: Position) {
        let pos = self.clamp(pos);
        if pos.col < self.line_len(pos.line) {
            let line = &mut self.lines[pos.line];
            let at = Self::byte_offset(line, pos.col);
            line.remove(at);
            self.dirty = true;
        } else if pos.line + 1 < self.line_count() {
            let tail = self.lines.remove(pos.line + 1);
            self.lines[pos.line].push_str(&tail);
            self.dirty = true;
        }
    }

    /// Append text at the end of the buffer (async process output lands here).
    pub fn append(&mut self, text: &str) {
        let last = self.line_count().saturating_sub(1);
        let end = Position::new(last, self.line_len(last));
        self.insert(end, text);
    }

    /// The word under or immediately before `pos` (command `copy-by word`).
    pub fn word_at(&self, pos: Position) -> Option<String> {
        let pos = self.clamp(pos);
        let chars: Vec<char> = self.lines[pos.line].chars().collect();
        if chars.is_empty() {
            return None;
        }
        let mut start = pos.col.min(chars.len());
        if start == chars.len() || (start > 0 && !is_word(chars[start])) {
            start -= 1;
        }
        if !is_word(*chars.get(start)?) {
            return None;
        }
        while start > 0 && is_word(chars[start - 1]) {
            start -= 1;
        }
        let mut end = start;
        while end < chars.len() && is_word(chars[end]) {
            end += 1;
        }
        Some(chars[start..end].iter().collect())
    }
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn insert_plain_and_multiline() {
        let mut buf = Buffer::new("t");
        let p = buf.insert(Position::origin(), "hello");
        assert_eq!(p, Position::new(0, 5));
        let p = buf.insert(p, " wor\nld");
        assert_eq!(p, Position::new(1, 2));
        assert_eq!(buf.text(), "hello wor\nld");
        assert!(buf.is_dirty());
    }

    #[test]
    fn delete_before_joins_lines() {
        let mut buf = Buffer::from_str("t", "ab\ncd");
        let p = buf.delete_before(Position::new(1, 0));
        assert_eq!(p, Position::new(0, 2));
        assert_eq!(buf.text(), "abcd");
        // At origin it is a no-op.
        let p = buf.delete_before(Position::origin());
        assert_eq!(p, Position::origin());
    }

    #[test]
    fn delete_at_joins_at_eol() {
        let mut buf = Buffer::from_str("t", "ab\ncd");
        buf.delete_at(Position::new(0, 2));
        assert_eq!(buf.text(), "abcd");
        buf.delete_at(Position::new(0, 0));
        assert_eq!(buf.text(), "bcd");
    }

    #[test]
    fn clamp_bounds_positions() {
        let buf = Buffer::from_str("t", "ab\nc");
        assert_eq!(buf.clamp(Position::new(9, 9)), Position::new(1, 1));
        assert_eq!(buf.clamp(Position::new(0, 9)), Position::new(0, 2));
    }

    #[test]
    fn word_extraction() {
        let buf = Buffer::from_str("t", "foo bar_baz qux");
        assert_eq!(buf.word_at(Position::new(0, 1)).as_deref(), Some("foo"));
        assert_eq!(buf.word_at(Position::new(0, 6)).as_deref(), Some("bar_baz"));
        // After the last char of a word, the word before is used.
        assert_eq!(buf.word_at(Position::new(0, 3)).as_deref(), Some("foo"));
    }

    #[test]
    fn append_lands_at_end() {
        let mut buf = Buffer::from_str("t", "one");
        buf.append("\ntwo");
        assert_eq!(buf.text(), "one\ntwo");
    }
}
