//! A single textual edit: `{oldRange, newText}`.
//!
//! An edit is a pure removal iff `new_text` is empty and `old_range` is
//! non-empty, a pure insertion iff `old_range` is empty (`start == end`).

use nix_position::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub old_range: Range,
    pub new_text: String,
}

impl TextEdit {
    pub fn new(old_range: Range, new_text: impl Into<String>) -> Self {
        Self { old_range, new_text: new_text.into() }
    }

    pub fn insertion(at: nix_position::Cursor, text: impl Into<String>) -> Self {
        Self { old_range: Range::empty(at), new_text: text.into() }
    }

    pub fn removal(range: Range) -> Self {
        Self { old_range: range, new_text: String::new() }
    }

    pub fn is_pure_removal(&self) -> bool {
        self.new_text.is_empty() && !self.old_range.is_empty()
    }

    pub fn is_pure_insertion(&self) -> bool {
        self.old_range.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix_position::Cursor;

    #[test]
    fn insertion_has_empty_old_range() {
        let e = TextEdit::insertion(Cursor::new(0, 5, 5), "}");
        assert!(e.is_pure_insertion());
        assert!(!e.is_pure_removal());
    }

    #[test]
    fn removal_has_empty_new_text() {
        let range = Range::new(Cursor::new(0, 0, 0), Cursor::new(0, 1, 1));
        let e = TextEdit::removal(range);
        assert!(e.is_pure_removal());
        assert!(!e.is_pure_insertion());
    }
}
