//! `spec.md` §3: `DraftStore`, the raw-text side of document state. A draft
//! holds exactly what the client has sent for one open document; `TuStore`
//! holds what the server has derived from the most recently applied draft.
//! Keeping them separate means an incremental edit only needs to touch a
//! `Rope`, not re-run the whole parse pipeline inline with the edit itself.

use nix_position::LineIndex;
use ropey::Rope;
use rustc_hash::FxHashMap;

/// One open document's text, as a rope so incremental edits don't require
/// rewriting the whole buffer.
#[derive(Debug, Clone)]
pub struct Draft {
    pub version: i32,
    pub contents: Rope,
}

impl Draft {
    pub fn new(version: i32, contents: impl Into<String>) -> Self {
        Self { version, contents: Rope::from_str(&contents.into()) }
    }

    pub fn text(&self) -> String {
        self.contents.to_string()
    }

    /// Applies one LSP `TextDocumentContentChangeEvent`-shaped edit: replace
    /// `[start, end)` (UTF-16 line/character positions) with `text`. A
    /// `range` of `None` means a full-document replace.
    pub fn apply_change(&mut self, range: Option<((u32, u32), (u32, u32))>, text: &str, version: i32) {
        match range {
            None => {
                self.contents = Rope::from_str(text);
            }
            Some(((start_line, start_char), (end_line, end_char))) => {
                let index = LineIndex::from_rope(&self.contents);
                let start = index.position_to_offset_rope(&self.contents, start_line, start_char);
                let end = index.position_to_offset_rope(&self.contents, end_line, end_char);
                let start_char_idx = self.contents.byte_to_char(start);
                let end_char_idx = self.contents.byte_to_char(end);
                self.contents.remove(start_char_idx..end_char_idx);
                self.contents.insert(start_char_idx, text);
            }
        }
        self.version = version;
    }
}

/// `map<path, {version, contents}>` (`spec.md` §3). Single writer (the I/O
/// thread performing `didOpen`/`didChange`/`didClose`), so this has no
/// internal synchronization of its own — the controller owns one behind
/// whatever lock also guards its `TuStore`, matching §5's "DraftStore and
/// the TU map are guarded by a single lock".
#[derive(Debug, Clone, Default)]
pub struct DraftStore {
    drafts: FxHashMap<String, Draft>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, uri: String, version: i32, text: String) {
        self.drafts.insert(uri, Draft::new(version, text));
    }

    pub fn close(&mut self, uri: &str) -> Option<Draft> {
        self.drafts.remove(uri)
    }

    pub fn get(&self, uri: &str) -> Option<&Draft> {
        self.drafts.get(uri)
    }

    pub fn get_mut(&mut self, uri: &str) -> Option<&mut Draft> {
        self.drafts.get_mut(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_replace_discards_old_text() {
        let mut d = Draft::new(1, "old");
        d.apply_change(None, "new", 2);
        assert_eq!(d.text(), "new");
        assert_eq!(d.version, 2);
    }

    #[test]
    fn incremental_edit_replaces_only_the_given_range() {
        let mut d = Draft::new(1, "let a = 1; in a");
        // Replace "1" (the literal) with "2": line 0, chars 8..9.
        d.apply_change(Some(((0, 8), (0, 9))), "2", 2);
        assert_eq!(d.text(), "let a = 2; in a");
    }

    #[test]
    fn store_roundtrips_open_and_close() {
        let mut store = DraftStore::new();
        store.open("file:///a.nix".into(), 1, "1".into());
        assert!(store.get("file:///a.nix").is_some());
        store.close("file:///a.nix");
        assert!(store.get("file:///a.nix").is_none());
    }
}
