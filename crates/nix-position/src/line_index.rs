//! A cached line-start table for O(log n) offset <-> (line, column) lookups
//! over both plain strings and `ropey::Rope` buffers (the TU store keeps
//! documents as ropes so incremental edits don't require a full rewrite).

use ropey::Rope;

#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let bytes = text.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\n' {
                line_starts.push(i + 1);
            } else if bytes[i] == b'\r' {
                if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                    line_starts.push(i + 2);
                    i += 1;
                } else {
                    line_starts.push(i + 1);
                }
            }
            i += 1;
        }
        Self { line_starts }
    }

    pub fn from_rope(rope: &Rope) -> Self {
        let mut line_starts = vec![0];
        for li in 1..rope.len_lines() {
            line_starts.push(rope.line_to_byte(li));
        }
        Self { line_starts }
    }

    fn line_for_offset(&self, offset: usize) -> usize {
        self.line_starts.binary_search(&offset).unwrap_or_else(|i| i.saturating_sub(1))
    }

    pub fn offset_to_position(&self, text: &str, offset: usize) -> (u32, u32) {
        let offset = offset.min(text.len());
        let line = self.line_for_offset(offset);
        let start = self.line_starts[line];
        let col = text[start..offset].chars().map(|c| c.len_utf16()).sum::<usize>() as u32;
        (line as u32, col)
    }

    pub fn position_to_offset(&self, text: &str, line: u32, character: u32) -> usize {
        let line = line as usize;
        if line >= self.line_starts.len() {
            return text.len();
        }
        let start = self.line_starts[line];
        let end = self.line_starts.get(line + 1).copied().unwrap_or(text.len());
        let line_text = &text[start..end];
        let mut utf16_count = 0u32;
        let mut byte_offset = 0usize;
        for ch in line_text.chars() {
            if utf16_count >= character {
                break;
            }
            utf16_count += ch.len_utf16() as u32;
            byte_offset += ch.len_utf8();
        }
        start + byte_offset.min(line_text.len())
    }

    pub fn offset_to_position_rope(&self, rope: &Rope, offset: usize) -> (u32, u32) {
        let offset = offset.min(rope.len_bytes());
        let line = self.line_for_offset(offset);
        let start = self.line_starts[line];
        let col = rope.byte_slice(start..offset).chars().map(|c| c.len_utf16()).sum::<usize>() as u32;
        (line as u32, col)
    }

    pub fn position_to_offset_rope(&self, rope: &Rope, line: u32, character: u32) -> usize {
        let line = line as usize;
        if line >= self.line_starts.len() {
            return rope.len_bytes();
        }
        let start = self.line_starts[line];
        let end = self.line_starts.get(line + 1).copied().unwrap_or(rope.len_bytes());
        let slice = rope.byte_slice(start..end);
        let mut utf16_count = 0u32;
        let mut byte_offset = 0usize;
        for ch in slice.chars() {
            if utf16_count >= character {
                break;
            }
            utf16_count += ch.len_utf16() as u32;
            byte_offset += ch.len_utf8();
        }
        start + byte_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_and_position_round_trip() {
        let text = "a = 1;\nb = 2;\n";
        let idx = LineIndex::new(text);
        let off = text.find("b = 2").unwrap();
        let (line, col) = idx.offset_to_position(text, off);
        assert_eq!(line, 1);
        assert_eq!(idx.position_to_offset(text, line, col), off);
    }

    #[test]
    fn rope_matches_str_index() {
        let text = "let\n  x = 1;\nin x\n";
        let rope = Rope::from_str(text);
        let idx = LineIndex::from_rope(&rope);
        let off = text.find('x').unwrap();
        assert_eq!(idx.offset_to_position_rope(&rope, off), idx.offset_to_position(text, off));
    }
}
