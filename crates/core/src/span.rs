use std::ops::Range;

/// Zero-based line/column pair. Columns count UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Byte range into the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Inclusive on both ends so a cursor resting right after a token still
    /// touches it.
    pub fn touches(&self, offset: usize) -> bool {
        self.start <= offset && offset <= self.end
    }
}

/// A byte span together with its resolved positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextRange {
    pub span: Span,
    pub start: Position,
    pub end: Position,
}

impl TextRange {
    pub fn new(span: Span, start: Position, end: Position) -> Self {
        Self { span, start, end }
    }

    pub fn cover(first: TextRange, last: TextRange) -> Self {
        Self {
            span: Span::new(first.span.start, last.span.end),
            start: first.start,
            end: last.end,
        }
    }

    pub fn empty_at(span_offset: usize, position: Position) -> Self {
        Self {
            span: Span::new(span_offset, span_offset),
            start: position,
            end: position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        let bytes = text.as_bytes();
        let mut offset = 0;
        while offset < bytes.len() {
            match bytes[offset] {
                b'\n' => line_starts.push(offset + 1),
                b'\r' if bytes.get(offset + 1) != Some(&b'\n') => line_starts.push(offset + 1),
                _ => {}
            }
            offset += 1;
        }
        Self { line_starts }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    pub fn to_position(&self, text: &str, offset: usize) -> Position {
        let offset = offset.min(text.len());
        let line_index = self
            .line_starts
            .partition_point(|line_start| *line_start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts[line_index];
        let column = text
            .get(line_start..offset)
            .map(|slice| slice.encode_utf16().count())
            .unwrap_or(0);
        Position::new(line_index as u32, column as u32)
    }

    pub fn to_offset(&self, text: &str, position: Position) -> usize {
        let line = position.line as usize;
        if line >= self.line_starts.len() {
            return text.len();
        }

        let line_start = self.line_starts[line];
        let line_end = self
            .line_starts
            .get(line + 1)
            .copied()
            .unwrap_or(text.len());
        let line_text = &text[line_start..line_end];
        let target = position.column as usize;

        let mut column = 0usize;
        for (offset, ch) in line_text.char_indices() {
            if column >= target || ch == '\n' || ch == '\r' {
                return line_start + offset;
            }
            column += ch.len_utf16();
        }
        line_end
    }

    pub fn range(&self, text: &str, span: Span) -> TextRange {
        TextRange::new(
            span,
            self.to_position(text, span.start),
            self.to_position(text, span.end),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_line_and_column() {
        let text = "first\nsecond\nthird";
        let index = LineIndex::new(text);
        assert_eq!(index.to_position(text, 0), Position::new(0, 0));
        assert_eq!(index.to_position(text, 7), Position::new(1, 1));
        assert_eq!(index.to_position(text, 14), Position::new(2, 1));
    }

    #[test]
    fn carriage_returns_end_lines() {
        let text = "a\r\nb\rc";
        let index = LineIndex::new(text);
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.to_position(text, 3), Position::new(1, 0));
        assert_eq!(index.to_position(text, 5), Position::new(2, 0));
    }

    #[test]
    fn round_trips_utf16_columns() {
        let text = "ab\nz🙂x\n";
        let index = LineIndex::new(text);
        let offset = text.find('x').expect("x offset");
        let position = index.to_position(text, offset);
        assert_eq!(position, Position::new(1, 3));
        assert_eq!(index.to_offset(text, position), offset);
    }

    #[test]
    fn offsets_past_line_end_clamp_to_line_break() {
        let text = "set a 1\nend";
        let index = LineIndex::new(text);
        assert_eq!(index.to_offset(text, Position::new(0, 40)), 7);
        assert_eq!(index.to_offset(text, Position::new(9, 0)), text.len());
    }
}
