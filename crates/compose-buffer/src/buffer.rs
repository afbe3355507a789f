use std::fmt;
use std::mem;
use std::ops::Range;

use ropey::{LineType, Rope};
use sum_tree::Bias;

use crate::paragraph::{ListFormat, ParagraphFormat, ParagraphStyle};
use crate::rope_ext::{RopeExt, TextPoint};
use crate::style::{InlineStyle, StyleRuns};

/// One applied mutation, in byte terms. `removed` and `added` are the byte
/// counts taken out of and spliced into the buffer at `at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferEdit {
    pub at: usize,
    pub removed: usize,
    pub added: usize,
}

impl BufferEdit {
    pub fn inserted_range(&self) -> Range<usize> {
        self.at..self.at + self.added
    }
}

/// Styled, multi-line editable text. Holds the rope, the per-character style
/// runs, one paragraph format per line and the local selection.
///
/// Every accessor clamps rather than panics. Offsets past the end snap to the
/// end, rows past the last line act on the last line.
#[derive(Debug, Clone)]
pub struct RichBuffer {
    text: Rope,
    runs: StyleRuns,
    paragraphs: Vec<ParagraphFormat>,
    selection: Range<usize>,
    typing_style: InlineStyle,
}

impl Default for RichBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RichBuffer {
    pub fn new() -> Self {
        Self {
            text: Rope::new(),
            runs: StyleRuns::new(0),
            paragraphs: vec![ParagraphFormat::default()],
            selection: 0..0,
            typing_style: InlineStyle::default(),
        }
    }

    pub fn from_plain_text(text: &str) -> Self {
        let normalized = normalize_newlines(text);
        let rope = Rope::from(normalized.as_str());
        let line_count = rope.lines_len();
        Self {
            runs: StyleRuns::new(rope.len()),
            paragraphs: vec![ParagraphFormat::default(); line_count],
            selection: rope.len()..rope.len(),
            typing_style: InlineStyle::default(),
            text: rope,
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.len() == 0
    }

    pub fn char_at(&self, offset: usize) -> Option<char> {
        self.text.char_at(offset)
    }

    pub fn is_line_start(&self, offset: usize) -> bool {
        let offset = self.clip_offset(offset, Bias::Left);
        self.text.offset_to_point(offset).column == 0
    }

    pub fn slice_to_string(&self, range: Range<usize>) -> String {
        let start = self.clip_offset(range.start, Bias::Left);
        let end = self.clip_offset(range.end.max(start), Bias::Right);
        self.text.slice(start..end).to_string()
    }

    pub fn clip_offset(&self, offset: usize, bias: Bias) -> usize {
        self.text.clip_offset(offset, bias)
    }

    // Selection

    pub fn cursor(&self) -> usize {
        self.selection.end
    }

    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    pub fn set_cursor(&mut self, offset: usize) {
        let offset = self.clip_offset(offset, Bias::Left);
        self.selection = offset..offset;
    }

    pub fn select(&mut self, range: Range<usize>) {
        let start = self.clip_offset(range.start, Bias::Left);
        let end = self.clip_offset(range.end.max(start), Bias::Right);
        self.selection = start..end;
    }

    pub fn cursor_point(&self) -> TextPoint {
        self.text.offset_to_point(self.cursor())
    }

    pub fn offset_for_point(&self, point: TextPoint) -> usize {
        self.text.point_to_offset(point)
    }

    // Styles

    /// Style governing the character just before `offset`, matching what a
    /// cursor placed there visually sits inside of.
    pub fn style_at(&self, offset: usize) -> InlineStyle {
        if self.is_empty() {
            return InlineStyle::default();
        }
        let offset = self.clip_offset(offset, Bias::Left);
        self.runs.style_at(offset.saturating_sub(1).min(self.len() - 1))
    }

    pub fn typing_style(&self) -> InlineStyle {
        self.typing_style
    }

    pub fn set_typing_style(&mut self, style: InlineStyle) {
        self.typing_style = style;
    }

    pub fn update_typing_style(&mut self, update: impl FnOnce(&mut InlineStyle)) {
        update(&mut self.typing_style);
    }

    /// Pull the typing style from the text surrounding the cursor. Called
    /// after cursor motion that is not part of typing.
    pub fn sync_typing_style(&mut self) {
        self.typing_style = self.style_at(self.cursor());
    }

    pub fn update_styles(&mut self, range: Range<usize>, update: impl FnMut(&mut InlineStyle)) {
        let start = self.clip_offset(range.start, Bias::Left);
        let end = self.clip_offset(range.end.max(start), Bias::Right);
        self.runs.update_range(start..end, update);
    }

    pub fn style_runs_in_range(
        &self,
        range: Range<usize>,
    ) -> impl Iterator<Item = (Range<usize>, &InlineStyle)> {
        self.runs.iter_runs_in_range(range)
    }

    // Paragraphs

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    pub fn paragraph_format(&self, row: usize) -> ParagraphFormat {
        let row = row.min(self.paragraphs.len().saturating_sub(1));
        self.paragraphs.get(row).copied().unwrap_or_default()
    }

    pub fn set_paragraph_style(&mut self, row: usize, style: ParagraphStyle) {
        let row = row.min(self.paragraphs.len().saturating_sub(1));
        if let Some(format) = self.paragraphs.get_mut(row) {
            format.style = style;
        }
    }

    pub fn set_list(&mut self, row: usize, list: Option<ListFormat>) {
        let row = row.min(self.paragraphs.len().saturating_sub(1));
        if let Some(format) = self.paragraphs.get_mut(row) {
            format.list = list;
        }
    }

    pub fn row_at(&self, offset: usize) -> usize {
        let offset = self.clip_offset(offset, Bias::Left);
        self.text.byte_to_line_idx(offset, LineType::LF)
    }

    pub fn line_range(&self, row: usize) -> Range<usize> {
        self.text.line_start_offset(row)..self.text.line_end_offset(row)
    }

    pub fn line_text(&self, row: usize) -> String {
        self.text.slice_line(row).to_string()
    }

    pub fn has_rich_formatting(&self) -> bool {
        self.runs.any_non_default() || self.paragraphs.iter().any(|p| !p.is_default())
    }

    // Edits

    pub fn insert(&mut self, at: usize, text: &str) -> BufferEdit {
        let at = self.clip_offset(at, Bias::Left);
        let text = normalize_newlines(text);
        if text.is_empty() {
            self.set_cursor(at);
            return BufferEdit {
                at,
                removed: 0,
                added: 0,
            };
        }

        let mut content = self.text.to_string();
        content.insert_str(at, &text);
        self.text = Rope::from(content.as_str());

        self.runs.insert_range(at, text.len(), self.typing_style);

        let row = self.text.byte_to_line_idx(at, LineType::LF);
        let newlines = text.matches('\n').count();
        let successor = self.paragraph_format(row).split_successor();
        for ix in 0..newlines {
            self.paragraphs.insert(row + 1 + ix, successor);
        }

        self.set_cursor(at + text.len());
        BufferEdit {
            at,
            removed: 0,
            added: text.len(),
        }
    }

    pub fn insert_at_cursor(&mut self, text: &str) -> BufferEdit {
        let selection = self.selection();
        if selection.start < selection.end {
            self.replace(selection, text)
        } else {
            self.insert(selection.end, text)
        }
    }

    pub fn delete(&mut self, range: Range<usize>) -> BufferEdit {
        let start = self.clip_offset(range.start, Bias::Left);
        let end = self.clip_offset(range.end.max(start), Bias::Right);
        if start == end {
            self.set_cursor(start);
            return BufferEdit {
                at: start,
                removed: 0,
                added: 0,
            };
        }

        let removed_newlines = self.text.slice(start..end).to_string().matches('\n').count();
        let row = self.text.byte_to_line_idx(start, LineType::LF);

        let mut content = self.text.to_string();
        content.replace_range(start..end, "");
        self.text = Rope::from(content.as_str());

        self.runs.delete_range(start..end);
        for _ in 0..removed_newlines {
            if row + 1 < self.paragraphs.len() {
                self.paragraphs.remove(row + 1);
            }
        }

        self.set_cursor(start);
        BufferEdit {
            at: start,
            removed: end - start,
            added: 0,
        }
    }

    pub fn replace(&mut self, range: Range<usize>, text: &str) -> BufferEdit {
        let deleted = self.delete(range);
        let inserted = self.insert(deleted.at, text);
        BufferEdit {
            at: deleted.at,
            removed: deleted.removed,
            added: inserted.added,
        }
    }

    /// Split at `at`, keeping the head in place and returning the tail.
    /// The tail's first line keeps the format of the line it was cut from.
    pub fn split_off(&mut self, at: usize) -> RichBuffer {
        let at = self.clip_offset(at, Bias::Left);
        let row = self.text.byte_to_line_idx(at, LineType::LF);

        let content = self.text.to_string();
        let (head, tail) = content.split_at(at);

        let tail_runs = self.runs.split_off(at);
        let tail_paragraphs = self.paragraphs[row..].to_vec();

        self.text = Rope::from(head);
        self.paragraphs.truncate(row + 1);
        self.set_cursor(self.selection.end.min(at));

        let mut split = RichBuffer {
            text: Rope::from(tail),
            runs: tail_runs,
            paragraphs: tail_paragraphs,
            selection: 0..0,
            typing_style: self.typing_style,
        };
        if split.paragraphs.is_empty() {
            split.paragraphs.push(ParagraphFormat::default());
        }
        split
    }

    /// Join `other` onto the end. The joined row keeps whichever of the two
    /// meeting formats carries information.
    pub fn append(&mut self, other: RichBuffer) {
        let mut content = self.text.to_string();
        content.push_str(&other.text.to_string());
        self.text = Rope::from(content.as_str());

        self.runs.append(other.runs);

        let mut incoming = other.paragraphs.into_iter();
        if let Some(first) = incoming.next() {
            if let Some(last) = self.paragraphs.last_mut() {
                if last.is_default() && !first.is_default() {
                    *last = first;
                }
            }
        }
        self.paragraphs.extend(incoming);
        debug_assert_eq!(self.paragraphs.len(), self.text.lines_len());
    }

    /// Remove and return the first line as its own buffer. On a single-line
    /// buffer this drains the whole buffer.
    pub fn detach_first_paragraph(&mut self) -> RichBuffer {
        if self.text.lines_len() <= 1 {
            return mem::take(self);
        }

        let end = self.text.line_end_offset(0);
        let mut rest = self.split_off(end + 1);
        self.delete(end..self.len());
        mem::swap(self, &mut rest);
        rest
    }
}

impl fmt::Display for RichBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

fn normalize_newlines(text: &str) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paragraph::ListKind;

    #[test]
    fn insert_moves_cursor_and_tracks_styles() {
        let mut buffer = RichBuffer::new();
        buffer.insert(0, "hello");
        assert_eq!(buffer.cursor(), 5);

        buffer.update_typing_style(|s| s.bold = true);
        buffer.insert_at_cursor(" world");
        assert_eq!(buffer.to_string(), "hello world");
        assert!(buffer.style_at(8).bold);
        assert!(!buffer.style_at(3).bold);
    }

    #[test]
    fn newline_insert_grows_paragraphs() {
        let mut buffer = RichBuffer::from_plain_text("one");
        buffer.set_paragraph_style(0, ParagraphStyle::Heading { level: 1 });
        buffer.insert(3, "\ntwo");

        assert_eq!(buffer.paragraph_count(), 2);
        assert_eq!(
            buffer.paragraph_format(0).style,
            ParagraphStyle::Heading { level: 1 }
        );
        assert_eq!(buffer.paragraph_format(1), ParagraphFormat::default());
    }

    #[test]
    fn list_format_survives_line_split() {
        let mut buffer = RichBuffer::from_plain_text("item");
        buffer.set_list(0, Some(ListFormat { kind: ListKind::Unordered, indent: 0 }));
        buffer.insert(4, "\n");

        assert_eq!(buffer.paragraph_format(1).list.map(|l| l.kind), Some(ListKind::Unordered));
    }

    #[test]
    fn delete_collapses_paragraphs() {
        let mut buffer = RichBuffer::from_plain_text("one\ntwo\nthree");
        assert_eq!(buffer.paragraph_count(), 3);

        buffer.delete(3..8);
        assert_eq!(buffer.to_string(), "onewo");
        assert_eq!(buffer.paragraph_count(), 1);
        assert_eq!(buffer.cursor(), 3);
    }

    #[test]
    fn split_off_and_append_round_trip() {
        let mut buffer = RichBuffer::from_plain_text("alpha\nbeta");
        buffer.update_styles(6..10, |s| s.italic = true);

        let tail = buffer.split_off(6);
        assert_eq!(buffer.to_string(), "alpha\n");
        assert_eq!(tail.to_string(), "beta");
        assert!(tail.style_at(2).italic);

        buffer.append(tail);
        assert_eq!(buffer.to_string(), "alpha\nbeta");
        assert_eq!(buffer.paragraph_count(), 2);
        assert!(buffer.style_at(8).italic);
    }

    #[test]
    fn detach_first_paragraph_splits_on_first_newline() {
        let mut buffer = RichBuffer::from_plain_text("head\nrest\nmore");
        let first = buffer.detach_first_paragraph();

        assert_eq!(first.to_string(), "head");
        assert_eq!(buffer.to_string(), "rest\nmore");
        assert_eq!(buffer.paragraph_count(), 2);
    }

    #[test]
    fn detach_first_paragraph_drains_single_line() {
        let mut buffer = RichBuffer::from_plain_text("only");
        let first = buffer.detach_first_paragraph();

        assert_eq!(first.to_string(), "only");
        assert!(buffer.is_empty());
    }

    #[test]
    fn rich_formatting_detection() {
        let mut buffer = RichBuffer::from_plain_text("plain");
        assert!(!buffer.has_rich_formatting());

        buffer.update_styles(0..2, |s| s.bold = true);
        assert!(buffer.has_rich_formatting());
    }
}
