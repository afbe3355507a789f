use compose_buffer::{BufferEdit, InlineStyle, ListFormat, ListKind, ParagraphStyle, RichBuffer};

use crate::block::BlockKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormatKind {
    TextSpan,
    ParagraphStyle,
    ListStyle,
    BlockType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarkdownFormat {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Heading(u8),
    UnorderedList,
    OrderedList,
    Quote,
    Code,
}

impl MarkdownFormat {
    fn kind(self) -> FormatKind {
        match self {
            MarkdownFormat::Bold
            | MarkdownFormat::Italic
            | MarkdownFormat::Underline
            | MarkdownFormat::Strikethrough => FormatKind::TextSpan,
            MarkdownFormat::Heading(_) => FormatKind::ParagraphStyle,
            MarkdownFormat::UnorderedList | MarkdownFormat::OrderedList => FormatKind::ListStyle,
            MarkdownFormat::Quote | MarkdownFormat::Code => FormatKind::BlockType,
        }
    }
}

struct FormatMatch {
    token: &'static str,
    closable: bool,
    must_start_line: bool,
    format: MarkdownFormat,
}

const FORMAT_MATCHES: &[FormatMatch] = &[
    FormatMatch {
        token: "**",
        closable: true,
        must_start_line: false,
        format: MarkdownFormat::Bold,
    },
    FormatMatch {
        token: "__",
        closable: true,
        must_start_line: false,
        format: MarkdownFormat::Underline,
    },
    FormatMatch {
        token: "*",
        closable: true,
        must_start_line: false,
        format: MarkdownFormat::Italic,
    },
    FormatMatch {
        token: "_",
        closable: true,
        must_start_line: false,
        format: MarkdownFormat::Italic,
    },
    FormatMatch {
        token: "~~",
        closable: true,
        must_start_line: false,
        format: MarkdownFormat::Strikethrough,
    },
    FormatMatch {
        token: "# ",
        closable: false,
        must_start_line: true,
        format: MarkdownFormat::Heading(1),
    },
    FormatMatch {
        token: "## ",
        closable: false,
        must_start_line: true,
        format: MarkdownFormat::Heading(2),
    },
    FormatMatch {
        token: "### ",
        closable: false,
        must_start_line: true,
        format: MarkdownFormat::Heading(3),
    },
    FormatMatch {
        token: "#### ",
        closable: false,
        must_start_line: true,
        format: MarkdownFormat::Heading(4),
    },
    FormatMatch {
        token: "##### ",
        closable: false,
        must_start_line: true,
        format: MarkdownFormat::Heading(5),
    },
    FormatMatch {
        token: "###### ",
        closable: false,
        must_start_line: true,
        format: MarkdownFormat::Heading(6),
    },
    FormatMatch {
        token: "- ",
        closable: false,
        must_start_line: true,
        format: MarkdownFormat::UnorderedList,
    },
    FormatMatch {
        token: "* ",
        closable: false,
        must_start_line: true,
        format: MarkdownFormat::UnorderedList,
    },
    FormatMatch {
        token: "1. ",
        closable: false,
        must_start_line: true,
        format: MarkdownFormat::OrderedList,
    },
    FormatMatch {
        token: "> ",
        closable: false,
        must_start_line: true,
        format: MarkdownFormat::Quote,
    },
    FormatMatch {
        token: "```",
        closable: false,
        must_start_line: true,
        format: MarkdownFormat::Code,
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyntaxState {
    /// Mid-word, no token can start here.
    None,
    /// A token may start at the next typed character.
    Pre,
    /// Some prefix of at least one token has been typed.
    Started,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SyntaxSpan {
    start: usize,
    end: usize,
}

impl SyntaxSpan {
    fn collapsed(at: usize) -> Self {
        Self { start: at, end: at }
    }
}

enum Outcome {
    Advanced,
    Completed,
    Escalate(BlockKind),
}

/// Incremental markdown token recognizer. Watches one buffer's edits, tracks
/// the candidate token under construction and rewrites the buffer when a
/// token completes. Never re-enters itself: its own corrective edits are not
/// fed back in.
#[derive(Debug)]
pub struct SyntaxRecognizer {
    state: SyntaxState,
    span: SyntaxSpan,
    /// Open span-format tokens awaiting their closer, with the offset their
    /// styled range starts at.
    stack: Vec<(MarkdownFormat, usize)>,
}

impl Default for SyntaxRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxRecognizer {
    pub fn new() -> Self {
        Self {
            state: SyntaxState::Pre,
            span: SyntaxSpan::collapsed(0),
            stack: Vec::new(),
        }
    }

    /// Point the recognizer at a buffer, typically after a focus change.
    /// Open spans do not survive the move.
    pub fn attach(&mut self, buffer: &RichBuffer) {
        self.stack.clear();
        self.span = SyntaxSpan::collapsed(buffer.cursor());
        self.state = self.derive_state(buffer, buffer.cursor());
    }

    /// Digest one applied edit. Returns the block kind to escalate into when
    /// the edit completed a block-type token.
    pub fn handle_edit(&mut self, buffer: &mut RichBuffer, edit: BufferEdit) -> Option<BlockKind> {
        if edit.removed > 0 {
            self.note_deletion(buffer, edit.at, edit.removed);
        }
        if edit.added == 0 {
            return None;
        }

        let inserted = buffer.slice_to_string(edit.inserted_range());
        let mut pos = edit.at;
        for ch in inserted.chars() {
            match self.handle_char(buffer, ch, pos) {
                Outcome::Escalate(kind) => return Some(kind),
                Outcome::Completed => pos = self.span.start,
                Outcome::Advanced => pos += ch.len_utf8(),
            }
        }
        None
    }

    fn handle_char(&mut self, buffer: &mut RichBuffer, ch: char, pos: usize) -> Outcome {
        let len = ch.len_utf8();
        for (_, open) in &mut self.stack {
            if *open > pos {
                *open += len;
            }
        }

        match self.state {
            SyntaxState::None => {
                self.span = SyntaxSpan::collapsed(pos + len);
                if is_separator(ch) {
                    self.state = SyntaxState::Pre;
                }
                Outcome::Advanced
            }
            SyntaxState::Pre => {
                if pos != self.span.start {
                    self.span = SyntaxSpan::collapsed(pos);
                }
                let mut candidate = [0u8; 4];
                let candidate = ch.encode_utf8(&mut candidate);
                let (partial, _full) = self.classify(buffer, candidate, pos);
                if partial {
                    self.state = SyntaxState::Started;
                    self.span = SyntaxSpan {
                        start: pos,
                        end: pos + len,
                    };
                } else {
                    // A bare one-character token never fires from here; it
                    // only completes as the tail of a started candidate.
                    self.span = SyntaxSpan::collapsed(pos + len);
                    if !is_separator(ch) && !self.has_active_format(buffer) {
                        self.state = SyntaxState::None;
                    }
                }
                Outcome::Advanced
            }
            SyntaxState::Started => {
                let candidate = buffer.slice_to_string(self.span.start..pos + len);
                let (partial, full) = self.classify(buffer, &candidate, self.span.start);
                if let Some(ix) = full {
                    if !partial {
                        self.span.end = pos + len;
                        return self.complete(buffer, ix);
                    }
                }
                if partial {
                    self.span.end = pos + len;
                } else {
                    self.state = SyntaxState::Pre;
                    self.span = SyntaxSpan::collapsed(pos + len);
                }
                Outcome::Advanced
            }
        }
    }

    /// Candidate classification against the token table. Returns whether any
    /// longer token still matches and the exact match if one exists.
    fn classify(
        &self,
        buffer: &RichBuffer,
        candidate: &str,
        candidate_start: usize,
    ) -> (bool, Option<usize>) {
        let mut partial = false;
        let mut full = None;
        for (ix, m) in FORMAT_MATCHES.iter().enumerate() {
            if m.must_start_line && !buffer.is_line_start(candidate_start) {
                continue;
            }
            if m.token == candidate {
                full = Some(ix);
            } else if m.token.len() > candidate.len() && m.token.starts_with(candidate) {
                partial = true;
            }
        }
        (partial, full)
    }

    fn complete(&mut self, buffer: &mut RichBuffer, match_ix: usize) -> Outcome {
        let m = &FORMAT_MATCHES[match_ix];
        let token_start = self.span.start;
        let token_end = self.span.end;
        let token_len = token_end - token_start;

        // Own state advances before the buffer is touched.
        self.state = SyntaxState::Pre;
        self.span = SyntaxSpan::collapsed(token_start);

        buffer.delete(token_start..token_end);
        for (_, open) in &mut self.stack {
            if *open > token_start {
                *open = open.saturating_sub(token_len).max(token_start);
            }
        }

        match m.format.kind() {
            FormatKind::TextSpan => {
                debug_assert!(m.closable);
                let closes = self
                    .stack
                    .last()
                    .is_some_and(|(open_format, _)| *open_format == m.format);
                if closes {
                    let Some((_, open_at)) = self.stack.pop() else {
                        return Outcome::Completed;
                    };
                    if open_at < token_start {
                        buffer.update_styles(open_at..token_start, |style| {
                            set_span_flag(m.format, style, true);
                        });
                    }
                    buffer.update_typing_style(|style| set_span_flag(m.format, style, false));
                } else {
                    self.stack.push((m.format, token_start));
                    buffer.update_typing_style(|style| set_span_flag(m.format, style, true));
                }
                Outcome::Completed
            }
            FormatKind::ParagraphStyle => {
                let row = buffer.row_at(buffer.cursor());
                if let MarkdownFormat::Heading(level) = m.format {
                    buffer.set_paragraph_style(row, ParagraphStyle::Heading { level });
                }
                Outcome::Completed
            }
            FormatKind::ListStyle => {
                let row = buffer.row_at(buffer.cursor());
                let kind = match m.format {
                    MarkdownFormat::OrderedList => ListKind::Ordered,
                    _ => ListKind::Unordered,
                };
                buffer.set_list(row, Some(ListFormat { kind, indent: 0 }));
                Outcome::Completed
            }
            FormatKind::BlockType => {
                let kind = match m.format {
                    MarkdownFormat::Code => BlockKind::Code,
                    _ => BlockKind::Quote,
                };
                Outcome::Escalate(kind)
            }
        }
    }

    /// Deletions dominate whatever candidate was in flight. The span
    /// collapses at the edit point and the state recomputes from the
    /// character following it: separator or buffer end means ready,
    /// anything else means mid-word.
    fn note_deletion(&mut self, buffer: &RichBuffer, at: usize, removed: usize) {
        for (_, open) in &mut self.stack {
            *open = shift_left(*open, at, removed);
        }

        self.span = SyntaxSpan::collapsed(at);
        self.state = match buffer.char_at(self.span.end) {
            None => SyntaxState::Pre,
            Some(ch) if is_separator(ch) => SyntaxState::Pre,
            Some(_) => SyntaxState::None,
        };
    }

    fn derive_state(&self, buffer: &RichBuffer, at: usize) -> SyntaxState {
        if at == 0 || self.has_active_format(buffer) {
            return SyntaxState::Pre;
        }
        let before = buffer
            .slice_to_string(0..at)
            .chars()
            .next_back();
        match before {
            None => SyntaxState::Pre,
            Some(ch) if is_separator(ch) => SyntaxState::Pre,
            Some(_) => SyntaxState::None,
        }
    }

    fn has_active_format(&self, buffer: &RichBuffer) -> bool {
        !self.stack.is_empty() || !buffer.typing_style().is_default()
    }
}

fn is_separator(ch: char) -> bool {
    ch.is_whitespace()
}

fn shift_left(pos: usize, at: usize, removed: usize) -> usize {
    if pos <= at {
        pos
    } else {
        pos.saturating_sub(removed).max(at)
    }
}

fn set_span_flag(format: MarkdownFormat, style: &mut InlineStyle, value: bool) {
    match format {
        MarkdownFormat::Bold => style.bold = value,
        MarkdownFormat::Italic => style.italic = value,
        MarkdownFormat::Underline => style.underline = value,
        MarkdownFormat::Strikethrough => style.strikethrough = value,
        _ => {}
    }
}
