use std::ops::Range;

use crate::buffer::RichBuffer;
use crate::paragraph::{ListFormat, ListKind, ParagraphFormat, ParagraphStyle};
use crate::style::InlineStyle;

const MAX_LIST_INDENT: u8 = 8;

/// Inline tokens in the order spans are opened. Closing walks the same list
/// backwards, so italic always sits innermost and `***` re-parses cleanly.
const INLINE_TOKENS: &[(&str, InlineFlag)] = &[
    ("**", InlineFlag::Bold),
    ("__", InlineFlag::Underline),
    ("~~", InlineFlag::Strikethrough),
    ("*", InlineFlag::Italic),
    ("_", InlineFlag::Italic),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineFlag {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

impl InlineFlag {
    fn is_set(self, style: &InlineStyle) -> bool {
        match self {
            InlineFlag::Bold => style.bold,
            InlineFlag::Italic => style.italic,
            InlineFlag::Underline => style.underline,
            InlineFlag::Strikethrough => style.strikethrough,
        }
    }

    fn toggle(self, style: &mut InlineStyle) {
        match self {
            InlineFlag::Bold => style.bold = !style.bold,
            InlineFlag::Italic => style.italic = !style.italic,
            InlineFlag::Underline => style.underline = !style.underline,
            InlineFlag::Strikethrough => style.strikethrough = !style.strikethrough,
        }
    }
}

impl RichBuffer {
    /// Render the buffer as one markdown fragment, line by line.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let mut ordered_counter: u64 = 0;
        let mut prev_ordered_indent: Option<u8> = None;

        for row in 0..self.paragraph_count() {
            if row > 0 {
                out.push('\n');
            }

            let format = self.paragraph_format(row);
            match format.list {
                Some(ListFormat {
                    kind: ListKind::Ordered,
                    indent,
                }) if prev_ordered_indent == Some(indent) => {
                    ordered_counter += 1;
                }
                Some(ListFormat {
                    kind: ListKind::Ordered,
                    indent,
                }) => {
                    ordered_counter = 1;
                    prev_ordered_indent = Some(indent);
                }
                _ => {
                    prev_ordered_indent = None;
                }
            }

            match format.style {
                ParagraphStyle::Heading { level } => {
                    for _ in 0..level.clamp(1, 6) {
                        out.push('#');
                    }
                    out.push(' ');
                }
                ParagraphStyle::Paragraph => {
                    if let Some(list) = format.list {
                        for _ in 0..list.indent.min(MAX_LIST_INDENT) {
                            out.push_str("  ");
                        }
                        match list.kind {
                            ListKind::Unordered => out.push_str("- "),
                            ListKind::Ordered => {
                                out.push_str(&format_ordinal(ordered_counter));
                            }
                        }
                    }
                }
            }

            self.render_inline(self.line_range(row), &mut out);
        }

        out
    }

    fn render_inline(&self, range: Range<usize>, out: &mut String) {
        for (span, style) in self.style_runs_in_range(range) {
            let text = self.slice_to_string(span);
            if text.is_empty() {
                continue;
            }

            let mut open = Vec::new();
            let mut seen_italic = false;
            for (token, flag) in INLINE_TOKENS {
                if *flag == InlineFlag::Italic {
                    if seen_italic {
                        continue;
                    }
                    seen_italic = true;
                }
                if flag.is_set(style) {
                    open.push(*token);
                }
            }

            for token in &open {
                out.push_str(token);
            }
            out.push_str(&text);
            for token in open.iter().rev() {
                out.push_str(token);
            }
        }
    }

    /// Parse a markdown fragment back into a styled buffer. Tokens without a
    /// matching closer on the same line stay literal.
    pub fn from_markdown(source: &str) -> Self {
        let mut plain = String::new();
        let mut spans: Vec<(Range<usize>, InlineStyle)> = Vec::new();
        let mut formats: Vec<ParagraphFormat> = Vec::new();

        for (ix, line) in source.split('\n').enumerate() {
            if ix > 0 {
                plain.push('\n');
            }
            let (format, content) = parse_line_prefix(line);
            formats.push(format);
            parse_inline(content, &mut plain, &mut spans);
        }

        let mut buffer = RichBuffer::from_plain_text(&plain);
        for (range, style) in spans {
            buffer.update_styles(range, |s| *s = style);
        }
        for (row, format) in formats.into_iter().enumerate() {
            buffer.set_paragraph_style(row, format.style);
            buffer.set_list(row, format.list);
        }
        buffer.set_cursor(buffer.len());
        buffer
    }
}

fn format_ordinal(counter: u64) -> String {
    let mut s = counter.to_string();
    s.push_str(". ");
    s
}

fn parse_line_prefix(line: &str) -> (ParagraphFormat, &str) {
    let hashes = line.bytes().take_while(|b| *b == b'#').count();
    if (1..=6).contains(&hashes) {
        if let Some(rest) = line[hashes..].strip_prefix(' ') {
            return (ParagraphFormat::heading(hashes as u8), rest);
        }
    }

    let spaces = line.bytes().take_while(|b| *b == b' ').count();
    let indent = ((spaces / 2) as u8).min(MAX_LIST_INDENT);
    let after_indent = &line[indent as usize * 2..];

    if let Some(rest) = after_indent
        .strip_prefix("- ")
        .or_else(|| after_indent.strip_prefix("* "))
    {
        let mut format = ParagraphFormat::list(ListKind::Unordered);
        if let Some(list) = format.list.as_mut() {
            list.indent = indent;
        }
        return (format, rest);
    }

    let digits = after_indent.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(rest) = after_indent[digits..].strip_prefix(". ") {
            let mut format = ParagraphFormat::list(ListKind::Ordered);
            if let Some(list) = format.list.as_mut() {
                list.indent = indent;
            }
            return (format, rest);
        }
    }

    (ParagraphFormat::default(), line)
}

fn parse_inline(line: &str, plain: &mut String, spans: &mut Vec<(Range<usize>, InlineStyle)>) {
    let mut style = InlineStyle::default();
    let mut span_start = plain.len();
    let mut ix = 0;

    while ix < line.len() {
        let rest = &line[ix..];
        let mut consumed = None;

        for (token, flag) in INLINE_TOKENS {
            if !rest.starts_with(token) {
                continue;
            }
            let closes = flag.is_set(&style);
            let has_closer = line[ix + token.len()..].contains(token);
            if closes || has_closer {
                consumed = Some((*token, *flag));
                break;
            }
        }

        if let Some((token, flag)) = consumed {
            if plain.len() > span_start && !style.is_default() {
                spans.push((span_start..plain.len(), style));
            }
            flag.toggle(&mut style);
            ix += token.len();
            span_start = plain.len();
        } else {
            let ch = rest.chars().next().unwrap_or('\0');
            plain.push(ch);
            ix += ch.len_utf8();
        }
    }

    if plain.len() > span_start && !style.is_default() {
        spans.push((span_start..plain.len(), style));
    }
}
