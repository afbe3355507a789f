use compose_buffer::RichBuffer;

use crate::block::{Block, BlockKind};
use crate::model::BlockList;

/// Render the block list as one canonical markdown body. Attachment blocks
/// travel out of band and are skipped. An empty string means no content.
pub fn serialize(blocks: &BlockList) -> String {
    let mut parts = Vec::new();

    for block in blocks.blocks() {
        let Some(buffer) = block.buffer() else {
            continue;
        };
        let normalized = normalize_breaks(&buffer.to_markdown());
        if normalized.is_empty() {
            continue;
        }

        let rendered = match block.kind {
            BlockKind::Quote => render_quote(&normalized),
            BlockKind::Code => render_code(&normalized),
            BlockKind::Text | BlockKind::Attachment => normalized,
        };
        if !rendered.is_empty() {
            parts.push(rendered);
        }
    }

    parts.join("\n\n")
}

/// Rebuild a block list from a message body, the inverse of [`serialize`].
/// Paragraphs are delimited by blank lines, except inside code fences.
pub fn hydrate(source: &str) -> BlockList {
    let mut blocks = Vec::new();
    let lines: Vec<&str> = source.split('\n').collect();
    let mut ix = 0;

    while ix < lines.len() {
        let line = lines[ix];
        if line.trim().is_empty() {
            ix += 1;
            continue;
        }

        if line.trim_start().starts_with("```") {
            ix += 1;
            let mut body = Vec::new();
            while ix < lines.len() && !lines[ix].trim_start().starts_with("```") {
                body.push(lines[ix]);
                ix += 1;
            }
            if ix < lines.len() {
                ix += 1;
            }
            blocks.push(Block::code(RichBuffer::from_plain_text(&body.join("\n"))));
            continue;
        }

        let mut paragraph = Vec::new();
        while ix < lines.len()
            && !lines[ix].trim().is_empty()
            && !lines[ix].trim_start().starts_with("```")
        {
            paragraph.push(lines[ix]);
            ix += 1;
        }

        if paragraph.iter().all(|l| l.starts_with('>')) {
            let inner: Vec<&str> = paragraph
                .iter()
                .map(|l| l.strip_prefix("> ").or_else(|| l.strip_prefix('>')).unwrap_or(l))
                .collect();
            blocks.push(Block::quote(RichBuffer::from_markdown(&inner.join("\n"))));
        } else {
            blocks.push(Block::text(RichBuffer::from_markdown(&paragraph.join("\n"))));
        }
    }

    if blocks.is_empty() {
        BlockList::new()
    } else {
        BlockList::from_blocks(blocks)
    }
}

/// Trim leading and trailing blank lines, then rejoin interior lines:
/// blank-line breaks stay as one paragraph break, single newlines between
/// two plain lines collapse to a space, and lines carrying a structural
/// prefix keep their own line.
fn normalize_breaks(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let first = lines.iter().position(|l| !l.trim().is_empty());
    let Some(first) = first else {
        return String::new();
    };
    let last = lines.iter().rposition(|l| !l.trim().is_empty()).unwrap_or(first);

    let mut out = String::new();
    let mut pending_break = false;
    let mut prev_structural = false;

    for line in &lines[first..=last] {
        if line.trim().is_empty() {
            pending_break = true;
            continue;
        }

        if !out.is_empty() {
            if pending_break {
                out.push_str("\n\n");
            } else if prev_structural || is_structural_line(line) {
                out.push('\n');
            } else {
                out.push(' ');
            }
        }
        out.push_str(line);
        pending_break = false;
        prev_structural = is_structural_line(line);
    }

    out
}

fn is_structural_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with("- ") || trimmed.starts_with("* ") || trimmed.starts_with("> ") {
        return true;
    }
    if trimmed.starts_with("```") {
        return true;
    }
    let hashes = trimmed.bytes().take_while(|b| *b == b'#').count();
    if (1..=6).contains(&hashes) && trimmed[hashes..].starts_with(' ') {
        return true;
    }
    let digits = trimmed.bytes().take_while(|b| b.is_ascii_digit()).count();
    digits > 0 && trimmed[digits..].starts_with(". ")
}

fn render_quote(normalized: &str) -> String {
    let paragraphs: Vec<String> = normalized
        .split("\n\n")
        .map(strip_stray_artifacts)
        .filter(|p| !p.is_empty())
        .map(|p| format!("> {p}"))
        .collect();
    paragraphs.join("\n")
}

fn render_code(normalized: &str) -> String {
    let mut body = normalized.to_string();
    while body.contains("\n\n") {
        body = body.replace("\n\n", "\n");
    }
    format!("```\n{body}\n```")
}

/// One leading and one trailing `*` or `"` left behind by delimiter
/// stripping gets dropped from a quoted paragraph.
fn strip_stray_artifacts(paragraph: &str) -> String {
    let mut s = paragraph;
    if let Some(rest) = s.strip_prefix('*').or_else(|| s.strip_prefix('"')) {
        s = rest;
    }
    if let Some(rest) = s.strip_suffix('*').or_else(|| s.strip_suffix('"')) {
        s = rest;
    }
    s.to_string()
}
