use std::collections::BTreeMap;
use std::ops::Range;

use serde::{Deserialize, Serialize};

use compose_buffer::RichBuffer;

/// Sentinel wrapped around quote content. One copy sits at each end of a
/// quote buffer so the visual frame survives arbitrary edits in between.
pub(crate) const QUOTE_AFFIX: char = '"';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Text,
    Code,
    Quote,
    Attachment,
}

pub type Attrs = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    File,
    Image,
    Reply,
}

/// Opaque handle to an attached payload. The composer never loads the bytes,
/// it only carries the reference through the block list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub id: String,
    pub name: String,
    pub kind: AttachmentKind,
    #[serde(default, skip_serializing_if = "Attrs::is_empty")]
    pub attrs: Attrs,
}

impl AttachmentRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: AttachmentKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            attrs: Attrs::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum BlockContent {
    TextBearing(RichBuffer),
    Attachment(AttachmentRef),
}

#[derive(Debug, Clone)]
pub struct Block {
    pub kind: BlockKind,
    pub(crate) content: BlockContent,
}

impl Block {
    pub fn text(buffer: RichBuffer) -> Self {
        Self {
            kind: BlockKind::Text,
            content: BlockContent::TextBearing(buffer),
        }
    }

    pub fn empty_text() -> Self {
        Self::text(RichBuffer::new())
    }

    pub fn code(buffer: RichBuffer) -> Self {
        Self {
            kind: BlockKind::Code,
            content: BlockContent::TextBearing(buffer),
        }
    }

    pub fn quote(mut buffer: RichBuffer) -> Self {
        apply_quote_affix(&mut buffer);
        Self {
            kind: BlockKind::Quote,
            content: BlockContent::TextBearing(buffer),
        }
    }

    pub fn attachment(reference: AttachmentRef) -> Self {
        Self {
            kind: BlockKind::Attachment,
            content: BlockContent::Attachment(reference),
        }
    }

    pub fn with_buffer(kind: BlockKind, buffer: RichBuffer) -> Self {
        match kind {
            BlockKind::Text => Self::text(buffer),
            BlockKind::Code => Self::code(buffer),
            BlockKind::Quote => Self::quote(buffer),
            BlockKind::Attachment => Self::text(buffer),
        }
    }

    pub fn is_text_bearing(&self) -> bool {
        matches!(self.content, BlockContent::TextBearing(_))
    }

    pub fn buffer(&self) -> Option<&RichBuffer> {
        match &self.content {
            BlockContent::TextBearing(buffer) => Some(buffer),
            BlockContent::Attachment(_) => None,
        }
    }

    pub fn buffer_mut(&mut self) -> Option<&mut RichBuffer> {
        match &mut self.content {
            BlockContent::TextBearing(buffer) => Some(buffer),
            BlockContent::Attachment(_) => None,
        }
    }

    pub fn attachment_ref(&self) -> Option<&AttachmentRef> {
        match &self.content {
            BlockContent::Attachment(reference) => Some(reference),
            BlockContent::TextBearing(_) => None,
        }
    }

    /// Offsets the cursor may occupy. Quotes pin their affix characters in
    /// place, everything else is fully editable.
    pub fn protected_range(&self) -> Option<Range<usize>> {
        if self.kind != BlockKind::Quote {
            return None;
        }
        let buffer = self.buffer()?;
        let affix = QUOTE_AFFIX.len_utf8();
        if buffer.len() < affix * 2 {
            return None;
        }
        Some(affix..buffer.len() - affix)
    }
}

fn apply_quote_affix(buffer: &mut RichBuffer) {
    strip_quote_affix(buffer);
    let affix = QUOTE_AFFIX.to_string();
    buffer.insert(0, &affix);
    buffer.insert(buffer.len(), &affix);
    buffer.set_cursor(buffer.len() - affix.len());
}

/// Remove the affix characters if present. Used when a quote's content moves
/// into a plain block.
pub(crate) fn strip_quote_affix(buffer: &mut RichBuffer) {
    let affix = QUOTE_AFFIX.len_utf8();
    if buffer.len() >= affix && buffer.char_at(buffer.len() - affix) == Some(QUOTE_AFFIX) {
        buffer.delete(buffer.len() - affix..buffer.len());
    }
    if buffer.char_at(0) == Some(QUOTE_AFFIX) {
        buffer.delete(0..affix);
    }
}

/// Plain content of a quote buffer, affixes removed.
pub(crate) fn quote_inner(buffer: &RichBuffer) -> RichBuffer {
    let mut inner = buffer.clone();
    strip_quote_affix(&mut inner);
    inner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_wraps_content_in_affixes() {
        let block = Block::quote(RichBuffer::from_plain_text("cited"));
        let buffer = block.buffer().unwrap();
        assert_eq!(buffer.to_string(), "\"cited\"");
        assert_eq!(block.protected_range(), Some(1..6));
        assert_eq!(buffer.cursor(), 6);
    }

    #[test]
    fn strip_quote_affix_restores_content() {
        let block = Block::quote(RichBuffer::from_plain_text("cited"));
        let inner = quote_inner(block.buffer().unwrap());
        assert_eq!(inner.to_string(), "cited");
    }

    #[test]
    fn text_block_has_no_protected_range() {
        let block = Block::text(RichBuffer::from_plain_text("\"free\""));
        assert_eq!(block.protected_range(), None);
    }
}
