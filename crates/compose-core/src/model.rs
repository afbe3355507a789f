use std::mem;
use std::ops::Range;

use compose_buffer::{ParagraphStyle, RichBuffer, TextPoint};

use crate::arena::{BlockArena, BlockId};
use crate::block::{self, AttachmentKind, AttachmentRef, Block, BlockKind};

pub const MAX_INDENT_LEVEL: u8 = 8;

/// Granular change notifications, drained by the embedding layer after each
/// operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    BlocksInserted { range: Range<usize> },
    BlocksRemoved { range: Range<usize> },
    FocusChanged { focus: Option<BlockId> },
}

/// Ordered list of blocks making up one draft message. Always holds at least
/// one block. Every operation clamps out-of-range rows instead of panicking.
#[derive(Debug)]
pub struct BlockList {
    arena: BlockArena,
    order: Vec<BlockId>,
    focus: Option<BlockId>,
    events: Vec<ModelEvent>,
    /// Block created by the last focus transition. Removed again when
    /// navigated away from while still untouched.
    nav_scratch: Option<BlockId>,
}

impl Default for BlockList {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockList {
    fn empty() -> Self {
        Self {
            arena: BlockArena::new(),
            order: Vec::new(),
            focus: None,
            events: Vec::new(),
            nav_scratch: None,
        }
    }

    pub fn new() -> Self {
        let mut list = Self::empty();
        let id = list.arena.insert(Block::empty_text());
        list.order.push(id);
        list.focus = Some(id);
        list
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut list = Self::empty();
        for block in blocks {
            let id = list.arena.insert(block);
            list.order.push(id);
        }
        if list.order.is_empty() {
            let id = list.arena.insert(Block::empty_text());
            list.order.push(id);
        }

        let focus = list
            .order
            .iter()
            .rev()
            .copied()
            .find(|id| list.arena.get(*id).is_some_and(|b| b.is_text_bearing()));
        let focus = match focus {
            Some(id) => id,
            None => {
                let id = list.arena.insert(Block::empty_text());
                list.order.push(id);
                id
            }
        };
        if let Some(block) = list.arena.get_mut(focus) {
            let protected_end = block.protected_range().map(|r| r.end);
            if let Some(buffer) = block.buffer_mut() {
                let end = protected_end.unwrap_or(buffer.len());
                buffer.set_cursor(end);
            }
        }
        list.focus = Some(focus);
        list
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.order.iter().filter_map(|id| self.arena.get(*id))
    }

    pub fn block(&self, row: usize) -> Option<&Block> {
        self.arena.get(*self.order.get(row)?)
    }

    pub fn block_mut(&mut self, row: usize) -> Option<&mut Block> {
        self.arena.get_mut(*self.order.get(row)?)
    }

    pub fn row_of(&self, id: BlockId) -> Option<usize> {
        self.order.iter().position(|candidate| *candidate == id)
    }

    pub fn focus(&self) -> Option<BlockId> {
        self.focus
    }

    pub fn focused_row(&self) -> Option<usize> {
        self.row_of(self.focus?)
    }

    pub fn focused_block(&self) -> Option<&Block> {
        self.arena.get(self.focus?)
    }

    pub fn focused_block_mut(&mut self) -> Option<&mut Block> {
        self.arena.get_mut(self.focus?)
    }

    pub fn focused_buffer_mut(&mut self) -> Option<&mut RichBuffer> {
        self.focused_block_mut()?.buffer_mut()
    }

    pub fn set_focus(&mut self, row: usize) {
        let row = row.min(self.order.len().saturating_sub(1));
        if let Some(id) = self.order.get(row).copied() {
            self.set_focus_id(id);
        }
    }

    fn set_focus_id(&mut self, id: BlockId) {
        if self.focus != Some(id) {
            self.focus = Some(id);
            self.events.push(ModelEvent::FocusChanged { focus: Some(id) });
        }
    }

    /// Marks the focused block as deliberately edited, which keeps transition
    /// scratch blocks from being garbage collected.
    pub fn note_user_edit(&mut self) {
        self.nav_scratch = None;
    }

    pub fn take_events(&mut self) -> Vec<ModelEvent> {
        mem::take(&mut self.events)
    }

    /// Inserts at `row`, shifting later blocks down. Out-of-range rows are a
    /// no-op.
    pub fn insert_block(&mut self, row: usize, block: Block) -> Option<BlockId> {
        if row > self.order.len() {
            return None;
        }
        let id = self.arena.insert(block);
        self.order.insert(row, id);
        self.events.push(ModelEvent::BlocksInserted { range: row..row + 1 });
        Some(id)
    }

    /// Removes the block at `row`. Refuses to drop below one block, so the
    /// last remaining block stays untouched.
    pub fn remove_block(&mut self, row: usize) {
        if self.order.len() <= 1 {
            return;
        }
        let Some(&id) = self.order.get(row) else {
            return;
        };

        self.arena.remove(id);
        self.order.remove(row);
        self.events.push(ModelEvent::BlocksRemoved { range: row..row + 1 });

        if self.focus == Some(id) {
            let focus_row = row.saturating_sub(1);
            self.set_focus(focus_row);
            if let Some(buffer) = self.focused_buffer_mut() {
                buffer.set_cursor(buffer.len());
            }
        }
    }

    /// Escalate the focused block to `kind` at the cursor. The new block
    /// takes exactly the cursor's paragraph; paragraphs above and below stay
    /// in blocks of the original kind.
    pub fn insert_block_type_at_cursor(&mut self, kind: BlockKind) -> Option<BlockId> {
        let row = self.focused_row()?;
        let id = self.order[row];

        if self.arena.get(id)?.kind == kind {
            // The marker was typed inside a block already of that kind; the
            // line just sheds whatever paragraph style it carried.
            if let Some(buffer) = self.arena.get_mut(id)?.buffer_mut() {
                let line = buffer.row_at(buffer.cursor());
                buffer.set_paragraph_style(line, ParagraphStyle::Paragraph);
                buffer.set_list(line, None);
            }
            return Some(id);
        }

        let original = self.arena.get(id)?;
        if !original.is_text_bearing() {
            return None;
        }
        let original_kind = original.kind;

        let removed = self.arena.remove(id)?;
        self.order.remove(row);
        self.events.push(ModelEvent::BlocksRemoved { range: row..row + 1 });

        let crate::block::BlockContent::TextBearing(mut buffer) = removed.content else {
            return None;
        };
        let mut at = buffer.cursor();
        if original_kind == BlockKind::Quote {
            block::strip_quote_affix(&mut buffer);
            at = at.saturating_sub(1).min(buffer.len());
        }

        let line = buffer.row_at(at);
        let line_start = buffer.line_range(line).start;

        let mut below = None;
        if line + 1 < buffer.paragraph_count() {
            let next_start = buffer.line_range(line + 1).start;
            below = Some(buffer.split_off(next_start));
            let len = buffer.len();
            if len > 0 && buffer.char_at(len - 1) == Some('\n') {
                buffer.delete(len - 1..len);
            }
        }

        let (above, mut mid) = if line > 0 {
            let mid = buffer.split_off(line_start);
            let mut above = buffer;
            let len = above.len();
            if len > 0 && above.char_at(len - 1) == Some('\n') {
                above.delete(len - 1..len);
            }
            (Some(above), mid)
        } else {
            (None, buffer)
        };
        mid.set_paragraph_style(0, ParagraphStyle::Paragraph);
        mid.set_list(0, None);
        mid.set_cursor(at.saturating_sub(line_start));

        let mut insert_row = row;
        if let Some(above) = above {
            let above_id = self.arena.insert(Block::with_buffer(original_kind, above));
            self.order.insert(insert_row, above_id);
            insert_row += 1;
        }

        let cursor = mid.cursor();
        let mid_id = self.arena.insert(Block::with_buffer(kind, mid));
        self.order.insert(insert_row, mid_id);
        let mid_row = insert_row;
        insert_row += 1;

        if let Some(below) = below {
            let below_id = self.arena.insert(Block::with_buffer(original_kind, below));
            self.order.insert(insert_row, below_id);
            insert_row += 1;
        }

        self.events.push(ModelEvent::BlocksInserted {
            range: row..insert_row,
        });
        if let Some(block) = self.block_mut(mid_row) {
            let protected = block.protected_range();
            if let Some(buffer) = block.buffer_mut() {
                let mut cursor = cursor;
                if let Some(range) = protected {
                    cursor = (cursor + range.start).clamp(range.start, range.end);
                }
                buffer.set_cursor(cursor);
            }
        }
        self.set_focus_id(mid_id);
        self.nav_scratch = None;
        Some(mid_id)
    }

    /// Vertical focus transition past the focused block's first or last line.
    pub fn handle_transition(&mut self, up: bool) {
        let Some(row) = self.focused_row() else {
            return;
        };
        let len = self.order.len();
        let prev_scratch = self.nav_scratch.take();
        let vacated = self.order[row];

        let current_kind = self.block(row).map(|b| b.kind);
        let column = self
            .focused_block()
            .and_then(|b| b.buffer())
            .map(|b| b.cursor_point().column)
            .unwrap_or(0);

        let at_edge = if up { row == 0 } else { row == len - 1 };
        if at_edge {
            if current_kind != Some(BlockKind::Text) {
                let insert_row = if up { 0 } else { len };
                let Some(id) = self.insert_block(insert_row, Block::empty_text()) else {
                    return;
                };
                self.set_focus_id(id);
                self.nav_scratch = Some(id);
                self.cleanup_scratch(prev_scratch, vacated);
            } else {
                self.nav_scratch = prev_scratch;
            }
            return;
        }

        let target_row = if up { row - 1 } else { row + 1 };
        let target_id = self.order[target_row];
        let target_is_text_bearing = self
            .arena
            .get(target_id)
            .is_some_and(|b| b.is_text_bearing());

        if target_is_text_bearing {
            if let Some(block) = self.arena.get_mut(target_id) {
                let protected = block.protected_range();
                if let Some(buffer) = block.buffer_mut() {
                    let dest_line = if up {
                        buffer.paragraph_count().saturating_sub(1)
                    } else {
                        0
                    };
                    let mut offset = buffer.offset_for_point(TextPoint::new(dest_line, column));
                    if let Some(range) = protected {
                        offset = offset.clamp(range.start, range.end);
                    }
                    buffer.set_cursor(offset);
                    buffer.sync_typing_style();
                }
            }
            self.set_focus_id(target_id);
        } else {
            // A cursor cannot land on an attachment; give it a line between.
            let insert_row = if up { row } else { row + 1 };
            let Some(id) = self.insert_block(insert_row, Block::empty_text()) else {
                return;
            };
            self.set_focus_id(id);
            self.nav_scratch = Some(id);
        }

        self.cleanup_scratch(prev_scratch, vacated);
    }

    fn cleanup_scratch(&mut self, prev_scratch: Option<BlockId>, vacated: BlockId) {
        if prev_scratch != Some(vacated) || self.focus == Some(vacated) {
            return;
        }
        let Some(row) = self.row_of(vacated) else {
            return;
        };
        let untouched = self
            .arena
            .get(vacated)
            .and_then(|b| b.buffer())
            .is_some_and(|b| b.is_empty() && !b.has_rich_formatting());
        if untouched && self.order.len() > 1 {
            self.arena.remove(vacated);
            self.order.remove(row);
            self.events.push(ModelEvent::BlocksRemoved { range: row..row + 1 });
        }
    }

    /// Backspace with the cursor at the very start of the focused block.
    pub fn backspace_at_block_start(&mut self) {
        let Some(row) = self.focused_row() else {
            return;
        };
        let id = self.order[row];

        if row == 0 {
            let Some(block) = self.arena.get_mut(id) else {
                return;
            };
            if matches!(block.kind, BlockKind::Code | BlockKind::Quote) {
                let Some(buffer) = block.buffer_mut() else {
                    return;
                };
                let mut inner = mem::take(buffer);
                block::strip_quote_affix(&mut inner);
                inner.set_cursor(0);
                *block = Block::text(inner);
            }
            return;
        }

        let prev_row = row - 1;
        let prev_id = self.order[prev_row];
        let prev_is_text_bearing = self
            .arena
            .get(prev_id)
            .is_some_and(|b| b.is_text_bearing());

        if !prev_is_text_bearing {
            self.remove_block(prev_row);
            return;
        }

        let Some(fragment) = self
            .arena
            .get_mut(id)
            .and_then(|b| b.buffer_mut())
            .map(|b| b.detach_first_paragraph())
        else {
            return;
        };

        let emptied = self
            .arena
            .get(id)
            .and_then(|b| b.buffer())
            .is_some_and(|b| b.is_empty());

        self.append_fragment(prev_row, fragment);
        self.set_focus_id(prev_id);
        if emptied {
            if let Some(current_row) = self.row_of(id) {
                self.arena.remove(id);
                self.order.remove(current_row);
                self.events.push(ModelEvent::BlocksRemoved {
                    range: current_row..current_row + 1,
                });
            }
        }
    }

    /// Forward delete with the cursor at the very end of the focused block.
    pub fn delete_at_block_end(&mut self) {
        let Some(row) = self.focused_row() else {
            return;
        };
        if row + 1 >= self.order.len() {
            return;
        }
        let id = self.order[row];
        let next_id = self.order[row + 1];

        let next_is_text_bearing = self
            .arena
            .get(next_id)
            .is_some_and(|b| b.is_text_bearing());
        if !next_is_text_bearing {
            return;
        }

        let Some(fragment) = self
            .arena
            .get_mut(next_id)
            .and_then(|b| b.buffer_mut())
            .map(|b| b.detach_first_paragraph())
        else {
            return;
        };

        let emptied = self
            .arena
            .get(next_id)
            .and_then(|b| b.buffer())
            .is_some_and(|b| b.is_empty());

        self.append_fragment(row, fragment);
        self.set_focus_id(id);
        if emptied {
            if let Some(next_row) = self.row_of(next_id) {
                self.arena.remove(next_id);
                self.order.remove(next_row);
                self.events.push(ModelEvent::BlocksRemoved {
                    range: next_row..next_row + 1,
                });
            }
        }
    }

    fn append_fragment(&mut self, row: usize, mut fragment: RichBuffer) {
        block::strip_quote_affix(&mut fragment);
        let Some(&id) = self.order.get(row) else {
            return;
        };
        let Some(block) = self.arena.get_mut(id) else {
            return;
        };
        let is_quote = block.kind == BlockKind::Quote;
        let Some(buffer) = block.buffer_mut() else {
            return;
        };
        if is_quote {
            block::strip_quote_affix(buffer);
        }
        let join = buffer.len();
        buffer.append(fragment);
        if is_quote {
            let inner = mem::take(buffer);
            *block = Block::quote(inner);
        }
        let cursor = join + if is_quote { 1 } else { 0 };
        if let Some(buffer) = block.buffer_mut() {
            buffer.set_cursor(cursor);
            buffer.sync_typing_style();
        }
    }

    /// Attachments live at the head of the message: an optional reply
    /// context first, then attachments newest first, then one text block
    /// carrying the flattened text content.
    pub fn add_attachment(&mut self, reference: AttachmentRef) {
        let old_len = self.order.len();
        let mut reply = None;
        let mut attachments = Vec::new();
        let mut text = String::new();

        for (ix, id) in mem::take(&mut self.order).into_iter().enumerate() {
            let Some(block) = self.arena.remove(id) else {
                continue;
            };
            if block.kind == BlockKind::Attachment {
                let is_reply = block
                    .attachment_ref()
                    .is_some_and(|r| r.kind == AttachmentKind::Reply);
                if ix == 0 && is_reply && reply.is_none() {
                    reply = Some(block);
                } else {
                    attachments.push(block);
                }
            } else if let Some(buffer) = block.buffer() {
                let content = if block.kind == BlockKind::Quote {
                    block::quote_inner(buffer).to_string()
                } else {
                    buffer.to_string()
                };
                if !content.is_empty() {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(&content);
                }
            }
        }
        self.events.push(ModelEvent::BlocksRemoved { range: 0..old_len });

        if let Some(reply) = reply {
            let id = self.arena.insert(reply);
            self.order.push(id);
        }
        let new_id = self.arena.insert(Block::attachment(reference));
        self.order.push(new_id);
        for block in attachments {
            let id = self.arena.insert(block);
            self.order.push(id);
        }

        let mut buffer = RichBuffer::from_plain_text(&text);
        buffer.set_cursor(buffer.len());
        let text_id = self.arena.insert(Block::text(buffer));
        self.order.push(text_id);

        self.events.push(ModelEvent::BlocksInserted {
            range: 0..self.order.len(),
        });
        self.set_focus_id(text_id);
        self.nav_scratch = None;
    }

    /// Tab and shift-tab on a list line.
    pub fn handle_indent(&mut self, outdent: bool) {
        let Some(buffer) = self.focused_buffer_mut() else {
            return;
        };
        let line = buffer.row_at(buffer.cursor());
        let format = buffer.paragraph_format(line);
        let Some(mut list) = format.list else {
            return;
        };
        list.indent = if outdent {
            list.indent.saturating_sub(1)
        } else {
            (list.indent + 1).min(MAX_INDENT_LEVEL)
        };
        buffer.set_list(line, Some(list));
    }

    pub fn has_rich_content(&self) -> bool {
        self.blocks().any(|block| {
            if block.kind != BlockKind::Text {
                return true;
            }
            block.buffer().is_some_and(|b| b.has_rich_formatting())
        })
    }
}
