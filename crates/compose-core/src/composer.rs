use std::ops::Range;

use compose_buffer::InlineStyle;

use crate::block::{AttachmentRef, Block, BlockKind};
use crate::markdown;
use crate::model::{BlockList, ModelEvent};
use crate::recognizer::SyntaxRecognizer;

/// Toolbar-reachable character formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanFormat {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

impl SpanFormat {
    fn read(self, style: &InlineStyle) -> bool {
        match self {
            SpanFormat::Bold => style.bold,
            SpanFormat::Italic => style.italic,
            SpanFormat::Underline => style.underline,
            SpanFormat::Strikethrough => style.strikethrough,
        }
    }

    fn write(self, style: &mut InlineStyle, value: bool) {
        match self {
            SpanFormat::Bold => style.bold = value,
            SpanFormat::Italic => style.italic = value,
            SpanFormat::Underline => style.underline = value,
            SpanFormat::Strikethrough => style.strikethrough = value,
        }
    }
}

/// Facade tying the block list and the syntax recognizer together. All user
/// input funnels through here so recognizer bookkeeping and focus
/// reattachment stay consistent.
#[derive(Debug)]
pub struct Composer {
    blocks: BlockList,
    recognizer: SyntaxRecognizer,
}

impl Default for Composer {
    fn default() -> Self {
        Self::new()
    }
}

impl Composer {
    pub fn new() -> Self {
        let mut composer = Self {
            blocks: BlockList::new(),
            recognizer: SyntaxRecognizer::new(),
        };
        composer.reattach();
        composer
    }

    /// Reopen an existing message body for editing.
    pub fn hydrate(body: &str) -> Self {
        let mut composer = Self {
            blocks: markdown::hydrate(body),
            recognizer: SyntaxRecognizer::new(),
        };
        composer.reattach();
        composer
    }

    pub fn clear(&mut self) {
        *self = Self::new();
    }

    pub fn blocks(&self) -> &BlockList {
        &self.blocks
    }

    pub fn serialize(&self) -> String {
        markdown::serialize(&self.blocks)
    }

    pub fn has_rich_content(&self) -> bool {
        self.blocks.has_rich_content()
    }

    pub fn take_events(&mut self) -> Vec<ModelEvent> {
        self.blocks.take_events()
    }

    pub fn set_focus(&mut self, row: usize) {
        self.blocks.set_focus(row);
        self.reattach();
    }

    /// Place the cursor within the focused block, clamped to its editable
    /// range.
    pub fn set_cursor(&mut self, offset: usize) {
        if let Some(block) = self.blocks.focused_block_mut() {
            let protected = block.protected_range();
            if let Some(buffer) = block.buffer_mut() {
                let offset = match protected {
                    Some(range) => offset.clamp(range.start, range.end),
                    None => offset,
                };
                buffer.set_cursor(offset);
                buffer.sync_typing_style();
            }
        }
        self.reattach();
    }

    pub fn select(&mut self, range: Range<usize>) {
        if let Some(block) = self.blocks.focused_block_mut() {
            let protected = block.protected_range();
            if let Some(buffer) = block.buffer_mut() {
                let range = match protected {
                    Some(p) => range.start.clamp(p.start, p.end)..range.end.clamp(p.start, p.end),
                    None => range,
                };
                buffer.select(range);
            }
        }
        self.reattach();
    }

    /// Insert typed or pasted text at the focused cursor.
    pub fn type_text(&mut self, text: &str) {
        self.blocks.note_user_edit();

        let escalation = {
            let recognizer = &mut self.recognizer;
            let Some(block) = self.blocks.focused_block_mut() else {
                return;
            };
            let protected = block.protected_range();
            // Code blocks hold their text verbatim.
            let literal = block.kind == BlockKind::Code;
            let Some(buffer) = block.buffer_mut() else {
                return;
            };
            if let Some(range) = &protected {
                let selection = buffer.selection();
                buffer.select(
                    selection.start.clamp(range.start, range.end)
                        ..selection.end.clamp(range.start, range.end),
                );
            }
            let edit = buffer.insert_at_cursor(text);
            if literal {
                None
            } else {
                recognizer.handle_edit(buffer, edit)
            }
        };

        if let Some(kind) = escalation {
            self.blocks.insert_block_type_at_cursor(kind);
            self.reattach();
        }
    }

    pub fn backspace(&mut self) {
        self.blocks.note_user_edit();

        let at_start = {
            let Some(block) = self.blocks.focused_block_mut() else {
                return;
            };
            let floor = block.protected_range().map(|r| r.start).unwrap_or(0);
            let Some(buffer) = block.buffer_mut() else {
                return;
            };
            let selection = buffer.selection();
            if selection.start < selection.end {
                false
            } else {
                buffer.cursor() <= floor
            }
        };

        if at_start {
            self.blocks.backspace_at_block_start();
            self.reattach();
            return;
        }

        let recognizer = &mut self.recognizer;
        let Some(block) = self.blocks.focused_block_mut() else {
            return;
        };
        let floor = block.protected_range().map(|r| r.start).unwrap_or(0);
        let Some(buffer) = block.buffer_mut() else {
            return;
        };

        let selection = buffer.selection();
        let edit = if selection.start < selection.end {
            buffer.delete(selection.start.max(floor)..selection.end)
        } else {
            let cursor = buffer.cursor();
            let prev = buffer
                .slice_to_string(0..cursor)
                .chars()
                .next_back()
                .map(|ch| cursor - ch.len_utf8())
                .unwrap_or(cursor);
            buffer.delete(prev.max(floor)..cursor)
        };
        recognizer.handle_edit(buffer, edit);
    }

    pub fn delete_forward(&mut self) {
        self.blocks.note_user_edit();

        let at_end = {
            let Some(block) = self.blocks.focused_block_mut() else {
                return;
            };
            let protected_end = block.protected_range().map(|r| r.end);
            let Some(buffer) = block.buffer_mut() else {
                return;
            };
            let selection = buffer.selection();
            if selection.start < selection.end {
                false
            } else {
                buffer.cursor() >= protected_end.unwrap_or(buffer.len())
            }
        };

        if at_end {
            self.blocks.delete_at_block_end();
            self.reattach();
            return;
        }

        let recognizer = &mut self.recognizer;
        let Some(block) = self.blocks.focused_block_mut() else {
            return;
        };
        let ceiling = block.protected_range().map(|r| r.end);
        let Some(buffer) = block.buffer_mut() else {
            return;
        };

        let selection = buffer.selection();
        let edit = if selection.start < selection.end {
            let end = ceiling.unwrap_or(buffer.len()).min(selection.end);
            buffer.delete(selection.start..end)
        } else {
            let cursor = buffer.cursor();
            let Some(ch) = buffer.char_at(cursor) else {
                return;
            };
            buffer.delete(cursor..cursor + ch.len_utf8())
        };
        recognizer.handle_edit(buffer, edit);
    }

    pub fn transition_up(&mut self) {
        self.blocks.handle_transition(true);
        self.reattach();
    }

    pub fn transition_down(&mut self) {
        self.blocks.handle_transition(false);
        self.reattach();
    }

    pub fn indent(&mut self) {
        self.blocks.note_user_edit();
        self.blocks.handle_indent(false);
    }

    pub fn outdent(&mut self) {
        self.blocks.note_user_edit();
        self.blocks.handle_indent(true);
    }

    pub fn add_attachment(&mut self, reference: AttachmentRef) {
        self.blocks.add_attachment(reference);
        self.reattach();
    }

    pub fn insert_block(&mut self, row: usize, block: Block) {
        let _ = self.blocks.insert_block(row, block);
        self.reattach();
    }

    pub fn remove_block(&mut self, row: usize) {
        self.blocks.remove_block(row);
        self.reattach();
    }

    pub fn insert_block_type_at_cursor(&mut self, kind: BlockKind) {
        self.blocks.insert_block_type_at_cursor(kind);
        self.reattach();
    }

    /// Toolbar toggle, as opposed to a typed markdown token. The recognizer
    /// re-derives its state from the buffer afterwards.
    pub fn toggle_span_format(&mut self, format: SpanFormat) {
        self.blocks.note_user_edit();
        {
            let Some(buffer) = self.blocks.focused_buffer_mut() else {
                return;
            };
            let selection = buffer.selection();
            if selection.start < selection.end {
                let value = !format.read(&buffer.style_at(selection.start + 1));
                buffer.update_styles(selection, |style| format.write(style, value));
                buffer.sync_typing_style();
            } else {
                let value = !format.read(&buffer.typing_style());
                buffer.update_typing_style(|style| format.write(style, value));
            }
        }
        self.reattach();
    }

    fn reattach(&mut self) {
        if let Some(buffer) = self.blocks.focused_block().and_then(|b| b.buffer()) {
            self.recognizer.attach(buffer);
        }
    }
}
