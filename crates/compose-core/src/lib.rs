mod arena;
mod block;
mod composer;
mod markdown;
mod model;
mod recognizer;

pub use arena::BlockId;
pub use block::{AttachmentKind, AttachmentRef, Attrs, Block, BlockKind};
pub use composer::{Composer, SpanFormat};
pub use markdown::{hydrate, serialize};
pub use model::{BlockList, ModelEvent, MAX_INDENT_LEVEL};
pub use recognizer::SyntaxRecognizer;

pub use compose_buffer::{
    InlineStyle, ListFormat, ListKind, ParagraphFormat, ParagraphStyle, RichBuffer, TextPoint,
};
