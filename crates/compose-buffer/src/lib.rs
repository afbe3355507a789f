mod buffer;
mod markdown;
mod paragraph;
mod rope_ext;
mod style;

pub use buffer::*;
pub use paragraph::*;
pub use rope_ext::TextPoint;
pub use style::InlineStyle;
pub use sum_tree::Bias;
