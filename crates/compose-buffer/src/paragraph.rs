use serde::{Deserialize, Serialize};

/// Typography applied to one whole line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "style")]
pub enum ParagraphStyle {
    #[default]
    Paragraph,
    Heading {
        level: u8,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Unordered,
    Ordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFormat {
    pub kind: ListKind,
    #[serde(default)]
    pub indent: u8,
}

/// Per-line format, one entry per line of the owning buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphFormat {
    #[serde(flatten)]
    pub style: ParagraphStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<ListFormat>,
}

impl ParagraphFormat {
    pub fn heading(level: u8) -> Self {
        Self {
            style: ParagraphStyle::Heading {
                level: level.clamp(1, 6),
            },
            list: None,
        }
    }

    pub fn list(kind: ListKind) -> Self {
        Self {
            style: ParagraphStyle::Paragraph,
            list: Some(ListFormat { kind, indent: 0 }),
        }
    }

    pub fn is_default(&self) -> bool {
        self == &Self::default()
    }

    /// Format inherited by the line created when this one is split.
    /// Headings do not continue past a line break, lists do.
    pub fn split_successor(&self) -> Self {
        match self.style {
            ParagraphStyle::Heading { .. } => Self::default(),
            ParagraphStyle::Paragraph => *self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_does_not_continue_after_split() {
        let format = ParagraphFormat::heading(2);
        assert_eq!(format.split_successor(), ParagraphFormat::default());
    }

    #[test]
    fn list_continues_after_split() {
        let format = ParagraphFormat::list(ListKind::Ordered);
        assert_eq!(format.split_successor(), format);
    }

    #[test]
    fn heading_level_is_clamped() {
        let format = ParagraphFormat::heading(9);
        assert_eq!(
            format.style,
            ParagraphStyle::Heading { level: 6 }
        );
    }
}
