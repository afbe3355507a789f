use ropey::{LineType, Rope, RopeSlice};
use sum_tree::Bias;

/// Row/column position in byte terms within one buffer.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct TextPoint {
    pub row: usize,
    pub column: usize,
}

impl TextPoint {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

pub(crate) trait RopeExt {
    fn line_start_offset(&self, row: usize) -> usize;
    fn line_end_offset(&self, row: usize) -> usize;
    fn slice_line(&self, row: usize) -> RopeSlice<'_>;
    fn lines_len(&self) -> usize;
    fn char_at(&self, offset: usize) -> Option<char>;

    fn offset_to_point(&self, offset: usize) -> TextPoint;
    fn point_to_offset(&self, point: TextPoint) -> usize;

    fn clip_offset(&self, offset: usize, bias: Bias) -> usize;
}

impl RopeExt for Rope {
    fn slice_line(&self, row: usize) -> RopeSlice<'_> {
        if row >= self.lines_len() {
            return self.slice(0..0);
        }

        let line = self.line(row, LineType::LF);
        if line.len() > 0 {
            let last = line.len() - 1;
            if line.is_char_boundary(last) && line.char(last) == '\n' {
                return line.slice(..last);
            }
        }

        line
    }

    fn line_start_offset(&self, row: usize) -> usize {
        if row >= self.lines_len() {
            return self.len();
        }
        self.line_to_byte_idx(row, LineType::LF)
    }

    fn line_end_offset(&self, row: usize) -> usize {
        if row >= self.lines_len() {
            return self.len();
        }
        self.line_start_offset(row) + self.slice_line(row).len()
    }

    fn lines_len(&self) -> usize {
        self.len_lines(LineType::LF)
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        if offset >= self.len() {
            return None;
        }
        self.get_char(offset).ok()
    }

    fn offset_to_point(&self, offset: usize) -> TextPoint {
        let offset = self.clip_offset(offset, Bias::Left);
        let row = self.byte_to_line_idx(offset, LineType::LF);
        let column = offset.saturating_sub(self.line_to_byte_idx(row, LineType::LF));
        TextPoint::new(row, column)
    }

    fn point_to_offset(&self, point: TextPoint) -> usize {
        if point.row >= self.lines_len() {
            return self.len();
        }

        let line_start = self.line_to_byte_idx(point.row, LineType::LF);
        let line_len = self.slice_line(point.row).len();
        line_start + point.column.min(line_len)
    }

    fn clip_offset(&self, offset: usize, bias: Bias) -> usize {
        if offset > self.len() {
            return self.len();
        }

        if self.is_char_boundary(offset) {
            return offset;
        }

        if bias == Bias::Left {
            self.floor_char_boundary(offset)
        } else {
            self.ceil_char_boundary(offset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_round_trip_clamps_column_to_line() {
        let rope = Rope::from("ab\ncdef\n");
        assert_eq!(rope.offset_to_point(0), TextPoint::new(0, 0));
        assert_eq!(rope.offset_to_point(4), TextPoint::new(1, 1));
        assert_eq!(rope.point_to_offset(TextPoint::new(0, 99)), 2);
        assert_eq!(rope.point_to_offset(TextPoint::new(1, 2)), 5);
        assert_eq!(rope.point_to_offset(TextPoint::new(9, 0)), rope.len());
    }

    #[test]
    fn slice_line_excludes_newline() {
        let rope = Rope::from("one\ntwo");
        assert_eq!(rope.slice_line(0).to_string(), "one");
        assert_eq!(rope.slice_line(1).to_string(), "two");
        assert_eq!(rope.lines_len(), 2);
    }
}
