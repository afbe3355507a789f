use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Character-level formatting carried by a run of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineStyle {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
    #[serde(default)]
    pub strikethrough: bool,
}

impl InlineStyle {
    pub fn is_default(&self) -> bool {
        self == &Self::default()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StyleRun {
    pub(crate) len: usize,
    pub(crate) style: InlineStyle,
}

/// Run-length encoded style spans covering the whole buffer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StyleRuns {
    runs: Vec<StyleRun>,
}

impl StyleRuns {
    pub(crate) fn new(total_len: usize) -> Self {
        Self {
            runs: vec![StyleRun {
                len: total_len,
                style: InlineStyle::default(),
            }],
        }
    }

    pub(crate) fn total_len(&self) -> usize {
        self.runs.iter().map(|r| r.len).sum()
    }

    pub(crate) fn style_at(&self, mut offset: usize) -> InlineStyle {
        let total_len = self.total_len();
        if total_len == 0 {
            return InlineStyle::default();
        }
        if offset >= total_len {
            offset = total_len - 1;
        }

        let mut cursor = 0;
        for run in &self.runs {
            if offset < cursor + run.len {
                return run.style;
            }
            cursor += run.len;
        }

        self.runs.last().map(|r| r.style).unwrap_or_default()
    }

    pub(crate) fn delete_range(&mut self, range: Range<usize>) {
        if range.is_empty() {
            return;
        }

        let start_ix = self.split_at(range.start);
        let end_ix = self.split_at(range.end);
        if start_ix < end_ix {
            self.runs.drain(start_ix..end_ix);
        }
        self.normalize();
    }

    pub(crate) fn insert_range(&mut self, offset: usize, len: usize, style: InlineStyle) {
        if len == 0 {
            return;
        }
        let ix = self.split_at(offset);
        self.runs.insert(ix, StyleRun { len, style });
        self.normalize();
    }

    pub(crate) fn update_range(
        &mut self,
        range: Range<usize>,
        mut update: impl FnMut(&mut InlineStyle),
    ) {
        if range.is_empty() {
            return;
        }
        let start_ix = self.split_at(range.start);
        let end_ix = self.split_at(range.end);
        for run in &mut self.runs[start_ix..end_ix] {
            update(&mut run.style);
        }
        self.normalize();
    }

    pub(crate) fn iter_runs_in_range(
        &self,
        range: Range<usize>,
    ) -> impl Iterator<Item = (Range<usize>, &InlineStyle)> {
        let mut cursor = 0usize;
        self.runs.iter().filter_map(move |run| {
            let run_start = cursor;
            let run_end = cursor + run.len;
            cursor = run_end;

            let start = run_start.max(range.start);
            let end = run_end.min(range.end);
            if start < end {
                Some((start..end, &run.style))
            } else {
                None
            }
        })
    }

    /// Split off the tail starting at `offset` into its own run set.
    pub(crate) fn split_off(&mut self, offset: usize) -> StyleRuns {
        let total = self.total_len();
        let offset = offset.min(total);

        let tail_runs: Vec<StyleRun> = self
            .iter_runs_in_range(offset..total)
            .map(|(range, style)| StyleRun {
                len: range.end - range.start,
                style: *style,
            })
            .collect();

        self.delete_range(offset..total);

        let mut tail = StyleRuns { runs: tail_runs };
        if tail.runs.is_empty() {
            tail.runs.push(StyleRun {
                len: 0,
                style: InlineStyle::default(),
            });
        }
        tail.normalize();
        tail
    }

    pub(crate) fn append(&mut self, other: StyleRuns) {
        self.runs.extend(other.runs);
        self.normalize();
    }

    pub(crate) fn any_non_default(&self) -> bool {
        self.runs
            .iter()
            .any(|run| run.len > 0 && !run.style.is_default())
    }

    fn split_at(&mut self, offset: usize) -> usize {
        let offset = offset.min(self.total_len());

        let mut cursor = 0usize;
        for ix in 0..self.runs.len() {
            let run_len = self.runs[ix].len;
            if offset == cursor {
                return ix;
            }
            if offset < cursor + run_len {
                let left_len = offset - cursor;
                let right_len = run_len - left_len;
                let style = self.runs[ix].style;
                self.runs[ix].len = left_len;
                self.runs.insert(
                    ix + 1,
                    StyleRun {
                        len: right_len,
                        style,
                    },
                );
                return ix + 1;
            }
            cursor += run_len;
        }
        self.runs.len()
    }

    fn normalize(&mut self) {
        let keep_zero = self.runs.len() == 1;
        self.runs.retain(|r| r.len > 0 || keep_zero);

        if self.runs.is_empty() {
            self.runs.push(StyleRun {
                len: 0,
                style: InlineStyle::default(),
            });
            return;
        }

        let mut merged: Vec<StyleRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            if let Some(prev) = merged.last_mut() {
                if prev.style == run.style {
                    prev.len += run.len;
                    continue;
                }
            }
            merged.push(run);
        }

        self.runs = merged;
        if self.runs.is_empty() {
            self.runs.push(StyleRun {
                len: 0,
                style: InlineStyle::default(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> InlineStyle {
        InlineStyle {
            bold: true,
            ..Default::default()
        }
    }

    #[test]
    fn update_range_splits_runs() {
        let mut runs = StyleRuns::new(10);
        runs.update_range(2..5, |s| s.bold = true);

        assert_eq!(runs.style_at(1), InlineStyle::default());
        assert_eq!(runs.style_at(2), bold());
        assert_eq!(runs.style_at(4), bold());
        assert_eq!(runs.style_at(5), InlineStyle::default());
        assert_eq!(runs.total_len(), 10);
    }

    #[test]
    fn insert_and_delete_keep_total_len() {
        let mut runs = StyleRuns::new(4);
        runs.insert_range(2, 3, bold());
        assert_eq!(runs.total_len(), 7);
        assert_eq!(runs.style_at(3), bold());

        runs.delete_range(2..5);
        assert_eq!(runs.total_len(), 4);
        assert!(!runs.any_non_default());
    }

    #[test]
    fn split_off_rebases_tail() {
        let mut runs = StyleRuns::new(6);
        runs.update_range(4..6, |s| s.italic = true);

        let tail = runs.split_off(4);
        assert_eq!(runs.total_len(), 4);
        assert_eq!(tail.total_len(), 2);
        assert!(tail.style_at(0).italic);
    }
}
