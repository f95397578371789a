//! Byte offset to line/column mapping

/// Line start table for one source text
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self { source, line_starts }
    }

    /// 1-based line and column (in characters) of a byte offset.
    /// Offsets past the end clamp to the end of input.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let mut offset = offset.min(self.source.len());
        while !self.source.is_char_boundary(offset) {
            offset -= 1;
        }
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let start = self.line_starts[line];
        let column = self.source[start..offset].chars().count() + 1;
        (line + 1, column)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let index = LineIndex::new("ROCK R1\nDEPOSITION D1\n");
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(5), (1, 6));
        assert_eq!(index.line_col(8), (2, 1));
        assert_eq!(index.line_col(19), (2, 12));
        assert_eq!(index.line_count(), 3);
    }

    #[test]
    fn test_columns_count_characters() {
        let index = LineIndex::new("ROCK R1 [ name: \"Grès\"; x ]");
        // byte offset of `;` is one past the character count because `è` is two bytes
        let semicolon = "ROCK R1 [ name: \"Grès\"".len();
        assert_eq!(index.line_col(semicolon), (1, 23));
    }

    #[test]
    fn test_offset_past_end_clamps() {
        let index = LineIndex::new("EROSION E1 [");
        assert_eq!(index.line_col(100), (1, 13));
    }
}
