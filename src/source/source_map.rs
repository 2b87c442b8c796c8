/// Maps byte offsets to line/column positions within source text.
pub struct SourceMap {
    line_starts: Vec<usize>,
}

impl SourceMap {
    pub fn new(source: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.bytes().enumerate().filter(|&(_, b)| b == b'\n').map(|(i, _)| i + 1))
            .collect();
        SourceMap { line_starts }
    }

    /// Returns (line, col), both 1-based.
    pub fn lookup(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let col = offset.saturating_sub(self.line_starts[line]);
        (line + 1, col + 1)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Returns the full text of the given 1-based line number.
    pub fn line_text<'a>(&self, source: &'a str, line: usize) -> &'a str {
        if line == 0 || line > self.line_starts.len() {
            return "";
        }
        let start = self.line_starts[line - 1];
        let end = self.line_starts.get(line).copied().unwrap_or(source.len());
        source
            .get(start..end)
            .unwrap_or("")
            .trim_end_matches('\n')
            .trim_end_matches('\r')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_statement() {
        let src = "print 1 + 2;";
        let sm = SourceMap::new(src);
        assert_eq!(sm.lookup(0), (1, 1));
        assert_eq!(sm.lookup(6), (1, 7));
        assert_eq!(sm.line_count(), 1);
    }

    #[test]
    fn statements_on_separate_lines() {
        let src = "print 1;\nprint 2;\nprint 3;";
        let sm = SourceMap::new(src);
        assert_eq!(sm.lookup(8), (1, 9));
        assert_eq!(sm.lookup(9), (2, 1));
        assert_eq!(sm.lookup(18), (3, 1));
        assert_eq!(sm.line_text(src, 2), "print 2;");
    }

    #[test]
    fn line_text_out_of_bounds() {
        let src = "nil;";
        let sm = SourceMap::new(src);
        assert_eq!(sm.line_text(src, 0), "");
        assert_eq!(sm.line_text(src, 99), "");
    }

    #[test]
    fn crlf_and_trailing_newline() {
        let src = "true;\r\n";
        let sm = SourceMap::new(src);
        assert_eq!(sm.line_text(src, 1), "true;");
        assert_eq!(sm.line_text(src, 2), "");
        assert_eq!(sm.lookup(src.len()), (2, 1));
    }

    #[test]
    fn empty_source() {
        let sm = SourceMap::new("");
        assert_eq!(sm.lookup(0), (1, 1));
        assert_eq!(sm.line_text("", 1), "");
    }
}
