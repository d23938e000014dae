use efml_errors::{LinedRange, Position};
use efml_parse::{LanguageVariant, SourceFile, parse_with_variant};
use efml_scanner::is_line_break;
use text_size::{TextRange, TextSize};

/// One edit sent by the editor. Without a range the whole text is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentChange {
    pub range: Option<LinedRange>,
    pub text: String,
}

impl ContentChange {
    pub fn full(text: impl Into<String>) -> Self {
        Self { range: None, text: text.into() }
    }

    pub fn replace(range: LinedRange, text: impl Into<String>) -> Self {
        Self { range: Some(range), text: text.into() }
    }
}

/// Where each line starts. Lines end where the scanner ends them: at LF, CR,
/// CRLF, U+2028 or U+2029.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineStarts {
    starts: Vec<TextSize>,
    len: TextSize,
}

impl LineStarts {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![TextSize::new(0)];
        let mut chars = text.char_indices().peekable();

        while let Some((offset, ch)) = chars.next() {
            if !is_line_break(ch) {
                continue;
            }
            let mut end = offset + ch.len_utf8();
            if ch == '\r' && chars.next_if(|&(_, next)| next == '\n').is_some() {
                end += 1;
            }
            starts.push(TextSize::new(end as u32));
        }

        Self { starts, len: TextSize::of(text) }
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Line `line` including its line break.
    pub fn line(&self, line: u32) -> Option<TextRange> {
        let start = *self.starts.get(line as usize)?;
        let end = self.starts.get(line as usize + 1).copied().unwrap_or(self.len);
        Some(TextRange::new(start, end))
    }

    /// The line `offset` falls on.
    pub fn line_of(&self, offset: TextSize) -> u32 {
        (self.starts.partition_point(|&start| start <= offset) - 1) as u32
    }
}

/// An open document: its text and the tree parsed from exactly that text.
#[derive(Debug)]
pub struct Document {
    uri: String,
    language_id: String,
    version: i32,
    text: String,
    lines: LineStarts,
    tree: SourceFile,
}

impl Document {
    pub fn create(
        uri: impl Into<String>,
        language_id: impl Into<String>,
        version: i32,
        text: String,
    ) -> Self {
        let lines = LineStarts::new(&text);
        let tree = parse_with_variant(&text, LanguageVariant::Html);
        Self { uri: uri.into(), language_id: language_id.into(), version, text, lines, tree }
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> &LineStarts {
        &self.lines
    }

    pub fn tree(&self) -> &SourceFile {
        &self.tree
    }

    /// Applies `changes` in order, each against the text left by the previous
    /// one, then parses the result from scratch.
    pub fn update(&mut self, changes: impl IntoIterator<Item = ContentChange>, version: i32) {
        for change in changes {
            match change.range {
                Some(range) => {
                    let range = self.text_range(range);
                    self.text.replace_range(std::ops::Range::<usize>::from(range), &change.text);
                }
                None => self.text = change.text,
            }
            self.lines = LineStarts::new(&self.text);
        }

        self.version = version;
        self.tree = parse_with_variant(&self.text, self.tree.variant());
        tracing::debug!(uri = %self.uri, version, "document reparsed");
    }

    /// Byte offset of a UTF-16 position. Positions past the end of a line
    /// stick to its end; lines past the end of the text stick to the end.
    pub fn offset(&self, position: Position) -> TextSize {
        let Some(line) = self.lines.line(position.line) else {
            return TextSize::of(&self.text);
        };
        let content = self.text[line].trim_end_matches(is_line_break);

        let mut column = 0;
        for (offset, ch) in content.char_indices() {
            if column >= position.character {
                return line.start() + TextSize::new(offset as u32);
            }
            column += ch.len_utf16() as u32;
        }

        line.start() + TextSize::of(content)
    }

    pub fn position(&self, offset: TextSize) -> Position {
        let offset = offset.min(TextSize::of(&self.text));
        let line = self.lines.line_of(offset);
        let line_start = self.lines.line(line).map_or(offset, TextRange::start);
        let prefix = &self.text[TextRange::new(line_start, offset)];
        Position::new(line, prefix.encode_utf16().count() as u32)
    }

    fn text_range(&self, range: LinedRange) -> TextRange {
        let start = self.offset(range.start);
        let end = self.offset(range.end);
        if start <= end { TextRange::new(start, end) } else { TextRange::new(end, start) }
    }
}

#[cfg(test)]
mod tests {
    use efml_syntax::SyntaxKind;

    use super::*;

    fn document(text: &str) -> Document {
        Document::create("file:///test.efml", "efml", 1, text.to_owned())
    }

    fn range(start: (u32, u32), end: (u32, u32)) -> LinedRange {
        LinedRange::new(Position::new(start.0, start.1), Position::new(end.0, end.1))
    }

    #[test]
    fn create_parses_eagerly() {
        let doc = document(">div\n  .hello\n");
        assert_eq!(doc.tree().text(), doc.text());
        assert_eq!(doc.tree().lines().len(), 1);
        assert_eq!(doc.version(), 1);
    }

    #[test]
    fn incremental_edit_reparses() {
        let mut doc = document(">div\n  .hello\n");
        doc.update([ContentChange::replace(range((0, 1), (0, 4)), "span")], 2);

        assert_eq!(doc.text(), ">span\n  .hello\n");
        assert_eq!(doc.version(), 2);
        assert_eq!(doc.tree().text(), doc.text());
        let tag = doc.tree().find(|node| node.kind() == SyntaxKind::STRING_LITERAL).unwrap();
        assert_eq!(doc.tree().node_text(tag), "span");
    }

    #[test]
    fn edits_apply_in_sequence() {
        let mut doc = document(">a\n");
        doc.update(
            [
                ContentChange::replace(range((1, 0), (1, 0)), "  .x\n"),
                ContentChange::replace(range((1, 3), (1, 4)), "yz"),
            ],
            2,
        );
        assert_eq!(doc.text(), ">a\n  .yz\n");
    }

    #[test]
    fn full_replacement() {
        let mut doc = document(">a\n");
        doc.update([ContentChange::full(">\n")], 3);
        assert_eq!(doc.text(), ">\n");
        assert_eq!(doc.tree().diagnostics().len(), 1);
    }

    #[test]
    fn positions_use_utf16_columns() {
        let doc = document(".é😀x\n.b");
        assert_eq!(doc.offset(Position::new(0, 4)), TextSize::new(7));
        assert_eq!(doc.position(TextSize::new(7)), Position::new(0, 4));
        assert_eq!(doc.offset(Position::new(1, 1)), TextSize::new(10));
    }

    #[test]
    fn lone_carriage_returns_end_lines() {
        let mut doc = document(">a\r.b");
        assert_eq!(doc.lines().len(), 2);
        assert_eq!(doc.offset(Position::new(1, 1)), TextSize::new(4));
        assert_eq!(doc.position(TextSize::new(4)), Position::new(1, 1));

        doc.update([ContentChange::replace(range((1, 1), (1, 2)), "c")], 2);
        assert_eq!(doc.text(), ">a\r.c");
        assert_eq!(doc.tree().text(), doc.text());
    }

    #[test]
    fn every_scanner_line_break_starts_a_line() {
        let lines = LineStarts::new("a\r\nb\nc\rd\u{2028}e\u{2029}f");
        let starts = (0..6).map(|line| lines.line(line).unwrap().start()).collect::<Vec<_>>();
        assert_eq!(starts, [0, 3, 5, 7, 11, 15].map(TextSize::new));
        assert_eq!(lines.line(6), None);
        assert_eq!(lines.line_of(TextSize::new(12)), 4);
    }

    #[test]
    fn out_of_range_positions_are_clamped() {
        let doc = document(">a\r\n>b");
        assert_eq!(doc.offset(Position::new(0, 50)), TextSize::new(2));
        assert_eq!(doc.offset(Position::new(9, 0)), TextSize::new(6));
    }
}
