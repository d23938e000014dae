use text_size::TextSize;

pub(crate) const EOF_CHAR: char = '\0';

/// A point in the text: byte offset, zero-based line, and UTF-16 columns both
/// within the line and from the start of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Location {
    pub offset: TextSize,
    pub line: u32,
    pub character: u32,
    pub utf16: u32,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'t> {
    text: &'t str,
    location: Location,
}

impl<'t> Cursor<'t> {
    pub(crate) fn new(text: &'t str) -> Self {
        Self { text, location: Location::default() }
    }

    pub(crate) fn text(&self) -> &'t str {
        self.text
    }

    pub(crate) fn location(&self) -> Location {
        self.location
    }

    pub(crate) fn offset(&self) -> TextSize {
        self.location.offset
    }

    fn rest(&self) -> &'t str {
        &self.text[usize::from(self.location.offset)..]
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.rest().is_empty()
    }

    pub(crate) fn peek(&self) -> char {
        self.rest().chars().next().unwrap_or(EOF_CHAR)
    }

    pub(crate) fn second(&self) -> char {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next().unwrap_or(EOF_CHAR)
    }

    pub(crate) fn advance(&mut self) -> char {
        let Some(ch) = self.rest().chars().next() else {
            return EOF_CHAR;
        };

        let width = ch.len_utf16() as u32;
        self.location.offset += TextSize::of(ch);
        self.location.character += width;
        self.location.utf16 += width;
        ch
    }

    pub(crate) fn advance_while(&mut self, f: impl Fn(char) -> bool) {
        while !self.is_eof() && f(self.peek()) {
            self.advance();
        }
    }

    /// Moves the column bookkeeping to the start of the next line; the line
    /// break itself must already have been consumed.
    pub(crate) fn new_line(&mut self) {
        self.location.line += 1;
        self.location.character = 0;
    }
}
