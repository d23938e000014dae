mod classes;
mod cursor;

use classes::{can_start_line, is_token_start, single_char_token};
pub use classes::{is_line_break, is_same_line_whitespace};
pub use cursor::Location;
use cursor::Cursor;
pub use efml_syntax::SyntaxKind;
use efml_syntax::SyntaxKind::*;
use text_size::{TextRange, TextSize};

#[derive(Debug, Clone, Copy)]
struct State<'t> {
    cursor: Cursor<'t>,
    token: SyntaxKind,
    previous: SyntaxKind,
    trivia_start: Location,
    token_start: TextSize,
}

/// A snapshot of the scanner, restored with [`Scanner::rewind`].
#[derive(Debug, Clone, Copy)]
pub struct Checkpoint<'t>(State<'t>);

/// Splits efml source into tokens one at a time.
///
/// Whitespace in the middle of a line is absorbed as leading trivia of the next
/// token; whitespace at column 0 is the indentation token.
pub struct Scanner<'t> {
    state: State<'t>,
}

impl<'t> Scanner<'t> {
    pub fn new(text: &'t str) -> Self {
        Self {
            state: State {
                cursor: Cursor::new(text),
                token: UNKNOWN,
                previous: UNKNOWN,
                trivia_start: Location::default(),
                token_start: TextSize::new(0),
            },
        }
    }

    pub fn text(&self) -> &'t str {
        self.state.cursor.text()
    }

    pub fn token(&self) -> SyntaxKind {
        self.state.token
    }

    /// Where the current token's leading trivia starts.
    pub fn trivia_start(&self) -> Location {
        self.state.trivia_start
    }

    /// Just past the current token.
    pub fn token_end(&self) -> Location {
        self.state.cursor.location()
    }

    pub fn token_range(&self) -> TextRange {
        TextRange::new(self.state.token_start, self.state.cursor.offset())
    }

    /// The current token without its leading trivia.
    pub fn token_text(&self) -> &'t str {
        &self.text()[self.token_range()]
    }

    /// UTF-16 width of the current token including trivia.
    pub fn token_width(&self) -> u32 {
        self.token_end().utf16 - self.trivia_start().utf16
    }

    pub fn checkpoint(&self) -> Checkpoint<'t> {
        Checkpoint(self.state)
    }

    pub fn rewind(&mut self, checkpoint: Checkpoint<'t>) {
        self.state = checkpoint.0;
    }

    /// Runs `f` and restores the scanner afterwards, whatever `f` did.
    pub fn look_ahead<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        let checkpoint = self.checkpoint();
        let result = f(self);
        self.rewind(checkpoint);
        result
    }

    /// Runs `f`, keeping its progress only if it returns `Some`.
    pub fn try_scan<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let checkpoint = self.checkpoint();
        let result = f(self);
        if result.is_none() {
            self.rewind(checkpoint);
        }
        result
    }

    /// Indentation width of the next line with content, without consuming
    /// anything. Blank lines are skipped; the end of input counts as column 0.
    pub fn look_ahead_indent_level(&mut self) -> u32 {
        self.look_ahead(|scanner| {
            loop {
                let level = if scanner.token() == WHITESPACE {
                    let width = scanner.token_width();
                    scanner.scan();
                    width
                } else {
                    0
                };

                match scanner.token() {
                    COMMENT if scanner.token_range().is_empty() => {}
                    EOF => return 0,
                    _ => return level,
                }

                if scanner.scan() != NEW_LINE {
                    return 0;
                }
                scanner.scan();
            }
        })
    }

    pub fn scan(&mut self) -> SyntaxKind {
        let token = self.next_kind();
        self.state.token = token;
        token
    }

    fn next_kind(&mut self) -> SyntaxKind {
        self.state.previous = self.state.token;
        self.state.trivia_start = self.state.cursor.location();
        self.state.token_start = self.state.trivia_start.offset;

        let cursor = &mut self.state.cursor;
        if is_same_line_whitespace(cursor.peek()) {
            let at_line_start = cursor.location().character == 0;
            cursor.advance_while(is_same_line_whitespace);
            if at_line_start {
                return WHITESPACE;
            }
            self.state.token_start = cursor.offset();
        }

        if cursor.is_eof() {
            return EOF;
        }

        let first = cursor.peek();
        if let Some(kind) = single_char_token(first) {
            cursor.advance();
            return kind;
        }

        if matches!(self.state.previous, UNKNOWN | NEW_LINE | WHITESPACE)
            && self.try_scan(Self::comment_line).is_some()
        {
            return COMMENT;
        }

        let cursor = &mut self.state.cursor;
        match (first, cursor.second()) {
            ('{', '{') => {
                cursor.advance();
                cursor.advance();
                MUSTACHE_START
            }
            ('}', '}') => {
                cursor.advance();
                cursor.advance();
                MUSTACHE_END
            }
            _ if is_line_break(first) => {
                cursor.advance();
                if first == '\r' && cursor.peek() == '\n' {
                    cursor.advance();
                }
                cursor.new_line();
                NEW_LINE
            }
            _ => self.text_fragment(),
        }
    }

    /// Succeeds when the rest of the line starts with something other than a
    /// line sigil.
    fn comment_line(&mut self) -> Option<()> {
        let cursor = &mut self.state.cursor;
        let mut in_comment = false;

        loop {
            if cursor.is_eof() || is_line_break(cursor.peek()) {
                return Some(());
            }

            let ch = cursor.peek();
            if !in_comment {
                if can_start_line(ch) {
                    return None;
                }
                in_comment = !is_same_line_whitespace(ch);
            }
            cursor.advance();
        }
    }

    fn text_fragment(&mut self) -> SyntaxKind {
        loop {
            self.state.cursor.advance();

            if is_same_line_whitespace(self.state.cursor.peek()) {
                let kept = self.try_scan(|scanner| {
                    let cursor = &mut scanner.state.cursor;
                    cursor.advance_while(is_same_line_whitespace);
                    (!is_token_start(cursor.peek())).then_some(())
                });

                if kept.is_none() {
                    return TEXT_FRAGMENT;
                }
            }

            let cursor = &self.state.cursor;
            if cursor.is_eof() || is_token_start(cursor.peek()) {
                return TEXT_FRAGMENT;
            }
        }
    }
}
