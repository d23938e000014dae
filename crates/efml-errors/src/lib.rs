mod messages;

use std::fmt::Display;

pub use annotate_snippets::Renderer;
use annotate_snippets::{Level, Snippet};
pub use messages::DiagnosticMessage;
pub use text_size::{TextRange, TextSize};

/// A zero-based line and UTF-16 column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LinedRange {
    pub start: Position,
    pub end: Position,
}

impl LinedRange {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub const fn empty(at: Position) -> Self {
        Self { start: at, end: at }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error = 1,
    Warning = 2,
    Information = 3,
    Hint = 4,
}

impl Severity {
    fn level(self) -> Level {
        match self {
            Self::Error => Level::Error,
            Self::Warning => Level::Warning,
            Self::Information => Level::Info,
            Self::Hint => Level::Help,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedInformation {
    pub range: TextRange,
    pub lined: LinedRange,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    message: String,
    code: u32,
    severity: Severity,
    range: TextRange,
    lined: LinedRange,
    related: Vec<RelatedInformation>,
}

impl Diagnostic {
    pub fn new(
        message: DiagnosticMessage,
        args: &[&dyn Display],
        range: TextRange,
        lined: LinedRange,
    ) -> Self {
        Self {
            message: message.format(args),
            code: message.code,
            severity: message.severity,
            range,
            lined,
            related: Vec::new(),
        }
    }

    pub fn with_related(
        mut self,
        range: TextRange,
        lined: LinedRange,
        message: impl Into<String>,
    ) -> Self {
        self.related.push(RelatedInformation { range, lined, message: message.into() });
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn range(&self) -> TextRange {
        self.range
    }

    pub fn lined(&self) -> LinedRange {
        self.lined
    }

    pub fn related(&self) -> &[RelatedInformation] {
        &self.related
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn render(&self, renderer: &Renderer, path: &str, text: &str) -> String {
        let level = self.severity.level();
        let id = format!("E{:04}", self.code);

        let mut snippet = Snippet::source(text)
            .origin(path)
            .annotation(level.span(self.range.into()).label("here"))
            .fold(true);
        for related in &self.related {
            snippet = snippet.annotation(Level::Note.span(related.range.into()).label(&related.message));
        }

        let message = level.title(&self.message).id(&id).snippet(snippet);
        renderer.render(message).to_string()
    }
}
