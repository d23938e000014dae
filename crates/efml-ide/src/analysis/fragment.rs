use crate::extended_protocol::ExternalLanguage;

/// A snippet of HTML or TypeScript equivalent to what the user is editing,
/// with the cursor placed where the host should resolve the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub language: ExternalLanguage,
    pub source: String,
    pub position: lsp_types::Position,
}

pub(crate) struct FragmentBuilder {
    language: ExternalLanguage,
    source: String,
    cursor: Option<lsp_types::Position>,
}

impl FragmentBuilder {
    pub(crate) fn new(language: ExternalLanguage) -> Self {
        Self { language, source: String::new(), cursor: None }
    }

    pub(crate) fn text(mut self, text: &str) -> Self {
        self.source.push_str(text);
        self
    }

    pub(crate) fn cursor(mut self) -> Self {
        self.cursor = Some(self.end());
        self
    }

    pub(crate) fn finish(self) -> Fragment {
        let position = self.cursor.unwrap_or_else(|| self.end());
        Fragment { language: self.language, source: self.source, position }
    }

    fn end(&self) -> lsp_types::Position {
        let line = self.source.matches('\n').count() as u32;
        let last_line = self.source.rsplit('\n').next().unwrap_or_default();
        lsp_types::Position::new(line, last_line.encode_utf16().count() as u32)
    }
}
