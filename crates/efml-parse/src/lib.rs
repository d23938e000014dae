mod grammar;
mod parser;
#[cfg(test)]
mod tests;

pub use efml_syntax::{LanguageVariant, SourceFile};

/// Parses `text` as an HTML-flavoured efml document.
///
/// Malformed input never fails: problems are reported through
/// [`SourceFile::diagnostics`] and papered over with missing nodes.
///
/// # Panics
///
/// Panics when the grammar and the list driver fall out of step, which is a
/// bug in this crate rather than in the input.
pub fn parse(text: &str) -> SourceFile {
    parse_with_variant(text, LanguageVariant::Html)
}

pub fn parse_with_variant(text: &str, variant: LanguageVariant) -> SourceFile {
    let mut parser = parser::Parser::new(text);
    let root = grammar::source_file(&mut parser);
    parser.finish(root, variant)
}
