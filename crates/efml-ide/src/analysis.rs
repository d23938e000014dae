mod completion;
mod document_symbols;
mod folding_ranges;
pub(crate) mod fragment;
mod hover;
mod inlay_hints;
mod node_at;
mod semantic_tokens;

pub(crate) use completion::is_cacheable_tag;
pub use completion::{CatalogueEntry, EVENT_DESCRIPTORS, ForwardCompletion};
use efml_inputs::{ContentChange, Document};
use efml_scanner::is_same_line_whitespace;
use efml_syntax::{LanguageVariant, NodeData, NodeId, SourceFile};
pub use folding_ranges::FoldKind;
use folding_ranges::FoldingMemo;
pub use fragment::Fragment;
pub use hover::HoverAction;
pub use inlay_hints::key_name;
pub use semantic_tokens::SemanticRole;
use tokio_util::sync::CancellationToken;

use crate::ProtocolFault;
use crate::extended_protocol::InlayHint;

/// An open document together with everything derived from its current tree.
pub struct Analysis {
    document: Document,
    folds: FoldingMemo,
}

impl Analysis {
    pub fn new(document: Document) -> Self {
        Self { document, folds: FoldingMemo::default() }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn tree(&self) -> &SourceFile {
        self.document.tree()
    }

    /// Memoized results belong to the old tree and are dropped with it.
    pub fn update(&mut self, changes: impl IntoIterator<Item = ContentChange>, version: i32) {
        self.document.update(changes, version);
        self.folds.clear();
    }

    pub fn folding_ranges(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Vec<lsp_types::FoldingRange>, ProtocolFault> {
        let folds = folding_ranges::folding_ranges(self.document.tree(), &mut self.folds, cancel)?;
        Ok(folds.into_iter().map(Into::into).collect())
    }

    pub fn semantic_tokens(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<lsp_types::SemanticToken>, ProtocolFault> {
        let tokens = semantic_tokens::semantic_tokens(self.tree(), cancel)?;
        Ok(semantic_tokens::encode(&tokens))
    }

    pub fn document_symbols(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<lsp_types::DocumentSymbol>, ProtocolFault> {
        document_symbols::document_symbols(self.tree(), cancel)
    }

    /// Completions answered from the tree alone.
    pub fn completion(&self, position: lsp_types::Position) -> Vec<lsp_types::CompletionItem> {
        if !self.is_html() {
            return Vec::new();
        }
        completion::event_modifier_completions(self.tree(), position)
    }

    /// Completions that only the host's own language services can answer.
    pub fn forward_completion(&self, position: lsp_types::Position) -> Option<ForwardCompletion> {
        if !self.is_html() {
            return None;
        }
        completion::forward_completion(self.tree(), position)
    }

    pub fn hover(&self, position: lsp_types::Position) -> Option<HoverAction> {
        hover::hover(self.tree(), position)
    }

    pub fn inlay_hints(&self) -> Vec<InlayHint> {
        inlay_hints::inlay_hints(self.tree())
    }

    fn is_html(&self) -> bool {
        self.tree().variant() == LanguageVariant::Html
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<(), ProtocolFault> {
    if cancel.is_cancelled() { Err(ProtocolFault::RequestCancelled) } else { Ok(()) }
}

/// UTF-16 width of the whitespace a leaf carries in front of its content.
fn trivia_width(file: &SourceFile, id: NodeId) -> u32 {
    file.node_text(id)
        .chars()
        .take_while(|&ch| is_same_line_whitespace(ch))
        .map(|ch| ch.len_utf16() as u32)
        .sum()
}

/// Range of a leaf without its leading trivia.
fn content_range(file: &SourceFile, id: NodeId) -> lsp_types::Range {
    let position = &file[id].position;
    let start = position.start_character + trivia_width(file, id).min(position.len);
    lsp_types::Range::new(
        lsp_types::Position::new(position.line, start),
        lsp_types::Position::new(position.line, position.end_character().max(start)),
    )
}

fn leaf_text(file: &SourceFile, id: NodeId) -> &str {
    file.node_text(id).trim_matches(is_same_line_whitespace)
}

/// Tag name of the element `line` is nested in.
fn enclosing_tag(file: &SourceFile, line: NodeId) -> Option<&str> {
    let parent = file.parent(line)?;
    let NodeData::ElementDeclaration(element) = &file[parent].data else {
        return None;
    };
    let NodeData::TagDescriptor(tag) = &file[element.tag].data else {
        return None;
    };
    Some(leaf_text(file, tag.name)).filter(|name| !name.is_empty())
}

/// Like [`enclosing_tag`], but only for built-in elements. Custom components
/// start with an uppercase letter.
fn enclosing_native_tag(file: &SourceFile, line: NodeId) -> Option<&str> {
    enclosing_tag(file, line).filter(|tag| is_native_tag(tag))
}

fn is_native_tag(tag: &str) -> bool {
    !tag.starts_with(char::is_uppercase)
}
