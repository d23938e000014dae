mod arena;
mod node;
mod source_file;
mod syntax_kind;
mod syntax_set;
pub mod visitor;

pub use arena::{Arena, Idx};
pub use efml_errors::{Diagnostic, LinedRange, Position};
pub use node::{
    AttributeOrProperty, CommentLine, DottedChain, ElementDeclaration, EventHandler, LineTrivia,
    MountingPoint, Mustache, Node, NodeData, NodeId, NodePosition, Root, TagDescriptor,
    TemplateString, TextLine,
};
pub use source_file::{LanguageVariant, SourceFile};
pub use syntax_kind::SyntaxKind;
pub use syntax_set::SyntaxSet;
pub use text_size::{TextRange, TextSize};

#[cfg(test)]
mod tests;
