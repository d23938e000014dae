use efml_errors::Position;
use text_size::TextRange;

use crate::SyntaxKind;
use crate::arena::Idx;

pub type NodeId = Idx<Node>;

/// Where a node sits in the source.
///
/// `range` is a byte range including leading trivia. `line` and
/// `start_character` locate the first byte. `character` is the trailing UTF-16
/// column; when building the node consumed a line break the trailing column is
/// unknown and `character` equals `len` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePosition {
    pub range: TextRange,
    pub line: u32,
    pub start_character: u32,
    pub character: u32,
    pub len: u32,
    pub crosses_line: bool,
}

impl NodePosition {
    pub fn start(&self) -> Position {
        Position::new(self.line, self.start_character)
    }

    /// The column just past the node on its first line.
    pub fn end_character(&self) -> u32 {
        if self.crosses_line { self.start_character } else { self.character }
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub position: NodePosition,
    /// Synthesized by error recovery; holds no source content.
    pub missing: bool,
    pub parent: Option<NodeId>,
    pub data: NodeData,
}

impl Node {
    pub fn kind(&self) -> SyntaxKind {
        self.data.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Token(SyntaxKind),
    StringLiteral,
    Root(Root),
    CommentLine(CommentLine),
    ElementDeclaration(ElementDeclaration),
    AttributeOrProperty(AttributeOrProperty),
    EventHandler(EventHandler),
    TextLine(TextLine),
    MountingPoint(MountingPoint),
    TagDescriptor(TagDescriptor),
    TemplateString(TemplateString),
    Mustache(Mustache),
    DottedChain(DottedChain),
}

impl NodeData {
    pub fn kind(&self) -> SyntaxKind {
        match self {
            Self::Token(kind) => *kind,
            Self::StringLiteral => SyntaxKind::STRING_LITERAL,
            Self::Root(_) => SyntaxKind::SOURCE_FILE,
            Self::CommentLine(_) => SyntaxKind::COMMENT_LINE,
            Self::ElementDeclaration(_) => SyntaxKind::ELEMENT_DECLARATION,
            Self::AttributeOrProperty(_) => SyntaxKind::ATTRIBUTE_OR_PROPERTY,
            Self::EventHandler(_) => SyntaxKind::EVENT_HANDLER,
            Self::TextLine(_) => SyntaxKind::TEXT_LINE,
            Self::MountingPoint(_) => SyntaxKind::MOUNTING_POINT,
            Self::TagDescriptor(_) => SyntaxKind::TAG_DESCRIPTOR,
            Self::TemplateString(_) => SyntaxKind::TEMPLATE_STRING,
            Self::Mustache(_) => SyntaxKind::MUSTACHE,
            Self::DottedChain(_) => SyntaxKind::DOTTED_CHAIN,
        }
    }

    /// The indentation and line ending shared by every line kind.
    pub fn line_trivia(&self) -> Option<&LineTrivia> {
        Some(match self {
            Self::CommentLine(line) => &line.line,
            Self::ElementDeclaration(line) => &line.line,
            Self::AttributeOrProperty(line) => &line.line,
            Self::EventHandler(line) => &line.line,
            Self::TextLine(line) => &line.line,
            Self::MountingPoint(line) => &line.line,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Root {
    pub children: Vec<NodeId>,
    pub end_of_file: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineTrivia {
    pub indent: Option<NodeId>,
    pub indent_level: u32,
    /// A line break, or the end-of-file token on the last line.
    pub end_of_line: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLine {
    pub line: LineTrivia,
    /// `None` for a whitespace-only last line.
    pub comment: Option<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDeclaration {
    pub line: LineTrivia,
    pub tag: NodeId,
    pub children: Vec<NodeId>,
}

/// `#binding = value` declares an attribute, `%binding = value` a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeOrProperty {
    pub line: LineTrivia,
    pub start: NodeId,
    pub binding: NodeId,
    /// `@event` after a property binding: the event that writes it back.
    pub trigger_event: Option<(NodeId, NodeId)>,
    pub initializer: Option<(NodeId, NodeId)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventHandler {
    pub line: LineTrivia,
    pub at: NodeId,
    pub event: NodeId,
    pub modifiers: Option<(NodeId, NodeId)>,
    pub equals: NodeId,
    pub handler: NodeId,
    pub parameter: Option<(NodeId, NodeId)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLine {
    pub line: LineTrivia,
    pub sigil: NodeId,
    pub content: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountingPoint {
    pub line: LineTrivia,
    pub sigil: NodeId,
    pub identifier: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDescriptor {
    pub start: NodeId,
    pub name: NodeId,
    pub attributes: Option<(NodeId, NodeId)>,
    pub reference: Option<(NodeId, NodeId)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateString {
    pub parts: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mustache {
    pub start: NodeId,
    pub path: NodeId,
    pub default: Option<(NodeId, NodeId)>,
    pub end: NodeId,
}

/// `T (. T)*`, stored flat with the dots in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DottedChain {
    pub items: Vec<NodeId>,
}

impl DottedChain {
    pub fn segments(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.items.iter().step_by(2).copied()
    }
}
