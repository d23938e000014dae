use efml_syntax::SyntaxKind::{EOF, NEW_LINE, PERCENT, PLUS, WHITESPACE};
use efml_syntax::{NodeData, NodeId, SourceFile};
use tokio_util::sync::CancellationToken;

use super::{check_cancelled, trivia_width};
use crate::ProtocolFault;

/// The semantic token legend. The discriminant is the index sent on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticRole {
    Comment,
    String,
    ElementStart,
    Class,
    Element,
    Reference,
    MustacheStart,
    MustacheEnd,
    /// Code in another language, such as a script expression.
    ExoticExpression,
    Operator,
    MountingPoint,
    ListMountingPoint,
    Event,
    Modifier,
    Property,
    Attribute,
}

impl SemanticRole {
    pub const ALL: [Self; 16] = [
        Self::Comment,
        Self::String,
        Self::ElementStart,
        Self::Class,
        Self::Element,
        Self::Reference,
        Self::MustacheStart,
        Self::MustacheEnd,
        Self::ExoticExpression,
        Self::Operator,
        Self::MountingPoint,
        Self::ListMountingPoint,
        Self::Event,
        Self::Modifier,
        Self::Property,
        Self::Attribute,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::String => "string",
            Self::ElementStart => "elementStart",
            Self::Class => "class",
            Self::Element => "element",
            Self::Reference => "reference",
            Self::MustacheStart => "mustacheStart",
            Self::MustacheEnd => "mustacheEnd",
            Self::ExoticExpression => "exoticExpression",
            Self::Operator => "operator",
            Self::MountingPoint => "mountingPoint",
            Self::ListMountingPoint => "listMountingPoint",
            Self::Event => "event",
            Self::Modifier => "modifier",
            Self::Property => "property",
            Self::Attribute => "attribute",
        }
    }

    pub fn legend() -> lsp_types::SemanticTokensLegend {
        lsp_types::SemanticTokensLegend {
            token_types: Self::ALL
                .iter()
                .map(|role| lsp_types::SemanticTokenType::new(role.name()))
                .collect(),
            token_modifiers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AbsoluteToken {
    pub(crate) line: u32,
    pub(crate) start: u32,
    pub(crate) len: u32,
    pub(crate) role: SemanticRole,
}

/// Every highlighted leaf in document order.
pub(crate) fn semantic_tokens(
    file: &SourceFile,
    cancel: &CancellationToken,
) -> Result<Vec<AbsoluteToken>, ProtocolFault> {
    let mut emitter = Emitter { file, cancel, tokens: Vec::new() };
    emitter.lines(file.lines())?;
    Ok(emitter.tokens)
}

/// Relative encoding: the column is relative to the previous token only on
/// the same line.
pub(crate) fn encode(tokens: &[AbsoluteToken]) -> Vec<lsp_types::SemanticToken> {
    let mut previous_line = 0;
    let mut previous_start = 0;

    tokens
        .iter()
        .map(|token| {
            let delta_line = token.line - previous_line;
            let delta_start =
                if delta_line == 0 { token.start - previous_start } else { token.start };
            previous_line = token.line;
            previous_start = token.start;

            lsp_types::SemanticToken {
                delta_line,
                delta_start,
                length: token.len,
                token_type: token.role as u32,
                token_modifiers_bitset: 0,
            }
        })
        .collect()
}

struct Emitter<'a> {
    file: &'a SourceFile,
    cancel: &'a CancellationToken,
    tokens: Vec<AbsoluteToken>,
}

impl Emitter<'_> {
    fn lines(&mut self, lines: &[NodeId]) -> Result<(), ProtocolFault> {
        for &line in lines {
            self.line(line)?;
        }
        Ok(())
    }

    fn line(&mut self, id: NodeId) -> Result<(), ProtocolFault> {
        check_cancelled(self.cancel)?;

        let file = self.file;
        match &file[id].data {
            NodeData::CommentLine(line) => {
                if let Some(comment) = line.comment {
                    self.leaf(comment, SemanticRole::Comment);
                }
            }
            NodeData::ElementDeclaration(element) => {
                self.tag(element.tag);
                self.lines(&element.children)?;
            }
            NodeData::AttributeOrProperty(line) => {
                let role = match file[line.start].kind() {
                    PERCENT => SemanticRole::Property,
                    _ => SemanticRole::Attribute,
                };
                self.leaf(line.start, role);
                self.leaf(line.binding, role);
                if let Some((at, event)) = line.trigger_event {
                    self.leaf(at, SemanticRole::Event);
                    self.leaf(event, SemanticRole::Event);
                }
                self.initializer(line.initializer);
            }
            NodeData::EventHandler(line) => {
                self.leaf(line.at, SemanticRole::Event);
                self.leaf(line.event, SemanticRole::Event);
                if let Some((dot, chain)) = line.modifiers {
                    self.leaf(dot, SemanticRole::Operator);
                    self.chain(chain, SemanticRole::Modifier);
                }
                self.leaf(line.equals, SemanticRole::Operator);
                self.leaf(line.handler, SemanticRole::ExoticExpression);
                self.initializer(line.parameter);
            }
            NodeData::TextLine(line) => {
                self.leaf(line.sigil, SemanticRole::Operator);
                self.template(line.content, SemanticRole::String);
            }
            NodeData::MountingPoint(line) => {
                let role = match file[line.sigil].kind() {
                    PLUS => SemanticRole::ListMountingPoint,
                    _ => SemanticRole::MountingPoint,
                };
                self.leaf(line.sigil, role);
                self.leaf(line.identifier, role);
            }
            _ => {}
        }

        Ok(())
    }

    fn tag(&mut self, id: NodeId) {
        let file = self.file;
        let NodeData::TagDescriptor(tag) = &file[id].data else { return };
        self.leaf(tag.start, SemanticRole::ElementStart);
        self.leaf(tag.name, SemanticRole::Element);
        if let Some((dot, chain)) = tag.attributes {
            self.leaf(dot, SemanticRole::Operator);
            self.chain(chain, SemanticRole::Class);
        }
        if let Some((hash, name)) = tag.reference {
            self.leaf(hash, SemanticRole::Reference);
            self.leaf(name, SemanticRole::Reference);
        }
    }

    /// `= value` or `: parameter`.
    fn initializer(&mut self, initializer: Option<(NodeId, NodeId)>) {
        if let Some((operator, value)) = initializer {
            self.leaf(operator, SemanticRole::Operator);
            self.template(value, SemanticRole::String);
        }
    }

    /// Segments take `role`; the dots between them are operators.
    fn chain(&mut self, id: NodeId, role: SemanticRole) {
        let file = self.file;
        let NodeData::DottedChain(chain) = &file[id].data else { return };
        for (index, &item) in chain.items.iter().enumerate() {
            if index % 2 == 0 {
                self.template(item, role);
            } else {
                self.leaf(item, SemanticRole::Operator);
            }
        }
    }

    /// A template, a mustache or a plain literal standing for text.
    fn template(&mut self, id: NodeId, role: SemanticRole) {
        let file = self.file;
        match &file[id].data {
            NodeData::TemplateString(template) => {
                for &part in &template.parts {
                    self.template(part, role);
                }
            }
            NodeData::Mustache(mustache) => {
                self.leaf(mustache.start, SemanticRole::MustacheStart);
                self.chain(mustache.path, SemanticRole::ExoticExpression);
                if let Some((eq, default)) = mustache.default {
                    self.leaf(eq, SemanticRole::Operator);
                    self.leaf(default, SemanticRole::String);
                }
                self.leaf(mustache.end, SemanticRole::MustacheEnd);
            }
            _ => self.leaf(id, role),
        }
    }

    fn leaf(&mut self, id: NodeId, role: SemanticRole) {
        let node = &self.file[id];
        if node.missing
            || matches!(node.kind(), WHITESPACE | NEW_LINE | EOF)
            || node.position.crosses_line
        {
            return;
        }

        let trivia = trivia_width(self.file, id).min(node.position.len);
        let len = node.position.len - trivia;
        if len == 0 {
            return;
        }

        self.tokens.push(AbsoluteToken {
            line: node.position.line,
            start: node.position.start_character + trivia,
            len,
            role,
        });
    }
}
