use std::fmt::Display;

use drop_bomb::DropBomb;
use efml_errors::{Diagnostic, DiagnosticMessage, LinedRange, Position};
use efml_scanner::{Location, Scanner};
use efml_syntax::{
    Arena, LanguageVariant, Node, NodeData, NodeId, NodePosition, SourceFile, SyntaxKind,
    SyntaxSet, visitor,
};
use text_size::{TextRange, TextSize};

pub(crate) struct Parser<'t> {
    scanner: Scanner<'t>,
    nodes: Arena<Node>,
    diagnostics: Vec<Diagnostic>,
}

impl<'t> Parser<'t> {
    pub(crate) fn new(text: &'t str) -> Self {
        let mut scanner = Scanner::new(text);
        scanner.scan();
        Self { scanner, nodes: Arena::new(), diagnostics: Vec::new() }
    }

    pub(crate) fn current(&self) -> SyntaxKind {
        self.scanner.token()
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_any(&self, set: SyntaxSet) -> bool {
        set.contains(self.current())
    }

    /// Start of the current token's leading trivia.
    pub(crate) fn offset(&self) -> TextSize {
        self.scanner.trivia_start().offset
    }

    pub(crate) fn current_is_empty(&self) -> bool {
        self.scanner.token_range().is_empty()
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub(crate) fn bump(&mut self) {
        self.scanner.scan();
    }

    pub(crate) fn start(&mut self) -> Marker {
        Marker::new(self.scanner.trivia_start())
    }

    /// Turns the current token into a leaf node.
    pub(crate) fn token(&mut self) -> NodeId {
        let kind = self.current();
        let m = self.start();
        self.bump();
        m.complete(self, NodeData::Token(kind))
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> Option<NodeId> {
        self.at(kind).then(|| self.token())
    }

    pub(crate) fn expect(&mut self, kind: SyntaxKind) -> NodeId {
        if self.at(kind) {
            return self.token();
        }

        self.error(DiagnosticMessage::TOKEN_EXPECTED, &[&kind]);
        self.missing(NodeData::Token(kind))
    }

    pub(crate) fn missing(&mut self, data: NodeData) -> NodeId {
        let m = self.start();
        m.complete_missing(self, data)
    }

    /// Reports `message` against the current token.
    pub(crate) fn error(&mut self, message: DiagnosticMessage, args: &[&dyn Display]) {
        let start = self.scanner.trivia_start();
        let end = self.scanner.token_end();
        let lined_end = if end.line == start.line { position(end) } else { position(start) };

        self.diagnostics.push(Diagnostic::new(
            message,
            args,
            TextRange::new(start.offset, end.offset),
            LinedRange::new(position(start), lined_end),
        ));
    }

    pub(crate) fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn node_ranges(&self, id: NodeId) -> (TextRange, LinedRange) {
        let position = &self.nodes[id].position;
        let start = position.start();
        let end = Position::new(position.line, position.end_character());
        (position.range, LinedRange::new(start, end))
    }

    pub(crate) fn look_ahead_indent_level(&mut self) -> u32 {
        self.scanner.look_ahead_indent_level()
    }

    /// Runs `f` speculatively. On `None` the scanner, the nodes and the
    /// diagnostics are restored to where they were.
    pub(crate) fn try_parse<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let scanner = self.scanner.checkpoint();
        let nodes = self.nodes.len();
        let diagnostics = self.diagnostics.len();

        let result = f(self);
        if result.is_none() {
            self.scanner.rewind(scanner);
            self.nodes.truncate(nodes);
            self.diagnostics.truncate(diagnostics);
        }
        result
    }

    /// Parses elements while `more` holds. Every element must be produced and
    /// must consume input; anything else means the grammar and its driver
    /// disagree.
    pub(crate) fn node_list(
        &mut self,
        mut more: impl FnMut(&mut Self) -> bool,
        mut element: impl FnMut(&mut Self) -> Option<NodeId>,
    ) -> Vec<NodeId> {
        let mut nodes = Vec::new();

        while more(self) {
            let before = self.offset();
            let Some(node) = element(self) else {
                invariant_violation("list continuation holds but no element was produced");
            };
            if self.offset() == before {
                invariant_violation("list element consumed no input");
            }
            nodes.push(node);
        }

        nodes
    }

    pub(crate) fn finish(self, root: NodeId, variant: LanguageVariant) -> SourceFile {
        let Parser { scanner, nodes, diagnostics } = self;
        SourceFile::new(scanner.text().to_owned(), variant, nodes, root, diagnostics)
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = self.nodes.alloc(node);

        let mut children = Vec::new();
        visitor::for_each_child(&self.nodes[id].data, |child| {
            children.push(child);
            None::<()>
        });
        for child in children {
            self.nodes[child].parent = Some(id);
        }

        id
    }
}

#[track_caller]
#[cold]
pub(crate) fn invariant_violation(what: &str) -> ! {
    panic!("parser invariant violated: {what}")
}

fn position(location: Location) -> Position {
    Position::new(location.line, location.character)
}

pub(crate) struct Marker {
    start: Location,
    bomb: DropBomb,
}

impl Marker {
    fn new(start: Location) -> Self {
        Self { start, bomb: DropBomb::new("Marker must be completed") }
    }

    pub(crate) fn complete(self, p: &mut Parser<'_>, data: NodeData) -> NodeId {
        self.finish(p, data, false)
    }

    pub(crate) fn complete_missing(self, p: &mut Parser<'_>, data: NodeData) -> NodeId {
        self.finish(p, data, true)
    }

    fn finish(mut self, p: &mut Parser<'_>, data: NodeData, missing: bool) -> NodeId {
        self.bomb.defuse();

        let start = self.start;
        let end = p.scanner.trivia_start();
        let len = end.utf16 - start.utf16;
        let crosses_line = end.line != start.line;

        let position = NodePosition {
            range: TextRange::new(start.offset, end.offset),
            line: start.line,
            start_character: start.character,
            character: if crosses_line { len } else { end.character },
            len,
            crosses_line,
        };

        p.alloc(Node { position, missing, parent: None, data })
    }
}
