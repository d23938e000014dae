use efml_errors::{Diagnostic, DiagnosticMessage};
use efml_syntax::SyntaxKind::*;
use efml_syntax::{
    AttributeOrProperty, CommentLine, ElementDeclaration, EventHandler, LineTrivia, MountingPoint,
    NodeData, NodeId, SyntaxSet, TextLine,
};

use super::LINE_END;
use super::exprs::{dotted_chain, mustache, name_until, string_until, tag_descriptor, template_until};
use crate::parser::Parser;

/// Lines indented at least `level` columns. `owner` is the tag of the element
/// whose children these are.
pub(crate) fn block(p: &mut Parser, level: u32, owner: Option<NodeId>) -> Vec<NodeId> {
    p.node_list(
        |p| !p.at(EOF) && p.look_ahead_indent_level() >= level,
        |p| line(p, level, owner),
    )
}

struct LineStart {
    indent: Option<NodeId>,
    indent_level: u32,
}

impl LineStart {
    fn finish(self, end_of_line: NodeId) -> LineTrivia {
        LineTrivia { indent: self.indent, indent_level: self.indent_level, end_of_line }
    }
}

fn line(p: &mut Parser, level: u32, owner: Option<NodeId>) -> Option<NodeId> {
    if p.at(EOF) {
        return None;
    }

    let m = p.start();
    let indent = p.eat(WHITESPACE);
    let indent_level = indent.map_or(0, |indent| p.node(indent).position.len);
    let start = LineStart { indent, indent_level };

    if let Some(indent) = indent
        && indent_level > level
        && !at_blank_line(p)
    {
        unexpected_indentation(p, indent, level, owner);
    }

    let data = match p.current() {
        GREATER_THAN => element(p, start),
        HASH | PERCENT => attribute_or_property(p, start),
        AT => event_handler(p, start),
        DOT | BAR => text(p, start),
        PLUS | MINUS => mounting_point(p, start),
        COMMENT => {
            let comment = p.token();
            comment_line(p, start, Some(comment))
        }
        EOF => comment_line(p, start, None),
        kind => {
            p.error(DiagnosticMessage::UNEXPECTED_TOKEN, &[&kind]);
            let rest = string_until(p, SyntaxSet::EMPTY);
            comment_line(p, start, Some(rest))
        }
    };

    Some(m.complete(p, data))
}

fn at_blank_line(p: &Parser) -> bool {
    p.at(EOF) || (p.at(COMMENT) && p.current_is_empty())
}

fn unexpected_indentation(p: &mut Parser, indent: NodeId, level: u32, owner: Option<NodeId>) {
    let found = p.node(indent).position.len;
    let (range, lined) = p.node_ranges(indent);
    let mut diagnostic =
        Diagnostic::new(DiagnosticMessage::UNEXPECTED_INDENTATION, &[&level, &found], range, lined);

    if let Some(owner) = owner {
        let (range, lined) = p.node_ranges(owner);
        diagnostic = diagnostic.with_related(range, lined, "enclosing element declared here");
    }

    p.push_diagnostic(diagnostic);
}

fn line_end(p: &mut Parser) -> NodeId {
    if p.at(EOF) { p.token() } else { p.expect(NEW_LINE) }
}

fn comment_line(p: &mut Parser, start: LineStart, comment: Option<NodeId>) -> NodeData {
    let end_of_line = line_end(p);
    NodeData::CommentLine(CommentLine { line: start.finish(end_of_line), comment })
}

/// The tag line, then a nested block if the next line is indented deeper.
fn element(p: &mut Parser, start: LineStart) -> NodeData {
    let tag = tag_descriptor(p);
    let end_of_line = line_end(p);

    let children = if p.at_any(LINE_END) {
        Vec::new()
    } else {
        let next_level = p.look_ahead_indent_level();
        if next_level > start.indent_level { block(p, next_level, Some(tag)) } else { Vec::new() }
    };

    NodeData::ElementDeclaration(ElementDeclaration { line: start.finish(end_of_line), tag, children })
}

/// `# binding (= value)?` or `% binding (@ event)? (= value)?`
fn attribute_or_property(p: &mut Parser, start: LineStart) -> NodeData {
    let sigil = p.token();
    let is_property = p.node(sigil).kind() == PERCENT;

    let until = if is_property { SyntaxSet::new([EQ, AT]) } else { SyntaxSet::new([EQ]) };
    let binding = name_until(p, until);
    let trigger_event = if is_property {
        p.eat(AT).map(|at| (at, name_until(p, SyntaxSet::new([EQ]))))
    } else {
        None
    };
    let initializer = p.eat(EQ).map(|eq| (eq, attribute_value(p)));
    let end_of_line = line_end(p);

    NodeData::AttributeOrProperty(AttributeOrProperty {
        line: start.finish(end_of_line),
        start: sigil,
        binding,
        trigger_event,
        initializer,
    })
}

/// A value that is a single mustache becomes that mustache, anything else a
/// template.
fn attribute_value(p: &mut Parser) -> NodeId {
    let lone_mustache = if p.at(MUSTACHE_START) {
        p.try_parse(|p| {
            let value = mustache(p);
            p.at_any(LINE_END).then_some(value)
        })
    } else {
        None
    };

    lone_mustache.unwrap_or_else(|| template_until(p, SyntaxSet::EMPTY))
}

/// `@ event (. modifier)* = handler (: parameter)?`
fn event_handler(p: &mut Parser, start: LineStart) -> NodeData {
    let at = p.token();
    let event = name_until(p, SyntaxSet::new([DOT, EQ]));

    let modifiers = p.eat(DOT).map(|dot| {
        let chain =
            dotted_chain(p, |p| name_until(p, SyntaxSet::new([DOT, EQ])), |p| p.at(DOT));
        (dot, chain)
    });

    let equals = p.expect(EQ);
    let handler = name_until(p, SyntaxSet::new([COLON]));
    let parameter = p.eat(COLON).map(|colon| (colon, template_until(p, SyntaxSet::EMPTY)));
    let end_of_line = line_end(p);

    NodeData::EventHandler(EventHandler {
        line: start.finish(end_of_line),
        at,
        event,
        modifiers,
        equals,
        handler,
        parameter,
    })
}

/// `. text` or `| text`
fn text(p: &mut Parser, start: LineStart) -> NodeData {
    let sigil = p.token();
    let content = template_until(p, SyntaxSet::EMPTY);
    let end_of_line = line_end(p);

    NodeData::TextLine(TextLine { line: start.finish(end_of_line), sigil, content })
}

/// `+ name` or `- name`
fn mounting_point(p: &mut Parser, start: LineStart) -> NodeData {
    let sigil = p.token();
    let identifier = name_until(p, SyntaxSet::EMPTY);
    let end_of_line = line_end(p);

    NodeData::MountingPoint(MountingPoint { line: start.finish(end_of_line), sigil, identifier })
}
