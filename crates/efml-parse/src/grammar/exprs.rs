use efml_errors::DiagnosticMessage;
use efml_syntax::SyntaxKind::*;
use efml_syntax::{DottedChain, Mustache, NodeData, NodeId, SyntaxSet, TagDescriptor, TemplateString};

use super::LINE_END;
use crate::parser::{Parser, invariant_violation};

/// `> name (. class)* (# reference)?`
pub(crate) fn tag_descriptor(p: &mut Parser) -> NodeId {
    let m = p.start();
    let start = p.expect(GREATER_THAN);
    let name = name_until(p, SyntaxSet::new([DOT, HASH]));

    let attributes = p.eat(DOT).map(|dot| {
        let chain = dotted_chain(
            p,
            |p| template_until(p, SyntaxSet::new([DOT, HASH])),
            |p| p.at(DOT),
        );
        (dot, chain)
    });

    let reference = p.eat(HASH).map(|hash| (hash, name_until(p, SyntaxSet::EMPTY)));

    m.complete(p, NodeData::TagDescriptor(TagDescriptor { start, name, attributes, reference }))
}

/// Literal text mixed with mustaches, up to `until` or the end of the line.
pub(crate) fn template_until(p: &mut Parser, until: SyntaxSet) -> NodeId {
    let m = p.start();
    let stop = until.union(LINE_END);

    let parts = p.node_list(
        |p| !p.at_any(stop),
        |p| {
            Some(if p.at(MUSTACHE_START) {
                mustache(p)
            } else {
                string_until(p, until.with(MUSTACHE_START))
            })
        },
    );

    m.complete(p, NodeData::TemplateString(TemplateString { parts }))
}

/// `{{ path (. path)* (= default)? }}`
pub(crate) fn mustache(p: &mut Parser) -> NodeId {
    let m = p.start();
    let start = p.expect(MUSTACHE_START);
    let path = dotted_chain(
        p,
        |p| name_until(p, SyntaxSet::new([DOT, EQ, MUSTACHE_END])),
        |p| p.at(DOT),
    );
    let default =
        p.eat(EQ).map(|eq| (eq, string_until(p, SyntaxSet::new([MUSTACHE_END]))));
    let end = p.expect(MUSTACHE_END);

    m.complete(p, NodeData::Mustache(Mustache { start, path, default, end }))
}

/// `item (. item)*`, continuing while `more` holds.
pub(crate) fn dotted_chain(
    p: &mut Parser,
    mut item: impl FnMut(&mut Parser) -> NodeId,
    mut more: impl FnMut(&mut Parser) -> bool,
) -> NodeId {
    let m = p.start();
    let mut items = vec![item(p)];

    while more(p) {
        let before = p.offset();
        items.push(p.expect(DOT));
        items.push(item(p));
        if p.offset() == before {
            invariant_violation("dotted chain continuation consumed no input");
        }
    }

    m.complete(p, NodeData::DottedChain(DottedChain { items }))
}

/// Every token up to `until` or the end of the line, possibly none.
pub(crate) fn string_until(p: &mut Parser, until: SyntaxSet) -> NodeId {
    let stop = until.union(LINE_END);
    let m = p.start();
    while !p.at_any(stop) {
        p.bump();
    }
    m.complete(p, NodeData::StringLiteral)
}

/// Like [`string_until`], but an empty name is reported and marked missing.
pub(crate) fn name_until(p: &mut Parser, until: SyntaxSet) -> NodeId {
    if p.at_any(until.union(LINE_END)) {
        p.error(DiagnosticMessage::NON_EMPTY_STRING_EXPECTED, &[]);
        return p.missing(NodeData::StringLiteral);
    }
    string_until(p, until)
}
