use efml_syntax::SyntaxKind::*;
use efml_syntax::{NodeData, NodeId, Root, SyntaxSet};

use crate::parser::Parser;

pub(crate) mod exprs;
pub(crate) mod lines;

pub(crate) const LINE_END: SyntaxSet = SyntaxSet::new([NEW_LINE, EOF]);

pub(crate) fn source_file(p: &mut Parser) -> NodeId {
    let m = p.start();
    let children = lines::block(p, 0, None);
    let end_of_file = p.expect(EOF);
    m.complete(p, NodeData::Root(Root { children, end_of_file }))
}
