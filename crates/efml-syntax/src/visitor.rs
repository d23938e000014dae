use crate::node::{NodeData, NodeId};

macro_rules! visit {
    ($f:ident; $($children:expr),* $(,)?) => {{
        $(
            for child in $children {
                if let Some(result) = $f(child) {
                    return Some(result);
                }
            }
        )*
    }};
}

fn pair(pair: Option<(NodeId, NodeId)>) -> impl Iterator<Item = NodeId> {
    pair.into_iter().flat_map(|(first, second)| [first, second])
}

/// Calls `f` on every direct child of `data` in source order, stopping at the
/// first `Some`.
pub fn for_each_child<T>(data: &NodeData, mut f: impl FnMut(NodeId) -> Option<T>) -> Option<T> {
    match data {
        NodeData::Token(_) | NodeData::StringLiteral => {}
        NodeData::Root(node) => visit!(f; node.children.iter().copied(), [node.end_of_file]),
        NodeData::CommentLine(node) => visit!(
            f;
            node.line.indent.into_iter(),
            node.comment.into_iter(),
            [node.line.end_of_line],
        ),
        NodeData::ElementDeclaration(node) => visit!(
            f;
            node.line.indent.into_iter(),
            [node.tag, node.line.end_of_line],
            node.children.iter().copied(),
        ),
        NodeData::AttributeOrProperty(node) => visit!(
            f;
            node.line.indent.into_iter(),
            [node.start, node.binding],
            pair(node.trigger_event),
            pair(node.initializer),
            [node.line.end_of_line],
        ),
        NodeData::EventHandler(node) => visit!(
            f;
            node.line.indent.into_iter(),
            [node.at, node.event],
            pair(node.modifiers),
            [node.equals, node.handler],
            pair(node.parameter),
            [node.line.end_of_line],
        ),
        NodeData::TextLine(node) => visit!(
            f;
            node.line.indent.into_iter(),
            [node.sigil, node.content, node.line.end_of_line],
        ),
        NodeData::MountingPoint(node) => visit!(
            f;
            node.line.indent.into_iter(),
            [node.sigil, node.identifier, node.line.end_of_line],
        ),
        NodeData::TagDescriptor(node) => visit!(
            f;
            [node.start, node.name],
            pair(node.attributes),
            pair(node.reference),
        ),
        NodeData::TemplateString(node) => visit!(f; node.parts.iter().copied()),
        NodeData::Mustache(node) => visit!(f; [node.start, node.path], pair(node.default), [node.end]),
        NodeData::DottedChain(node) => visit!(f; node.items.iter().copied()),
    }

    None
}
