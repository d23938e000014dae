use efml_syntax::SyntaxKind::EOF;
use efml_syntax::{NodeData, NodeId, SourceFile};

/// The node under `position`.
///
/// Candidates are the nodes starting on the position's line whose span covers
/// the column. A leaf (token or string literal) beats any composite node, then the narrowest span wins,
/// then the earliest in document order. Missing nodes and trivia never match.
pub(crate) fn node_at(file: &SourceFile, position: lsp_types::Position) -> Option<NodeId> {
    let mut best: Option<(bool, u32, NodeId)> = None;

    file.for_each_child_recursively(file.root(), |id| {
        let node = &file[id];
        if node.missing || node.kind().is_trivia() || node.kind() == EOF {
            return None;
        }

        let span = &node.position;
        let covers = span.line == position.line
            && span.start_character <= position.character
            && (span.crosses_line || position.character <= span.start_character + span.len);
        if !covers {
            return None;
        }

        let is_leaf = matches!(node.data, NodeData::Token(_) | NodeData::StringLiteral);
        let better = match best {
            None => true,
            Some((best_is_leaf, best_len, _)) => {
                (is_leaf && !best_is_leaf) || (is_leaf == best_is_leaf && span.len < best_len)
            }
        };
        if better {
            best = Some((is_leaf, span.len, id));
        }

        None::<()>
    });

    best.map(|(_, _, id)| id)
}
