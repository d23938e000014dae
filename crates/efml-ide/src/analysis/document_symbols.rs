use efml_syntax::SyntaxKind::PLUS;
use efml_syntax::{NodeData, NodeId, SourceFile};
use tokio_util::sync::CancellationToken;

use super::{check_cancelled, content_range, leaf_text};
use crate::ProtocolFault;

/// Shown for a declaration whose name is missing.
const UNNAMED: &str = "<unnamed>";

pub(crate) fn document_symbols(
    file: &SourceFile,
    cancel: &CancellationToken,
) -> Result<Vec<lsp_types::DocumentSymbol>, ProtocolFault> {
    symbols(file, file.lines(), cancel)
}

fn symbols(
    file: &SourceFile,
    lines: &[NodeId],
    cancel: &CancellationToken,
) -> Result<Vec<lsp_types::DocumentSymbol>, ProtocolFault> {
    let mut found = Vec::new();

    for &line in lines {
        check_cancelled(cancel)?;

        match &file[line].data {
            NodeData::ElementDeclaration(element) => {
                let NodeData::TagDescriptor(tag) = &file[element.tag].data else { continue };
                let children = symbols(file, &element.children, cancel)?;
                found.push(symbol(
                    file,
                    line,
                    tag.name,
                    lsp_types::SymbolKind::FIELD,
                    Some(children),
                ));
            }
            NodeData::MountingPoint(mounting_point) => {
                let kind = if file.kind(mounting_point.sigil) == PLUS {
                    lsp_types::SymbolKind::ARRAY
                } else {
                    lsp_types::SymbolKind::TYPE_PARAMETER
                };
                found.push(symbol(file, line, mounting_point.identifier, kind, None));
            }
            _ => {}
        }
    }

    Ok(found)
}

fn symbol(
    file: &SourceFile,
    line: NodeId,
    name: NodeId,
    kind: lsp_types::SymbolKind,
    children: Option<Vec<lsp_types::DocumentSymbol>>,
) -> lsp_types::DocumentSymbol {
    let start = lsp_types::Position::new(file[line].position.line, 0);
    let range = lsp_types::Range::new(start, content_end(file, last_line(file, line)));

    let text = leaf_text(file, name);
    let selection_range = content_range(file, name);

    #[allow(deprecated)]
    lsp_types::DocumentSymbol {
        name: if text.is_empty() { UNNAMED.to_owned() } else { text.to_owned() },
        detail: None,
        kind,
        tags: None,
        deprecated: None,
        range,
        selection_range,
        children,
    }
}

/// The line itself, or the deepest last descendant of an element.
fn last_line(file: &SourceFile, mut line: NodeId) -> NodeId {
    while let NodeData::ElementDeclaration(element) = &file[line].data {
        let Some(&last) = element.children.last() else { break };
        line = last;
    }
    line
}

/// Where the content of `line` ends, before trailing whitespace and the line
/// break.
fn content_end(file: &SourceFile, line: NodeId) -> lsp_types::Position {
    match file[line].data.line_trivia() {
        Some(trivia) => {
            let end_of_line = &file[trivia.end_of_line].position;
            lsp_types::Position::new(end_of_line.line, end_of_line.start_character)
        }
        None => lsp_types::Position::new(file[line].position.line, 0),
    }
}
