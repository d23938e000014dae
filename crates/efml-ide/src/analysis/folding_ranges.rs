use efml_syntax::SyntaxKind::{self, BAR};
use efml_syntax::{NodeData, NodeId, SourceFile};
use rustc_hash::FxHashMap;
use tokio_util::sync::CancellationToken;

use super::check_cancelled;
use crate::ProtocolFault;

/// Runs shorter than this never fold.
const MIN_RUN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldKind {
    Element,
    Comment,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fold {
    pub(crate) start_line: u32,
    pub(crate) end_line: u32,
    pub(crate) kind: FoldKind,
}

impl From<Fold> for lsp_types::FoldingRange {
    fn from(fold: Fold) -> Self {
        lsp_types::FoldingRange {
            start_line: fold.start_line,
            end_line: fold.end_line,
            kind: match fold.kind {
                FoldKind::Comment => Some(lsp_types::FoldingRangeKind::Comment),
                FoldKind::Element | FoldKind::Text => None,
            },
            ..lsp_types::FoldingRange::default()
        }
    }
}

/// Folds already computed for the root and for element declarations. Node ids
/// are only meaningful for one tree, so the memo is cleared on every reparse.
pub(crate) type FoldingMemo = FxHashMap<NodeId, Vec<Fold>>;

pub(crate) fn folding_ranges(
    file: &SourceFile,
    memo: &mut FoldingMemo,
    cancel: &CancellationToken,
) -> Result<Vec<Fold>, ProtocolFault> {
    Folder { file, memo, cancel }.node(file.root())
}

struct Folder<'a> {
    file: &'a SourceFile,
    memo: &'a mut FoldingMemo,
    cancel: &'a CancellationToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunKey {
    Comment,
    Text(SyntaxKind),
}

struct Run {
    key: RunKey,
    start_line: u32,
    end_line: u32,
    len: usize,
}

impl Run {
    fn fold(&self) -> Option<Fold> {
        let kind = match self.key {
            RunKey::Comment => FoldKind::Comment,
            RunKey::Text(BAR) => FoldKind::Text,
            RunKey::Text(_) => return None,
        };
        (self.len >= MIN_RUN).then_some(Fold {
            start_line: self.start_line,
            end_line: self.end_line,
            kind,
        })
    }
}

impl Folder<'_> {
    fn node(&mut self, id: NodeId) -> Result<Vec<Fold>, ProtocolFault> {
        if let Some(folds) = self.memo.get(&id) {
            return Ok(folds.clone());
        }
        check_cancelled(self.cancel)?;

        let file = self.file;
        let folds = match &file[id].data {
            NodeData::Root(root) => self.lines(&root.children)?,
            NodeData::ElementDeclaration(element) => {
                let mut folds = Vec::new();
                if let Some(end_line) = self.last_descendant_line(id) {
                    folds.push(Fold {
                        start_line: file[id].position.line,
                        end_line,
                        kind: FoldKind::Element,
                    });
                }
                folds.extend(self.lines(&element.children)?);
                folds
            }
            _ => return Ok(Vec::new()),
        };

        self.memo.insert(id, folds.clone());
        Ok(folds)
    }

    fn lines(&mut self, lines: &[NodeId]) -> Result<Vec<Fold>, ProtocolFault> {
        let mut folds = Vec::new();
        let mut run: Option<Run> = None;

        for &line in lines {
            folds.extend(self.node(line)?);

            let line_number = self.file[line].position.line;
            let key = self.run_key(line);
            if let Some(current) = run.as_mut().filter(|run| Some(run.key) == key) {
                current.end_line = line_number;
                current.len += 1;
            } else {
                folds.extend(run.take().and_then(|run| run.fold()));
                run = key.map(|key| Run {
                    key,
                    start_line: line_number,
                    end_line: line_number,
                    len: 1,
                });
            }
        }

        folds.extend(run.and_then(|run| run.fold()));
        Ok(folds)
    }

    /// Blank lines belong to no run, so they end whatever run came before.
    fn run_key(&self, line: NodeId) -> Option<RunKey> {
        let file = self.file;
        match &file[line].data {
            NodeData::CommentLine(comment) => comment
                .comment
                .filter(|&comment| !file[comment].position.is_empty())
                .map(|_| RunKey::Comment),
            NodeData::TextLine(text) => Some(RunKey::Text(file.kind(text.sigil))),
            _ => None,
        }
    }

    fn last_descendant_line(&self, element: NodeId) -> Option<u32> {
        let mut current = element;
        let mut end_line = None;

        while let NodeData::ElementDeclaration(declaration) = &self.file[current].data {
            let Some(&last) = declaration.children.last() else { break };
            end_line = Some(self.file[last].position.line);
            current = last;
        }

        end_line
    }
}
