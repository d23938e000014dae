use efml_syntax::SyntaxKind::{AT, GREATER_THAN, HASH, PERCENT, STRING_LITERAL};
use efml_syntax::{NodeData, SourceFile};

use super::completion::catalogue_entry;
use super::fragment::{Fragment, FragmentBuilder};
use super::node_at::node_at;
use super::{enclosing_native_tag, is_native_tag, leaf_text};
use crate::extended_protocol::ExternalLanguage;

#[derive(Debug, Clone, PartialEq)]
pub enum HoverAction {
    /// Answered from the tree.
    Local(lsp_types::Hover),
    /// Needs the host's HTML or TypeScript service.
    Forward(Fragment),
}

pub(crate) fn hover(file: &SourceFile, position: lsp_types::Position) -> Option<HoverAction> {
    let node = node_at(file, position)?;
    let parent = file.parent(node)?;
    let kind = file.kind(node);

    match &file[parent].data {
        NodeData::TagDescriptor(tag) if kind == GREATER_THAN || node == tag.name => {
            let name = leaf_text(file, tag.name);
            if name.is_empty() || !is_native_tag(name) {
                return None;
            }
            forward(
                FragmentBuilder::new(ExternalLanguage::Html)
                    .text("<")
                    .text(name)
                    .cursor()
                    .text(">"),
            )
        }
        NodeData::AttributeOrProperty(line)
            if node == line.start || node == line.binding =>
        {
            let tag = enclosing_native_tag(file, parent)?;
            let binding = leaf_text(file, line.binding);
            if file.kind(line.start) == PERCENT {
                forward(
                    FragmentBuilder::new(ExternalLanguage::Ts)
                        .text("(null as HTMLElementTagNameMap['")
                        .text(&tag.to_lowercase())
                        .text("']).")
                        .text(binding)
                        .cursor(),
                )
            } else {
                debug_assert_eq!(file.kind(line.start), HASH);
                forward(
                    FragmentBuilder::new(ExternalLanguage::Html)
                        .text("<")
                        .text(tag)
                        .text(" ")
                        .text(binding)
                        .cursor()
                        .text(" />"),
                )
            }
        }
        NodeData::AttributeOrProperty(line)
            if line.trigger_event.is_some_and(|(at, event)| node == at || node == event) =>
        {
            let (_, event) = line.trigger_event?;
            let tag = enclosing_native_tag(file, parent)?;
            forward(event_fragment(tag, leaf_text(file, event)))
        }
        NodeData::EventHandler(line) if kind == AT || node == line.event => {
            let tag = enclosing_native_tag(file, parent)?;
            forward(event_fragment(tag, leaf_text(file, line.event)))
        }
        NodeData::DottedChain(_) if kind == STRING_LITERAL => {
            let handler = file.parent(parent)?;
            let NodeData::EventHandler(line) = &file[handler].data else { return None };
            if line.modifiers.map(|(_, chain)| chain) != Some(parent) {
                return None;
            }

            let entry = catalogue_entry(leaf_text(file, node))?;
            Some(HoverAction::Local(lsp_types::Hover {
                contents: lsp_types::HoverContents::Markup(entry.markdown()),
                range: None,
            }))
        }
        _ => None,
    }
}

/// `<tag onEVENT|="" />`
fn event_fragment(tag: &str, event: &str) -> FragmentBuilder {
    FragmentBuilder::new(ExternalLanguage::Html)
        .text("<")
        .text(tag)
        .text(" on")
        .text(event)
        .cursor()
        .text("=\"\" />")
}

fn forward(fragment: FragmentBuilder) -> Option<HoverAction> {
    Some(HoverAction::Forward(fragment.finish()))
}
