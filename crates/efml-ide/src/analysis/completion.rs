use efml_syntax::SyntaxKind::{AT, GREATER_THAN, HASH, PERCENT};
use efml_syntax::{NodeData, NodeId, SourceFile};
use lsp_types::{CompletionItemKind, CompletionList};

use super::fragment::{Fragment, FragmentBuilder};
use super::node_at::node_at;
use super::{enclosing_native_tag, enclosing_tag, leaf_text};
use crate::extended_protocol::ExternalLanguage;

/// A built-in event modifier or method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogueEntry {
    pub label: &'static str,
    pub kind: CompletionItemKind,
    pub detail: &'static str,
    /// Markdown.
    pub documentation: &'static str,
}

impl CatalogueEntry {
    fn completion_item(&self) -> lsp_types::CompletionItem {
        lsp_types::CompletionItem {
            label: self.label.to_owned(),
            kind: Some(self.kind),
            detail: Some(self.detail.to_owned()),
            documentation: Some(lsp_types::Documentation::MarkupContent(self.markdown())),
            ..lsp_types::CompletionItem::default()
        }
    }

    pub(crate) fn markdown(&self) -> lsp_types::MarkupContent {
        lsp_types::MarkupContent {
            kind: lsp_types::MarkupKind::Markdown,
            value: self.documentation.to_owned(),
        }
    }
}

pub const EVENT_DESCRIPTORS: [CatalogueEntry; 7] = [
    CatalogueEntry {
        label: "alt",
        kind: CompletionItemKind::ENUM_MEMBER,
        detail: "EventDescriptorModifiers.alt",
        documentation: "Invoke this event only when the `alt` key (`Option` or `⌥` on OS X) was pressed.\n\n\
                        See [KeyboardEvent.altKey](https://mdn.io/KeyboardEvent.altKey)",
    },
    CatalogueEntry {
        label: "ctrl",
        kind: CompletionItemKind::ENUM_MEMBER,
        detail: "EventDescriptorModifiers.ctrl",
        documentation: "Invoke this event only when the `ctrl` key was pressed.\n\n\
                        See [KeyboardEvent.ctrlKey](https://mdn.io/KeyboardEvent.ctrlKey)",
    },
    CatalogueEntry {
        label: "shift",
        kind: CompletionItemKind::ENUM_MEMBER,
        detail: "EventDescriptorModifiers.shift",
        documentation: "Invoke this event only when the `shift` key was pressed.\n\n\
                        See [KeyboardEvent.shiftKey](https://mdn.io/KeyboardEvent.shiftKey)",
    },
    CatalogueEntry {
        label: "meta",
        kind: CompletionItemKind::ENUM_MEMBER,
        detail: "EventDescriptorModifiers.meta",
        documentation: "Invoke this event only when the `meta` key (`⌘ Command` on Mac keyboards, \
                        or the Windows key `⊞`) was pressed.\n\n\
                        See [KeyboardEvent.metaKey](https://mdn.io/KeyboardEvent.metaKey)",
    },
    CatalogueEntry {
        label: "prevent",
        kind: CompletionItemKind::METHOD,
        detail: "EventDescriptorMethods.preventDefault()",
        documentation: "If invoked when the cancelable attribute value is true, and while executing \
                        a listener for the event with passive set to false, signals to the operation \
                        that caused event to be dispatched that it needs to be canceled.\n\n\
                        See [Event.preventDefault](https://mdn.io/Event.preventDefault)",
    },
    CatalogueEntry {
        label: "stop",
        kind: CompletionItemKind::METHOD,
        detail: "EventDescriptorMethods.stopPropagation()",
        documentation: "When dispatched in a tree, invoking this method prevents event from reaching \
                        any objects other than the current object.\n\n\
                        See [Event.stopPropagation](https://mdn.io/Event.stopPropagation)",
    },
    CatalogueEntry {
        label: "stopImmediate",
        kind: CompletionItemKind::METHOD,
        detail: "EventDescriptorMethods.stopImmediatePropagation()",
        documentation: "Invoking this method prevents event from reaching any registered event \
                        listeners after the current one finishes running and, when dispatched in a \
                        tree, also prevents event from reaching any other objects.\n\n\
                        See [Event.stopImmediatePropagation](https://mdn.io/Event.stopImmediatePropagation)",
    },
];

pub(crate) fn catalogue_entry(label: &str) -> Option<&'static CatalogueEntry> {
    EVENT_DESCRIPTORS.iter().find(|entry| entry.label == label)
}

/// Inside an event modifier chain: every catalogue entry not already used
/// earlier in the chain.
pub(crate) fn event_modifier_completions(
    file: &SourceFile,
    position: lsp_types::Position,
) -> Vec<lsp_types::CompletionItem> {
    let Some(node) = node_at(file, position) else { return Vec::new() };
    let Some(chain) = modifier_chain_of(file, node) else { return Vec::new() };

    let NodeData::DottedChain(chain) = &file[chain].data else { return Vec::new() };

    let cursor_start = file[node].position.range.start();
    let used = chain
        .segments()
        .filter(|&segment| file[segment].position.range.end() <= cursor_start)
        .map(|segment| leaf_text(file, segment))
        .collect::<Vec<_>>();

    EVENT_DESCRIPTORS
        .iter()
        .filter(|entry| !used.contains(&entry.label))
        .map(CatalogueEntry::completion_item)
        .collect()
}

/// The modifier chain `node` belongs to, either as one of its items or as the
/// dot in front of it.
fn modifier_chain_of(file: &SourceFile, node: NodeId) -> Option<NodeId> {
    let parent = file.parent(node)?;
    let (owner, in_chain) = match &file[parent].data {
        NodeData::EventHandler(_) => (parent, false),
        NodeData::DottedChain(_) => (file.parent(parent)?, true),
        _ => return None,
    };

    let NodeData::EventHandler(handler) = &file[owner].data else { return None };
    let (dot, chain) = handler.modifiers?;
    let matches = if in_chain { chain == parent } else { dot == node };
    matches.then_some(chain)
}

/// What the host has to complete at a line sigil.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardCompletion {
    Tag,
    Attribute { tag: String },
    Event { tag: String },
    Property { tag: String },
}

impl ForwardCompletion {
    /// The fragment to send and the completion kind the host should keep.
    pub fn fragment(&self) -> (Fragment, Option<CompletionItemKind>) {
        match self {
            Self::Tag => (
                FragmentBuilder::new(ExternalLanguage::Html).text("<").cursor().finish(),
                Some(CompletionItemKind::PROPERTY),
            ),
            Self::Attribute { tag } | Self::Event { tag } => (
                FragmentBuilder::new(ExternalLanguage::Html)
                    .text("<")
                    .text(tag)
                    .text(" ")
                    .cursor()
                    .finish(),
                None,
            ),
            Self::Property { tag } => (
                FragmentBuilder::new(ExternalLanguage::Ts)
                    .text("{\n    let _: HTMLElementTagNameMap['")
                    .text(&tag.to_lowercase())
                    .text("']\n    _!.")
                    .cursor()
                    .text("\n}")
                    .finish(),
                Some(CompletionItemKind::FIELD),
            ),
        }
    }

    /// The element whose attribute list answers this request, if the list is
    /// shared through the attribute cache.
    pub fn attribute_tag(&self) -> Option<&str> {
        match self {
            Self::Attribute { tag } | Self::Event { tag } => Some(tag),
            Self::Tag | Self::Property { .. } => None,
        }
    }

    /// Turns the host's answer into what the user sees.
    pub fn select(&self, mut list: CompletionList) -> CompletionList {
        match self {
            Self::Tag => list.items.retain(|item| item.label != "!DOCTYPE"),
            Self::Attribute { .. } => list.items.retain(|item| !item.label.starts_with("on")),
            Self::Event { .. } => {
                list.items.retain(|item| item.label.starts_with("on"));
                for item in &mut list.items {
                    item.label.drain(.."on".len());
                }
            }
            Self::Property { .. } => {}
        }
        list
    }
}

pub(crate) fn forward_completion(
    file: &SourceFile,
    position: lsp_types::Position,
) -> Option<ForwardCompletion> {
    let node = node_at(file, position)?;
    let parent = file.parent(node)?;

    match (file.kind(node), &file[parent].data) {
        (GREATER_THAN, NodeData::TagDescriptor(_)) => Some(ForwardCompletion::Tag),
        (HASH, NodeData::AttributeOrProperty(_)) => {
            let tag = enclosing_tag(file, parent)?;
            Some(ForwardCompletion::Attribute { tag: tag.to_owned() })
        }
        (AT, NodeData::EventHandler(_)) => {
            let tag = enclosing_tag(file, parent)?;
            Some(ForwardCompletion::Event { tag: tag.to_owned() })
        }
        (PERCENT, NodeData::AttributeOrProperty(_)) => {
            let tag = enclosing_native_tag(file, parent)?;
            Some(ForwardCompletion::Property { tag: tag.to_owned() })
        }
        _ => None,
    }
}

/// Only lists of built-in elements are stable enough to keep forever.
pub(crate) fn is_cacheable_tag(tag: &str) -> bool {
    !tag.contains('-') && tag.to_lowercase() == tag
}
