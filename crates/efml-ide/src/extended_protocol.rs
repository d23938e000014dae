//! Requests outside the LSP proper.
//!
//! The server asks the client to resolve completion and hover inside
//! synthesized HTML/TypeScript fragments; the client asks the server for
//! inlay hints. Parameters travel in both directions as a one-element
//! array holding the argument list, so `requestCompletionFrom` is sent as
//! `[["html", "<div |", {"line": 0, "character": 5}, null]]`.

use serde::{Deserialize, Serialize};

use crate::analysis::Fragment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExternalLanguage {
    Html,
    Ts,
    Js,
}

pub type CompletionArguments = (
    ExternalLanguage,
    String,
    lsp_types::Position,
    Option<lsp_types::CompletionItemKind>,
);

pub type HoverArguments = (ExternalLanguage, String, lsp_types::Position);

#[derive(Debug)]
pub enum RequestCompletionFrom {}

impl lsp_types::request::Request for RequestCompletionFrom {
    type Params = (CompletionArguments,);
    type Result = Option<lsp_types::CompletionList>;
    const METHOD: &'static str = "requestCompletionFrom";
}

impl RequestCompletionFrom {
    pub(crate) fn params(
        fragment: Fragment,
        filter: Option<lsp_types::CompletionItemKind>,
    ) -> (CompletionArguments,) {
        ((fragment.language, fragment.source, fragment.position, filter),)
    }
}

#[derive(Debug)]
pub enum RequestHoverInfoFrom {}

impl lsp_types::request::Request for RequestHoverInfoFrom {
    type Params = (HoverArguments,);
    type Result = Option<lsp_types::Hover>;
    const METHOD: &'static str = "requestHoverInfoFrom";
}

impl RequestHoverInfoFrom {
    pub(crate) fn params(fragment: Fragment) -> (HoverArguments,) {
        ((fragment.language, fragment.source, fragment.position),)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnstableInlayHintsParams {
    pub text_document: lsp_types::TextDocumentIdentifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlayHint {
    pub position: lsp_types::Position,
    pub label: String,
}

#[derive(Debug)]
pub enum OnUnstableInlayHints {}

impl lsp_types::request::Request for OnUnstableInlayHints {
    type Params = ((UnstableInlayHintsParams,),);
    type Result = Vec<InlayHint>;
    const METHOD: &'static str = "onUnstableInlayHints";
}
