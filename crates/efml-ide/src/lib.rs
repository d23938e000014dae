mod analysis;
mod extended_protocol;
mod server;

pub use analysis::{
    Analysis, CatalogueEntry, EVENT_DESCRIPTORS, FoldKind, ForwardCompletion, Fragment,
    HoverAction, SemanticRole, key_name,
};
pub use extended_protocol::{
    CompletionArguments, ExternalLanguage, HoverArguments, InlayHint, OnUnstableInlayHints,
    RequestCompletionFrom, RequestHoverInfoFrom, UnstableInlayHintsParams,
};
pub use server::{Server, ServerConfig};

/// Failures of a feature request that are reported back to the client with a
/// stable code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolFault {
    #[error("Document not found")]
    DocumentNotFound,
    #[error("Request cancelled")]
    RequestCancelled,
}

impl ProtocolFault {
    pub fn code(self) -> i32 {
        match self {
            Self::DocumentNotFound => 1,
            Self::RequestCancelled => 2,
        }
    }
}
