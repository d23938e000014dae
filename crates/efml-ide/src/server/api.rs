use anyhow::Result;
use efml_errors::Severity;
use efml_inputs::{ContentChange, Document};
use tokio_util::sync::CancellationToken;

use super::forwards::{self, PendingKind};
use super::notifications::NotificationDispatcher;
use super::requests::{Reply, RequestDispatcher};
use super::{Server, from_lsp_range, to_lsp_range, to_request_id};
use crate::analysis::{Analysis, HoverAction};
use crate::extended_protocol::{
    InlayHint, OnUnstableInlayHints, RequestCompletionFrom, RequestHoverInfoFrom,
    UnstableInlayHintsParams,
};

pub(crate) fn request(server: &mut Server, request: lsp_server::Request) {
    if server.shutdown_requested {
        server.respond(lsp_server::Response::new_err(
            request.id,
            lsp_server::ErrorCode::InvalidRequest as i32,
            "shutdown already requested".to_owned(),
        ));
        return;
    }

    RequestDispatcher::new(request, server)
        .on::<lsp_types::request::Shutdown>(handle_shutdown)
        .on_cancellable::<lsp_types::request::FoldingRangeRequest>(handle_folding_range)
        .on_cancellable::<lsp_types::request::DocumentSymbolRequest>(handle_document_symbol)
        .on_cancellable::<lsp_types::request::SemanticTokensFullRequest>(handle_semantic_tokens)
        .on_deferred::<lsp_types::request::Completion>(handle_completion)
        .on_deferred::<lsp_types::request::HoverRequest>(handle_hover)
        .on::<OnUnstableInlayHints>(handle_inlay_hints)
        .finish();
}

fn handle_shutdown(server: &mut Server, (): ()) -> Result<()> {
    tracing::info!("shutdown requested");
    server.shutdown_requested = true;
    Ok(())
}

#[expect(clippy::needless_pass_by_value)]
fn handle_folding_range(
    server: &mut Server,
    params: lsp_types::FoldingRangeParams,
    cancel: &CancellationToken,
) -> Result<Option<Vec<lsp_types::FoldingRange>>> {
    let analysis = server.analysis_mut(&params.text_document.uri)?;
    Ok(Some(analysis.folding_ranges(cancel)?))
}

#[expect(clippy::needless_pass_by_value)]
fn handle_document_symbol(
    server: &mut Server,
    params: lsp_types::DocumentSymbolParams,
    cancel: &CancellationToken,
) -> Result<Option<lsp_types::DocumentSymbolResponse>> {
    let symbols = server.analysis(&params.text_document.uri)?.document_symbols(cancel)?;
    Ok(Some(lsp_types::DocumentSymbolResponse::Nested(symbols)))
}

#[expect(clippy::needless_pass_by_value)]
fn handle_semantic_tokens(
    server: &mut Server,
    params: lsp_types::SemanticTokensParams,
    cancel: &CancellationToken,
) -> Result<Option<lsp_types::SemanticTokensResult>> {
    let data = server.analysis(&params.text_document.uri)?.semantic_tokens(cancel)?;
    Ok(Some(lsp_types::SemanticTokensResult::Tokens(lsp_types::SemanticTokens {
        result_id: None,
        data,
    })))
}

/// Event modifiers are completed here; tag, attribute, event and property
/// names come from the client's own HTML and TypeScript services.
fn handle_completion(
    server: &mut Server,
    id: lsp_server::RequestId,
    params: lsp_types::CompletionParams,
) -> Result<Reply<Option<lsp_types::CompletionResponse>>> {
    let lsp_types::TextDocumentPositionParams { text_document, position } =
        params.text_document_position;
    let analysis = server.analysis(&text_document.uri)?;

    let local = analysis.completion(position);
    let Some(target) = analysis.forward_completion(position) else {
        return Ok(Reply::Now(Some(lsp_types::CompletionResponse::List(
            lsp_types::CompletionList { is_incomplete: false, items: local },
        ))));
    };

    if let Some(cached) = forwards::cached_completion(server, &target) {
        tracing::debug!(?target, "completion list from cache");
        return Ok(Reply::Now(Some(forwards::merge(local, &target, Some(cached)))));
    }

    let (fragment, filter) = target.fragment();
    forwards::forward::<RequestCompletionFrom>(
        server,
        id,
        RequestCompletionFrom::params(fragment, filter),
        PendingKind::Completion { local, target },
    );
    Ok(Reply::Deferred)
}

fn handle_hover(
    server: &mut Server,
    id: lsp_server::RequestId,
    params: lsp_types::HoverParams,
) -> Result<Reply<Option<lsp_types::Hover>>> {
    let lsp_types::TextDocumentPositionParams { text_document, position } =
        params.text_document_position_params;

    let hover = server.analysis(&text_document.uri)?.hover(position);
    Ok(match hover {
        None => Reply::Now(None),
        Some(HoverAction::Local(hover)) => Reply::Now(Some(hover)),
        Some(HoverAction::Forward(fragment)) => {
            forwards::forward::<RequestHoverInfoFrom>(
                server,
                id,
                RequestHoverInfoFrom::params(fragment),
                PendingKind::Hover,
            );
            Reply::Deferred
        }
    })
}

fn handle_inlay_hints(
    server: &mut Server,
    ((params,),): ((UnstableInlayHintsParams,),),
) -> Result<Vec<InlayHint>> {
    Ok(server.analysis(&params.text_document.uri)?.inlay_hints())
}

pub(crate) fn notification(server: &mut Server, notification: lsp_server::Notification) {
    NotificationDispatcher::new(notification, server)
        .on::<lsp_types::notification::DidOpenTextDocument>(handle_did_open_text_document)
        .on::<lsp_types::notification::DidChangeTextDocument>(handle_did_change_text_document)
        .on::<lsp_types::notification::DidCloseTextDocument>(handle_did_close_text_document)
        .on::<lsp_types::notification::Cancel>(handle_cancel)
        .finish();
}

fn handle_did_open_text_document(
    server: &mut Server,
    params: lsp_types::DidOpenTextDocumentParams,
) -> Result<()> {
    let lsp_types::TextDocumentItem { uri, language_id, version, text } = params.text_document;

    let document = Document::create(uri.as_str(), language_id, version, text);
    server.documents.insert(uri.clone(), Analysis::new(document));
    publish_diagnostics(server, &uri)
}

fn handle_did_change_text_document(
    server: &mut Server,
    params: lsp_types::DidChangeTextDocumentParams,
) -> Result<()> {
    let lsp_types::VersionedTextDocumentIdentifier { uri, version } = params.text_document;
    let changes = params.content_changes.into_iter().map(|change| ContentChange {
        range: change.range.map(from_lsp_range),
        text: change.text,
    });

    server.analysis_mut(&uri)?.update(changes, version);
    publish_diagnostics(server, &uri)
}

fn handle_did_close_text_document(
    server: &mut Server,
    params: lsp_types::DidCloseTextDocumentParams,
) -> Result<()> {
    let uri = params.text_document.uri;
    server.documents.remove(&uri);
    server.notify::<lsp_types::notification::PublishDiagnostics>(
        lsp_types::PublishDiagnosticsParams { uri, diagnostics: Vec::new(), version: None },
    );
    Ok(())
}

fn handle_cancel(server: &mut Server, params: lsp_types::CancelParams) -> Result<()> {
    forwards::cancel(server, &to_request_id(params.id));
    Ok(())
}

fn publish_diagnostics(server: &Server, uri: &lsp_types::Uri) -> Result<()> {
    let analysis = server.analysis(uri)?;
    let diagnostics = analysis
        .tree()
        .diagnostics()
        .iter()
        .map(|diagnostic| to_lsp_diagnostic(uri, diagnostic))
        .collect();

    server.notify::<lsp_types::notification::PublishDiagnostics>(
        lsp_types::PublishDiagnosticsParams {
            uri: uri.clone(),
            diagnostics,
            version: Some(analysis.document().version()),
        },
    );
    Ok(())
}

fn to_lsp_diagnostic(
    uri: &lsp_types::Uri,
    diagnostic: &efml_errors::Diagnostic,
) -> lsp_types::Diagnostic {
    let related = diagnostic
        .related()
        .iter()
        .map(|related| lsp_types::DiagnosticRelatedInformation {
            location: lsp_types::Location::new(uri.clone(), to_lsp_range(related.lined)),
            message: related.message.clone(),
        })
        .collect::<Vec<_>>();

    lsp_types::Diagnostic {
        range: to_lsp_range(diagnostic.lined()),
        severity: Some(to_lsp_severity(diagnostic.severity())),
        code: Some(lsp_types::NumberOrString::Number(diagnostic.code() as i32)),
        source: Some("efml".to_owned()),
        message: diagnostic.message().to_owned(),
        related_information: (!related.is_empty()).then_some(related),
        ..lsp_types::Diagnostic::default()
    }
}

fn to_lsp_severity(severity: Severity) -> lsp_types::DiagnosticSeverity {
    match severity {
        Severity::Error => lsp_types::DiagnosticSeverity::ERROR,
        Severity::Warning => lsp_types::DiagnosticSeverity::WARNING,
        Severity::Information => lsp_types::DiagnosticSeverity::INFORMATION,
        Severity::Hint => lsp_types::DiagnosticSeverity::HINT,
    }
}
