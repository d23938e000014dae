mod api;
mod forwards;
mod notifications;
mod requests;

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use anyhow::Result;
use efml_errors::LinedRange;
use lsp_types::notification::{Cancel, Exit, Notification as _};
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::ProtocolFault;
use crate::analysis::{Analysis, SemanticRole};
use forwards::Forwards;

/// How often pending forwards are checked for expiry.
const TICK: Duration = Duration::from_millis(100);

/// Tunables read from `initializationOptions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerConfig {
    /// How long a forwarded completion or hover may wait for the client.
    pub forward_timeout_ms: u64,
    /// Lifetime of the cached tag name list.
    pub tag_cache_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { forward_timeout_ms: 5000, tag_cache_ttl_secs: 30 * 60 }
    }
}

impl ServerConfig {
    fn forward_timeout(&self) -> Duration {
        Duration::from_millis(self.forward_timeout_ms)
    }

    fn tag_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.tag_cache_ttl_secs)
    }
}

pub struct Server {
    connection: lsp_server::Connection,
    io_threads: Option<lsp_server::IoThreads>,
    config: ServerConfig,
    documents: FxHashMap<lsp_types::Uri, Analysis>,
    forwards: Forwards,
    /// Messages already taken off the connection but not handled yet.
    backlog: VecDeque<lsp_server::Message>,
    shutdown_requested: bool,
}

impl Server {
    fn server_capabilities() -> lsp_types::ServerCapabilities {
        lsp_types::ServerCapabilities {
            text_document_sync: Some(lsp_types::TextDocumentSyncCapability::Kind(
                lsp_types::TextDocumentSyncKind::INCREMENTAL,
            )),
            folding_range_provider: Some(lsp_types::FoldingRangeProviderCapability::Simple(true)),
            document_symbol_provider: Some(lsp_types::OneOf::Left(true)),
            semantic_tokens_provider: Some(
                lsp_types::SemanticTokensServerCapabilities::SemanticTokensOptions(
                    lsp_types::SemanticTokensOptions {
                        legend: SemanticRole::legend(),
                        range: Some(false),
                        full: Some(lsp_types::SemanticTokensFullOptions::Bool(true)),
                        ..Default::default()
                    },
                ),
            ),
            completion_provider: Some(lsp_types::CompletionOptions {
                trigger_characters: Some(vec![".".to_owned()]),
                ..Default::default()
            }),
            hover_provider: Some(lsp_types::HoverProviderCapability::Simple(true)),
            ..lsp_types::ServerCapabilities::default()
        }
    }

    /// Serves the client on stdin/stdout.
    pub fn new() -> Result<Self> {
        let (connection, io_threads) = lsp_server::Connection::stdio();
        Self::initialize(connection, Some(io_threads))
    }

    /// Serves the client on the other end of `connection`, which must not
    /// have been initialized yet.
    pub fn with_connection(connection: lsp_server::Connection) -> Result<Self> {
        Self::initialize(connection, None)
    }

    fn initialize(
        connection: lsp_server::Connection,
        io_threads: Option<lsp_server::IoThreads>,
    ) -> Result<Self> {
        let (initialize_id, initialize_params) = match connection.initialize_start() {
            Ok(it) => it,
            Err(protocol_error) => {
                if protocol_error.channel_is_disconnected()
                    && let Some(io_threads) = io_threads
                {
                    io_threads.join()?;
                }
                return Err(protocol_error.into());
            }
        };

        let config = config_from_params(&initialize_params);
        tracing::info!(?config, "initializing");

        let initialize_data = serde_json::json!({
            "capabilities": Self::server_capabilities(),
            "serverInfo": {
                "name": "efml",
                "version": env!("CARGO_PKG_VERSION"),
            },
        });

        if let Err(protocol_error) = connection.initialize_finish(initialize_id, initialize_data) {
            if protocol_error.channel_is_disconnected()
                && let Some(io_threads) = io_threads
            {
                io_threads.join()?;
            }
            return Err(protocol_error.into());
        }

        Ok(Self {
            connection,
            io_threads,
            config,
            documents: FxHashMap::default(),
            forwards: Forwards::default(),
            backlog: VecDeque::new(),
            shutdown_requested: false,
        })
    }

    pub fn config(&self) -> ServerConfig {
        self.config
    }

    pub fn run(mut self) -> Result<()> {
        let receiver = self.connection.receiver.clone();
        let ticker = crossbeam_channel::tick(TICK);

        loop {
            crossbeam_channel::select! {
                recv(receiver) -> message => {
                    let Ok(message) = message else { break };
                    self.backlog.push_back(message);
                    self.backlog.extend(receiver.try_iter());
                    if self.drain_backlog() {
                        break;
                    }
                }
                recv(ticker) -> _ => forwards::expire(&mut self, Instant::now()),
            }
        }

        tracing::info!("exiting");
        match self.io_threads.take() {
            Some(io_threads) => io_threads.join().map_err(Into::into),
            None => Ok(()),
        }
    }

    /// Handles everything queued up. Returns `true` once the client asked to
    /// exit.
    fn drain_backlog(&mut self) -> bool {
        while let Some(message) = self.backlog.pop_front() {
            match message {
                lsp_server::Message::Request(request) => api::request(self, request),
                lsp_server::Message::Response(response) => forwards::resume(self, response),
                lsp_server::Message::Notification(notification) => {
                    if notification.method == Exit::METHOD {
                        if !self.shutdown_requested {
                            tracing::warn!("exit without shutdown");
                        }
                        return true;
                    }
                    api::notification(self, notification);
                }
            }
        }
        false
    }

    /// Whether the client already asked to cancel `id` in a message that has
    /// not been handled yet.
    fn cancel_pending(&self, id: &lsp_server::RequestId) -> bool {
        self.backlog.iter().any(|message| {
            matches!(
                message,
                lsp_server::Message::Notification(notification)
                    if cancelled_request(notification).as_ref() == Some(id)
            )
        })
    }

    fn analysis(&self, uri: &lsp_types::Uri) -> Result<&Analysis> {
        self.documents.get(uri).ok_or_else(|| ProtocolFault::DocumentNotFound.into())
    }

    fn analysis_mut(&mut self, uri: &lsp_types::Uri) -> Result<&mut Analysis> {
        self.documents.get_mut(uri).ok_or_else(|| ProtocolFault::DocumentNotFound.into())
    }

    fn send(&self, message: lsp_server::Message) {
        if let Err(error) = self.connection.sender.send(message) {
            tracing::error!(%error, "failed to send a message to the client");
        }
    }

    fn respond(&self, response: lsp_server::Response) {
        self.send(response.into());
    }

    fn notify<N>(&self, params: N::Params)
    where
        N: lsp_types::notification::Notification,
    {
        match new_notification::<N>(params) {
            Ok(notification) => self.send(notification.into()),
            Err(error) => tracing::error!(method = N::METHOD, %error, "failed to encode notification"),
        }
    }
}

fn config_from_params(params: &serde_json::Value) -> ServerConfig {
    let Some(options) = params.get("initializationOptions").filter(|options| !options.is_null())
    else {
        return ServerConfig::default();
    };

    from_json("initializationOptions", options).unwrap_or_else(|error| {
        tracing::warn!(%error, "ignoring initialization options");
        ServerConfig::default()
    })
}

/// The request a `$/cancelRequest` notification refers to.
fn cancelled_request(notification: &lsp_server::Notification) -> Option<lsp_server::RequestId> {
    if notification.method != Cancel::METHOD {
        return None;
    }
    let params = from_json::<lsp_types::CancelParams>(Cancel::METHOD, &notification.params).ok()?;
    Some(to_request_id(params.id))
}

fn to_request_id(id: lsp_types::NumberOrString) -> lsp_server::RequestId {
    match id {
        lsp_types::NumberOrString::Number(id) => id.into(),
        lsp_types::NumberOrString::String(id) => id.into(),
    }
}

fn from_json<T: serde::de::DeserializeOwned>(
    what: &'static str,
    json: &serde_json::Value,
) -> Result<T> {
    serde_json::from_value(json.clone())
        .map_err(|e| anyhow::format_err!("Failed to deserialize {what}: {e}; {json}"))
}

fn result_to_response<R>(
    id: lsp_server::RequestId,
    result: Result<R::Result>,
) -> lsp_server::Response
where
    R: lsp_types::request::Request,
    R::Result: serde::Serialize,
{
    match result {
        Ok(resp) => lsp_server::Response::new_ok(id, &resp),
        Err(error) => error_response(id, &error),
    }
}

fn error_response(id: lsp_server::RequestId, error: &anyhow::Error) -> lsp_server::Response {
    let code = match error.downcast_ref::<ProtocolFault>() {
        Some(fault) => fault.code(),
        None => lsp_server::ErrorCode::InternalError as i32,
    };
    lsp_server::Response::new_err(id, code, error.to_string())
}

fn fault_response(id: lsp_server::RequestId, fault: ProtocolFault) -> lsp_server::Response {
    lsp_server::Response::new_err(id, fault.code(), fault.to_string())
}

fn new_notification<N>(params: N::Params) -> Result<lsp_server::Notification>
where
    N: lsp_types::notification::Notification,
{
    Ok(lsp_server::Notification {
        method: N::METHOD.to_owned(),
        params: serde_json::to_value(&params)?,
    })
}

fn to_lsp_range(range: LinedRange) -> lsp_types::Range {
    lsp_types::Range::new(
        lsp_types::Position::new(range.start.line, range.start.character),
        lsp_types::Position::new(range.end.line, range.end.character),
    )
}

fn from_lsp_range(range: lsp_types::Range) -> LinedRange {
    LinedRange::new(
        efml_errors::Position::new(range.start.line, range.start.character),
        efml_errors::Position::new(range.end.line, range.end.character),
    )
}
