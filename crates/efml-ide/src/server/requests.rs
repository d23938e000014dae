use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use super::{Server, error_response, from_json, result_to_response};

/// The outcome of a handler that may need the client's help.
pub(crate) enum Reply<T> {
    Now(T),
    /// Answered later, once the client responds to a forwarded request.
    Deferred,
}

pub(crate) struct RequestDispatcher<'me> {
    request: Option<lsp_server::Request>,
    server: &'me mut Server,
}

impl<'me> RequestDispatcher<'me> {
    pub(crate) fn new(request: lsp_server::Request, server: &'me mut Server) -> Self {
        Self { request: request.into(), server }
    }

    fn parse<R>(&mut self) -> Option<(lsp_server::Request, R::Params)>
    where
        R: lsp_types::request::Request,
        R::Params: serde::de::DeserializeOwned,
    {
        let request = self.request.take_if(|request| request.method == R::METHOD)?;
        match from_json(R::METHOD, &request.params) {
            Ok(params) => Some((request, params)),
            Err(error) => {
                tracing::warn!(method = R::METHOD, %error, "invalid params");
                let response = lsp_server::Response::new_err(
                    request.id,
                    lsp_server::ErrorCode::InvalidParams as i32,
                    error.to_string(),
                );
                self.server.respond(response);
                None
            }
        }
    }

    pub(crate) fn on<R>(self, f: fn(&mut Server, R::Params) -> Result<R::Result>) -> Self
    where
        R: lsp_types::request::Request,
        R::Params: serde::de::DeserializeOwned,
        R::Result: serde::Serialize,
    {
        self.dispatch::<R>(|server, _, params| f(server, params).map(Reply::Now))
    }

    /// Like [`Self::on`], for handlers that give up when the client cancels
    /// the request.
    pub(crate) fn on_cancellable<R>(
        self,
        f: fn(&mut Server, R::Params, &CancellationToken) -> Result<R::Result>,
    ) -> Self
    where
        R: lsp_types::request::Request,
        R::Params: serde::de::DeserializeOwned,
        R::Result: serde::Serialize,
    {
        self.dispatch::<R>(|server, id, params| {
            let cancel = CancellationToken::new();
            if server.cancel_pending(id) {
                cancel.cancel();
            }
            f(server, params, &cancel).map(Reply::Now)
        })
    }

    /// For handlers that may forward part of the work to the client and
    /// answer `id` themselves later.
    pub(crate) fn on_deferred<R>(
        self,
        f: fn(&mut Server, lsp_server::RequestId, R::Params) -> Result<Reply<R::Result>>,
    ) -> Self
    where
        R: lsp_types::request::Request,
        R::Params: serde::de::DeserializeOwned,
        R::Result: serde::Serialize,
    {
        self.dispatch::<R>(|server, id, params| f(server, id.clone(), params))
    }

    fn dispatch<R>(
        mut self,
        f: impl FnOnce(&mut Server, &lsp_server::RequestId, R::Params) -> Result<Reply<R::Result>>,
    ) -> Self
    where
        R: lsp_types::request::Request,
        R::Params: serde::de::DeserializeOwned,
        R::Result: serde::Serialize,
    {
        let Some((request, params)) = self.parse::<R>() else {
            return self;
        };
        tracing::debug!(method = R::METHOD, id = %request.id, "handling request");

        let server = &mut *self.server;
        let result = panic::catch_unwind(AssertUnwindSafe(|| f(server, &request.id, params)))
            .unwrap_or_else(|payload| {
                Err(anyhow::format_err!("request handler panicked: {}", panic_message(&*payload)))
            });

        match result {
            Ok(Reply::Now(result)) => {
                self.server.respond(result_to_response::<R>(request.id, Ok(result)));
            }
            Ok(Reply::Deferred) => {}
            Err(error) => {
                tracing::error!(method = R::METHOD, id = %request.id, "{error:#}");
                self.server.respond(error_response(request.id, &error));
            }
        }

        self
    }

    pub(crate) fn finish(self) {
        if let Some(request) = self.request {
            tracing::warn!(method = %request.method, "unknown request");
            self.server.respond(lsp_server::Response::new_err(
                request.id,
                lsp_server::ErrorCode::MethodNotFound as i32,
                "unknown request".to_owned(),
            ));
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
