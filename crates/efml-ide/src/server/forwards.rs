//! Requests the server sends to the client on behalf of a pending client
//! request, and the completion lists cached from their answers.

use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::{Server, fault_response, from_json};
use crate::ProtocolFault;
use crate::analysis::{ForwardCompletion, is_cacheable_tag};

#[derive(Default)]
pub(super) struct Forwards {
    next_id: i32,
    pending: FxHashMap<lsp_server::RequestId, Pending>,
    cache: CompletionCache,
}

struct Pending {
    /// Our own id, for `$/cancelRequest`.
    number: i32,
    /// The client request waiting on this one.
    origin: lsp_server::RequestId,
    deadline: Instant,
    kind: PendingKind,
}

pub(super) enum PendingKind {
    Completion { local: Vec<lsp_types::CompletionItem>, target: ForwardCompletion },
    Hover,
}

/// Host completion lists as they were received, before [`ForwardCompletion::select`].
#[derive(Default)]
struct CompletionCache {
    tags: Option<(Instant, lsp_types::CompletionList)>,
    attributes: FxHashMap<String, lsp_types::CompletionList>,
}

impl CompletionCache {
    fn get(
        &self,
        target: &ForwardCompletion,
        now: Instant,
        ttl: Duration,
    ) -> Option<&lsp_types::CompletionList> {
        match target {
            ForwardCompletion::Tag => self
                .tags
                .as_ref()
                .filter(|(stored, _)| now.duration_since(*stored) < ttl)
                .map(|(_, list)| list),
            _ => self.attributes.get(target.attribute_tag()?),
        }
    }

    fn store(&mut self, target: &ForwardCompletion, list: &lsp_types::CompletionList, now: Instant) {
        if list.is_incomplete || list.items.is_empty() {
            return;
        }

        match target {
            ForwardCompletion::Tag => self.tags = Some((now, list.clone())),
            ForwardCompletion::Attribute { tag } | ForwardCompletion::Event { tag }
                if is_cacheable_tag(tag) =>
            {
                self.attributes.insert(tag.clone(), list.clone());
            }
            _ => {}
        }
    }
}

/// Sends `R` to the client; the answer completes the client request `origin`.
pub(super) fn forward<R>(
    server: &mut Server,
    origin: lsp_server::RequestId,
    params: R::Params,
    kind: PendingKind,
) where
    R: lsp_types::request::Request,
{
    let forwards = &mut server.forwards;
    forwards.next_id += 1;
    let number = forwards.next_id;
    let id = lsp_server::RequestId::from(number);

    tracing::debug!(method = R::METHOD, %id, %origin, "forwarding to the client");
    let deadline = Instant::now() + server.config.forward_timeout();
    forwards.pending.insert(id.clone(), Pending { number, origin, deadline, kind });

    server.send(lsp_server::Request::new(id, R::METHOD.to_owned(), params).into());
}

pub(super) fn cached_completion(
    server: &Server,
    target: &ForwardCompletion,
) -> Option<lsp_types::CompletionList> {
    let ttl = server.config.tag_cache_ttl();
    server.forwards.cache.get(target, Instant::now(), ttl).cloned()
}

/// Local items followed by what the host contributed.
pub(super) fn merge(
    mut local: Vec<lsp_types::CompletionItem>,
    target: &ForwardCompletion,
    forwarded: Option<lsp_types::CompletionList>,
) -> lsp_types::CompletionResponse {
    let is_incomplete = forwarded.as_ref().is_some_and(|list| list.is_incomplete);
    if let Some(list) = forwarded {
        local.extend(target.select(list).items);
    }
    lsp_types::CompletionResponse::List(lsp_types::CompletionList { is_incomplete, items: local })
}

/// Completes the client request a forward was made for.
pub(super) fn resume(server: &mut Server, response: lsp_server::Response) {
    let Some(pending) = server.forwards.pending.remove(&response.id) else {
        tracing::debug!(id = %response.id, "response to an unknown or expired request");
        return;
    };

    let result = match response.error {
        Some(error) => {
            tracing::warn!(
                id = %response.id,
                code = error.code,
                message = %error.message,
                "forwarded request failed",
            );
            None
        }
        None => response.result,
    };

    settle(server, pending, result);
}

/// Answers every client request whose forward ran out of time.
pub(super) fn expire(server: &mut Server, now: Instant) {
    let expired = server
        .forwards
        .pending
        .iter()
        .filter(|(_, pending)| pending.deadline <= now)
        .map(|(id, _)| id.clone())
        .collect::<Vec<_>>();

    for id in expired {
        let Some(pending) = server.forwards.pending.remove(&id) else { continue };
        tracing::warn!(%id, origin = %pending.origin, "forwarded request timed out");
        settle(server, pending, None);
    }
}

/// The client gave up on `origin`; drop whatever was forwarded for it.
pub(super) fn cancel(server: &mut Server, origin: &lsp_server::RequestId) {
    let Some(id) = server
        .forwards
        .pending
        .iter()
        .find(|(_, pending)| &pending.origin == origin)
        .map(|(id, _)| id.clone())
    else {
        return;
    };
    let Some(pending) = server.forwards.pending.remove(&id) else { return };

    tracing::debug!(%origin, "request cancelled while waiting on the client");
    server.notify::<lsp_types::notification::Cancel>(lsp_types::CancelParams {
        id: lsp_types::NumberOrString::Number(pending.number),
    });
    server.respond(fault_response(pending.origin, ProtocolFault::RequestCancelled));
}

fn settle(server: &mut Server, pending: Pending, result: Option<serde_json::Value>) {
    let response = match pending.kind {
        PendingKind::Completion { local, target } => {
            let list = result.and_then(|value| {
                decode::<lsp_types::CompletionList>("completion list", &value)
            });
            if let Some(list) = &list {
                server.forwards.cache.store(&target, list, Instant::now());
            }
            lsp_server::Response::new_ok(pending.origin, merge(local, &target, list))
        }
        PendingKind::Hover => {
            // The host's range is relative to the fragment, not the document.
            let hover = result
                .and_then(|value| decode::<lsp_types::Hover>("hover", &value))
                .map(|hover| lsp_types::Hover { range: None, ..hover });
            lsp_server::Response::new_ok(pending.origin, hover)
        }
    };

    server.respond(response);
}

fn decode<T: serde::de::DeserializeOwned>(
    what: &'static str,
    value: &serde_json::Value,
) -> Option<T> {
    match from_json::<Option<T>>(what, value) {
        Ok(decoded) => decoded,
        Err(error) => {
            tracing::warn!(%error, "malformed answer from the client");
            None
        }
    }
}
