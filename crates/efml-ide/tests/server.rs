use std::thread;
use std::time::Duration;

use efml_ide::{CompletionArguments, ExternalLanguage, HoverArguments, Server};
use lsp_server::{Connection, Message, Notification, Request, RequestId, Response};
use serde_json::{Value, json};

const URI: &str = "file:///test.efml";

struct Client {
    connection: Connection,
    server: Option<thread::JoinHandle<()>>,
    next_id: i32,
    version: i32,
}

impl Client {
    fn start(options: Value) -> Self {
        let (client, server) = Connection::memory();
        let handle = thread::spawn(move || {
            Server::with_connection(server).unwrap().run().unwrap();
        });

        let mut client = Self { connection: client, server: Some(handle), next_id: 0, version: 0 };
        let result = client.request(
            "initialize",
            json!({ "capabilities": {}, "initializationOptions": options }),
        );
        assert_eq!(result["serverInfo"]["name"], "efml");
        client.notify("initialized", json!({}));
        client
    }

    fn recv(&self) -> Message {
        self.connection.receiver.recv_timeout(Duration::from_secs(10)).expect("server went quiet")
    }

    fn notify(&self, method: &str, params: Value) {
        let notification = Notification::new(method.to_owned(), params);
        self.connection.sender.send(notification.into()).unwrap();
    }

    fn send_request(&mut self, method: &str, params: Value) -> RequestId {
        self.next_id += 1;
        let id = RequestId::from(self.next_id);
        let request = Request::new(id.clone(), method.to_owned(), params);
        self.connection.sender.send(request.into()).unwrap();
        id
    }

    fn response(&self, id: &RequestId) -> Response {
        match self.recv() {
            Message::Response(response) if &response.id == id => response,
            other => panic!("expected the response to {id}, got {other:?}"),
        }
    }

    fn request(&mut self, method: &str, params: Value) -> Value {
        let id = self.send_request(method, params);
        let response = self.response(&id);
        assert!(response.error.is_none(), "{method} failed: {:?}", response.error);
        response.result.unwrap_or(Value::Null)
    }

    fn forwarded(&self, method: &str) -> Request {
        match self.recv() {
            Message::Request(request) if request.method == method => request,
            other => panic!("expected {method} from the server, got {other:?}"),
        }
    }

    fn notification(&self, method: &str) -> Value {
        match self.recv() {
            Message::Notification(notification) if notification.method == method => {
                notification.params
            }
            other => panic!("expected {method} from the server, got {other:?}"),
        }
    }

    fn open(&mut self, text: &str) -> Value {
        self.version = 1;
        self.notify(
            "textDocument/didOpen",
            json!({
                "textDocument": { "uri": URI, "languageId": "efml", "version": 1, "text": text }
            }),
        );
        self.notification("textDocument/publishDiagnostics")
    }

    fn change(&mut self, change: Value) -> Value {
        self.version += 1;
        self.notify(
            "textDocument/didChange",
            json!({
                "textDocument": { "uri": URI, "version": self.version },
                "contentChanges": [change],
            }),
        );
        self.notification("textDocument/publishDiagnostics")
    }

    fn shutdown(mut self) {
        assert_eq!(self.request("shutdown", Value::Null), Value::Null);
        self.notify("exit", Value::Null);
        if let Some(server) = self.server.take() {
            server.join().unwrap();
        }
    }
}

fn at(line: u32, character: u32) -> Value {
    json!({ "textDocument": { "uri": URI }, "position": { "line": line, "character": character } })
}

fn item_labels(list: &Value) -> Vec<&str> {
    list["items"].as_array().unwrap().iter().map(|item| item["label"].as_str().unwrap()).collect()
}

#[test]
fn advertises_capabilities() {
    let (client, server) = Connection::memory();
    let handle = thread::spawn(move || Server::with_connection(server).unwrap().config());

    let id = RequestId::from(1);
    client
        .sender
        .send(Request::new(id.clone(), "initialize".to_owned(), json!({ "capabilities": {} })).into())
        .unwrap();
    let response = match client.receiver.recv_timeout(Duration::from_secs(10)).unwrap() {
        Message::Response(response) => response,
        other => panic!("unexpected {other:?}"),
    };
    client.sender.send(Notification::new("initialized".to_owned(), json!({})).into()).unwrap();

    let config = handle.join().unwrap();
    assert_eq!(config.forward_timeout_ms, 5000);

    let capabilities = &response.result.unwrap()["capabilities"];
    assert_eq!(capabilities["textDocumentSync"], 2);
    assert_eq!(capabilities["hoverProvider"], true);
    assert_eq!(capabilities["foldingRangeProvider"], true);
    assert_eq!(capabilities["documentSymbolProvider"], true);
    assert_eq!(capabilities["completionProvider"]["triggerCharacters"], json!(["."]));
    assert_eq!(capabilities["semanticTokensProvider"]["full"], true);
    assert_eq!(capabilities["semanticTokensProvider"]["legend"]["tokenTypes"][0], "comment");
}

#[test]
fn diagnostics_follow_edits() {
    let mut client = Client::start(Value::Null);

    let published = client.open(">\n");
    assert_eq!(published["version"], 1);
    let diagnostics = published["diagnostics"].as_array().unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0]["code"], 5);
    assert_eq!(diagnostics[0]["source"], "efml");
    assert_eq!(diagnostics[0]["severity"], 1);

    let published = client.change(json!({
        "range": { "start": { "line": 0, "character": 1 }, "end": { "line": 0, "character": 1 } },
        "text": "div",
    }));
    assert_eq!(published["version"], 2);
    assert_eq!(published["diagnostics"], json!([]));

    let published = client.change(json!({ "text": ">\n" }));
    assert_eq!(published["diagnostics"].as_array().unwrap().len(), 1);

    client.notify("textDocument/didClose", json!({ "textDocument": { "uri": URI } }));
    let published = client.notification("textDocument/publishDiagnostics");
    assert_eq!(published["diagnostics"], json!([]));

    client.shutdown();
}

#[test]
fn local_features() {
    let mut client = Client::start(Value::Null);
    client.open("first\nsecond\nthird\n>div\n  @click.ctrl.meta.stop.alt.\n  @keyup.13=go\n");

    let completion = client.request("textDocument/completion", at(4, 28));
    assert_eq!(completion["isIncomplete"], false);
    assert_eq!(item_labels(&completion), ["shift", "prevent", "stopImmediate"]);

    let document = json!({ "textDocument": { "uri": URI } });
    let folds = client.request("textDocument/foldingRange", document.clone());
    assert!(folds.as_array().unwrap().iter().any(|fold| fold["kind"] == "comment"));

    let symbols = client.request("textDocument/documentSymbol", document.clone());
    assert_eq!(symbols[0]["name"], "div");

    let tokens = client.request("textDocument/semanticTokens/full", document.clone());
    let data = tokens["data"].as_array().unwrap();
    assert!(!data.is_empty());
    assert_eq!(data.len() % 5, 0);

    let hints = client.request("onUnstableInlayHints", json!([[document]]));
    assert_eq!(hints, json!([{ "position": { "line": 5, "character": 9 }, "label": "ENTER :" }]));

    let hover = client.request("textDocument/hover", at(4, 20));
    assert_eq!(hover["contents"]["kind"], "markdown");
    assert!(hover.get("range").is_none_or(Value::is_null));

    client.shutdown();
}

#[test]
fn unknown_documents_and_methods() {
    let mut client = Client::start(Value::Null);

    let id = client.send_request(
        "textDocument/foldingRange",
        json!({ "textDocument": { "uri": "file:///missing.efml" } }),
    );
    let error = client.response(&id).error.unwrap();
    assert_eq!(error.code, 1);
    assert_eq!(error.message, "Document not found");

    let id = client.send_request("efml/unheardOf", Value::Null);
    let error = client.response(&id).error.unwrap();
    assert_eq!(error.code, lsp_server::ErrorCode::MethodNotFound as i32);

    client.shutdown();
}

#[test]
fn hover_is_forwarded_to_the_client() {
    let mut client = Client::start(Value::Null);
    client.open(">div\n  #title\n");

    let id = client.send_request("textDocument/hover", at(1, 4));
    let forwarded = client.forwarded("requestHoverInfoFrom");
    assert_eq!(forwarded.params, json!([["html", "<div title />", { "line": 0, "character": 10 }]]));
    let ((_, _, position),): (HoverArguments,) =
        serde_json::from_value(forwarded.params.clone()).unwrap();
    assert_eq!(position, lsp_types::Position::new(0, 10));

    let answer = json!({
        "contents": { "kind": "markdown", "value": "Advisory information" },
        "range": { "start": { "line": 0, "character": 5 }, "end": { "line": 0, "character": 10 } },
    });
    client.connection.sender.send(Response::new_ok(forwarded.id, answer).into()).unwrap();

    let hover = client.response(&id).result.unwrap();
    assert_eq!(hover["contents"]["value"], "Advisory information");
    assert!(hover.get("range").is_none_or(Value::is_null));

    client.shutdown();
}

#[test]
fn unanswered_forwards_time_out() {
    let mut client = Client::start(json!({ "forwardTimeoutMs": 50 }));
    client.open(">div\n  #title\n");

    let id = client.send_request("textDocument/hover", at(1, 4));
    let forwarded = client.forwarded("requestHoverInfoFrom");
    assert_eq!(client.response(&id).result, Some(Value::Null));

    // A late answer is dropped without a reply.
    client.connection.sender.send(Response::new_ok(forwarded.id, Value::Null).into()).unwrap();
    let folds = client.request("textDocument/foldingRange", json!({ "textDocument": { "uri": URI } }));
    assert!(folds.is_array());

    client.shutdown();
}

#[test]
fn cancelling_a_forwarded_request() {
    let mut client = Client::start(Value::Null);
    client.open(">div\n  #title\n");

    let id = client.send_request("textDocument/hover", at(1, 4));
    let forwarded = client.forwarded("requestHoverInfoFrom");

    client.notify("$/cancelRequest", json!({ "id": id }));
    let cancelled = client.notification("$/cancelRequest");
    assert_eq!(cancelled["id"], json!(forwarded.id));

    let error = client.response(&id).error.unwrap();
    assert_eq!(error.code, 2);

    client.shutdown();
}

#[test]
fn forwarded_completion_is_merged_and_cached() {
    let mut client = Client::start(Value::Null);
    client.open(">div\n  @\n  #\n");

    let id = client.send_request("textDocument/completion", at(1, 3));
    let forwarded = client.forwarded("requestCompletionFrom");
    assert_eq!(forwarded.params, json!([["html", "<div ", { "line": 0, "character": 5 }, null]]));
    let ((language, source, _, kind),): (CompletionArguments,) =
        serde_json::from_value(forwarded.params.clone()).unwrap();
    assert_eq!((language, source.as_str(), kind), (ExternalLanguage::Html, "<div ", None));

    let answer = json!({
        "isIncomplete": false,
        "items": [{ "label": "id" }, { "label": "onclick" }, { "label": "onblur" }],
    });
    client.connection.sender.send(Response::new_ok(forwarded.id, answer).into()).unwrap();

    let completion = client.response(&id).result.unwrap();
    assert_eq!(item_labels(&completion), ["click", "blur"]);

    // The same tag's list now comes from the cache, for attributes too.
    let completion = client.request("textDocument/completion", at(1, 3));
    assert_eq!(item_labels(&completion), ["click", "blur"]);
    let completion = client.request("textDocument/completion", at(2, 3));
    assert_eq!(item_labels(&completion), ["id"]);

    client.shutdown();
}

#[test]
fn tag_list_expires_after_its_window() {
    let mut client = Client::start(json!({ "tagCacheTtlSecs": 0 }));
    client.open(">\n");

    let answer = json!({ "isIncomplete": false, "items": [{ "label": "div" }, { "label": "!DOCTYPE" }] });
    for _ in 0..2 {
        let id = client.send_request("textDocument/completion", at(0, 1));
        let forwarded = client.forwarded("requestCompletionFrom");
        client.connection.sender.send(Response::new_ok(forwarded.id, answer.clone()).into()).unwrap();

        let completion = client.response(&id).result.unwrap();
        assert_eq!(item_labels(&completion), ["div"]);
    }

    client.shutdown();
}

#[test]
fn failed_forward_degrades_to_local_items() {
    let mut client = Client::start(Value::Null);
    client.open(">div\n  @\n");

    let id = client.send_request("textDocument/completion", at(1, 3));
    let forwarded = client.forwarded("requestCompletionFrom");
    let failure = Response::new_err(forwarded.id, -32603, "no html service".to_owned());
    client.connection.sender.send(failure.into()).unwrap();

    let response = client.response(&id);
    assert!(response.error.is_none());
    let completion = response.result.unwrap();
    assert_eq!(completion["isIncomplete"], false);
    assert_eq!(completion["items"], json!([]));

    // Nothing was cached, so the next request asks again.
    let id = client.send_request("textDocument/completion", at(1, 3));
    let forwarded = client.forwarded("requestCompletionFrom");
    let answer = json!({ "isIncomplete": false, "items": [{ "label": "onclick" }] });
    client.connection.sender.send(Response::new_ok(forwarded.id, answer).into()).unwrap();
    assert_eq!(item_labels(&client.response(&id).result.unwrap()), ["click"]);

    client.shutdown();
}

#[test]
fn custom_element_lists_are_never_cached() {
    let mut client = Client::start(Value::Null);
    client.open(">my-widget\n  #\n>Card\n  #\n");

    let answer = json!({ "isIncomplete": false, "items": [{ "label": "slot" }] });
    for position in [at(1, 3), at(1, 3), at(3, 3), at(3, 3)] {
        let id = client.send_request("textDocument/completion", position);
        let forwarded = client.forwarded("requestCompletionFrom");
        client.connection.sender.send(Response::new_ok(forwarded.id, answer.clone()).into()).unwrap();

        let completion = client.response(&id).result.unwrap();
        assert_eq!(item_labels(&completion), ["slot"]);
    }

    client.shutdown();
}

#[test]
fn requests_after_shutdown_are_refused() {
    let mut client = Client::start(Value::Null);
    assert_eq!(client.request("shutdown", Value::Null), Value::Null);

    // Dropped: no diagnostics are published ahead of the refusal below.
    client.notify(
        "textDocument/didOpen",
        json!({ "textDocument": { "uri": URI, "languageId": "efml", "version": 1, "text": ">\n" } }),
    );

    let id = client.send_request("textDocument/foldingRange", json!({ "textDocument": { "uri": URI } }));
    let error = client.response(&id).error.unwrap();
    assert_eq!(error.code, lsp_server::ErrorCode::InvalidRequest as i32);

    client.notify("exit", Value::Null);
    if let Some(server) = client.server.take() {
        server.join().unwrap();
    }
}
