//! Integration tests for the webhook relay.
//!
//! Each test spins up stub LINE and Gemini servers on random ports, points
//! the real gateway clients at them, serves the real webhook router, and
//! asserts on what the stubs received.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::time::timeout;

use polite_relay::channels::LineChannel;
use polite_relay::llm::GeminiClient;
use polite_relay::pipeline::{EventDispatcher, PromptTable};
use polite_relay::webhook::{WebhookState, webhook_routes};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// One request seen by a stub server.
#[derive(Debug, Clone)]
struct Captured {
    path: String,
    authorization: Option<String>,
    api_key: Option<String>,
    body: Value,
}

/// What the stub Gemini server answers.
#[derive(Debug, Clone)]
enum GeminiMode {
    Text(String),
    Status(u16, String),
    Empty,
}

#[derive(Clone)]
struct StubState {
    captured: Arc<Mutex<Vec<Captured>>>,
    gemini: GeminiMode,
}

impl StubState {
    async fn capture(&self, uri: &Uri, headers: &HeaderMap, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        self.captured.lock().await.push(Captured {
            path: uri.path().to_string(),
            authorization: header("authorization"),
            api_key: header("x-goog-api-key"),
            body,
        });
    }
}

async fn line_stub(
    State(state): State<StubState>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    state.capture(&uri, &headers, body).await;
    Json(json!({}))
}

async fn gemini_stub(
    State(state): State<StubState>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> axum::response::Response {
    state.capture(&uri, &headers, body).await;
    match state.gemini {
        GeminiMode::Text(text) => Json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        }))
        .into_response(),
        GeminiMode::Status(code, body) => (
            StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response(),
        GeminiMode::Empty => Json(json!({ "candidates": [] })).into_response(),
    }
}

async fn serve(app: Router) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    port
}

/// Running relay plus the requests its upstreams received.
struct Harness {
    relay_port: u16,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl Harness {
    async fn start(gemini: GeminiMode) -> Self {
        let stub = StubState {
            captured: Arc::new(Mutex::new(Vec::new())),
            gemini,
        };
        let upstream = Router::new()
            .route("/v2/bot/message/reply", post(line_stub))
            .route("/v2/bot/chat/loading/start", post(line_stub))
            .route("/generate", post(gemini_stub))
            .with_state(stub.clone());
        let upstream_port = serve(upstream).await;

        let channel = Arc::new(LineChannel::new(
            SecretString::from("line-token"),
            format!("http://127.0.0.1:{upstream_port}"),
        ));
        let llm = Arc::new(GeminiClient::new(
            SecretString::from("gemini-key"),
            format!("http://127.0.0.1:{upstream_port}/generate"),
        ));
        let dispatcher = EventDispatcher::new(channel, llm, Arc::new(PromptTable::builtin()));
        let relay_port = serve(webhook_routes(WebhookState {
            dispatcher: Arc::new(dispatcher),
        }))
        .await;

        // Give the servers a moment to start accepting connections.
        tokio::time::sleep(Duration::from_millis(50)).await;

        Self {
            relay_port,
            captured: stub.captured,
        }
    }

    async fn deliver(&self, events: Value) -> (StatusCode, Value) {
        let resp = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{}/api/webhook", self.relay_port))
            .json(&json!({ "destination": "Ubot", "events": events }))
            .send()
            .await
            .unwrap();
        let status = StatusCode::from_u16(resp.status().as_u16()).unwrap();
        (status, resp.json().await.unwrap())
    }

    async fn requests_to(&self, path: &str) -> Vec<Captured> {
        self.captured
            .lock()
            .await
            .iter()
            .filter(|c| c.path == path)
            .cloned()
            .collect()
    }
}

fn postback(reply_token: &str, data: &str) -> Value {
    json!({
        "type": "postback",
        "replyToken": reply_token,
        "source": { "type": "user", "userId": "U42" },
        "postback": { "data": data }
    })
}

fn text_message(reply_token: &str, text: &str) -> Value {
    json!({
        "type": "message",
        "replyToken": reply_token,
        "source": { "type": "user", "userId": "U42" },
        "message": { "type": "text", "id": "1", "text": text }
    })
}

// ── Tests ────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_message_replies_with_register_picker() {
    timeout(TEST_TIMEOUT, async {
        let harness = Harness::start(GeminiMode::Text("unused".into())).await;

        let (status, ack) = harness
            .deliver(json!([text_message("rt-1", "  こんにちは\n先輩  ")]))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack, json!({ "message": "ok" }));

        let replies = harness.requests_to("/v2/bot/message/reply").await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].authorization.as_deref(), Some("Bearer line-token"));
        assert_eq!(
            replies[0].body,
            json!({
                "replyToken": "rt-1",
                "messages": [{
                    "type": "template",
                    "altText": "変換シーンを選択してください",
                    "template": {
                        "type": "buttons",
                        "text": "このメッセージをどのように丁寧にしますか？",
                        "actions": [
                            { "type": "postback", "label": "部活", "data": "club_こんにちは 先輩" },
                            { "type": "postback", "label": "サークル", "data": "circle_こんにちは 先輩" },
                            { "type": "postback", "label": "就職活動", "data": "jobHunting_こんにちは 先輩" },
                            { "type": "postback", "label": "目上の大人", "data": "adult_こんにちは 先輩" }
                        ]
                    }
                }]
            })
        );
        assert!(harness.requests_to("/generate").await.is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn register_postback_runs_full_conversion() {
    timeout(TEST_TIMEOUT, async {
        let harness = Harness::start(GeminiMode::Text("明日はお休みをいただきます。\n".into())).await;

        let (status, _) = harness
            .deliver(json!([postback("rt-2", "jobHunting_明日休む")]))
            .await;
        assert_eq!(status, StatusCode::OK);

        let loading = harness.requests_to("/v2/bot/chat/loading/start").await;
        assert_eq!(loading.len(), 1);
        assert_eq!(loading[0].body, json!({ "chatId": "U42", "loadingSeconds": 10 }));

        let generate = harness.requests_to("/generate").await;
        assert_eq!(generate.len(), 1);
        assert_eq!(generate[0].api_key.as_deref(), Some("gemini-key"));
        let contents = generate[0].body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0]["role"], "user");
        assert!(
            contents[0]["parts"][0]["text"]
                .as_str()
                .unwrap()
                .contains("就職活動")
        );
        assert_eq!(
            contents[1]["parts"][0]["text"],
            "以下のテキストを、就職活動の場面に適した丁寧な言葉遣いに変換してください。\n\n明日休む"
        );

        let replies = harness.requests_to("/v2/bot/message/reply").await;
        assert_eq!(replies.len(), 1);
        let messages = replies[0].body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0],
            json!({ "type": "text", "text": "明日はお休みをいただきます。" })
        );
        assert_eq!(messages[1]["altText"], "変換されたテキストです");
        let actions = messages[1]["template"]["actions"].as_array().unwrap();
        assert_eq!(actions[0]["clipboardText"], "明日はお休みをいただきます。");
        assert_eq!(actions[1]["data"], "change_明日休む");
        assert_eq!(actions[2]["data"], "next_message");
        assert_eq!(actions[2]["inputOption"], "openKeyboard");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn gemini_error_status_is_reported_as_text() {
    timeout(TEST_TIMEOUT, async {
        let harness = Harness::start(GeminiMode::Status(429, "quota exceeded".into())).await;

        let (status, ack) = harness.deliver(json!([postback("rt-3", "club_hi")])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack, json!({ "message": "ok" }));

        let replies = harness.requests_to("/v2/bot/message/reply").await;
        assert_eq!(replies.len(), 1);
        assert_eq!(
            replies[0].body["messages"],
            json!([{
                "type": "text",
                "text": "エラーが発生しました: Gemini API request failed: 429 quota exceeded"
            }])
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn gemini_without_text_gets_fixed_message() {
    timeout(TEST_TIMEOUT, async {
        let harness = Harness::start(GeminiMode::Empty).await;

        harness.deliver(json!([postback("rt-4", "circle_hi")])).await;

        let replies = harness.requests_to("/v2/bot/message/reply").await;
        assert_eq!(replies.len(), 1);
        assert_eq!(
            replies[0].body["messages"],
            json!([{
                "type": "text",
                "text": "エラーが発生しました: Gemini APIからの応答にテキストが含まれていません。"
            }])
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn mixed_batch_dispatches_every_event() {
    timeout(TEST_TIMEOUT, async {
        let harness = Harness::start(GeminiMode::Text("はい".into())).await;

        let (status, ack) = harness
            .deliver(json!([
                postback("rt-next", "next_message"),
                postback("rt-change", "change_やあ"),
                postback("rt-bad", "unknown_payload"),
                { "type": "follow", "replyToken": "rt-follow", "source": { "type": "user", "userId": "U42" } },
                postback("rt-adult", "adult_やあ")
            ]))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ack, json!({ "message": "ok" }));

        let mut tokens: Vec<String> = harness
            .requests_to("/v2/bot/message/reply")
            .await
            .into_iter()
            .map(|c| c.body["replyToken"].as_str().unwrap().to_string())
            .collect();
        tokens.sort();
        assert_eq!(tokens, vec!["rt-adult", "rt-change", "rt-next"]);
        assert_eq!(harness.requests_to("/generate").await.len(), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unreachable_upstream_still_acknowledges() {
    timeout(TEST_TIMEOUT, async {
        let channel = Arc::new(LineChannel::new(
            SecretString::from("t"),
            "http://127.0.0.1:1",
        ));
        let llm = Arc::new(GeminiClient::new(
            SecretString::from("k"),
            "http://127.0.0.1:1/generate",
        ));
        let dispatcher = EventDispatcher::new(channel, llm, Arc::new(PromptTable::builtin()));
        let port = serve(webhook_routes(WebhookState {
            dispatcher: Arc::new(dispatcher),
        }))
        .await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let resp = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{port}/api/webhook"))
            .json(&json!({ "events": [postback("rt", "club_hi"), text_message("rt2", "yo")] }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
        assert_eq!(resp.json::<Value>().await.unwrap(), json!({ "message": "ok" }));
    })
    .await
    .expect("test timed out");
}
