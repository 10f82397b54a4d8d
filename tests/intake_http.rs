//! Integration tests for the conversation and lead endpoints.
//!
//! Each test spins up an Axum server on a random port and talks to it with
//! reqwest. External services are replaced by in-memory stores and stub
//! servers bound to localhost.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Json;
use axum::http::StatusCode;
use axum::routing::post;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use trades_intake::conversation::ConversationOrchestrator;
use trades_intake::error::LlmError;
use trades_intake::leads::{LeadSink, WebhookForwarder};
use trades_intake::llm::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider, OpenAiProvider,
    Role,
};
use trades_intake::server::build_router;
use trades_intake::storage::memory::{MemoryConnector, MemoryFileStore, MemoryRecordStore};

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(5);

const DISCOVERY_REPLY: &str = "1) Where is the leak?\n2) Is it the spout or the base?\n3) Mixer or separate taps?\n4) Can you isolate the water?";

/// Stub LLM answering with a fixed reply and recording transcripts.
struct ScriptedLlm {
    reply: String,
    transcripts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedLlm {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            transcripts: Mutex::new(Vec::new()),
        })
    }

    fn transcripts(&self) -> Vec<Vec<ChatMessage>> {
        self.transcripts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    fn model_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.transcripts.lock().unwrap().push(request.messages);
        Ok(CompletionResponse {
            content: self.reply.clone(),
            input_tokens: 0,
            output_tokens: 0,
            finish_reason: FinishReason::Stop,
            response_id: None,
        })
    }
}

/// Bind a router on a random localhost port and return its base URL.
async fn serve(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;

    format!("http://127.0.0.1:{port}")
}

async fn start_intake(llm: Arc<dyn LlmProvider>, sink: LeadSink) -> String {
    let app = build_router(
        Arc::new(ConversationOrchestrator::new(llm)),
        Arc::new(sink),
        12 * 1024 * 1024,
    );
    serve(app).await
}

fn memory_sink(files: &Arc<MemoryFileStore>, records: &Arc<MemoryRecordStore>) -> LeadSink {
    LeadSink::Direct(Arc::new(MemoryConnector::new(files.clone(), records.clone())))
}

fn lead_body(images: Value) -> Value {
    json!({
        "name": "Alex",
        "contact": "07700 900456",
        "postcode": "SW4",
        "enquiry": "Kitchen tap is leaking",
        "summary": "Mixer tap dripping at the base, isolator works",
        "images": images
    })
}

// ── Conversation endpoint ────────────────────────────────────────────

#[tokio::test]
async fn empty_prompt_is_rejected() {
    timeout(TEST_TIMEOUT, async {
        let llm = ScriptedLlm::new("unused");
        let base = start_intake(llm.clone(), memory_sink(&Default::default(), &Default::default())).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/api/ai"))
            .json(&json!({ "prompt": "" }))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "No prompt or messages");
        assert!(llm.transcripts().is_empty());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn discover_returns_numbered_questions() {
    timeout(TEST_TIMEOUT, async {
        let llm = ScriptedLlm::new(DISCOVERY_REPLY);
        let base = start_intake(llm.clone(), memory_sink(&Default::default(), &Default::default())).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/api/ai"))
            .json(&json!({ "mode": "discover", "prompt": "Kitchen tap is leaking" }))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["reply"], DISCOVERY_REPLY);

        let transcripts = llm.transcripts();
        assert_eq!(transcripts.len(), 1);
        assert_eq!(transcripts[0].len(), 2);
        assert_eq!(transcripts[0][0].role, Role::System);
        assert_eq!(transcripts[0][1], ChatMessage::user("Kitchen tap is leaking"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn chat_history_is_forwarded_in_order() {
    timeout(TEST_TIMEOUT, async {
        let llm = ScriptedLlm::new("Thanks Alex. What's the best number to call?");
        let base = start_intake(llm.clone(), memory_sink(&Default::default(), &Default::default())).await;

        let history = json!([
            { "role": "user", "content": "Kitchen tap is leaking" },
            { "role": "assistant", "content": "What's your first name?" },
            { "role": "user", "content": "Alex" }
        ]);
        let resp = reqwest::Client::new()
            .post(format!("{base}/api/ai"))
            .json(&json!({ "messages": history }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let sent = &llm.transcripts()[0];
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(sent[1], ChatMessage::user("Kitchen tap is leaking"));
        assert_eq!(sent[2], ChatMessage::assistant("What's your first name?"));
        assert_eq!(sent[3], ChatMessage::user("Alex"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn identical_requests_give_identical_replies() {
    timeout(TEST_TIMEOUT, async {
        let llm = ScriptedLlm::new("Is water reaching any electrics?");
        let base = start_intake(llm, memory_sink(&Default::default(), &Default::default())).await;
        let client = reqwest::Client::new();

        let mut replies = Vec::new();
        for _ in 0..2 {
            let body: Value = client
                .post(format!("{base}/api/ai"))
                .json(&json!({ "prompt": "Ceiling dripping under bathroom" }))
                .send()
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            replies.push(body["reply"].clone());
        }
        assert_eq!(replies[0], replies[1]);
    })
    .await
    .expect("test timed out");
}

// ── Lead endpoint ────────────────────────────────────────────────────

#[tokio::test]
async fn two_images_are_uploaded_and_linked() {
    timeout(TEST_TIMEOUT, async {
        let files = Arc::new(MemoryFileStore::new());
        let records = Arc::new(MemoryRecordStore::new());
        let base = start_intake(ScriptedLlm::new(""), memory_sink(&files, &records)).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/api/log"))
            .json(&lead_body(json!([
                { "name": "tap.jpg", "mime": "image/jpeg", "data": "aGVsbG8=" },
                { "name": "sink.png", "mime": "image/png", "data": "d29ybGQ=" }
            ])))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["ok"], true);
        let refs = body["references"].as_array().unwrap();
        assert_eq!(refs.len(), 2);
        assert!(refs[0].as_str().unwrap().ends_with("_tap.jpg"));
        assert!(refs[1].as_str().unwrap().ends_with("_sink.png"));
        assert_eq!(body["photoLinks"], body["references"]);

        let rows = records.rows();
        assert_eq!(rows.len(), 1);
        let cell = &rows[0][6];
        assert!(cell.contains(refs[0].as_str().unwrap()));
        assert!(cell.contains(refs[1].as_str().unwrap()));
        assert!(cell.contains("Photo 2"));
        assert_eq!(rows[0][3], "SW4");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn failed_first_upload_keeps_second() {
    timeout(TEST_TIMEOUT, async {
        let files = Arc::new(MemoryFileStore::new().failing_on("first"));
        let records = Arc::new(MemoryRecordStore::new());
        let base = start_intake(ScriptedLlm::new(""), memory_sink(&files, &records)).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/api/log"))
            .json(&lead_body(json!([
                { "name": "first.jpg", "data": "aGVsbG8=" },
                { "name": "second.jpg", "data": "d29ybGQ=" }
            ])))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        let refs = body["references"].as_array().unwrap();
        assert_eq!(refs.len(), 1);
        assert!(refs[0].as_str().unwrap().ends_with("_second.jpg"));

        let cell = &records.rows()[0][6];
        assert!(cell.contains("Photo 1"));
        assert!(!cell.contains("Photo 2"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn append_failure_is_storage_error() {
    timeout(TEST_TIMEOUT, async {
        let files = Arc::new(MemoryFileStore::new());
        let records = Arc::new(MemoryRecordStore::failing());
        let base = start_intake(ScriptedLlm::new(""), memory_sink(&files, &records)).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/api/log"))
            .json(&lead_body(json!([
                { "name": "a.jpg", "data": "aGVsbG8=" },
                { "name": "b.jpg", "data": "d29ybGQ=" }
            ])))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 502);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Failed to log lead with images.");
        assert_eq!(files.objects().len(), 2);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn lead_without_photos_still_recorded() {
    timeout(TEST_TIMEOUT, async {
        let files = Arc::new(MemoryFileStore::new());
        let records = Arc::new(MemoryRecordStore::new());
        let base = start_intake(ScriptedLlm::new(""), memory_sink(&files, &records)).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/api/log"))
            .json(&lead_body(json!([])))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert!(body["references"].as_array().unwrap().is_empty());
        assert_eq!(records.rows().len(), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn null_fields_do_not_lose_the_lead() {
    timeout(TEST_TIMEOUT, async {
        let files = Arc::new(MemoryFileStore::new());
        let records = Arc::new(MemoryRecordStore::new());
        let base = start_intake(ScriptedLlm::new(""), memory_sink(&files, &records)).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/api/log"))
            .json(&json!({ "name": "Sam", "contact": null, "images": null }))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["ok"], true);
        let rows = records.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1], "Sam");
        assert_eq!(rows[0][2], "");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn webhook_variant_relays_reply() {
    timeout(TEST_TIMEOUT, async {
        let received: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = received.clone();
        let hook = axum::Router::new().route(
            "/hook",
            post(move |Json(body): Json<Value>| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(body);
                    Json(json!({ "ok": true, "row": 17 }))
                }
            }),
        );
        let hook_base = serve(hook).await;

        let sink = LeadSink::Forward(WebhookForwarder::new(format!("{hook_base}/hook")));
        let base = start_intake(ScriptedLlm::new(""), sink).await;

        let mut payload = lead_body(json!([]));
        payload["source"] = json!("landing-page");
        let resp = reqwest::Client::new()
            .post(format!("{base}/api/log"))
            .json(&payload)
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["row"], 17);
        let forwarded = received.lock().unwrap().clone();
        assert_eq!(forwarded.len(), 1);
        assert_eq!(forwarded[0]["source"], "landing-page");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn webhook_error_is_bad_gateway() {
    timeout(TEST_TIMEOUT, async {
        let hook = axum::Router::new().route(
            "/hook",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "script exploded") }),
        );
        let hook_base = serve(hook).await;

        let sink = LeadSink::Forward(WebhookForwarder::new(format!("{hook_base}/hook")));
        let base = start_intake(ScriptedLlm::new(""), sink).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/api/log"))
            .json(&lead_body(json!([])))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 502);
        let body: Value = resp.json().await.unwrap();
        assert!(body["detail"].as_str().unwrap().contains("script exploded"));
    })
    .await
    .expect("test timed out");
}

// ── OpenAI adapter against a stub server ─────────────────────────────

#[tokio::test]
async fn openai_adapter_reads_first_choice() {
    timeout(TEST_TIMEOUT, async {
        let requests: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();
        let stub = axum::Router::new().route(
            "/v1/chat/completions",
            post(move |Json(body): Json<Value>| {
                let seen = seen.clone();
                async move {
                    seen.lock().unwrap().push(body);
                    Json(json!({
                        "id": "chatcmpl-1",
                        "choices": [
                            { "message": { "role": "assistant", "content": "first" }, "finish_reason": "stop" },
                            { "message": { "role": "assistant", "content": "second" }, "finish_reason": "stop" }
                        ],
                        "usage": { "prompt_tokens": 12, "completion_tokens": 3 }
                    }))
                }
            }),
        );
        let base = serve(stub).await;

        let provider = OpenAiProvider::new("sk-test".to_string().into(), format!("{base}/v1"), "gpt-4o-mini");
        let response = provider
            .complete(
                CompletionRequest::new(vec![ChatMessage::user("hi")])
                    .with_model(Some("gpt-4o".into()))
                    .with_temperature(0.2),
            )
            .await
            .unwrap();

        assert_eq!(response.content, "first");
        assert_eq!(response.input_tokens, 12);
        assert_eq!(response.finish_reason, FinishReason::Stop);

        let sent = requests.lock().unwrap().clone();
        assert_eq!(sent[0]["model"], "gpt-4o");
        assert_eq!(sent[0]["messages"][0]["role"], "user");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn openai_adapter_empty_choices_is_empty_reply() {
    timeout(TEST_TIMEOUT, async {
        let stub = axum::Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({ "id": "chatcmpl-2", "choices": [] })) }),
        );
        let base = serve(stub).await;

        let provider = OpenAiProvider::new("sk-test".to_string().into(), format!("{base}/v1"), "gpt-4o-mini");
        let response = provider
            .complete(CompletionRequest::new(vec![ChatMessage::user("hi")]))
            .await
            .unwrap();
        assert_eq!(response.content, "");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn upstream_failure_surfaces_detail_through_endpoint() {
    timeout(TEST_TIMEOUT, async {
        let stub = axum::Router::new().route(
            "/v1/chat/completions",
            post(|| async {
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    r#"{"error":{"message":"Rate limit reached"}}"#,
                )
            }),
        );
        let stub_base = serve(stub).await;

        let provider: Arc<dyn LlmProvider> = Arc::new(OpenAiProvider::new(
            "sk-test".to_string().into(),
            format!("{stub_base}/v1"),
            "gpt-4o-mini",
        ));
        let base = start_intake(provider, memory_sink(&Default::default(), &Default::default())).await;

        let resp = reqwest::Client::new()
            .post(format!("{base}/api/ai"))
            .json(&json!({ "prompt": "Boiler pressure dropping" }))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 500);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "Upstream error");
        assert!(body["detail"].as_str().unwrap().contains("Rate limit reached"));
    })
    .await
    .expect("test timed out");
}
