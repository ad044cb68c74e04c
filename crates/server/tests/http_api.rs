//! Router tests for the voice support API.
//!
//! Each test builds its own state with mock model and speech backends and a
//! temporary directory for audio and the history file.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use voice_support_agent::{SessionManager, SessionOrchestrator};
use voice_support_config::Settings;
use voice_support_core::{LanguageModel, TextToSpeech};
use voice_support_persistence::JsonConversationMirror;
use voice_support_pipeline::SpeechSynthesizer;
use voice_support_server::{create_router, AppState};

// =============================================================================
// Helpers
// =============================================================================

#[derive(Default)]
struct EchoLlm {
    fail: AtomicBool,
    delay_ms: AtomicU64,
}

#[async_trait]
impl LanguageModel for EchoLlm {
    async fn generate(&self, prompt: &str) -> voice_support_core::Result<String> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(voice_support_core::Error::Llm("upstream unavailable".into()));
        }
        let query = prompt.rsplit("User: ").next().unwrap_or_default();
        Ok(format!("**Echo**: {}", query))
    }

    fn model_name(&self) -> &str {
        "echo"
    }
}

#[derive(Default)]
struct FakeTts {
    fail: AtomicBool,
    delay_ms: AtomicU64,
}

#[async_trait]
impl TextToSpeech for FakeTts {
    async fn synthesize(&self, text: &str, language: &str) -> voice_support_core::Result<Vec<u8>> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(voice_support_core::Error::Tts("speech endpoint down".into()));
        }
        Ok(format!("{}|{}", language, text).into_bytes())
    }

    fn supported_languages(&self) -> &[&'static str] {
        &["en", "hi", "mr"]
    }

    fn model_name(&self) -> &str {
        "fake"
    }
}

struct TestApp {
    router: axum::Router,
    llm: Arc<EchoLlm>,
    tts: Arc<FakeTts>,
    dir: tempfile::TempDir,
}

async fn make_app() -> TestApp {
    make_app_with(|_| {}).await
}

async fn make_app_with(configure: impl FnOnce(&mut Settings)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let llm = Arc::new(EchoLlm::default());
    let tts = Arc::new(FakeTts::default());

    let mut settings = Settings::default();
    settings.llm.api_key = Some("test-key".into());
    settings.tts.audio_dir = dir.path().join("audio").display().to_string();
    settings.storage.history_file = dir.path().join("history.json").display().to_string();
    configure(&mut settings);

    let sessions = Arc::new(SessionManager::from_config(&settings.sessions));
    let mirror = JsonConversationMirror::open(&settings.storage.history_file)
        .await
        .unwrap();
    let orchestrator = SessionOrchestrator::new(
        sessions.clone(),
        llm.clone(),
        SpeechSynthesizer::new(tts.clone(), &settings.tts.audio_dir),
        Arc::new(mirror),
        settings.persona.system_prompt.clone(),
    )
    .with_settings(&settings);

    TestApp {
        router: create_router(AppState::new(settings, orchestrator, sessions)),
        llm,
        tts,
        dir,
    }
}

fn post_json(uri: &str, json: &str) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(resp: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(resp: axum::response::Response) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

async fn start(app: &TestApp) -> String {
    let resp = app
        .router
        .clone()
        .oneshot(Request::post("/start-conversation").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["session_id"].as_str().unwrap().to_string()
}

async fn ask(app: &TestApp, session_id: &str, text: &str) -> axum::response::Response {
    let body = serde_json::json!({ "text": text, "session_id": session_id }).to_string();
    app.router.clone().oneshot(post_json("/ask", &body)).await.unwrap()
}

// =============================================================================
// Conversation flow
// =============================================================================

#[tokio::test]
async fn test_start_conversation_returns_empty_history() {
    let app = make_app().await;
    let id = start(&app).await;

    let resp = app
        .router
        .clone()
        .oneshot(get(&format!("/get-history/{}", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, serde_json::json!({ "history": [] }));
}

#[tokio::test]
async fn test_english_round_trip() {
    let app = make_app().await;
    let id = start(&app).await;

    let resp = ask(&app, &id, "My router keeps restarting").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["session_id"], id.as_str());
    assert_eq!(json["detected_language"], "en");
    assert_eq!(json["reply"], "**Echo**: My router keeps restarting");
    assert_eq!(json["audio_available"], true);
    assert!(json.get("warning").is_none());

    let resp = app
        .router
        .clone()
        .oneshot(get(&format!("/get-history/{}", id)))
        .await
        .unwrap();
    let history = body_json(resp).await;
    assert_eq!(
        history,
        serde_json::json!({ "history": [
            { "role": "user", "content": "My router keeps restarting" },
            { "role": "assistant", "content": "**Echo**: My router keeps restarting" },
        ]})
    );

    let resp = app
        .router
        .clone()
        .oneshot(get(&format!("/get-audio/{}", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "audio/mpeg");
    assert_eq!(body_bytes(resp).await, b"en|Echo: My router keeps restarting");
}

#[tokio::test]
async fn test_hindi_query() {
    let app = make_app().await;
    let id = start(&app).await;

    let resp = ask(&app, &id, "मेरा बिल गलत है").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["detected_language"], "hi");

    let resp = app
        .router
        .clone()
        .oneshot(get(&format!("/get-audio/{}", id)))
        .await
        .unwrap();
    assert!(body_bytes(resp).await.starts_with(b"hi|"));
}

#[tokio::test]
async fn test_french_query_reports_its_code() {
    let app = make_app().await;
    let id = start(&app).await;

    let resp = ask(
        &app,
        &id,
        "Bonjour, je voudrais savoir pourquoi ma facture est beaucoup plus élevée \
         que le mois dernier. Pouvez-vous m'aider, s'il vous plaît ?",
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["detected_language"], "fr");

    let resp = app
        .router
        .clone()
        .oneshot(get(&format!("/get-audio/{}", id)))
        .await
        .unwrap();
    assert!(body_bytes(resp).await.starts_with(b"en|"));
}

#[tokio::test]
async fn test_history_file_written() {
    let app = make_app().await;
    let id = start(&app).await;
    ask(&app, &id, "hello").await;
    ask(&app, &id, "hello again").await;

    let raw = std::fs::read_to_string(app.dir.path().join("history.json")).unwrap();
    let records: Value = serde_json::from_str(&raw).unwrap();
    let records = records.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["session_id"], id.as_str());
    assert_eq!(records[0]["messages"].as_array().unwrap().len(), 5);
}

// =============================================================================
// Error paths
// =============================================================================

#[tokio::test]
async fn test_ask_without_text() {
    let app = make_app().await;
    let id = start(&app).await;

    let resp = ask(&app, &id, "   ").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "No input text provided");

    let body = serde_json::json!({ "session_id": id }).to_string();
    let resp = app.router.clone().oneshot(post_json("/ask", &body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ask_unknown_session() {
    let app = make_app().await;
    let id = start(&app).await;

    let resp = ask(&app, "20240101000000-00000000000000000000000000000000", "hello").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Invalid session ID");

    let body = serde_json::json!({ "text": "hello" }).to_string();
    let resp = app.router.clone().oneshot(post_json("/ask", &body)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .router
        .clone()
        .oneshot(get(&format!("/get-history/{}", id)))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["history"], serde_json::json!([]));
}

#[tokio::test]
async fn test_ask_malformed_json() {
    let app = make_app().await;
    let resp = app
        .router
        .clone()
        .oneshot(post_json("/ask", "{not json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(resp).await["error"].is_string());
}

#[tokio::test]
async fn test_inference_failure() {
    let app = make_app().await;
    let id = start(&app).await;
    app.llm.fail.store(true, Ordering::SeqCst);

    let resp = ask(&app, &id, "hello").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_json(resp)
        .await["error"]
        .as_str()
        .unwrap()
        .contains("upstream unavailable"));

    let resp = app
        .router
        .clone()
        .oneshot(get(&format!("/get-audio/{}", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_synthesis_failure_still_replies() {
    let app = make_app().await;
    let id = start(&app).await;
    app.tts.fail.store(true, Ordering::SeqCst);

    let resp = ask(&app, &id, "hello").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["audio_available"], false);
    assert!(json["warning"].as_str().unwrap().contains("speech endpoint down"));
    assert_eq!(json["reply"], "**Echo**: hello");
}

#[tokio::test]
async fn test_failed_synthesis_hides_previous_audio() {
    let app = make_app().await;
    let id = start(&app).await;

    assert_eq!(ask(&app, &id, "first question").await.status(), StatusCode::OK);
    app.tts.fail.store(true, Ordering::SeqCst);
    let resp = ask(&app, &id, "second question").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["audio_available"], false);

    let resp = app
        .router
        .clone()
        .oneshot(get(&format!("/get-audio/{}", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_slow_synthesis_still_delivers_reply() {
    let app = make_app_with(|settings| {
        settings.server.timeout_seconds = 3;
        settings.llm.total_timeout_secs = 1;
        settings.tts.total_timeout_secs = 1;
    })
    .await;
    let id = start(&app).await;
    app.tts.delay_ms.store(5_000, Ordering::SeqCst);

    let resp = ask(&app, &id, "hello").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["reply"], "**Echo**: hello");
    assert_eq!(json["audio_available"], false);
    assert!(json["warning"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn test_request_timeout_returns_json_error() {
    let app = make_app_with(|settings| {
        settings.server.timeout_seconds = 1;
        settings.llm.total_timeout_secs = 30;
    })
    .await;
    let id = start(&app).await;
    app.llm.delay_ms.store(3_000, Ordering::SeqCst);

    let resp = ask(&app, &id, "hello").await;
    assert_eq!(resp.status(), StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body_json(resp).await["error"], "Request timed out");
}

#[tokio::test]
async fn test_get_history_unknown_session() {
    let app = make_app().await;
    let resp = app
        .router
        .clone()
        .oneshot(get("/get-history/unknown"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "Session not found");
}

#[tokio::test]
async fn test_get_audio_before_any_turn() {
    let app = make_app().await;
    let id = start(&app).await;

    let resp = app
        .router
        .clone()
        .oneshot(get(&format!("/get-audio/{}", id)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(body_json(resp).await["error"].is_string());
}

#[tokio::test]
async fn test_get_audio_rejects_malformed_id() {
    let app = make_app().await;
    let resp = app
        .router
        .clone()
        .oneshot(get("/get-audio/..%2Fhistory"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// =============================================================================
// Operational endpoints
// =============================================================================

#[tokio::test]
async fn test_health_and_ready() {
    let app = make_app().await;
    start(&app).await;

    let resp = app.router.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["status"], "healthy");

    let resp = app.router.clone().oneshot(get("/ready")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["status"], "ready");
    assert_eq!(json["sessions"], 1);
}
