//! HTTP surface tests, driven through the router with `tower::ServiceExt`

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use viva_engine::api;
use viva_engine::config::{AIConfig, InterviewConfig};
use viva_engine::interview::{InterviewService, SessionStore};
use viva_engine::keys::{ApiKey, Provider, ProviderRegistry};
use viva_engine::llm::{GenerationGateway, ProviderCall, TextGenerator};

struct FixedGenerator;

#[async_trait]
impl TextGenerator for FixedGenerator {
    fn provider(&self) -> Provider {
        Provider::OpenAI
    }

    async fn generate(
        &self,
        _key: &ApiKey,
        _call: &ProviderCall,
    ) -> viva_engine::llm::Result<String> {
        Ok(r#"{"question":"Explain borrowing.","evaluation":{"score":6,"strengths":"ok","improvements":"more","corrected_answer":"..."},"difficulty":"medium","interview_status":"IN_PROGRESS"}"#.to_string())
    }
}

/// Gemini stand-in that remembers the last call it received
#[derive(Default)]
struct RecordingGenerator {
    last: Mutex<Option<ProviderCall>>,
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate(
        &self,
        _key: &ApiKey,
        call: &ProviderCall,
    ) -> viva_engine::llm::Result<String> {
        *self.last.lock().unwrap() = Some(call.clone());
        Ok(format!("echo: {}", call.prompt))
    }
}

fn app_with_recorder() -> (Router, Arc<RecordingGenerator>) {
    let mut registry = ProviderRegistry::new(Provider::DEFAULT_PRIORITY.to_vec());
    registry
        .add_provider(Provider::OpenAI, vec![ApiKey::new("sk-openai")])
        .unwrap();
    registry
        .add_provider(Provider::Gemini, vec![ApiKey::new("gm-key")])
        .unwrap();
    let recorder = Arc::new(RecordingGenerator::default());
    let gateway = GenerationGateway::new(Arc::new(registry), AIConfig::default())
        .with_generator(Arc::new(FixedGenerator))
        .with_generator(recorder.clone());
    let service = InterviewService::new(
        Arc::new(gateway),
        Arc::new(SessionStore::new()),
        InterviewConfig::default(),
    );
    (api::router(Arc::new(service), &[]), recorder)
}

fn app_with_keys(with_keys: bool) -> Router {
    let mut registry = ProviderRegistry::new(Provider::DEFAULT_PRIORITY.to_vec());
    if with_keys {
        registry
            .add_provider(Provider::OpenAI, vec![ApiKey::new("sk-hidden-key")])
            .unwrap();
    }
    let gateway = GenerationGateway::new(Arc::new(registry), AIConfig::default())
        .with_generator(Arc::new(FixedGenerator));
    let service = InterviewService::new(
        Arc::new(gateway),
        Arc::new(SessionStore::new()),
        InterviewConfig::default(),
    );
    api::router(Arc::new(service), &["http://localhost:3000".to_string()])
}

fn app() -> Router {
    app_with_keys(true)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn start(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/v1/interview/start",
        Some(json!({
            "role": "Backend Engineer",
            "experienceLevel": "senior",
            "language": "hindi",
            "maxQuestions": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["sessionId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health_hides_keys() {
    let (status, body) = send(&app(), "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["defaultProvider"], "openai");
    assert_eq!(body["supportedLanguages"], 11);
    assert_eq!(body["providers"][0]["keys"], 1);
    assert_eq!(body["providers"][0]["model"], AIConfig::default().openai.model);
    assert!(!body.to_string().contains("sk-hidden-key"));
}

#[tokio::test]
async fn test_health_degraded_without_keys() {
    let (status, body) = send(&app_with_keys(false), "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn test_catalog_endpoints() {
    let app = app();

    let (status, body) = send(&app, "GET", "/api/v1/interview/languages", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 11);

    let (status, body) = send(&app, "GET", "/api/v1/interview/languages/tamil", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "tamil");
    assert_eq!(body["name"], "Tamil");

    let (status, body) = send(&app, "GET", "/api/v1/interview/languages/latin", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "LANGUAGE_NOT_FOUND");

    let (status, body) = send(&app, "GET", "/api/v1/interview/experience-levels", None).await;
    assert_eq!(status, StatusCode::OK);
    let codes: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["code"].as_str().unwrap())
        .collect();
    assert_eq!(codes, vec!["junior", "mid", "senior"]);
}

#[tokio::test]
async fn test_interview_round_trip() {
    let app = app();
    let id = start(&app).await;

    let uri = format!("/api/v1/interview/{}/answer", id);
    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(json!({"candidateAnswer": "Ownership rules", "duration": 12.5, "confidence": 0.9})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["interviewStatus"], "IN_PROGRESS");
    assert_eq!(body["questionNumber"], 2);
    assert_eq!(body["evaluation"]["score"], 6.0);
    assert_eq!(body["evaluation"]["correctedAnswer"], "...");

    let (status, body) = send(
        &app,
        "POST",
        &uri,
        Some(json!({"candidateAnswer": "Lifetimes", "duration": 7.5, "confidence": 0.5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["interviewStatus"], "COMPLETED");
    assert!(body.get("nextQuestion").is_none());

    let (status, body) = send(&app, "GET", &format!("/api/v1/interview/{}/progress", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answered"], 2);
    assert_eq!(body["totalDuration"], 20.0);

    let (status, body) =
        send(&app, "POST", &format!("/api/v1/interview/{}/complete", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "COMPLETED");
    assert_eq!(body["totalAnswers"], 2);
    assert_eq!(body["userId"], "anonymous");
}

#[tokio::test]
async fn test_unsupported_language_is_bad_request() {
    let (status, body) = send(
        &app(),
        "POST",
        "/api/v1/interview/start",
        Some(json!({"role": "QA", "experienceLevel": "mid", "language": "esperanto"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "UNSUPPORTED_LANGUAGE");
    assert!(!body["error"]["hint"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let (status, body) = send(&app(), "GET", "/api/v1/interview/nope/progress", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn test_double_pause_is_conflict() {
    let app = app();
    let id = start(&app).await;
    let uri = format!("/api/v1/interview/{}/pause", id);

    let (status, body) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["interviewStatus"], "PAUSED");

    let (status, body) = send(&app, "POST", &uri, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "INVALID_STATE_TRANSITION");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/api/v1/interview/{}/answer", id),
        Some(json!({"candidateAnswer": "x"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_json_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/interview/start")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
}

#[tokio::test]
async fn test_no_keys_is_service_unavailable() {
    let app = app_with_keys(false);
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/interview/start",
        Some(json!({"role": "QA", "experienceLevel": "junior", "language": "english"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "NO_KEY_AVAILABLE");

    let (_, health) = send(&app, "GET", "/api/v1/health", None).await;
    assert_eq!(health["activeSessions"], 0);
}

#[tokio::test]
async fn test_prompt_preview() {
    let (status, body) = send(
        &app(),
        "POST",
        "/api/v1/interview/prompt-preview",
        Some(json!({
            "role": "Data Engineer",
            "experienceLevel": "junior",
            "language": "marathi",
            "maxQuestions": 3,
            "questionNumber": 3,
            "previousQuestion": "What is a join?",
            "candidateAnswer": "Combining tables"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let user_prompt = body["userPrompt"].as_str().unwrap();
    assert!(user_prompt.contains("Data Engineer"));
    assert!(user_prompt.contains("COMPLETED"));
    assert!(!body["systemPrompt"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_text_uses_configured_defaults() {
    let (app, recorder) = app_with_recorder();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/ai/generate-text",
        Some(json!({"prompt": "Name a Rust smart pointer"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "openai");
    assert_eq!(body["model"], AIConfig::default().openai.model);
    assert!(body["text"].as_str().unwrap().contains("Explain borrowing."));
    assert!(recorder.last.lock().unwrap().is_none());
}

#[tokio::test]
async fn test_generate_text_forwards_overrides() {
    let (app, recorder) = app_with_recorder();
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/ai/generate-text",
        Some(json!({
            "prompt": "Name a Rust smart pointer",
            "provider": "Gemini",
            "model": "gemini-1.5-pro",
            "temperature": 0.25,
            "maxTokens": 32
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "gemini");
    assert_eq!(body["model"], "gemini-1.5-pro");
    assert_eq!(body["text"], "echo: Name a Rust smart pointer");

    let call = recorder.last.lock().unwrap().clone().unwrap();
    assert_eq!(call.model, "gemini-1.5-pro");
    assert_eq!(call.temperature, 0.25);
    assert_eq!(call.max_tokens, 32);
    assert!(call.system_prompt.is_none());
}

#[tokio::test]
async fn test_generate_text_rejects_bad_input() {
    let (app, recorder) = app_with_recorder();

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/ai/generate-text",
        Some(json!({"prompt": "hi", "provider": "mistral"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "INVALID_REQUEST");
    assert!(body["error"]["message"].as_str().unwrap().contains("mistral"));

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/ai/generate-text",
        Some(json!({"prompt": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/api/v1/ai/generate-text",
        Some(json!({"prompt": "hi", "temperature": 5.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(recorder.last.lock().unwrap().is_none());
}
