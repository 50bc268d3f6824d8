use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header;
use axum::http::Request;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use policy_qa::api::build_app;
use policy_qa::api::fanout::FanOutOptions;
use policy_qa::api::AppState;
use policy_qa::api::PipelineCache;
use policy_qa::embeddings::Embedder;
use policy_qa::llm::TextGenerator;
use policy_qa::rag::pipeline::BLANK_QUESTION_ANSWER;
use policy_qa::rag::pipeline::RetrievalSettings;
use policy_qa::rag::Chunker;
use policy_qa::rag::DocumentLoader;
use policy_qa::rag::DocumentPipelineFactory;
use policy_qa::rag::Pipeline;
use policy_qa::rag::PipelineFactory;
use policy_qa::rag::QueryAnswer;
use policy_qa::PolicyQaError;
use policy_qa::Result;
use serde_json::json;
use serde_json::Value;
use tower::ServiceExt;

const SECRET: &str = "test-secret";
const POLICY_URL: &str = "https://example.com/policy.pdf";

/// Answers "A:<question>"; questions containing "explode" fail
struct StubPipeline;

#[async_trait]
impl Pipeline for StubPipeline {
    async fn query(&self, question: &str) -> Result<QueryAnswer> {
        if question.contains("explode") {
            return Err(PolicyQaError::QueryError(
                "upstream LLM returned 503 for key sk-live-123".to_string(),
            ));
        }
        Ok(QueryAnswer::new(format!("A:{question}")))
    }
}

#[derive(Default)]
struct StubFactory {
    builds: AtomicUsize,
}

#[async_trait]
impl PipelineFactory for StubFactory {
    async fn build(&self, document_url: &str) -> Result<Arc<dyn Pipeline>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if document_url.contains("missing") {
            return Err(PolicyQaError::DocumentFetchError(format!(
                "{document_url}: HTTP 404"
            )));
        }
        Ok(Arc::new(StubPipeline))
    }
}

fn app_with(
    factory: Arc<dyn PipelineFactory>,
    api_key: Option<&str>,
) -> (Router, Arc<PipelineCache>) {
    let cache = Arc::new(PipelineCache::new(factory));
    let state = AppState {
        cache: Arc::clone(&cache),
        api_key: api_key.map(str::to_string),
        fanout: FanOutOptions::default(),
    };
    (build_app(state, false), cache)
}

fn run_request(auth: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/hackrx/run")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn policy_body() -> Value {
    json!({
        "documents": POLICY_URL,
        "questions": ["What is covered?", "What is excluded?"]
    })
}

#[tokio::test]
async fn test_answers_returned_in_question_order() {
    let (app, _) = app_with(Arc::new(StubFactory::default()), Some(SECRET));

    let response = app
        .oneshot(run_request(Some("Bearer test-secret"), &policy_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"answers": ["A:What is covered?", "A:What is excluded?"]})
    );
}

#[tokio::test]
async fn test_empty_questions_returns_empty_answers() {
    let (app, _) = app_with(Arc::new(StubFactory::default()), Some(SECRET));
    let body = json!({"documents": POLICY_URL, "questions": []});

    let response = app
        .oneshot(run_request(Some("Bearer test-secret"), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"answers": []}));
}

#[tokio::test]
async fn test_wrong_token_is_unauthorized() {
    let factory = Arc::new(StubFactory::default());
    let (app, _) = app_with(factory.clone(), Some(SECRET));

    let response = app
        .oneshot(run_request(Some("Bearer wrong"), &policy_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"detail": "Invalid API key"})
    );
    // Rejected before any document work
    assert_eq!(factory.builds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_missing_header_is_unauthorized() {
    let (app, _) = app_with(Arc::new(StubFactory::default()), Some(SECRET));

    let response = app.oneshot(run_request(None, &policy_body())).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        json_body(response).await,
        json!({"detail": "Invalid API key"})
    );
}

#[tokio::test]
async fn test_token_without_bearer_prefix_is_accepted_literally() {
    let (app, _) = app_with(Arc::new(StubFactory::default()), Some(SECRET));

    let response = app
        .oneshot(run_request(Some("test-secret"), &policy_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unset_secret_rejects_every_request() {
    let (app, _) = app_with(Arc::new(StubFactory::default()), None);

    for auth in [None, Some("Bearer "), Some("Bearer anything")] {
        let response = app
            .clone()
            .oneshot(run_request(auth, &policy_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_bad_token_wins_over_malformed_body() {
    let (app, _) = app_with(Arc::new(StubFactory::default()), Some(SECRET));

    let request = Request::builder()
        .method("POST")
        .uri("/hackrx/run")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer wrong")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_failing_query_is_sanitized_internal_error() {
    let (app, _) = app_with(Arc::new(StubFactory::default()), Some(SECRET));
    let body = json!({
        "documents": POLICY_URL,
        "questions": ["What is covered?", "please explode"]
    });

    let response = app
        .oneshot(run_request(Some("Bearer test-secret"), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body, json!({"detail": "Internal server error"}));
    assert!(!body.to_string().contains("sk-live-123"));
}

#[tokio::test]
async fn test_unfetchable_document_is_internal_error_and_retried() {
    let factory = Arc::new(StubFactory::default());
    let (app, cache) = app_with(factory.clone(), Some(SECRET));
    let body = json!({
        "documents": "https://example.com/missing.pdf",
        "questions": ["Anything?"]
    });

    for _ in 0..2 {
        let response = app
            .clone()
            .oneshot(run_request(Some("Bearer test-secret"), &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    assert_eq!(factory.builds.load(Ordering::SeqCst), 2);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_same_document_is_built_once() {
    let factory = Arc::new(StubFactory::default());
    let (app, cache) = app_with(factory.clone(), Some(SECRET));

    for _ in 0..3 {
        let response = app
            .clone()
            .oneshot(run_request(Some("Bearer test-secret"), &policy_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(factory.builds.load(Ordering::SeqCst), 1);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn test_health_is_open_and_reports_cache_stats() {
    let (app, cache) = app_with(Arc::new(StubFactory::default()), Some(SECRET));
    cache.get_or_create(POLICY_URL).await.unwrap();
    cache.get_or_create(POLICY_URL).await.unwrap();
    assert!(cache.get_or_create("https://example.com/missing.pdf").await.is_err());

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["cached_documents"], 1);
    assert_eq!(body["cache_hit_rate"], 0.5);
    assert_eq!(body["failed_builds"], 1);
}

/// Embeds by keyword presence
struct KeywordEmbedder;

fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    ["grace", "hospital", "maternity"]
        .iter()
        .map(|k| if lower.contains(k) { 1.0 } else { 0.0 })
        .collect()
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(keyword_vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| keyword_vector(t)).collect())
    }
}

/// Replies with the first retrieved section
struct FirstSectionGenerator;

#[async_trait]
impl TextGenerator for FirstSectionGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(prompt
            .split("[Section 1]\n")
            .nth(1)
            .and_then(|rest| rest.lines().next())
            .unwrap_or_default()
            .to_string())
    }
}

const POLICY_TEXT: &str = "A grace period of thirty days is allowed for premium payment.\n\n\
    Hospital expenses are covered up to the sum insured.\n\n\
    Maternity benefits apply after 24 months of continuous coverage.";

/// Serve the policy text from a local listener; returns its URL
async fn serve_policy_document() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let doc_server = Router::new().route("/policy.txt", get(|| async { POLICY_TEXT }));
    tokio::spawn(async move {
        axum::serve(listener, doc_server).await.unwrap();
    });
    format!("http://{addr}/policy.txt")
}

fn document_factory() -> DocumentPipelineFactory {
    DocumentPipelineFactory::with_services(
        DocumentLoader::new(Duration::from_secs(5), 1024 * 1024).unwrap(),
        Chunker::new(80, 0).unwrap(),
        Arc::new(KeywordEmbedder),
        Arc::new(FirstSectionGenerator),
        RetrievalSettings {
            top_k: 1,
            max_context_length: 2000,
        },
    )
}

#[tokio::test]
async fn test_end_to_end_with_served_document() {
    let url = serve_policy_document().await;
    let (app, _) = app_with(Arc::new(document_factory()), Some(SECRET));

    let body = json!({
        "documents": url,
        "questions": [
            "Is maternity covered?",
            "What is the grace period?",
            "Are hospital bills covered?"
        ]
    });
    let response = app
        .oneshot(run_request(Some("Bearer test-secret"), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let answers = json_body(response).await["answers"].clone();
    assert!(answers[0].as_str().unwrap().starts_with("Maternity benefits"));
    assert!(answers[1].as_str().unwrap().starts_with("A grace period"));
    assert!(answers[2].as_str().unwrap().starts_with("Hospital expenses"));
}

#[tokio::test]
async fn test_blank_question_is_answered_not_rejected() {
    let url = serve_policy_document().await;
    let (app, _) = app_with(Arc::new(document_factory()), Some(SECRET));

    let body = json!({
        "documents": url,
        "questions": ["What is covered?", ""]
    });
    let response = app
        .oneshot(run_request(Some("Bearer test-secret"), &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let answers = json_body(response).await["answers"].clone();
    let answers = answers.as_array().unwrap();
    assert_eq!(answers.len(), 2);
    assert!(!answers[0].as_str().unwrap().is_empty());
    assert_eq!(answers[1], BLANK_QUESTION_ANSWER);
}
