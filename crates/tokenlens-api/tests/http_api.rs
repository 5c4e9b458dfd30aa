#![allow(clippy::unwrap_used)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::{Value, json};
use tokenlens_api::{AppState, CORRELATION_ID_HEADER, routes::create_router};
use tokenlens_config::ApplicationConfig;
use tower::ServiceExt;

fn app() -> Router {
    let mut config = ApplicationConfig::default();
    config.tokenizer.huggingface_dir = std::env::temp_dir().join("tokenlens-api-tests-empty");
    create_router(AppState::from_config(&config).unwrap())
}

async fn send(request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, headers, body)
}

fn post_check(body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/check-limits")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_reports_correlation_id() {
    let (status, headers, body) = send(get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(
        headers[CORRELATION_ID_HEADER].to_str().unwrap(),
        body["correlation_id"].as_str().unwrap()
    );
}

#[tokio::test]
async fn test_caller_correlation_id_is_kept() {
    let id = uuid::Uuid::new_v4().to_string();
    let request = Request::builder()
        .uri("/health")
        .header(CORRELATION_ID_HEADER, &id)
        .body(Body::empty())
        .unwrap();
    let (_, headers, body) = send(request).await;
    assert_eq!(headers[CORRELATION_ID_HEADER].to_str().unwrap(), id);
    assert_eq!(body["correlation_id"], id);
}

#[tokio::test]
async fn test_invalid_correlation_id_is_replaced() {
    let request = Request::builder()
        .uri("/health")
        .header(CORRELATION_ID_HEADER, "not-a-uuid")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(request).await;
    let echoed = headers[CORRELATION_ID_HEADER].to_str().unwrap();
    assert_ne!(echoed, "not-a-uuid");
    assert!(uuid::Uuid::parse_str(echoed).is_ok());
}

#[tokio::test]
async fn test_text_within_limit() {
    let (status, _, body) = send(post_check(&json!({
        "provider": "openai",
        "model": "gpt-4",
        "model_type": "text",
        "content": "Hello, world!"
    })))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_within_limit"], true);
    assert_eq!(body["tier"], "precise");
    assert_eq!(body["model_max_tokens"], 8192);
    assert!(body.get("batches").is_none());
}

#[tokio::test]
async fn test_text_over_limit_returns_batches() {
    let text = "token ".repeat(10_000);
    let (status, _, body) = send(post_check(&json!({
        "provider": "openai",
        "model": "gpt-4",
        "model_type": "text",
        "content": text,
        "batch_size": 1000
    })))
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_within_limit"], false);
    assert_eq!(body["recommended_batch_size"], 1000);

    let batches = body["batches"].as_array().unwrap();
    let total: u64 = batches
        .iter()
        .map(|b| b["token_count"].as_u64().unwrap())
        .sum();
    assert_eq!(total, body["total_tokens"].as_u64().unwrap());
    assert_eq!(batches[0]["index"], 1);
    assert_eq!(batches[0]["start_char"], 0);
}

#[tokio::test]
async fn test_zero_batch_size_is_rejected() {
    let (status, _, body) = send(post_check(&json!({
        "provider": "openai",
        "model": "gpt-4",
        "model_type": "text",
        "content": "short",
        "batch_size": 0
    })))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["details"]["field"], "batch_size");
}

#[tokio::test]
async fn test_split_beyond_max_batches_is_rejected() {
    let text = "lorem ipsum dolor sit amet ".repeat(2000);
    let (status, _, body) = send(post_check(&json!({
        "provider": "openai",
        "model": "gpt-3.5-turbo",
        "model_type": "text",
        "content": text,
        "batch_size": 1
    })))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["details"]["field"], "batch_size");
    assert!(body["message"].as_str().unwrap().contains("larger batch_size"));
}

#[tokio::test]
async fn test_model_name_case_does_not_change_the_count() {
    let check = |model: &str| {
        post_check(&json!({
            "provider": "openai",
            "model": model,
            "model_type": "text",
            "content": "Hello, world!"
        }))
    };
    let (_, _, lower) = send(check("gpt-4o")).await;
    let (status, _, upper) = send(check("GPT-4O")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(upper["model"], "gpt-4o");
    assert_eq!(upper["tokenizer"], lower["tokenizer"]);
    assert_eq!(upper["total_tokens"], lower["total_tokens"]);
}

#[tokio::test]
async fn test_unknown_provider_and_model_are_not_found() {
    let (status, _, body) = send(post_check(&json!({
        "provider": "nobody",
        "model": "gpt-4",
        "model_type": "text",
        "content": "hi"
    })))
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "RESOURCE_NOT_FOUND");

    let (status, _, _) = send(post_check(&json!({
        "provider": "openai",
        "model": "gpt-99",
        "model_type": "text",
        "content": "hi"
    })))
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_remote_only_provider_needs_approximate_tier() {
    let request = json!({
        "provider": "anthropic",
        "model": "claude-3-opus",
        "model_type": "text",
        "content": "Hello there"
    });
    let (status, _, body) = send(post_check(&request)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "TOKENIZER_UNAVAILABLE");

    let mut approximate = request;
    approximate["tokenizer"] = json!("approximate");
    let (status, _, body) = send(post_check(&approximate)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tier"], "approximate");
}

#[tokio::test]
async fn test_media_check_reports_violations() {
    let (status, _, body) = send(post_check(&json!({
        "provider": "openai",
        "model": "dall-e-3",
        "model_type": "image",
        "content": { "size": "512x512", "style": "sketch" }
    })))
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_within_limit"], false);
    assert_eq!(body["content_type"], "image");
    let fields: Vec<&str> = body["violations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["size", "style"]);
}

#[tokio::test]
async fn test_mismatched_content_type_is_bad_request() {
    let (status, _, body) = send(post_check(&json!({
        "provider": "openai",
        "model": "gpt-4",
        "model_type": "image",
        "content": { "size": "1024x1024" }
    })))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "UNSUPPORTED_CONTENT_TYPE");

    let (status, _, body) = send(post_check(&json!({
        "provider": "openai",
        "model": "gpt-4",
        "model_type": "text",
        "content": { "text": "objects are for media" }
    })))
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "content");
}

#[tokio::test]
async fn test_malformed_body_is_validation_error() {
    let request = Request::builder()
        .method("POST")
        .uri("/check-limits")
        .header("content-type", "application/json")
        .body(Body::from("{\"provider\": "))
        .unwrap();
    let (status, headers, body) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert!(headers.contains_key(CORRELATION_ID_HEADER));
}

#[tokio::test]
async fn test_list_providers() {
    let (status, _, body) = send(get("/providers")).await;
    assert_eq!(status, StatusCode::OK);
    let providers = body["providers"].as_array().unwrap();
    assert_eq!(providers.len(), 27);

    let openai = providers.iter().find(|p| p["name"] == "openai").unwrap();
    assert_eq!(openai["precise_tokenizer"], true);
    let anthropic = providers.iter().find(|p| p["name"] == "anthropic").unwrap();
    assert_eq!(anthropic["precise_tokenizer"], false);
}

#[tokio::test]
async fn test_list_models_by_type_through_alias() {
    let (status, _, body) = send(get("/providers/open-ai/models?type=voice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["provider"], "openai");
    let names: Vec<&str> = body["models"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["tts-1", "tts-1-hd", "whisper-1"]);
}

#[tokio::test]
async fn test_get_single_model() {
    let (status, _, body) = send(get("/providers/mistral/models/mistral-embed")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["limits"]["type"], "embedding");
    assert_eq!(body["limits"]["additional_constraints"]["batch_size"], 96);

    let (_, _, body) = send(get("/providers/Mistral/models/Mistral-Embed")).await;
    assert_eq!(body["name"], "mistral-embed");

    let (status, _, _) = send(get("/providers/mistral/models/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
