mod common;

use satya_common::SatyaError;
use satya_llm::analysis::{analyze_text, ScamCategory, Verdict};
use satya_llm::gemini::GeminiClient;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

const MODEL: &str = "gemini-test";
const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

fn envelope(inner_text: &str) -> Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": inner_text}], "role": "model"},
            "finishReason": "STOP"
        }],
        "usageMetadata": {"promptTokenCount": 300, "candidatesTokenCount": 80, "totalTokenCount": 380}
    })
}

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::with_endpoint(&format!("{}/v1beta", server.uri()), "test-key", MODEL)
        .expect("client builds")
}

#[tokio::test]
async fn analysis_round_trip_through_the_envelope() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    let inner = json!({
        "verdict": "REAL",
        "sentiment": "Neutral",
        "truthfulness_score": 91,
        "main_claim": "ISRO launched Chandrayaan-3 in July 2023.",
        "analysis_summary": "Widely reported and confirmed by ISRO.",
        "scam_category": "N/A",
        "named_entities": {"ORG": ["ISRO"]}
    });

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "test-key"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(&format!("  {inner}\n"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let report = analyze_text(&client(&server), "Chandrayaan-3 launched in 2023")
        .await
        .expect("analysis succeeds");

    assert_eq!(report.verdict, Verdict::Real);
    assert_eq!(report.truthfulness_score, 91);
    assert_eq!(report.scam_category, ScamCategory::NotApplicable);
}

#[tokio::test]
async fn prompt_and_generation_config_are_sent() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            r#"{"verdict":"FAKE","sentiment":"Biased","truthfulness_score":5,"main_claim":"c","analysis_summary":"s","scam_category":"Impersonation","named_entities":{}}"#,
        )))
        .mount(&server)
        .await;

    analyze_text(&client(&server), "Forwarded: PM's new WhatsApp number")
        .await
        .unwrap();

    let received: Vec<Request> = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Forwarded: PM's new WhatsApp number"));
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
}

#[tokio::test]
async fn upstream_failure_is_a_service_error_with_message() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "API key not valid. Please pass a valid API key.", "status": "INVALID_ARGUMENT"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = analyze_text(&client(&server), "anything").await.unwrap_err();
    match err {
        SatyaError::Service { status, message } => {
            assert_eq!(status, Some(400));
            assert!(message.contains("API key not valid"));
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn blocked_prompt_is_malformed() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"promptFeedback": {"blockReason": "SAFETY"}})),
        )
        .mount(&server)
        .await;

    let err = analyze_text(&client(&server), "anything").await.unwrap_err();
    assert!(matches!(err, SatyaError::MalformedResponse(m) if m.contains("SAFETY")));
}

#[tokio::test]
async fn prose_instead_of_json_is_malformed() {
    common::init_test_tracing();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope("I'm sorry, I can't verify this claim.")),
        )
        .mount(&server)
        .await;

    let err = analyze_text(&client(&server), "anything").await.unwrap_err();
    assert!(matches!(err, SatyaError::MalformedResponse(_)));
}

#[tokio::test]
async fn blank_text_never_reaches_the_network() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = analyze_text(&client(&server), "  \n ").await.unwrap_err();
    assert!(matches!(err, SatyaError::Validation(_)));
}
