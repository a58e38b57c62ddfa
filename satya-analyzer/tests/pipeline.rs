mod common;

use satya_analyzer::{AnalysisRequest, Analyzer, Credentials};
use satya_common::SatyaError;
use satya_llm::analysis::{ScamCategory, Verdict};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";
const SEARCH_PATH: &str = "/customsearch/v1";

fn analyzer(server: &MockServer) -> Analyzer {
    Analyzer::new()
        .with_gemini_endpoint(&format!("{}/v1beta", server.uri()))
        .with_model("gemini-test")
        .with_search_endpoint(&server.uri())
}

fn envelope(payload: &Value) -> Value {
    json!({
        "candidates": [{
            "content": {"parts": [{"text": payload.to_string()}], "role": "model"},
            "finishReason": "STOP"
        }]
    })
}

fn fake_payload(category: &str) -> Value {
    json!({
        "verdict": "FAKE",
        "sentiment": "Urgent",
        "truthfulness_score": 4,
        "main_claim": "RBI is paying every citizen Rs 5000",
        "analysis_summary": "No such scheme has been announced by RBI.",
        "scam_category": category,
        "named_entities": {"ORG": ["RBI"]}
    })
}

fn real_payload() -> Value {
    json!({
        "verdict": "REAL",
        "sentiment": "Neutral",
        "truthfulness_score": 93,
        "main_claim": "The Reserve Bank kept the repo rate unchanged.",
        "analysis_summary": "Matches the official policy statement.",
        "scam_category": "N/A",
        "named_entities": {"ORG": ["Reserve Bank of India"]}
    })
}

async fn mount_analysis(server: &MockServer, payload: &Value) {
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "gem-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(payload)))
        .expect(1)
        .mount(server)
        .await;
}

fn news(n: usize) -> Value {
    let items: Vec<_> = (1..=n)
        .map(|i| json!({"title": format!("Fact check {i}"), "link": format!("https://factcheck.example/{i}")}))
        .collect();
    json!({"items": items})
}

fn with_search() -> Credentials {
    Credentials::new("gem-key").with_search("search-key", "engine-1")
}

#[tokio::test]
async fn well_formed_payload_becomes_the_analysis() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    mount_analysis(&server, &real_payload()).await;

    let report = analyzer(&server)
        .analyze(&AnalysisRequest::new("Repo rate unchanged", Credentials::new("gem-key")))
        .await
        .unwrap();

    assert_eq!(report.analysis.verdict, Verdict::Real);
    assert_eq!(report.analysis.truthfulness_score, 93);
    assert_eq!(
        report.analysis.main_claim,
        "The Reserve Bank kept the repo rate unchanged."
    );
    assert_eq!(report.analysis.summary, "Matches the official policy statement.");
    assert_eq!(report.analysis.scam_category, ScamCategory::NotApplicable);
    assert!(report.analysis.named_entities["ORG"].contains("Reserve Bank of India"));
}

#[tokio::test]
async fn malformed_payload_fails_without_a_report() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    mount_analysis(&server, &json!({"verdict": "FAKE"})).await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(1)))
        .expect(0)
        .mount(&server)
        .await;

    let err = analyzer(&server)
        .analyze(&AnalysisRequest::new("anything", with_search()))
        .await
        .unwrap_err();
    assert!(matches!(err, SatyaError::MalformedResponse(_)), "{err:?}");
}

#[tokio::test]
async fn envelope_without_candidates_is_malformed() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let err = analyzer(&server)
        .analyze(&AnalysisRequest::new("anything", Credentials::new("gem-key")))
        .await
        .unwrap_err();
    assert!(matches!(err, SatyaError::MalformedResponse(_)));
}

#[tokio::test]
async fn upstream_error_status_is_surfaced() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = analyzer(&server)
        .analyze(&AnalysisRequest::new("anything", Credentials::new("gem-key")))
        .await
        .unwrap_err();
    assert!(
        matches!(err, SatyaError::Service { status: Some(429), ref message } if message.contains("exhausted"))
    );
}

#[tokio::test]
async fn real_verdict_has_no_remedies_and_never_searches() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    mount_analysis(&server, &real_payload()).await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(3)))
        .expect(0)
        .mount(&server)
        .await;

    let report = analyzer(&server)
        .analyze(&AnalysisRequest::new("Repo rate unchanged", with_search()))
        .await
        .unwrap();

    assert!(!report.is_fake());
    assert_eq!(report.remedies, None);
    assert_eq!(report.related_news, None);
}

#[tokio::test]
async fn financial_fraud_points_to_sachet() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    mount_analysis(&server, &fake_payload("Financial Fraud")).await;

    let report = analyzer(&server)
        .analyze(&AnalysisRequest::new("Claim your Rs 5000 now", Credentials::new("gem-key")))
        .await
        .unwrap();

    let remedies = report.remedies.expect("fake verdict carries remedies");
    assert_eq!(remedies.reporting_link, "https://sachet.rbi.org.in/");
    assert_eq!(remedies.title, "Actions & Remedies for: Financial Fraud");
    assert_eq!(remedies.remedies.len(), 3);
}

#[tokio::test]
async fn unknown_category_gets_general_fake_news_guidance() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    mount_analysis(&server, &fake_payload("Lottery Scam")).await;

    let report = analyzer(&server)
        .analyze(&AnalysisRequest::new("You won a lottery", Credentials::new("gem-key")))
        .await
        .unwrap();

    assert_eq!(
        report.analysis.scam_category,
        ScamCategory::Other("Lottery Scam".into())
    );
    let remedies = report.remedies.unwrap();
    assert_eq!(remedies.reporting_link, "https://factcheck.pib.gov.in/");
    assert!(remedies.reporting_description.starts_with("For general fake news"));
}

#[tokio::test]
async fn fake_without_search_credentials_skips_search() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    mount_analysis(&server, &fake_payload("Financial Fraud")).await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(3)))
        .expect(0)
        .mount(&server)
        .await;

    let credentials = Credentials {
        search_key: Some("search-key".into()),
        ..Credentials::new("gem-key")
    };
    let report = analyzer(&server)
        .analyze(&AnalysisRequest::new("Claim your Rs 5000 now", credentials))
        .await
        .unwrap();

    assert!(report.remedies.is_some());
    assert_eq!(report.related_news, None);
}

#[tokio::test]
async fn fake_with_blank_claim_keeps_remedies_but_skips_search() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    let mut payload = fake_payload("Job Scam");
    payload["main_claim"] = json!("   ");
    mount_analysis(&server, &payload).await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(3)))
        .expect(0)
        .mount(&server)
        .await;

    let report = analyzer(&server)
        .analyze(&AnalysisRequest::new("Pay Rs 2000 to get a railway job", with_search()))
        .await
        .unwrap();

    assert_eq!(report.analysis.verdict, Verdict::Fake);
    assert!(report.related_news.is_none());
    let remedies = report.remedies.expect("fake verdicts carry remedies");
    assert_eq!(remedies.title, "Actions & Remedies for: Job Scam");
}

#[tokio::test]
async fn related_news_is_capped_at_three() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    mount_analysis(&server, &fake_payload("Financial Fraud")).await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("q", "RBI is paying every citizen Rs 5000"))
        .and(query_param("key", "search-key"))
        .and(query_param("cx", "engine-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(5)))
        .expect(1)
        .mount(&server)
        .await;

    let report = analyzer(&server)
        .analyze(&AnalysisRequest::new("Claim your Rs 5000 now", with_search()))
        .await
        .unwrap();

    let related = report.related_news.expect("search succeeded");
    assert_eq!(related.len(), 3);
    assert_eq!(related[0].link, "https://factcheck.example/1");
}

#[tokio::test]
async fn search_failure_does_not_fail_the_analysis() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    mount_analysis(&server, &fake_payload("Job Scam")).await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let report = analyzer(&server)
        .analyze(&AnalysisRequest::new("Pay Rs 999 for a railway job", with_search()))
        .await
        .unwrap();

    assert_eq!(report.analysis.scam_category, ScamCategory::JobScam);
    assert_eq!(
        report.remedies.unwrap().reporting_link,
        "https://cybercrime.gov.in/"
    );
    assert_eq!(report.related_news, None);
}

#[tokio::test]
async fn identical_inputs_give_identical_reports() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&fake_payload("Impersonation"))))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(news(2)))
        .expect(2)
        .mount(&server)
        .await;

    let analyzer = analyzer(&server);
    let request = AnalysisRequest::new("Message from the PM's new number", with_search());
    let first = analyzer.analyze(&request).await.unwrap();
    let second = analyzer.analyze(&request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}
