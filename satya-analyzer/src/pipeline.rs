//! One analysis request from text to [`CombinedReport`].
//!
//! The flow is strictly sequential: validate, one analysis call, and for
//! `FAKE` verdicts the remedy lookup plus at most one search call. Only the
//! analysis path can fail the request; search problems are logged and
//! leave `related_news` empty.

use crate::remedies::RemedyTable;
use crate::report::{AnalysisRequest, CombinedReport, Credentials};
use satya_common::{Result, SatyaError};
use satya_config::{
    SatyaConfig, DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL, DEFAULT_SEARCH_ENDPOINT,
};
use satya_llm::analysis::{analyze_text_with_temperature, Verdict, ANALYSIS_TEMPERATURE};
use satya_llm::gemini::GeminiClient;
use satya_web::search::GoogleSearchClient;
use satya_web::NewsItem;
use std::time::Instant;
use tracing::Instrument;

/// Progress of a single request; each transition is logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Validating,
    AwaitingAnalysis,
    AwaitingEvidence,
    Done,
    Failed,
}

fn enter(stage: Stage) {
    tracing::debug!(?stage, "analysis.stage");
}

/// Immutable pipeline settings; share it behind an `Arc` for concurrent use.
#[derive(Debug, Clone)]
pub struct Analyzer {
    gemini_endpoint: String,
    model: String,
    temperature: f32,
    search_endpoint: String,
    remedies: RemedyTable,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self {
            gemini_endpoint: DEFAULT_GEMINI_ENDPOINT.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            temperature: ANALYSIS_TEMPERATURE,
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            remedies: RemedyTable::default(),
        }
    }
}

impl Analyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Endpoints, model and remedy overrides from a loaded configuration.
    /// Credentials are not captured; they travel with each request.
    pub fn from_config(config: &SatyaConfig) -> Self {
        let mut analyzer = Self::new()
            .with_gemini_endpoint(&config.analysis.endpoint)
            .with_model(&config.analysis.model)
            .with_remedies(RemedyTable::default().with_overrides(&config.remedies));
        if let Some(t) = config.analysis.temperature {
            analyzer = analyzer.with_temperature(t);
        }
        if let Some(search) = &config.search {
            analyzer = analyzer.with_search_endpoint(&search.endpoint);
        }
        analyzer
    }

    pub fn with_gemini_endpoint(mut self, endpoint: &str) -> Self {
        self.gemini_endpoint = endpoint.to_string();
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_search_endpoint(mut self, endpoint: &str) -> Self {
        self.search_endpoint = endpoint.to_string();
        self
    }

    pub fn with_remedies(mut self, remedies: RemedyTable) -> Self {
        self.remedies = remedies;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn remedies(&self) -> &RemedyTable {
        &self.remedies
    }

    /// Analyse `request.text` and assemble the combined report.
    ///
    /// Errors:
    /// - [`SatyaError::Validation`] for blank text,
    /// - [`SatyaError::Credential`] for a blank analysis key,
    /// - [`SatyaError::Service`] / [`SatyaError::MalformedResponse`] from the
    ///   analysis call.
    ///
    /// No partial report is ever returned.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<CombinedReport> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("analysis", %request_id, model = %self.model);
        async {
            let started = Instant::now();
            enter(Stage::Idle);
            match self.run(request).await {
                Ok(report) => {
                    enter(Stage::Done);
                    tracing::info!(
                        verdict = %report.analysis.verdict,
                        score = report.analysis.truthfulness_score,
                        scam_category = %report.analysis.scam_category,
                        related_news = ?report.related_news.as_ref().map(Vec::len),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "analysis.completed"
                    );
                    Ok(report)
                }
                Err(err) => {
                    enter(Stage::Failed);
                    tracing::warn!(
                        error = %err,
                        kind = ?err.kind(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "analysis.failed"
                    );
                    Err(err)
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: &AnalysisRequest) -> Result<CombinedReport> {
        enter(Stage::Validating);
        if request.text.trim().is_empty() {
            return Err(SatyaError::Validation(
                "text to analyze is empty".to_string(),
            ));
        }
        let credentials = &request.credentials;
        if credentials.analysis_key.trim().is_empty() {
            return Err(SatyaError::Credential(
                "analysis API key is required".to_string(),
            ));
        }

        enter(Stage::AwaitingAnalysis);
        let client = GeminiClient::with_endpoint(
            &self.gemini_endpoint,
            credentials.analysis_key.as_str(),
            self.model.as_str(),
        )?;
        let analysis =
            analyze_text_with_temperature(&client, &request.text, self.temperature).await?;

        if analysis.verdict == Verdict::Real {
            return Ok(CombinedReport {
                analysis,
                remedies: None,
                related_news: None,
            });
        }

        let remedies = self.remedies.lookup(&analysis.scam_category);
        enter(Stage::AwaitingEvidence);
        let related_news = self
            .related_news(credentials, &analysis.main_claim)
            .await;

        Ok(CombinedReport {
            analysis,
            remedies: Some(remedies),
            related_news,
        })
    }

    async fn related_news(&self, credentials: &Credentials, claim: &str) -> Option<Vec<NewsItem>> {
        let Some((key, engine_id)) = credentials.search() else {
            tracing::debug!("analysis.search_skipped.no_credentials");
            return None;
        };
        if claim.trim().is_empty() {
            tracing::debug!("analysis.search_skipped.no_claim");
            return None;
        }

        match GoogleSearchClient::with_endpoint(&self.search_endpoint, key, engine_id) {
            Ok(client) => client.related_news(claim.trim()).await,
            Err(err) => {
                tracing::warn!(error = %err, endpoint = %self.search_endpoint, "analysis.search_client_invalid");
                None
            }
        }
    }
}

impl Credentials {
    /// Keys as configured: the analysis key always, search keys when both
    /// are set and expanded.
    pub fn from_config(config: &SatyaConfig) -> Self {
        let credentials = Credentials::new(config.analysis.api_key.trim());
        match config.search.as_ref().and_then(|s| s.credentials()) {
            Some((key, engine_id)) => credentials.with_search(key, engine_id),
            None => credentials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use satya_config::SatyaConfigLoader;

    #[test]
    fn config_drives_endpoints_and_credentials() {
        let config = SatyaConfigLoader::new()
            .with_yaml_str(
                r#"
analysis:
  api_key: "gem-key"
  model: gemini-custom
  endpoint: http://localhost:9000/v1beta
  temperature: 0.5
search:
  api_key: "s-key"
  engine_id: "cx-1"
  endpoint: http://localhost:9001
remedies:
  "Job Scam": { link: "https://example.org/jobs", description: "Jobs desk." }
"#,
            )
            .load()
            .unwrap();

        let analyzer = Analyzer::from_config(&config);
        assert_eq!(analyzer.model(), "gemini-custom");
        assert_eq!(analyzer.gemini_endpoint, "http://localhost:9000/v1beta");
        assert_eq!(analyzer.search_endpoint, "http://localhost:9001");
        assert_eq!(analyzer.temperature, 0.5);
        assert_eq!(
            analyzer
                .remedies()
                .lookup(&satya_llm::analysis::ScamCategory::JobScam)
                .reporting_link,
            "https://example.org/jobs"
        );

        let creds = Credentials::from_config(&config);
        assert_eq!(creds.analysis_key, "gem-key");
        assert_eq!(creds.search(), Some(("s-key", "cx-1")));
    }

    #[tokio::test]
    async fn blank_inputs_fail_before_any_call() {
        let analyzer = Analyzer::new().with_gemini_endpoint("http://127.0.0.1:9/v1beta");

        let err = analyzer
            .analyze(&AnalysisRequest::new("  ", Credentials::new("k")))
            .await
            .unwrap_err();
        assert!(matches!(err, SatyaError::Validation(_)));

        let err = analyzer
            .analyze(&AnalysisRequest::new("claim", Credentials::new(" ")))
            .await
            .unwrap_err();
        assert!(matches!(err, SatyaError::Credential(_)));
    }
}
