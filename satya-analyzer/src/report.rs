use crate::remedies::RemedyInfo;
use satya_llm::analysis::{AnalysisReport, Verdict};
use satya_web::NewsItem;
use serde::{Deserialize, Serialize};

/// API keys for one analysis. Search is optional; without both search
/// values no related-news lookup happens.
#[derive(Clone, Default)]
pub struct Credentials {
    pub analysis_key: String,
    pub search_key: Option<String>,
    pub search_engine_id: Option<String>,
}

impl Credentials {
    pub fn new(analysis_key: impl Into<String>) -> Self {
        Self {
            analysis_key: analysis_key.into(),
            ..Default::default()
        }
    }

    pub fn with_search(mut self, key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        self.search_key = Some(key.into());
        self.search_engine_id = Some(engine_id.into());
        self
    }

    /// Both search values, if both are non-blank.
    pub fn search(&self) -> Option<(&str, &str)> {
        let key = self.search_key.as_deref().map(str::trim)?;
        let cx = self.search_engine_id.as_deref().map(str::trim)?;
        (!key.is_empty() && !cx.is_empty()).then_some((key, cx))
    }
}

// Keys stay out of Debug output, and therefore out of logs.
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("analysis_key", &"<redacted>")
            .field("search_configured", &self.search().is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub text: String,
    pub credentials: Credentials,
}

impl AnalysisRequest {
    pub fn new(text: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            text: text.into(),
            credentials,
        }
    }
}

/// Everything the user gets back for one piece of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedReport {
    pub analysis: AnalysisReport,
    /// Set only for `FAKE` verdicts.
    pub remedies: Option<RemedyInfo>,
    /// Set only for `FAKE` verdicts where a search was attempted and succeeded.
    pub related_news: Option<Vec<NewsItem>>,
}

impl CombinedReport {
    pub fn is_fake(&self) -> bool {
        self.analysis.verdict == Verdict::Fake
    }
}
