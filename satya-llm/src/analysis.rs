//! Structured fact-check report and the step that digs it out of model text.
//!
//! Gemini answers with a JSON envelope whose candidate text is itself a JSON
//! document. [`GeminiClient`](crate::gemini::GeminiClient) unwraps the
//! envelope; [`parse_analysis_payload`] turns the inner text into an
//! [`AnalysisReport`]. Nothing downstream ever sees raw model output.

use crate::prompt::build_analysis_prompt;
use crate::traits::{GenerateOpts, LlmClient};
use regex::Regex;
use satya_common::{Result, SatyaError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::OnceLock;

/// Sampling temperature used for fact-check requests.
pub const ANALYSIS_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    #[serde(alias = "Real", alias = "real")]
    Real,
    #[serde(alias = "Fake", alias = "fake")]
    Fake,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Real => "REAL",
            Verdict::Fake => "FAKE",
        })
    }
}

/// Misinformation category. Labels outside the known set are kept verbatim
/// in [`ScamCategory::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ScamCategory {
    FinancialFraud,
    HealthMisinformation,
    Impersonation,
    JobScam,
    GeneralFakeNews,
    NotApplicable,
    Other(String),
}

impl ScamCategory {
    /// The five categories a FAKE verdict may carry.
    pub const KNOWN: [ScamCategory; 5] = [
        ScamCategory::FinancialFraud,
        ScamCategory::HealthMisinformation,
        ScamCategory::Impersonation,
        ScamCategory::JobScam,
        ScamCategory::GeneralFakeNews,
    ];

    pub fn label(&self) -> &str {
        match self {
            ScamCategory::FinancialFraud => "Financial Fraud",
            ScamCategory::HealthMisinformation => "Health Misinformation",
            ScamCategory::Impersonation => "Impersonation",
            ScamCategory::JobScam => "Job Scam",
            ScamCategory::GeneralFakeNews => "General Fake News",
            ScamCategory::NotApplicable => "N/A",
            ScamCategory::Other(label) => label,
        }
    }

    /// Resolve a label, ignoring case and surrounding whitespace.
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        Self::KNOWN
            .iter()
            .chain(std::iter::once(&ScamCategory::NotApplicable))
            .find(|c| c.label().eq_ignore_ascii_case(trimmed))
            .cloned()
            .unwrap_or_else(|| ScamCategory::Other(trimmed.to_string()))
    }
}

impl From<String> for ScamCategory {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl From<ScamCategory> for String {
    fn from(c: ScamCategory) -> Self {
        c.label().to_string()
    }
}

impl fmt::Display for ScamCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The fact-check verdict as returned by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub verdict: Verdict,
    pub sentiment: String,
    pub truthfulness_score: u8,
    pub main_claim: String,
    #[serde(alias = "analysis_summary")]
    pub summary: String,
    pub scam_category: ScamCategory,
    /// Entity type (e.g. `PERSON`) to the unique mentions of that type.
    pub named_entities: BTreeMap<String, BTreeSet<String>>,
}

/// Exactly what the model is asked to emit; loosened where models drift.
#[derive(Debug, Deserialize)]
struct ReportWire {
    verdict: Verdict,
    sentiment: String,
    truthfulness_score: Value,
    main_claim: String,
    #[serde(alias = "summary")]
    analysis_summary: String,
    #[serde(default)]
    scam_category: Option<ScamCategory>,
    #[serde(default)]
    named_entities: Option<BTreeMap<String, Vec<String>>>,
}

impl TryFrom<ReportWire> for AnalysisReport {
    type Error = SatyaError;

    fn try_from(w: ReportWire) -> Result<Self> {
        let truthfulness_score = parse_score(&w.truthfulness_score)?;

        let scam_category = w.scam_category.unwrap_or(match w.verdict {
            Verdict::Real => ScamCategory::NotApplicable,
            Verdict::Fake => ScamCategory::GeneralFakeNews,
        });

        let named_entities = w
            .named_entities
            .unwrap_or_default()
            .into_iter()
            .map(|(kind, mentions)| {
                let unique = mentions
                    .into_iter()
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect::<BTreeSet<_>>();
                (kind, unique)
            })
            .collect();

        Ok(AnalysisReport {
            verdict: w.verdict,
            sentiment: w.sentiment,
            truthfulness_score,
            main_claim: w.main_claim,
            summary: w.analysis_summary,
            scam_category,
            named_entities,
        })
    }
}

fn parse_score(raw: &Value) -> Result<u8> {
    let score = match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match score {
        Some(s) if (0..=100).contains(&s) => Ok(s as u8),
        Some(s) => Err(SatyaError::MalformedResponse(format!(
            "truthfulness_score {s} is outside 0..=100"
        ))),
        None => Err(SatyaError::MalformedResponse(format!(
            "truthfulness_score is not an integer: {raw}"
        ))),
    }
}

fn json_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"))
}

/// Remove markdown code fences that models add despite being told not to.
fn strip_code_fences(text: &str) -> &str {
    text.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```JSON")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Locate the top-level JSON object in `text`: the whole (fence-stripped)
/// text if it parses, otherwise the outermost `{...}` span.
fn extract_json_object(text: &str) -> Option<serde_json::Map<String, Value>> {
    let cleaned = strip_code_fences(text);
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(cleaned) {
        return Some(map);
    }
    let block = json_block_re().find(cleaned)?;
    match serde_json::from_str::<Value>(block.as_str()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Parse the model's text into an [`AnalysisReport`].
///
/// ```
/// use satya_llm::analysis::{parse_analysis_payload, ScamCategory, Verdict};
///
/// let text = r#"```json
/// {"verdict":"FAKE","sentiment":"Provocative","truthfulness_score":12,
///  "main_claim":"RBI is giving away cash.","analysis_summary":"No such scheme exists.",
///  "scam_category":"Financial Fraud","named_entities":{"ORG":["RBI","RBI"]}}
/// ```"#;
/// let report = parse_analysis_payload(text).unwrap();
/// assert_eq!(report.verdict, Verdict::Fake);
/// assert_eq!(report.scam_category, ScamCategory::FinancialFraud);
/// assert_eq!(report.named_entities["ORG"].len(), 1);
/// ```
pub fn parse_analysis_payload(text: &str) -> Result<AnalysisReport> {
    let object = extract_json_object(text).ok_or_else(|| {
        SatyaError::MalformedResponse("no JSON object found in model output".to_string())
    })?;

    let wire: ReportWire = serde_json::from_value(Value::Object(object))
        .map_err(|e| SatyaError::MalformedResponse(e.to_string()))?;
    let report = AnalysisReport::try_from(wire)?;

    let consistent = (report.verdict == Verdict::Real)
        == (report.scam_category == ScamCategory::NotApplicable);
    if !consistent {
        tracing::warn!(
            verdict = %report.verdict,
            scam_category = %report.scam_category,
            "analysis.inconsistent_category"
        );
    }

    Ok(report)
}

/// Run one fact-check: build the prompt, make exactly one model call, parse.
pub async fn analyze_text(client: &dyn LlmClient, text: &str) -> Result<AnalysisReport> {
    analyze_text_with_temperature(client, text, ANALYSIS_TEMPERATURE).await
}

/// [`analyze_text`] with a caller-chosen sampling temperature.
pub async fn analyze_text_with_temperature(
    client: &dyn LlmClient,
    text: &str,
    temperature: f32,
) -> Result<AnalysisReport> {
    let prompt = build_analysis_prompt(text)?;
    let response = client
        .generate(
            &prompt,
            GenerateOpts {
                temperature: Some(temperature),
                json_output: true,
            },
        )
        .await?;
    tracing::debug!(
        model = client.model_name(),
        tokens_used = ?response.tokens_used,
        "analysis.response_received"
    );
    parse_analysis_payload(&response.text)
}
