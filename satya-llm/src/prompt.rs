//! Fact-check prompt construction.

use satya_common::{Result, SatyaError};

/// Delimiter fencing the user's text inside the prompt.
pub const TEXT_DELIMITER: &str = "---";

const INSTRUCTIONS: &str = r#"Act as a professional fact-checker based in India. Analyze the text below.
If the text accurately reports a statement someone made (e.g. "Minister X said Y"), the verdict is "REAL" because the reporting itself is factual; the analysis_summary must then explain that the content of the statement may still be misleading.

Return your complete analysis as a single JSON object with exactly these keys:
- "verdict": string, either "REAL" or "FAKE"
- "sentiment": string, e.g. "Neutral", "Biased", "Provocative"
- "truthfulness_score": integer from 0 to 100
- "main_claim": string, a one-sentence summary of the main claim
- "analysis_summary": string, a 2-3 sentence explanation of the verdict
- "scam_category": string; if the verdict is "FAKE" choose ONE of "Financial Fraud", "Health Misinformation", "Impersonation", "Job Scam", "General Fake News"; if the verdict is "REAL" use "N/A"
- "named_entities": object whose keys are entity types such as "PERSON", "ORG", "GPE" and whose values are lists of unique strings found in the text

Respond with the JSON object only. Do not add any text, notes, or explanations before or after it, and do not wrap it in markdown or code fences."#;

/// Build the analysis prompt for `text`.
///
/// The text is embedded verbatim between two [`TEXT_DELIMITER`] lines. Blank
/// input is rejected with [`SatyaError::Validation`].
pub fn build_analysis_prompt(text: &str) -> Result<String> {
    if text.trim().is_empty() {
        return Err(SatyaError::Validation(
            "text to analyze is empty".to_string(),
        ));
    }

    Ok(format!(
        "{INSTRUCTIONS}\n\nText to analyze:\n{TEXT_DELIMITER}\n{text}\n{TEXT_DELIMITER}\n"
    ))
}
