//! LLM integration for Satya.
//!
//! This crate exposes a provider-agnostic [`traits::LlmClient`] interface, the
//! Google Gemini implementation, the fact-check prompt, and the parser that
//! turns model output into a typed [`analysis::AnalysisReport`].
//!
//! # Examples
//! ```no_run
//! use satya_common::Result;
//! use satya_llm::{analysis::analyze_text, gemini::GeminiClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let client = GeminiClient::new("my-api-key", satya_llm::DEFAULT_GEMINI_MODEL)?;
//! let report = analyze_text(&client, "Drinking hot water cures every virus.").await?;
//! println!("{} ({}%)", report.verdict, report.truthfulness_score);
//! # Ok(())
//! # }
//! ```
pub mod analysis;
pub mod gemini;
pub mod prompt;
pub mod traits;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";
