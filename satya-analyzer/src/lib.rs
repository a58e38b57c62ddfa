//! The Satya fact-check pipeline.
//!
//! [`Analyzer::analyze`] takes text plus per-request credentials, asks the
//! analysis model for a verdict and, for fakes, attaches reporting guidance
//! ([`remedies`]) and up to three related articles from web search.
//!
//! ```no_run
//! use satya_analyzer::{AnalysisRequest, Analyzer, Credentials};
//!
//! # #[tokio::main]
//! # async fn main() -> satya_common::Result<()> {
//! let analyzer = Analyzer::new();
//! let request = AnalysisRequest::new(
//!     "RBI is giving ₹5000 to every citizen, click here to claim.",
//!     Credentials::new("gemini-key").with_search("search-key", "engine-id"),
//! );
//! let report = analyzer.analyze(&request).await?;
//! if let Some(remedies) = &report.remedies {
//!     println!("Report it at {}", remedies.reporting_link);
//! }
//! # Ok(())
//! # }
//! ```

pub mod pipeline;
pub mod remedies;
pub mod report;

pub use pipeline::{Analyzer, Stage};
pub use remedies::{RemedyInfo, RemedyTable};
pub use report::{AnalysisRequest, CombinedReport, Credentials};
